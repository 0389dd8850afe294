// Binary automaton format: header parsing, validation, state table.

use std::io::{Read, Write};

use wfstkit_core::{Codec, ErrorPolicy, Semiring, StateId};

use crate::FstError;
use crate::arc::Arc;
use crate::fst::{Fst, VectorFst, verify};
use crate::properties::FstProperties;

/// Magic number opening every automaton file.
pub const FST_MAGIC: u32 = 0x7EB2_4653;

/// Current file version.
pub const FST_VERSION: i32 = 1;

/// Parsed automaton file header.
///
/// Layout, every field in native byte order through [`Codec`]:
/// - magic (u32)
/// - version (i32)
/// - weight type name (string)
/// - properties (u64)
/// - start state (i64, -1 for none)
/// - state count (i64)
/// - arc count (i64)
///
/// The header is followed by one record per state: final weight, arc count
/// (i64), then `(ilabel, olabel, weight, nextstate)` per arc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstHeader {
    pub version: i32,
    pub weight_type: String,
    pub properties: FstProperties,
    pub start: Option<StateId>,
    pub num_states: u64,
    pub num_arcs: u64,
}

impl FstHeader {
    /// Header describing `fst`, with freshly computed properties.
    pub fn for_fst<W: Semiring, F: Fst<W>>(fst: &F) -> Self {
        Self {
            version: FST_VERSION,
            weight_type: W::weight_type().to_string(),
            properties: FstProperties::compute(fst),
            start: fst.start(),
            num_states: fst.num_states() as u64,
            num_arcs: fst.total_arcs() as u64,
        }
    }

    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, FstError> {
        let magic = u32::read_from(reader)?;
        if magic != FST_MAGIC {
            return Err(FstError::InvalidMagic { what: "automaton" });
        }
        let version = i32::read_from(reader)?;
        if version != FST_VERSION {
            return Err(FstError::Malformed(format!(
                "unsupported automaton file version {version}"
            )));
        }
        let weight_type = String::read_from(reader)?;
        let properties = FstProperties::from_bits(u64::read_from(reader)?);
        let start = match i64::read_from(reader)? {
            -1 => None,
            s => Some(to_state_id(s)?),
        };
        let num_states = to_count(i64::read_from(reader)?, "state count")?;
        let num_arcs = to_count(i64::read_from(reader)?, "arc count")?;
        Ok(Self {
            version,
            weight_type,
            properties,
            start,
            num_states,
            num_arcs,
        })
    }

    pub fn write_to<Wr: Write + ?Sized>(&self, writer: &mut Wr) -> Result<(), FstError> {
        FST_MAGIC.write_to(writer)?;
        self.version.write_to(writer)?;
        self.weight_type.write_to(writer)?;
        self.properties.bits().write_to(writer)?;
        self.start.map_or(-1, i64::from).write_to(writer)?;
        (self.num_states as i64).write_to(writer)?;
        (self.num_arcs as i64).write_to(writer)?;
        Ok(())
    }

    /// Parse just the header from the front of `bytes`.
    pub fn peek(mut bytes: &[u8]) -> Result<Self, FstError> {
        Self::read_from(&mut bytes)
    }
}

fn to_state_id(value: i64) -> Result<StateId, FstError> {
    StateId::try_from(value)
        .map_err(|_| FstError::Malformed(format!("state id {value} out of range")))
}

fn to_count(value: i64, what: &str) -> Result<u64, FstError> {
    u64::try_from(value).map_err(|_| FstError::Malformed(format!("negative {what}: {value}")))
}

/// Serialize `fst` with a header describing it.
pub fn write_fst<W, F, Wr>(fst: &F, writer: &mut Wr, policy: ErrorPolicy) -> Result<(), FstError>
where
    W: Semiring + Codec,
    F: Fst<W>,
    Wr: Write + ?Sized,
{
    write_body(fst, writer).map_err(|e| policy.raise(e))
}

fn write_body<W, F, Wr>(fst: &F, writer: &mut Wr) -> Result<(), FstError>
where
    W: Semiring + Codec,
    F: Fst<W>,
    Wr: Write + ?Sized,
{
    FstHeader::for_fst(fst).write_to(writer)?;
    for state in fst.states() {
        fst.final_weight(state).write_to(writer)?;
        let arcs = fst.arcs(state);
        (arcs.len() as i64).write_to(writer)?;
        for arc in arcs {
            arc.ilabel.write_to(writer)?;
            arc.olabel.write_to(writer)?;
            arc.weight.write_to(writer)?;
            arc.nextstate.write_to(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Deserialize an automaton whose weight type must be `W`.
///
/// The result is checked before it is returned: the start state and every
/// arc destination must be in range and every weight must be a member of
/// the semiring.
pub fn read_fst<W, R>(reader: &mut R, policy: ErrorPolicy) -> Result<VectorFst<W>, FstError>
where
    W: Semiring + Codec,
    R: Read + ?Sized,
{
    read_body(reader).map_err(|e| policy.raise(e))
}

fn read_body<W, R>(reader: &mut R) -> Result<VectorFst<W>, FstError>
where
    W: Semiring + Codec,
    R: Read + ?Sized,
{
    let header = FstHeader::read_from(reader)?;
    if header.weight_type != W::weight_type() {
        return Err(FstError::WeightTypeMismatch {
            expected: W::weight_type().to_string(),
            actual: header.weight_type,
        });
    }

    let mut fst = VectorFst::new();
    fst.reserve_states(header.num_states.min(1 << 16) as usize);
    let mut num_arcs = 0u64;
    for _ in 0..header.num_states {
        let state = fst.add_state();
        fst.set_final(state, W::read_from(reader)?);
        let count = to_count(i64::read_from(reader)?, "arc count")?;
        for _ in 0..count {
            let ilabel = u32::read_from(reader)?;
            let olabel = u32::read_from(reader)?;
            let weight = W::read_from(reader)?;
            let nextstate = u32::read_from(reader)?;
            fst.add_arc(state, Arc::new(ilabel, olabel, weight, nextstate));
        }
        num_arcs += count;
    }
    if num_arcs != header.num_arcs {
        return Err(FstError::Malformed(format!(
            "header declares {} arcs, body holds {num_arcs}",
            header.num_arcs
        )));
    }
    if let Some(start) = header.start {
        fst.set_start(start);
    }
    verify(&fst)?;
    log::debug!(
        "read automaton: {} states, {num_arcs} arcs, weight type {}",
        fst.num_states(),
        W::weight_type()
    );
    Ok(fst)
}
