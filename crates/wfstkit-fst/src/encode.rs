// Encode/Decode: map arc (ilabel, olabel, weight) triples to integer codes.

use std::io::{Read, Write};

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use wfstkit_core::{Codec, CodecError, EPSILON, ErrorPolicy, Label, NO_LABEL, Semiring, StateId};

use crate::FstError;
use crate::arc::Arc;
use crate::fst::{Fst, VectorFst};

/// Magic number opening every encode table file.
pub const ENCODE_MAGIC: u32 = 0x454E_4344;

/// Which arc fields are folded into the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeFlags {
    pub labels: bool,
    pub weights: bool,
}

impl EncodeFlags {
    pub const LABELS: Self = Self {
        labels: true,
        weights: false,
    };
    pub const WEIGHTS: Self = Self {
        labels: false,
        weights: true,
    };
    pub const BOTH: Self = Self {
        labels: true,
        weights: true,
    };

    pub const fn bits(self) -> u32 {
        (self.labels as u32) | ((self.weights as u32) << 1)
    }

    pub fn from_bits(bits: u32) -> Result<Self, FstError> {
        if bits > 3 {
            return Err(FstError::Malformed(format!("invalid encode flags {bits:#x}")));
        }
        Ok(Self {
            labels: bits & 1 != 0,
            weights: bits & 2 != 0,
        })
    }
}

/// The restricted triple an arc is encoded from.
///
/// Fields not selected by the table's flags are normalised (`olabel` to
/// epsilon, `weight` to `One`) so they do not split codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodeTuple<W> {
    pub ilabel: Label,
    pub olabel: Label,
    pub weight: W,
}

impl<W: Codec> Codec for EncodeTuple<W> {
    fn write_to<Wr: Write + ?Sized>(&self, writer: &mut Wr) -> Result<(), CodecError> {
        self.ilabel.write_to(writer)?;
        self.olabel.write_to(writer)?;
        self.weight.write_to(writer)
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        Ok(Self {
            ilabel: Label::read_from(reader)?,
            olabel: Label::read_from(reader)?,
            weight: W::read_from(reader)?,
        })
    }
}

/// Bijection between triples and codes.
///
/// Codes are assigned sequentially from 1 in first-encounter order; 0 stays
/// free so that a code never reads as epsilon. Final weights moved onto arcs
/// are keyed with `ilabel == NO_LABEL`, which no real arc carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeTable<W: Semiring> {
    flags: EncodeFlags,
    tuples: Vec<EncodeTuple<W>>,
    codes: HashMap<EncodeTuple<W>, Label>,
}

impl<W: Semiring> EncodeTable<W> {
    pub fn new(flags: EncodeFlags) -> Self {
        Self {
            flags,
            tuples: Vec::new(),
            codes: HashMap::new(),
        }
    }

    pub fn flags(&self) -> EncodeFlags {
        self.flags
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    fn arc_tuple(&self, arc: &Arc<W>) -> EncodeTuple<W> {
        EncodeTuple {
            ilabel: arc.ilabel,
            olabel: if self.flags.labels { arc.olabel } else { EPSILON },
            weight: if self.flags.weights {
                arc.weight.clone()
            } else {
                W::one()
            },
        }
    }

    fn final_tuple(&self, weight: &W) -> EncodeTuple<W> {
        EncodeTuple {
            ilabel: NO_LABEL,
            olabel: if self.flags.labels { NO_LABEL } else { EPSILON },
            weight: weight.clone(),
        }
    }

    /// Code for `tuple`, assigning the next one if it is new.
    pub fn encode(&mut self, tuple: EncodeTuple<W>) -> Label {
        match self.codes.entry(tuple) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let code = self.tuples.len() as Label + 1;
                self.tuples.push(e.key().clone());
                e.insert(code);
                code
            }
        }
    }

    /// The triple behind `code`, if the table holds one.
    pub fn decode(&self, code: Label) -> Option<&EncodeTuple<W>> {
        let index = (code as usize).checked_sub(1)?;
        self.tuples.get(index)
    }

    /// Tuples in code order.
    pub fn iter(&self) -> impl Iterator<Item = &EncodeTuple<W>> {
        self.tuples.iter()
    }
}

impl<W: Semiring + Codec> EncodeTable<W> {
    /// Layout: magic (u32), weight type (string), flags (u32), then the
    /// tuples in code order as an i64-counted sequence.
    pub fn write_to<Wr: Write + ?Sized>(&self, writer: &mut Wr) -> Result<(), FstError> {
        ENCODE_MAGIC.write_to(writer)?;
        W::weight_type().to_string().write_to(writer)?;
        self.flags.bits().write_to(writer)?;
        self.tuples.write_to(writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, FstError> {
        if u32::read_from(reader)? != ENCODE_MAGIC {
            return Err(FstError::InvalidMagic { what: "encode table" });
        }
        let weight_type = String::read_from(reader)?;
        if weight_type != W::weight_type() {
            return Err(FstError::WeightTypeMismatch {
                expected: W::weight_type().to_string(),
                actual: weight_type,
            });
        }
        let flags = EncodeFlags::from_bits(u32::read_from(reader)?)?;
        let tuples = Vec::<EncodeTuple<W>>::read_from(reader)?;

        let mut table = Self::new(flags);
        for tuple in tuples {
            if !tuple.weight.is_member() {
                return Err(FstError::Malformed(format!(
                    "encode table entry {} has an invalid weight",
                    table.len() + 1
                )));
            }
            let before = table.len();
            if table.encode(tuple) as usize <= before {
                return Err(FstError::Malformed(format!(
                    "encode table entry {} duplicates an earlier entry",
                    before + 1
                )));
            }
        }
        Ok(table)
    }
}

/// Encode every arc of `fst` through `table`, returning a fresh automaton.
///
/// Each arc's input label becomes its code. With label encoding the output
/// label becomes the code too; with weight encoding the weight becomes
/// `One`. Under weight encoding, final weights other than `Zero` and `One`
/// move onto an arc into a new superfinal state (the last state), so the
/// result's final weights are all trivial as well.
pub fn encode<W: Semiring, F: Fst<W>>(fst: &F, table: &mut EncodeTable<W>) -> VectorFst<W> {
    let flags = table.flags();
    let mut out = VectorFst::new();
    out.reserve_states(fst.num_states());
    for _ in fst.states() {
        out.add_state();
    }
    if let Some(start) = fst.start() {
        out.set_start(start);
    }

    let mut superfinal: Option<StateId> = None;
    for state in fst.states() {
        for arc in fst.arcs(state) {
            let code = table.encode(table.arc_tuple(arc));
            out.add_arc(
                state,
                Arc::new(
                    code,
                    if flags.labels { code } else { arc.olabel },
                    if flags.weights {
                        W::one()
                    } else {
                        arc.weight.clone()
                    },
                    arc.nextstate,
                ),
            );
        }

        let fw = fst.final_weight(state);
        if flags.weights && !fw.is_zero() && !fw.is_one() {
            let sf = match superfinal {
                Some(sf) => sf,
                None => {
                    let sf = out.add_state();
                    out.set_final(sf, W::one());
                    superfinal = Some(sf);
                    sf
                }
            };
            let code = table.encode(table.final_tuple(fw));
            let olabel = if flags.labels { code } else { EPSILON };
            out.add_arc(state, Arc::new(code, olabel, W::one(), sf));
        } else {
            out.set_final(state, fw.clone());
        }
    }
    log::debug!(
        "encode: {} arcs, table now holds {} codes",
        fst.total_arcs(),
        table.len()
    );
    out
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub policy: ErrorPolicy,
}

/// Invert [`encode`] in place.
///
/// Every arc's input label is looked up as a code; a code the table does not
/// hold fails with [`FstError::MissingEncoding`] and leaves `fst` untouched.
/// Arcs that carried final weights are folded back into final weights and
/// the superfinal state they led to is deleted. Epsilon arcs carry no code
/// and are kept as they are. Under label encoding an arc whose input and
/// output labels differ is [`FstError::Malformed`].
pub fn decode<W: Semiring>(
    fst: &mut VectorFst<W>,
    table: &EncodeTable<W>,
    opts: &DecodeOptions,
) -> Result<(), FstError> {
    decode_in_place(fst, table).map_err(|e| opts.policy.raise(e))
}

fn decode_in_place<W: Semiring>(
    fst: &mut VectorFst<W>,
    table: &EncodeTable<W>,
) -> Result<(), FstError> {
    let flags = table.flags();
    let mut rewritten = Vec::with_capacity(fst.num_states());
    let mut superfinal = vec![false; fst.num_states()];

    for state in fst.states() {
        let mut final_weight = fst.final_weight(state).clone();
        let mut arcs = Vec::with_capacity(fst.num_arcs(state));
        for arc in fst.arcs(state) {
            // Codes start at 1; an epsilon arc was added after encoding.
            if arc.ilabel == EPSILON {
                arcs.push(arc.clone());
                continue;
            }
            if flags.labels && arc.ilabel != arc.olabel {
                return Err(FstError::Malformed(format!(
                    "label-encoded arc at state {state} has input label {} and output label {}",
                    arc.ilabel, arc.olabel
                )));
            }
            let tuple = table
                .decode(arc.ilabel)
                .ok_or(FstError::MissingEncoding { code: arc.ilabel })?;
            if tuple.ilabel == NO_LABEL {
                final_weight = final_weight.plus(&tuple.weight);
                if let Some(flag) = superfinal.get_mut(arc.nextstate as usize) {
                    *flag = true;
                }
                continue;
            }
            arcs.push(Arc::new(
                tuple.ilabel,
                if flags.labels { tuple.olabel } else { arc.olabel },
                if flags.weights {
                    tuple.weight.clone()
                } else {
                    arc.weight.clone()
                },
                arc.nextstate,
            ));
        }
        rewritten.push((arcs, final_weight));
    }

    for (state, (arcs, final_weight)) in (0..).zip(rewritten) {
        fst.set_arcs(state, arcs);
        fst.set_final(state, final_weight);
    }

    if superfinal.iter().any(|&b| b) {
        for state in fst.states() {
            for arc in fst.arcs(state) {
                superfinal[arc.nextstate as usize] = false;
            }
        }
        if let Some(start) = fst.start() {
            superfinal[start as usize] = false;
        }
        fst.delete_states(&superfinal);
    }
    Ok(())
}
