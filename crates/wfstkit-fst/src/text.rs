// Text formats: AT&T-style automata and parenthesis triple files.

use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

use wfstkit_core::{Label, Semiring, StateId};

use crate::FstError;
use crate::arc::Arc;
use crate::fst::{Fst, VectorFst};

fn parse_error(source_name: &str, line: usize, message: impl Into<String>) -> FstError {
    FstError::Parse {
        source_name: source_name.to_string(),
        line,
        message: message.into(),
    }
}

/// Parse a decimal integer. The whole string must be consumed; negative
/// values are rejected unless `allow_negative` is set.
pub fn parse_int64(
    s: &str,
    source_name: &str,
    line: usize,
    allow_negative: bool,
) -> Result<i64, FstError> {
    let value: i64 = s
        .parse()
        .map_err(|_| parse_error(source_name, line, format!("bad integer \"{s}\"")))?;
    if value < 0 && !allow_negative {
        return Err(parse_error(
            source_name,
            line,
            format!("negative integer \"{s}\" not allowed"),
        ));
    }
    Ok(value)
}

fn parse_u32(s: &str, source_name: &str, line: usize) -> Result<u32, FstError> {
    let value = parse_int64(s, source_name, line, false)?;
    u32::try_from(value)
        .map_err(|_| parse_error(source_name, line, format!("integer \"{s}\" out of range")))
}

/// Significant lines of a whitespace-separated text file: blank lines and
/// lines whose first field starts with `#` are skipped. Yields the 1-based
/// line number with the fields.
fn fields<R: BufRead>(reader: R) -> impl Iterator<Item = std::io::Result<(usize, Vec<String>)>> {
    reader.lines().enumerate().filter_map(|(i, line)| match line {
        Err(e) => Some(Err(e)),
        Ok(line) => {
            let cols: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            match cols.first() {
                None => None,
                Some(first) if first.starts_with('#') => None,
                Some(_) => Some(Ok((i + 1, cols))),
            }
        }
    })
}

/// Read a file of `open close stack` triples, one per line, as used for
/// multi-stack parenthesis assignments. Returns the label pairs and the
/// stack id of each pair, in file order.
pub fn read_label_triples<R: BufRead>(
    reader: R,
    source_name: &str,
) -> Result<(Vec<(Label, Label)>, Vec<u32>), FstError> {
    let mut pairs = Vec::new();
    let mut stacks = Vec::new();
    for entry in fields(reader) {
        let (line, cols) = entry?;
        if cols.len() != 3 {
            return Err(parse_error(source_name, line, "bad number of columns"));
        }
        pairs.push((
            parse_u32(&cols[0], source_name, line)?,
            parse_u32(&cols[1], source_name, line)?,
        ));
        stacks.push(parse_u32(&cols[2], source_name, line)?);
    }
    Ok((pairs, stacks))
}

fn parse_weight<W>(s: &str, source_name: &str, line: usize) -> Result<W, FstError>
where
    W: Semiring + FromStr,
    W::Err: Display,
{
    let w: W = s
        .parse()
        .map_err(|e: W::Err| parse_error(source_name, line, e.to_string()))?;
    if !w.is_member() {
        return Err(parse_error(
            source_name,
            line,
            format!("weight \"{s}\" is not a member of the {} semiring", W::weight_type()),
        ));
    }
    Ok(w)
}

/// Compile an automaton from AT&T text.
///
/// Arc lines are `src dst ilabel olabel [weight]`, final-state lines are
/// `state [weight]`. A missing weight means `One`. States are created up to
/// the largest id mentioned; the first state named in the file is the start.
pub fn compile_fst<W, R>(reader: R, source_name: &str) -> Result<VectorFst<W>, FstError>
where
    W: Semiring + FromStr,
    W::Err: Display,
    R: BufRead,
{
    let mut fst = VectorFst::new();
    let ensure = |fst: &mut VectorFst<W>, state: StateId| {
        while fst.num_states() <= state as usize {
            fst.add_state();
        }
    };

    for entry in fields(reader) {
        let (line, cols) = entry?;
        match cols.len() {
            4 | 5 => {
                let src = parse_u32(&cols[0], source_name, line)?;
                let dst = parse_u32(&cols[1], source_name, line)?;
                let ilabel = parse_u32(&cols[2], source_name, line)?;
                let olabel = parse_u32(&cols[3], source_name, line)?;
                let weight = match cols.get(4) {
                    Some(w) => parse_weight(w, source_name, line)?,
                    None => W::one(),
                };
                ensure(&mut fst, src.max(dst));
                if fst.start().is_none() {
                    fst.set_start(src);
                }
                fst.add_arc(src, Arc::new(ilabel, olabel, weight, dst));
            }
            1 | 2 => {
                let state = parse_u32(&cols[0], source_name, line)?;
                let weight = match cols.get(1) {
                    Some(w) => parse_weight(w, source_name, line)?,
                    None => W::one(),
                };
                ensure(&mut fst, state);
                if fst.start().is_none() {
                    fst.set_start(state);
                }
                fst.set_final(state, weight);
            }
            _ => return Err(parse_error(source_name, line, "bad number of columns")),
        }
    }
    Ok(fst)
}

/// Print `fst` as AT&T text. The start state is printed first so that
/// [`compile_fst`] recovers it; weights equal to `One` are omitted.
pub fn print_fst<W, F, Wr>(fst: &F, writer: &mut Wr) -> Result<(), FstError>
where
    W: Semiring + Display,
    F: Fst<W>,
    Wr: Write + ?Sized,
{
    let Some(start) = fst.start() else {
        return Ok(());
    };
    let order = std::iter::once(start).chain(fst.states().filter(|&s| s != start));
    for state in order {
        for arc in fst.arcs(state) {
            write!(
                writer,
                "{state}\t{}\t{}\t{}",
                arc.nextstate, arc.ilabel, arc.olabel
            )?;
            if !arc.weight.is_one() {
                write!(writer, "\t{}", arc.weight)?;
            }
            writeln!(writer)?;
        }
        let fw = fst.final_weight(state);
        if fw.is_one() {
            writeln!(writer, "{state}")?;
        } else if !fw.is_zero() {
            writeln!(writer, "{state}\t{fw}")?;
        }
    }
    writer.flush()?;
    Ok(())
}
