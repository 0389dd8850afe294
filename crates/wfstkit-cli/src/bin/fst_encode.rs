// fst-encode: Encode arcs as single labels, or decode them back.
//
// Encoding replaces each arc's (input, output, weight) triple, restricted to
// the selected fields, by an integer code and writes the code table to
// TABLE. Decoding reads TABLE and restores the original arcs.
//
// Usage:
//   fst-encode [--encode-labels] [--encode-weights] IN TABLE [OUT]
//   fst-encode --decode IN TABLE [OUT]

use std::path::{Path, PathBuf};

use clap::Parser;
use wfstkit_cli::{CliWeight, CommonArgs, WeightVisitor};
use wfstkit_core::ErrorPolicy;
use wfstkit_fst::{DecodeOptions, EncodeFlags, EncodeTable, FstError, decode, encode};

#[derive(Parser)]
#[command(name = "fst-encode", version)]
#[command(about = "Encode arc labels and weights as single labels, or decode them")]
struct Cli {
    /// Input automaton ("-" for stdin)
    input: PathBuf,

    /// Code table: written when encoding, read when decoding
    table: PathBuf,

    /// Output automaton ("-" or absent for stdout)
    output: Option<PathBuf>,

    /// Fold the output label into the code
    #[arg(long, conflicts_with = "decode")]
    encode_labels: bool,

    /// Fold the weight into the code
    #[arg(long, conflicts_with = "decode")]
    encode_weights: bool,

    /// Decode IN with TABLE instead of encoding
    #[arg(long)]
    decode: bool,

    #[command(flatten)]
    common: CommonArgs,
}

struct Encode<'a> {
    cli: &'a Cli,
    bytes: &'a [u8],
    policy: ErrorPolicy,
}

impl Encode<'_> {
    fn output(&self) -> Option<&Path> {
        self.cli.output.as_deref()
    }
}

impl WeightVisitor for Encode<'_> {
    type Output = ();

    fn visit<W: CliWeight>(self) -> Result<(), FstError> {
        let policy = self.policy;
        let mut fst = wfstkit_cli::load_fst::<W>(self.bytes, policy)?;

        if self.cli.decode {
            let bytes = wfstkit_cli::read_input(Some(self.cli.table.as_path()), policy)?;
            let table = EncodeTable::<W>::read_from(&mut bytes.as_slice())
                .map_err(|e| policy.raise(e))?;
            decode(&mut fst, &table, &DecodeOptions { policy })?;
            return wfstkit_cli::store_fst(&fst, self.output(), policy);
        }

        let flags = EncodeFlags {
            labels: self.cli.encode_labels,
            weights: self.cli.encode_weights,
        };
        let mut table = EncodeTable::new(flags);
        let encoded = encode(&fst, &mut table);
        log::info!("{} distinct codes", table.len());

        let mut out = wfstkit_cli::open_output(Some(self.cli.table.as_path()), policy)?;
        table.write_to(&mut out).map_err(|e| policy.raise(e))?;
        wfstkit_cli::store_fst(&encoded, self.output(), policy)
    }
}

fn main() {
    let cli = Cli::parse();
    wfstkit_cli::run(&cli.common, |policy| {
        let bytes = wfstkit_cli::read_input(Some(cli.input.as_path()), policy)?;
        wfstkit_cli::dispatch(
            &bytes,
            policy,
            Encode {
                cli: &cli,
                bytes: &bytes,
                policy,
            },
        )
    });
}
