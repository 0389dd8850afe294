// fst-print: Print an automaton as AT&T text.
//
// Usage:
//   fst-print [OPTIONS] [IN] [OUT]

use std::path::{Path, PathBuf};

use clap::Parser;
use wfstkit_cli::{CliWeight, CommonArgs, WeightVisitor};
use wfstkit_core::ErrorPolicy;
use wfstkit_fst::FstError;
use wfstkit_fst::text::print_fst;

#[derive(Parser)]
#[command(name = "fst-print", version)]
#[command(about = "Print an automaton as AT&T text")]
struct Cli {
    /// Input automaton ("-" or absent for stdin)
    input: Option<PathBuf>,

    /// Text output ("-" or absent for stdout)
    output: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

struct Print<'a> {
    bytes: &'a [u8],
    output: Option<&'a Path>,
    policy: ErrorPolicy,
}

impl WeightVisitor for Print<'_> {
    type Output = ();

    fn visit<W: CliWeight>(self) -> Result<(), FstError> {
        let fst = wfstkit_cli::load_fst::<W>(self.bytes, self.policy)?;
        let mut out = wfstkit_cli::open_output(self.output, self.policy)?;
        print_fst(&fst, &mut out).map_err(|e| self.policy.raise(e))
    }
}

fn main() {
    let cli = Cli::parse();
    wfstkit_cli::run(&cli.common, |policy| {
        let bytes = wfstkit_cli::read_input(cli.input.as_deref(), policy)?;
        wfstkit_cli::dispatch(
            &bytes,
            policy,
            Print {
                bytes: &bytes,
                output: cli.output.as_deref(),
                policy,
            },
        )
    });
}
