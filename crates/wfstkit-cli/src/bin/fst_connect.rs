// fst-connect: Remove states that are not on a successful path.
//
// Keeps only states that are both reachable from the start state and able
// to reach a final state. An automaton with no such state becomes empty.
//
// Usage:
//   fst-connect [OPTIONS] [IN] [OUT]

use std::path::{Path, PathBuf};

use clap::Parser;
use wfstkit_cli::{CliWeight, CommonArgs, WeightVisitor};
use wfstkit_core::ErrorPolicy;
use wfstkit_fst::{ConnectOptions, FstError, connect_with};

#[derive(Parser)]
#[command(name = "fst-connect", version)]
#[command(about = "Remove inaccessible and non-coaccessible states")]
struct Cli {
    /// Input automaton ("-" or absent for stdin)
    input: Option<PathBuf>,

    /// Output automaton ("-" or absent for stdout)
    output: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

struct Connect<'a> {
    bytes: &'a [u8],
    output: Option<&'a Path>,
    policy: ErrorPolicy,
}

impl WeightVisitor for Connect<'_> {
    type Output = ();

    fn visit<W: CliWeight>(self) -> Result<(), FstError> {
        let mut fst = wfstkit_cli::load_fst::<W>(self.bytes, self.policy)?;
        connect_with(&mut fst, &ConnectOptions { policy: self.policy })?;
        wfstkit_cli::store_fst(&fst, self.output, self.policy)
    }
}

fn main() {
    let cli = Cli::parse();
    wfstkit_cli::run(&cli.common, |policy| {
        let bytes = wfstkit_cli::read_input(cli.input.as_deref(), policy)?;
        wfstkit_cli::dispatch(
            &bytes,
            policy,
            Connect {
                bytes: &bytes,
                output: cli.output.as_deref(),
                policy,
            },
        )
    });
}
