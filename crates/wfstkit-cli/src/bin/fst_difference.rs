// fst-difference: Subtract the language of one automaton from another.
//
// IN2 must be an epsilon-free, deterministic, unweighted acceptor of the
// same weight type as IN1. The result keeps IN1's labels and weights.
//
// Usage:
//   fst-difference [--connect=false] [OPTIONS] IN1 IN2 [OUT]

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use wfstkit_cli::{CliWeight, CommonArgs, WeightVisitor};
use wfstkit_fst::{DifferenceOptions, FstError, difference};

#[derive(Parser)]
#[command(name = "fst-difference", version)]
#[command(about = "Paths of IN1 whose output string is not accepted by IN2")]
struct Cli {
    /// Minuend ("-" for stdin)
    input1: PathBuf,

    /// Subtrahend: deterministic unweighted acceptor
    input2: PathBuf,

    /// Output automaton ("-" or absent for stdout)
    output: Option<PathBuf>,

    /// Trim the result
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    connect: bool,

    #[command(flatten)]
    common: CommonArgs,
}

struct Difference<'a> {
    first: &'a [u8],
    second: &'a [u8],
    output: Option<&'a Path>,
    opts: DifferenceOptions,
}

impl WeightVisitor for Difference<'_> {
    type Output = ();

    fn visit<W: CliWeight>(self) -> Result<(), FstError> {
        let policy = self.opts.policy;
        let a = wfstkit_cli::load_fst::<W>(self.first, policy)?;
        let b = wfstkit_cli::load_fst::<W>(self.second, policy)?;
        let result = difference(&a, &b, &self.opts)?;
        wfstkit_cli::store_fst(&result, self.output, policy)
    }
}

fn main() {
    let cli = Cli::parse();
    wfstkit_cli::run(&cli.common, |policy| {
        let first = wfstkit_cli::read_input(Some(cli.input1.as_path()), policy)?;
        let second = wfstkit_cli::read_input(Some(cli.input2.as_path()), policy)?;
        wfstkit_cli::dispatch(
            &first,
            policy,
            Difference {
                first: &first,
                second: &second,
                output: cli.output.as_deref(),
                opts: DifferenceOptions {
                    connect: cli.connect,
                    policy,
                },
            },
        )
    });
}
