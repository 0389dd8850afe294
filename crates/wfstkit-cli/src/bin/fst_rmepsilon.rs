// fst-rmepsilon: Remove epsilon transitions.
//
// Every epsilon path is replaced by direct arcs carrying the summed path
// weight. With --reverse the removal runs on the reversed automaton and the
// result is reversed back, which tends to give fewer states for automata
// whose epsilons sit near the final states.
//
// Usage:
//   fst-rmepsilon [--connect=false] [--reverse] [OPTIONS] [IN] [OUT]

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use wfstkit_cli::{CliWeight, CommonArgs, WeightVisitor};
use wfstkit_fst::{FstError, RmEpsilonOptions, rm_epsilon_with};

#[derive(Parser)]
#[command(name = "fst-rmepsilon", version)]
#[command(about = "Remove epsilon transitions")]
struct Cli {
    /// Input automaton ("-" or absent for stdin)
    input: Option<PathBuf>,

    /// Output automaton ("-" or absent for stdout)
    output: Option<PathBuf>,

    /// Trim the result
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    connect: bool,

    /// Remove epsilons on the reversed automaton
    #[arg(long)]
    reverse: bool,

    /// Convergence tolerance for epsilon-closure weights
    #[arg(long, value_name = "DELTA")]
    delta: Option<f32>,

    /// Give up on a state whose closure needs more relaxations than this
    #[arg(long, value_name = "N")]
    relaxation_limit: Option<usize>,

    #[command(flatten)]
    common: CommonArgs,
}

struct RmEpsilon<'a> {
    bytes: &'a [u8],
    output: Option<&'a Path>,
    opts: RmEpsilonOptions,
}

impl WeightVisitor for RmEpsilon<'_> {
    type Output = ();

    fn visit<W: CliWeight>(self) -> Result<(), FstError> {
        let mut fst = wfstkit_cli::load_fst::<W>(self.bytes, self.opts.policy)?;
        rm_epsilon_with(&mut fst, &self.opts)?;
        wfstkit_cli::store_fst(&fst, self.output, self.opts.policy)
    }
}

fn main() {
    let cli = Cli::parse();
    wfstkit_cli::run(&cli.common, |policy| {
        let defaults = RmEpsilonOptions::default();
        let opts = RmEpsilonOptions {
            connect: cli.connect,
            reverse: cli.reverse,
            delta: cli.delta.unwrap_or(defaults.delta),
            relaxation_limit: cli.relaxation_limit,
            policy,
        };
        let bytes = wfstkit_cli::read_input(cli.input.as_deref(), policy)?;
        wfstkit_cli::dispatch(
            &bytes,
            policy,
            RmEpsilon {
                bytes: &bytes,
                output: cli.output.as_deref(),
                opts,
            },
        )
    });
}
