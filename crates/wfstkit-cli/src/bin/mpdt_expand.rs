// mpdt-expand: Expand a multi-stack pushdown transducer into an automaton.
//
// The parenthesis file lists one `open close stack` triple per line. Open
// labels push onto their stack, close labels pop a matching open. A state of
// the result is final only when every stack is empty. The combined stack
// depth is bounded; --on-stack-overflow chooses whether a push past the
// bound drops that path or fails the run.
//
// Usage:
//   mpdt-expand --mpdt-parentheses FILE --max-stack-depth N
//               --on-stack-overflow reject|abort [OPTIONS] [IN] [OUT]

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use wfstkit_cli::{CliWeight, CommonArgs, WeightVisitor};
use wfstkit_fst::text::read_label_triples;
use wfstkit_fst::{
    FstError, MPdtExpandOptions, OnStackOverflow, ParenAssignment, StackBound, mpdt_expand,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Overflow {
    /// Drop the path that would overflow
    Reject,
    /// Fail the expansion
    Abort,
}

impl From<Overflow> for OnStackOverflow {
    fn from(value: Overflow) -> Self {
        match value {
            Overflow::Reject => OnStackOverflow::RejectPath,
            Overflow::Abort => OnStackOverflow::Abort,
        }
    }
}

#[derive(Parser)]
#[command(name = "mpdt-expand", version)]
#[command(about = "Expand a bounded multi-stack pushdown transducer")]
struct Cli {
    /// Input automaton ("-" or absent for stdin)
    input: Option<PathBuf>,

    /// Output automaton ("-" or absent for stdout)
    output: Option<PathBuf>,

    /// Parenthesis triples `open close stack`, one per line
    #[arg(long, value_name = "FILE")]
    mpdt_parentheses: PathBuf,

    /// Bound on the combined depth of all stacks
    #[arg(long, value_name = "N")]
    max_stack_depth: usize,

    /// What to do when a push would exceed the bound
    #[arg(long, value_name = "POLICY")]
    on_stack_overflow: Overflow,

    /// Keep parenthesis labels on the result's arcs
    #[arg(long)]
    keep_parentheses: bool,

    /// Trim the result
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    connect: bool,

    #[command(flatten)]
    common: CommonArgs,
}

struct Expand<'a> {
    bytes: &'a [u8],
    output: Option<&'a Path>,
    parens: &'a ParenAssignment,
    opts: MPdtExpandOptions,
}

impl WeightVisitor for Expand<'_> {
    type Output = ();

    fn visit<W: CliWeight>(self) -> Result<(), FstError> {
        let policy = self.opts.policy;
        let fst = wfstkit_cli::load_fst::<W>(self.bytes, policy)?;
        let result = mpdt_expand(&fst, self.parens, &self.opts)?;
        wfstkit_cli::store_fst(&result, self.output, policy)
    }
}

fn main() {
    let cli = Cli::parse();
    wfstkit_cli::run(&cli.common, |policy| {
        let parens_path = cli.mpdt_parentheses.as_path();
        let reader = wfstkit_cli::open_text(Some(parens_path), policy)?;
        let name = wfstkit_cli::display_name(Some(parens_path));
        let (pairs, stacks) = read_label_triples(reader, &name).map_err(|e| policy.raise(e))?;
        let parens = ParenAssignment::new(&pairs, &stacks).map_err(|e| policy.raise(e))?;
        log::info!(
            "{} parenthesis pairs on {} stacks",
            parens.len(),
            parens.num_stacks()
        );

        let mut opts = MPdtExpandOptions::new(StackBound {
            max_depth: cli.max_stack_depth,
            on_exceed: cli.on_stack_overflow.into(),
        });
        opts.connect = cli.connect;
        opts.keep_parentheses = cli.keep_parentheses;
        opts.policy = policy;

        let bytes = wfstkit_cli::read_input(cli.input.as_deref(), policy)?;
        wfstkit_cli::dispatch(
            &bytes,
            policy,
            Expand {
                bytes: &bytes,
                output: cli.output.as_deref(),
                parens: &parens,
                opts,
            },
        )
    });
}
