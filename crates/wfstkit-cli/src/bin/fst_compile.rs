// fst-compile: Compile an automaton from AT&T text.
//
// Arc lines are `src dst ilabel olabel [weight]`, final-state lines are
// `state [weight]`. The first state mentioned is the start state.
//
// Usage:
//   fst-compile [--weight-type boolean|tropical|log] [OPTIONS] [IN] [OUT]

use std::io::BufRead;
use std::path::{Path, PathBuf};

use clap::Parser;
use wfstkit_cli::{CliWeight, CommonArgs, WeightVisitor};
use wfstkit_core::ErrorPolicy;
use wfstkit_fst::text::compile_fst;
use wfstkit_fst::{Fst, FstError};

#[derive(Parser)]
#[command(name = "fst-compile", version)]
#[command(about = "Compile an automaton from AT&T text")]
struct Cli {
    /// Text automaton ("-" or absent for stdin)
    input: Option<PathBuf>,

    /// Output automaton ("-" or absent for stdout)
    output: Option<PathBuf>,

    /// Weight type of the result
    #[arg(long, default_value = "tropical", value_name = "TYPE")]
    weight_type: String,

    #[command(flatten)]
    common: CommonArgs,
}

struct Compile<'a> {
    reader: Box<dyn BufRead>,
    source_name: String,
    output: Option<&'a Path>,
    policy: ErrorPolicy,
}

impl WeightVisitor for Compile<'_> {
    type Output = ();

    fn visit<W: CliWeight>(self) -> Result<(), FstError> {
        let fst = compile_fst::<W, _>(self.reader, &self.source_name)
            .map_err(|e| self.policy.raise(e))?;
        log::info!(
            "compiled {} states, {} arcs",
            fst.num_states(),
            fst.total_arcs()
        );
        wfstkit_cli::store_fst(&fst, self.output, self.policy)
    }
}

fn main() {
    let cli = Cli::parse();
    wfstkit_cli::run(&cli.common, |policy| {
        let input = cli.input.as_deref();
        let compile = Compile {
            reader: wfstkit_cli::open_text(input, policy)?,
            source_name: wfstkit_cli::display_name(input),
            output: cli.output.as_deref(),
            policy,
        };
        wfstkit_cli::dispatch_named(&cli.weight_type, policy, compile)
    });
}
