// fst-info: Print a summary of an automaton.
//
// Usage:
//   fst-info [--json] [OPTIONS] [IN]

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use wfstkit_cli::{CliWeight, CommonArgs, WeightVisitor};
use wfstkit_core::ErrorPolicy;
use wfstkit_fst::{FstError, FstInfo};

#[derive(Parser)]
#[command(name = "fst-info", version)]
#[command(about = "Print a summary of an automaton")]
struct Cli {
    /// Input automaton ("-" or absent for stdin)
    input: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    common: CommonArgs,
}

struct Info<'a> {
    bytes: &'a [u8],
    policy: ErrorPolicy,
}

impl WeightVisitor for Info<'_> {
    type Output = FstInfo;

    fn visit<W: CliWeight>(self) -> Result<FstInfo, FstError> {
        let fst = wfstkit_cli::load_fst::<W>(self.bytes, self.policy)?;
        Ok(FstInfo::new(&fst))
    }
}

fn write_info(info: &FstInfo, json: bool) -> Result<(), FstError> {
    let mut out = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, info).map_err(io::Error::from)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{info}")?;
    }
    out.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    wfstkit_cli::run(&cli.common, |policy| {
        let bytes = wfstkit_cli::read_input(cli.input.as_deref(), policy)?;
        let info = wfstkit_cli::dispatch(
            &bytes,
            policy,
            Info {
                bytes: &bytes,
                policy,
            },
        )?;
        write_info(&info, cli.json).map_err(|e| policy.raise(e))
    });
}
