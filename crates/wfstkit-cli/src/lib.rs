// wfstkit-cli: shared utilities for CLI tools.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::process;
use std::str::FromStr;

use clap::{ArgAction, Args};
use wfstkit_core::{
    BooleanWeight, Codec, ErrorPolicy, LogWeight, ParseWeightError, Semiring, TropicalWeight,
};
use wfstkit_fst::{FstError, FstHeader, VectorFst, read_fst, write_fst};

/// Flags accepted by every tool.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Terminate at the first error instead of reporting it
    #[arg(long)]
    pub error_fatal: bool,
}

impl CommonArgs {
    pub fn policy(&self) -> ErrorPolicy {
        ErrorPolicy::from_fatal_flag(self.error_fatal)
    }
}

/// Initialise `env_logger`. `RUST_LOG` wins when set; otherwise the level
/// starts at `warn` and each `-v` raises it one step.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Set up logging, run `body` and exit with code 1 if it fails.
///
/// Every fallible step inside `body` surfaces its error through the policy
/// it is handed, so a failure is already logged by the time it gets here.
pub fn run<F>(common: &CommonArgs, body: F)
where
    F: FnOnce(ErrorPolicy) -> Result<(), FstError>,
{
    init_logging(common.verbose);
    if body(common.policy()).is_err() {
        process::exit(1);
    }
}

/// Whether `path` stands for standard input or output.
fn is_std(path: Option<&Path>) -> bool {
    path.is_none_or(|p| p == Path::new("-"))
}

/// Name of `path` for diagnostics.
pub fn display_name(path: Option<&Path>) -> String {
    match path {
        Some(p) if !is_std(path) => p.display().to_string(),
        _ => "standard input".to_string(),
    }
}

fn with_path(path: &Path, err: io::Error) -> FstError {
    FstError::Io(io::Error::new(
        err.kind(),
        format!("{}: {err}", path.display()),
    ))
}

/// Read all of `path`, or standard input for `-` or no path.
pub fn read_input(path: Option<&Path>, policy: ErrorPolicy) -> Result<Vec<u8>, FstError> {
    let result = match path {
        Some(p) if !is_std(path) => fs::read(p).map_err(|e| with_path(p, e)),
        _ => {
            let mut buf = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .map(|_| buf)
                .map_err(FstError::from)
        }
    };
    result.map_err(|e| policy.raise(e))
}

/// Line reader over `path`, or standard input for `-` or no path.
pub fn open_text(path: Option<&Path>, policy: ErrorPolicy) -> Result<Box<dyn BufRead>, FstError> {
    match path {
        Some(p) if !is_std(path) => File::open(p)
            .map(|f| Box::new(BufReader::new(f)) as Box<dyn BufRead>)
            .map_err(|e| policy.raise(with_path(p, e))),
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

/// Buffered writer to `path`, or standard output for `-` or no path.
pub fn open_output(path: Option<&Path>, policy: ErrorPolicy) -> Result<Box<dyn Write>, FstError> {
    match path {
        Some(p) if !is_std(path) => File::create(p)
            .map(|f| Box::new(BufWriter::new(f)) as Box<dyn Write>)
            .map_err(|e| policy.raise(with_path(p, e))),
        _ => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// A weight the tools can read, write, parse and print.
pub trait CliWeight: Semiring + Codec + FromStr<Err = ParseWeightError> + Display {}

impl<W> CliWeight for W where W: Semiring + Codec + FromStr<Err = ParseWeightError> + Display {}

/// Work that is generic over the weight type of its input.
///
/// The concrete weight is only known once a file header has been read, so
/// tools describe their work as a visitor and let [`dispatch`] pick `W`.
pub trait WeightVisitor {
    type Output;

    fn visit<W: CliWeight>(self) -> Result<Self::Output, FstError>;
}

/// Instantiate `visitor` with the weight named `weight_type`.
pub fn dispatch_named<V: WeightVisitor>(
    weight_type: &str,
    policy: ErrorPolicy,
    visitor: V,
) -> Result<V::Output, FstError> {
    log::debug!("weight type: {weight_type}");
    match weight_type {
        "boolean" => visitor.visit::<BooleanWeight>(),
        "tropical" => visitor.visit::<TropicalWeight>(),
        "log" => visitor.visit::<LogWeight>(),
        other => Err(policy.raise(FstError::UnsupportedWeightType(other.to_string()))),
    }
}

/// Instantiate `visitor` with the weight type recorded in the header at
/// the front of `bytes`.
pub fn dispatch<V: WeightVisitor>(
    bytes: &[u8],
    policy: ErrorPolicy,
    visitor: V,
) -> Result<V::Output, FstError> {
    let header = FstHeader::peek(bytes).map_err(|e| policy.raise(e))?;
    dispatch_named(&header.weight_type, policy, visitor)
}

/// Deserialize an automaton from an in-memory file image.
pub fn load_fst<W: CliWeight>(
    mut bytes: &[u8],
    policy: ErrorPolicy,
) -> Result<VectorFst<W>, FstError> {
    read_fst(&mut bytes, policy)
}

/// Serialize `fst` to `path`, or standard output for `-` or no path.
pub fn store_fst<W: CliWeight>(
    fst: &VectorFst<W>,
    path: Option<&Path>,
    policy: ErrorPolicy,
) -> Result<(), FstError> {
    let mut out = open_output(path, policy)?;
    write_fst(fst, &mut out, policy)
}
