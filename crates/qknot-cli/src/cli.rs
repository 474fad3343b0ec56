use clap::{Args, Parser, Subcommand};
use qknot::core::io::Format;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "QKnot Developers",
    version,
    about = "QKnot CLI - RNA secondary structure prediction, pseudoknots included, as a QUBO over candidate base pairs.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to build the interaction matrix.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a QUBO problem from an RNA sequence and save it as JSON.
    Build(BuildArgs),
    /// Solve a saved QUBO problem and write the predicted structure.
    Predict(PredictArgs),
    /// Fold a sequence with RNAfold to produce a reference structure.
    Fold(FoldArgs),
    /// Compare a predicted structure against a reference (precision, recall, F1).
    Compare(CompareArgs),
}

/// Pipeline settings shared by `build` and `predict`.
#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the minimum hairpin loop length (pairs need j - i > LEN).
    #[arg(long, value_name = "LEN")]
    pub min_loop_len: Option<usize>,

    /// Override the fraction of strongest candidates kept, in (0, 1].
    #[arg(short = 'f', long, value_name = "FLOAT")]
    pub fraction: Option<f64>,

    /// Override the penalty coupling two pairs that share a position.
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub conflict_penalty: Option<f64>,

    /// Override the bonus coupling two stacked pairs (non-positive).
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub stacking_bonus: Option<f64>,

    /// Use a custom pair score table (TOML with `fallback` and `[pairs]`).
    #[arg(long, value_name = "PATH")]
    pub score_table: Option<PathBuf>,

    /// Override conflict resolution of the extracted selection.
    #[command(flatten)]
    pub conflicts: ConflictHandling,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S filter.fraction=0.2
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// A group to handle mutually exclusive flags for conflict resolution.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct ConflictHandling {
    /// Drop selected pairs that reuse a position, keeping the most favorable ones.
    #[arg(long)]
    pub resolve_conflicts: bool,
    /// Keep the raw selection even when pairs share positions.
    #[arg(long)]
    pub raw: bool,
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Input sequence file (FASTA, dot-bracket or CT).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Input format; inferred from the file extension when omitted.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<Format>,

    /// Path for the QUBO problem JSON.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Where samples for a QUBO problem come from. Without either flag the
/// solver command from the config file is used.
#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
pub struct SampleSource {
    /// Read a precomputed sample set (JSON) instead of running a solver.
    #[arg(long, value_name = "PATH")]
    pub samples: Option<PathBuf>,

    /// External solver command; it receives the request JSON on stdin and
    /// must print a sample set JSON on stdout.
    #[arg(long, value_name = "CMD")]
    pub solver_cmd: Option<String>,
}

/// Arguments for the `predict` subcommand.
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// QUBO problem JSON written by `build`.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub problem: PathBuf,

    /// Path for the predicted structure in dot-bracket format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Also write the predicted structure as a connectivity table.
    #[arg(long, value_name = "PATH")]
    pub ct: Option<PathBuf>,

    #[command(flatten)]
    pub source: SampleSource,

    /// Override the number of reads requested from the solver.
    #[arg(short = 'n', long, value_name = "INT")]
    pub num_reads: Option<usize>,

    /// Override the solver timeout in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Compare the prediction against this reference structure.
    #[arg(short, long, value_name = "PATH")]
    pub reference: Option<PathBuf>,

    /// Reference format; inferred from the file extension when omitted.
    #[arg(long, value_name = "FORMAT")]
    pub reference_format: Option<Format>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Arguments for the `fold` subcommand.
#[derive(Args, Debug)]
pub struct FoldArgs {
    /// Input sequence file (FASTA, dot-bracket or CT).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Input format; inferred from the file extension when omitted.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<Format>,

    /// Path for the folded structure in dot-bracket format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Also write the folded structure as a connectivity table.
    #[arg(long, value_name = "PATH")]
    pub ct: Option<PathBuf>,

    /// Path to the RNAfold executable.
    #[arg(long, value_name = "PATH", default_value = "RNAfold")]
    pub rnafold: PathBuf,

    /// Timeout for the folding call in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

/// Arguments for the `compare` subcommand.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Predicted structure (dot-bracket, CT or pair list).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub predicted: PathBuf,

    /// Reference structure (dot-bracket, CT or pair list).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub reference: PathBuf,

    /// Predicted structure format; inferred from the extension when omitted.
    #[arg(long, value_name = "FORMAT")]
    pub predicted_format: Option<Format>,

    /// Reference structure format; inferred from the extension when omitted.
    #[arg(long, value_name = "FORMAT")]
    pub reference_format: Option<Format>,

    /// Reject unmatched brackets in dot-bracket inputs instead of ignoring them.
    #[arg(long)]
    pub strict: bool,

    /// Write one CSV row per classified pair.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Print the metrics as JSON instead of the text summary.
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_accepts_at_most_one_sample_source() {
        let base = ["qknot", "predict", "-p", "p.json", "-o", "out.dbn"];
        assert!(Cli::try_parse_from(base).is_ok());

        let mut both = base.to_vec();
        both.extend(["--samples", "s.json", "--solver-cmd", "solve"]);
        assert!(Cli::try_parse_from(both).is_err());

        let mut one = base.to_vec();
        one.extend(["--samples", "s.json"]);
        assert!(Cli::try_parse_from(one).is_ok());
    }

    #[test]
    fn negative_stacking_bonus_is_accepted() {
        let cli = Cli::try_parse_from([
            "qknot",
            "build",
            "-i",
            "seq.fa",
            "-o",
            "p.json",
            "--stacking-bonus",
            "-2.0",
        ])
        .unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.pipeline.stacking_bonus, Some(-2.0));
    }

    #[test]
    fn format_names_parse_from_arguments() {
        let cli = Cli::try_parse_from([
            "qknot",
            "compare",
            "-p",
            "a.txt",
            "-r",
            "b.txt",
            "--reference-format",
            "ct",
        ])
        .unwrap();
        let Commands::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.reference_format, Some(Format::Ct));
        assert_eq!(args.predicted_format, None);
    }

    #[test]
    fn conflict_flags_are_mutually_exclusive() {
        let result = Cli::try_parse_from([
            "qknot",
            "build",
            "-i",
            "seq.fa",
            "-o",
            "p.json",
            "--resolve-conflicts",
            "--raw",
        ]);
        assert!(result.is_err());
    }
}
