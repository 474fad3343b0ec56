use super::resolve_format;
use crate::cli::CompareArgs;
use crate::error::{CliError, Result};
use qknot::{
    core::{
        io::{self, LoadedStructure},
        models::structure::BracketPolicy,
    },
    engine::progress::ProgressReporter,
    workflows,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

fn load(path: &Path, explicit: Option<io::Format>, policy: BracketPolicy) -> Result<LoadedStructure> {
    let format = resolve_format(path, explicit);
    info!("Loading {} structure from {:?}", format, path);
    io::load_structure(path, format, policy).map_err(|e| CliError::file(path, e))
}

pub async fn run(args: CompareArgs) -> Result<()> {
    let policy = if args.strict {
        BracketPolicy::Strict
    } else {
        BracketPolicy::Tolerant
    };
    let predicted = load(&args.predicted, args.predicted_format, policy)?;
    let reference = load(&args.reference, args.reference_format, policy)?;

    let evaluation = workflows::evaluate::run(&predicted, &reference, &ProgressReporter::new());
    if evaluation.sequence_mismatch {
        println!("Warning: the predicted and reference sequences differ.");
    }

    if args.json {
        let json = serde_json::to_string_pretty(&evaluation.comparison.metrics())
            .map_err(|e| CliError::Other(e.into()))?;
        println!("{}", json);
    } else {
        println!("{}", evaluation.comparison);
    }

    if let Some(report_path) = &args.report {
        let file = File::create(report_path)?;
        evaluation
            .comparison
            .write_csv(BufWriter::new(file))
            .map_err(|e| CliError::file(report_path, e))?;
        info!("Pair report written to {:?}", report_path);
    }
    Ok(())
}
