use super::{label_for, resolve_format};
use crate::cli::BuildArgs;
use crate::config::PartialQknotConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use qknot::{core::io, engine::progress::ProgressReporter, workflows};
use tracing::{info, warn};

pub async fn run(args: BuildArgs) -> Result<()> {
    let partial_config = PartialQknotConfig::load(args.pipeline.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&args.pipeline)?;

    let format = resolve_format(&args.input, args.format);
    info!("Loading {} sequence from {:?}", format, &args.input);
    let sequence =
        io::load_sequence(&args.input, format).map_err(|e| CliError::file(&args.input, e))?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Building QUBO problem for '{}' ({} nt)...",
        label_for(&args.input),
        sequence.len()
    );
    let result = tokio::task::block_in_place(|| {
        workflows::build::run(&sequence, &final_config.pipeline, &reporter)
    })?;

    let summary = result.summary;
    if result.problem.is_empty() {
        warn!("The problem has no variables; prediction will yield the unpaired structure.");
        println!("Warning: no candidate pairs survived filtering.");
    }

    result
        .problem
        .save_json(&args.output)
        .map_err(|e| CliError::file(&args.output, e))?;

    println!(
        "✓ {} of {} candidate pairs kept ({} conflicts, {} stacks), problem written to: {}",
        summary.kept,
        summary.catalog_size,
        summary.interactions.conflicts,
        summary.interactions.stacks,
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PipelineArgs;
    use qknot::engine::problem::QuboProblem;
    use std::fs;
    use tempfile::tempdir;

    fn args(input: std::path::PathBuf, output: std::path::PathBuf) -> BuildArgs {
        BuildArgs {
            input,
            format: None,
            output,
            pipeline: PipelineArgs {
                min_loop_len: Some(0),
                fraction: Some(1.0),
                ..Default::default()
            },
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn build_writes_problem_artifact() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("gcgc.fa");
        let output = dir.path().join("gcgc.json");
        fs::write(&input, ">gcgc\nGCGC\n").unwrap();

        run(args(input, output.clone())).await.unwrap();

        let problem = QuboProblem::load_json(&output).unwrap();
        assert_eq!(problem.len(), 4);
        assert_eq!(problem.sequence().to_string(), "GCGC");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_sequence_names_the_input_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("bad.fa");
        fs::write(&input, ">bad\nGCXGC\n").unwrap();

        let result = run(args(input, dir.path().join("out.json"))).await;
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
