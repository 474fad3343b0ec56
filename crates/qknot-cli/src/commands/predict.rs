use super::{label_for, resolve_format};
use crate::cli::PredictArgs;
use crate::config::PartialQknotConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use crate::utils::solver::{ExternalSolver, load_samples};
use qknot::{
    core::io::{
        self, LoadedStructure,
        ct::{CtFile, CtRecord},
        dbn::{DbnFile, DbnRecord},
        traits::StructureFile,
    },
    core::models::structure::BracketPolicy,
    engine::{
        error::EngineError,
        problem::QuboProblem,
        progress::ProgressReporter,
        sampler::{QuboSampler, SampleSet},
    },
    workflows,
};
use std::time::Duration;
use tracing::{info, warn};

fn select_sampler(
    args: &PredictArgs,
    command: Option<&str>,
    timeout_secs: u64,
    problem: &QuboProblem,
) -> Result<Box<dyn QuboSampler>> {
    if let Some(path) = &args.source.samples {
        info!("Reading precomputed samples from {:?}", path);
        return Ok(Box::new(load_samples(path)?));
    }
    if let Some(command) = args.source.solver_cmd.as_deref().or(command) {
        info!("Using external solver '{}' (timeout {} s).", command, timeout_secs);
        return Ok(Box::new(ExternalSolver::new(
            command,
            Duration::from_secs(timeout_secs),
        )?));
    }
    if problem.is_empty() {
        return Ok(Box::new(SampleSet::default()));
    }
    Err(CliError::Argument(
        "no sample source; pass --samples or --solver-cmd, or set solver.command in the config file"
            .to_string(),
    ))
}

pub async fn run(args: PredictArgs) -> Result<()> {
    let partial_config = PartialQknotConfig::load(args.pipeline.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&args.pipeline)?;
    let num_reads = args.num_reads.unwrap_or(final_config.solver.num_reads);
    let timeout_secs = args.timeout.unwrap_or(final_config.solver.timeout_secs);

    info!("Loading QUBO problem from {:?}", &args.problem);
    let problem =
        QuboProblem::load_json(&args.problem).map_err(|e| CliError::file(&args.problem, e))?;

    let sampler = select_sampler(
        &args,
        final_config.solver.command.as_deref(),
        timeout_secs,
        &problem,
    )?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Predicting structure over {} candidate pairs...",
        problem.len()
    );
    let prediction = tokio::task::block_in_place(|| {
        workflows::predict::run(
            &problem,
            sampler.as_ref(),
            num_reads,
            &final_config.pipeline.extraction,
            &reporter,
        )
    })?;

    let sequence = problem.sequence().clone();
    let structure = prediction.annotated_structure(sequence.len())?;
    let record = DbnRecord::new(sequence.clone(), structure)
        .map_err(EngineError::from)?
        .with_name(label_for(&args.problem));
    DbnFile::write_to_path(&record, &args.output)
        .map_err(|e| CliError::file(&args.output, e))?;
    println!(
        "✓ Predicted {} base pair(s) (QUBO energy {:.3}) written to: {}",
        prediction.pairs.len(),
        prediction.energy,
        args.output.display()
    );

    if prediction.conflicting_positions > 0 {
        println!(
            "Warning: {} position(s) are claimed by more than one pair; use --resolve-conflicts for a valid structure.",
            prediction.conflicting_positions
        );
    }

    let pairs = prediction.pair_set();
    if let Some(ct_path) = &args.ct {
        if !pairs.is_well_formed() {
            return Err(CliError::Argument(
                "the predicted pairs share positions and cannot be written as a CT file; rerun with --resolve-conflicts".to_string(),
            ));
        }
        let ct = CtRecord {
            label: label_for(&args.problem),
            energy: None,
            sequence: sequence.clone(),
            pairs: pairs.clone(),
        };
        CtFile::write_to_path(&ct, ct_path).map_err(|e| CliError::file(ct_path, e))?;
        info!("Connectivity table written to {:?}", ct_path);
    }

    if let Some(reference_path) = &args.reference {
        let format = resolve_format(reference_path, args.reference_format);
        info!("Loading {} reference from {:?}", format, reference_path);
        let reference = io::load_structure(reference_path, format, BracketPolicy::Tolerant)
            .map_err(|e| CliError::file(reference_path, e))?;
        let predicted = LoadedStructure {
            sequence: Some(sequence),
            pairs,
        };
        let evaluation = workflows::evaluate::run(&predicted, &reference, &reporter);
        if evaluation.sequence_mismatch {
            warn!("Reference sequence differs from the predicted sequence.");
        }
        println!("\n{}", evaluation.comparison);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{PipelineArgs, SampleSource};
    use qknot::engine::config::PipelineConfigBuilder;
    use qknot::core::scoring::PairScoreTable;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::{TempDir, tempdir};

    fn write_gcgc_problem(dir: &Path) -> PathBuf {
        let config = PipelineConfigBuilder::new()
            .min_loop_len(0)
            .scoring(PairScoreTable::default())
            .filter_fraction(1.0)
            .conflict_penalty(6.0)
            .stacking_bonus(-1.5)
            .resolve_conflicts(false)
            .build()
            .unwrap();
        let result = workflows::build::run(
            &"GCGC".parse().unwrap(),
            &config,
            &ProgressReporter::new(),
        )
        .unwrap();
        let path = dir.join("gcgc.json");
        result.problem.save_json(&path).unwrap();
        path
    }

    fn predict_args(dir: &TempDir, samples: Option<PathBuf>) -> PredictArgs {
        PredictArgs {
            problem: write_gcgc_problem(dir.path()),
            output: dir.path().join("pred.dbn"),
            ct: None,
            source: SampleSource {
                samples,
                solver_cmd: None,
            },
            num_reads: None,
            timeout: None,
            reference: None,
            reference_format: None,
            pipeline: PipelineArgs::default(),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn samples_file_produces_dot_bracket_and_ct() {
        let dir = tempdir().unwrap();
        // Candidates are (1,2), (1,4), (2,3), (3,4); select the stacked (1,4) and (2,3).
        let samples = dir.path().join("samples.json");
        fs::write(
            &samples,
            r#"{"samples":[{"assignment":[1,0,0,1]},{"assignment":[0,1,1,0]}]}"#,
        )
        .unwrap();

        let mut args = predict_args(&dir, Some(samples));
        let ct_path = dir.path().join("pred.ct");
        args.ct = Some(ct_path.clone());
        run(args).await.unwrap();

        let record = DbnFile::read_from_path(dir.path().join("pred.dbn")).unwrap();
        assert_eq!(record.structure.to_string(), "(())");
        assert_eq!(record.name.as_deref(), Some("gcgc"));
        let ct = CtFile::read_from_path(&ct_path).unwrap();
        assert_eq!(ct.pairs.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn prediction_is_compared_against_reference() {
        let dir = tempdir().unwrap();
        let samples = dir.path().join("samples.json");
        fs::write(&samples, r#"{"samples":[{"assignment":{"1":1,"2":1}}]}"#).unwrap();
        let reference = dir.path().join("ref.dbn");
        fs::write(&reference, "GCGC\n(())\n").unwrap();

        let mut args = predict_args(&dir, Some(samples));
        args.reference = Some(reference);
        assert!(run(args).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_sample_source_is_an_argument_error() {
        let dir = tempdir().unwrap();
        let result = run(predict_args(&dir, None)).await;
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn conflicting_prediction_cannot_be_written_as_ct() {
        let dir = tempdir().unwrap();
        let samples = dir.path().join("samples.json");
        // (1,2) and (1,4) share position 1.
        fs::write(&samples, r#"{"samples":[{"assignment":[1,1,0,0]}]}"#).unwrap();

        let mut args = predict_args(&dir, Some(samples));
        args.ct = Some(dir.path().join("pred.ct"));
        let result = run(args).await;
        assert!(matches!(result, Err(CliError::Argument(_))));
        assert!(dir.path().join("pred.dbn").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolve_flag_yields_well_formed_ct() {
        let dir = tempdir().unwrap();
        let samples = dir.path().join("samples.json");
        fs::write(&samples, r#"{"samples":[{"assignment":[1,1,0,0]}]}"#).unwrap();

        let mut args = predict_args(&dir, Some(samples));
        args.ct = Some(dir.path().join("pred.ct"));
        args.pipeline.conflicts.resolve_conflicts = true;
        run(args).await.unwrap();

        let ct = CtFile::read_from_path(dir.path().join("pred.ct")).unwrap();
        assert_eq!(ct.pairs.len(), 1);
    }
}
