use super::{label_for, resolve_format};
use crate::cli::FoldArgs;
use crate::config::defaults::DefaultsConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use qknot::{
    core::io::{
        self,
        ct::CtFile,
        dbn::DbnFile,
        traits::StructureFile,
    },
    engine::{error::EngineError, folding::RnaFold, progress::ProgressReporter},
    workflows,
};
use std::time::Duration;
use tracing::info;

pub async fn run(args: FoldArgs) -> Result<()> {
    let format = resolve_format(&args.input, args.format);
    info!("Loading {} sequence from {:?}", format, &args.input);
    let sequence =
        io::load_sequence(&args.input, format).map_err(|e| CliError::file(&args.input, e))?;
    let label = label_for(&args.input);

    let timeout_secs = args
        .timeout
        .unwrap_or(DefaultsConfig::default().fold_timeout_secs);
    let engine = RnaFold::new()
        .with_program(args.rnafold.clone())
        .with_timeout(Duration::from_secs(timeout_secs));

    println!("Folding '{}' ({} nt) with RNAfold...", label, sequence.len());
    let progress_handler = CliProgressHandler::new();
    let fold_task = tokio::task::spawn_blocking(move || {
        let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
        workflows::fold::run(&sequence, &engine, &reporter)
    });
    let folded = fold_task
        .await
        .map_err(|e| CliError::Other(anyhow::anyhow!("Folding task failed: {}", e)))?
        .map_err(|e| match e {
            EngineError::FoldingTimedOut { .. } => CliError::Timeout(timeout_secs),
            other => CliError::Core(other),
        })?;

    let record = folded.record.clone().with_name(label.clone());
    DbnFile::write_to_path(&record, &args.output)
        .map_err(|e| CliError::file(&args.output, e))?;
    println!(
        "✓ Reference with {} base pair(s) ({:.2} kcal/mol) written to: {}",
        folded.pairs.len(),
        record.energy.unwrap_or_default(),
        args.output.display()
    );

    if let Some(ct_path) = &args.ct {
        CtFile::write_to_path(&folded.to_ct(label), ct_path)
            .map_err(|e| CliError::file(ct_path, e))?;
        info!("Connectivity table written to {:?}", ct_path);
    }
    Ok(())
}
