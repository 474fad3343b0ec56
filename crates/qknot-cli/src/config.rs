pub mod defaults;

use crate::cli::{ConflictHandling, PipelineArgs};
use crate::error::{CliError, Result};
use defaults::DefaultsConfig;
use qknot::core::scoring::PairScoreTable;
use qknot::engine::config as core_config;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialCatalogConfig {
    #[serde(rename = "min-loop-len")]
    min_loop_len: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialScoringConfig {
    /// Custom pair score table; relative paths are resolved against the
    /// directory of the config file.
    table: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialFilterConfig {
    fraction: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialInteractionConfig {
    #[serde(rename = "conflict-penalty")]
    conflict_penalty: Option<f64>,
    #[serde(rename = "stacking-bonus")]
    stacking_bonus: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialExtractionConfig {
    #[serde(rename = "resolve-conflicts")]
    resolve_conflicts: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSolverConfig {
    #[serde(rename = "num-reads")]
    num_reads: Option<usize>,
    #[serde(rename = "timeout-secs")]
    timeout_secs: Option<u64>,
    command: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialQknotConfig {
    catalog: Option<PartialCatalogConfig>,
    scoring: Option<PartialScoringConfig>,
    filter: Option<PartialFilterConfig>,
    interaction: Option<PartialInteractionConfig>,
    extraction: Option<PartialExtractionConfig>,
    solver: Option<PartialSolverConfig>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    pub num_reads: usize,
    pub timeout_secs: u64,
    pub command: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub pipeline: core_config::PipelineConfig,
    pub solver: SolverSettings,
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid value for {}: '{}' ({} expected)",
            key,
            value,
            std::any::type_name::<T>()
        ))
    })
}

impl PartialQknotConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::file(path, e))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Loads the file named by `--config`, or starts from an empty config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolves the final configuration.
    ///
    /// Precedence is CLI flag, then `-S key=value`, then the config file,
    /// then the built-in defaults.
    pub fn merge_with_cli(mut self, args: &PipelineArgs) -> Result<ResolvedConfig> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();

        let catalog = self.catalog.take().unwrap_or_default();
        let scoring = self.scoring.take().unwrap_or_default();
        let filter = self.filter.take().unwrap_or_default();
        let interaction = self.interaction.take().unwrap_or_default();
        let extraction = self.extraction.take().unwrap_or_default();
        let solver = self.solver.take().unwrap_or_default();

        let table_path = match (&args.score_table, scoring.table) {
            (Some(cli_path), _) => Some(cli_path.clone()),
            (None, Some(file_path)) => Some(self.resolve_relative(file_path)),
            (None, None) => None,
        };
        let scoring_table = match table_path {
            Some(path) => {
                debug!("Loading pair score table from {:?}", path);
                PairScoreTable::load(&path).map_err(|e| CliError::file(&path, e))?
            }
            None => PairScoreTable::default(),
        };

        let pipeline = core_config::PipelineConfigBuilder::new()
            .min_loop_len(
                args.min_loop_len
                    .or(catalog.min_loop_len)
                    .unwrap_or(defaults.min_loop_len),
            )
            .scoring(scoring_table)
            .filter_fraction(
                args.fraction
                    .or(filter.fraction)
                    .unwrap_or(defaults.filter_fraction),
            )
            .conflict_penalty(
                args.conflict_penalty
                    .or(interaction.conflict_penalty)
                    .unwrap_or(defaults.conflict_penalty),
            )
            .stacking_bonus(
                args.stacking_bonus
                    .or(interaction.stacking_bonus)
                    .unwrap_or(defaults.stacking_bonus),
            )
            .resolve_conflicts(Self::merge_conflict_handling(
                args.conflicts,
                extraction.resolve_conflicts,
                &defaults,
            ))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(ResolvedConfig {
            pipeline,
            solver: SolverSettings {
                num_reads: solver.num_reads.unwrap_or(defaults.num_reads),
                timeout_secs: solver.timeout_secs.unwrap_or(defaults.solver_timeout_secs),
                command: solver.command,
            },
        })
    }

    fn resolve_relative(&self, path: PathBuf) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }

    fn merge_conflict_handling(
        cli_flags: ConflictHandling,
        file_val: Option<bool>,
        defaults: &DefaultsConfig,
    ) -> bool {
        if cli_flags.resolve_conflicts {
            true
        } else if cli_flags.raw {
            false
        } else {
            file_val.unwrap_or(defaults.resolve_conflicts)
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();

            match key {
                "catalog.min-loop-len" => {
                    self.catalog.get_or_insert_with(Default::default).min_loop_len =
                        Some(parse_value(key, value)?);
                }
                "scoring.table" => {
                    self.scoring.get_or_insert_with(Default::default).table =
                        Some(PathBuf::from(value.trim()));
                }
                "filter.fraction" => {
                    self.filter.get_or_insert_with(Default::default).fraction =
                        Some(parse_value(key, value)?);
                }
                "interaction.conflict-penalty" => {
                    self.interaction
                        .get_or_insert_with(Default::default)
                        .conflict_penalty = Some(parse_value(key, value)?);
                }
                "interaction.stacking-bonus" => {
                    self.interaction
                        .get_or_insert_with(Default::default)
                        .stacking_bonus = Some(parse_value(key, value)?);
                }
                "extraction.resolve-conflicts" => {
                    self.extraction
                        .get_or_insert_with(Default::default)
                        .resolve_conflicts = Some(parse_value(key, value)?);
                }
                "solver.num-reads" => {
                    self.solver.get_or_insert_with(Default::default).num_reads =
                        Some(parse_value(key, value)?);
                }
                "solver.timeout-secs" => {
                    self.solver.get_or_insert_with(Default::default).timeout_secs =
                        Some(parse_value(key, value)?);
                }
                "solver.command" => {
                    self.solver.get_or_insert_with(Default::default).command =
                        Some(value.trim().to_string());
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
