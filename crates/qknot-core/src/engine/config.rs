use crate::core::scoring::PairScoreTable;
use thiserror::Error;

pub const DEFAULT_MIN_LOOP_LEN: usize = 3;
pub const DEFAULT_FILTER_FRACTION: f64 = 0.15;
pub const DEFAULT_CONFLICT_PENALTY: f64 = 6.0;
pub const DEFAULT_STACKING_BONUS: f64 = -1.5;

/// A candidate can stack with at most two neighbours: the pair directly
/// inside it and the pair directly enclosing it.
const MAX_STACKING_PARTNERS: f64 = 2.0;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Filter fraction must lie in (0, 1], got {0}")]
    FractionOutOfRange(f64),

    #[error("Conflict penalty must be a positive finite number, got {0}")]
    InvalidPenalty(f64),

    #[error("Stacking bonus must be a non-positive finite number, got {0}")]
    InvalidStackingBonus(f64),

    #[error(
        "Conflict penalty {penalty} does not dominate the favorable terms; it must exceed {required}"
    )]
    PenaltyNotDominating { penalty: f64, required: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// Pairs must satisfy `j - i > min_loop_len`.
    pub min_loop_len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Fraction of the strongest-scoring candidates kept, in (0, 1].
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionConfig {
    pub conflict_penalty: f64,
    pub stacking_bonus: f64,
}

impl InteractionConfig {
    /// Bound the conflict penalty must strictly exceed so that adding a
    /// conflicting pair to any selection always raises the total energy.
    ///
    /// A newly selected candidate contributes at most `max|bias|` from its
    /// diagonal plus two stacking bonuses, so the penalty of a single conflict
    /// has to outweigh both.
    pub fn required_penalty(&self, scoring: &PairScoreTable) -> f64 {
        scoring.max_magnitude() + MAX_STACKING_PARTNERS * self.stacking_bonus.abs()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractionConfig {
    /// Drop pairs that reuse a position, keeping the most favorable ones.
    pub resolve_conflicts: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub catalog: CatalogConfig,
    pub scoring: PairScoreTable,
    pub filter: FilterConfig,
    pub interaction: InteractionConfig,
    pub extraction: ExtractionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                min_loop_len: DEFAULT_MIN_LOOP_LEN,
            },
            scoring: PairScoreTable::default(),
            filter: FilterConfig {
                fraction: DEFAULT_FILTER_FRACTION,
            },
            interaction: InteractionConfig {
                conflict_penalty: DEFAULT_CONFLICT_PENALTY,
                stacking_bonus: DEFAULT_STACKING_BONUS,
            },
            extraction: ExtractionConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fraction = self.filter.fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::FractionOutOfRange(fraction));
        }

        let penalty = self.interaction.conflict_penalty;
        if !penalty.is_finite() || penalty <= 0.0 {
            return Err(ConfigError::InvalidPenalty(penalty));
        }
        let bonus = self.interaction.stacking_bonus;
        if !bonus.is_finite() || bonus > 0.0 {
            return Err(ConfigError::InvalidStackingBonus(bonus));
        }

        let required = self.interaction.required_penalty(&self.scoring);
        if penalty <= required {
            return Err(ConfigError::PenaltyNotDominating { penalty, required });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    min_loop_len: Option<usize>,
    scoring: Option<PairScoreTable>,
    filter_fraction: Option<f64>,
    conflict_penalty: Option<f64>,
    stacking_bonus: Option<f64>,
    resolve_conflicts: Option<bool>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_loop_len(mut self, len: usize) -> Self {
        self.min_loop_len = Some(len);
        self
    }
    pub fn scoring(mut self, table: PairScoreTable) -> Self {
        self.scoring = Some(table);
        self
    }
    pub fn filter_fraction(mut self, fraction: f64) -> Self {
        self.filter_fraction = Some(fraction);
        self
    }
    pub fn conflict_penalty(mut self, penalty: f64) -> Self {
        self.conflict_penalty = Some(penalty);
        self
    }
    pub fn stacking_bonus(mut self, bonus: f64) -> Self {
        self.stacking_bonus = Some(bonus);
        self
    }
    pub fn resolve_conflicts(mut self, resolve: bool) -> Self {
        self.resolve_conflicts = Some(resolve);
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let config = PipelineConfig {
            catalog: CatalogConfig {
                min_loop_len: self
                    .min_loop_len
                    .ok_or(ConfigError::MissingParameter("min_loop_len"))?,
            },
            scoring: self
                .scoring
                .ok_or(ConfigError::MissingParameter("scoring"))?,
            filter: FilterConfig {
                fraction: self
                    .filter_fraction
                    .ok_or(ConfigError::MissingParameter("filter_fraction"))?,
            },
            interaction: InteractionConfig {
                conflict_penalty: self
                    .conflict_penalty
                    .ok_or(ConfigError::MissingParameter("conflict_penalty"))?,
                stacking_bonus: self
                    .stacking_bonus
                    .ok_or(ConfigError::MissingParameter("stacking_bonus"))?,
            },
            extraction: ExtractionConfig {
                resolve_conflicts: self
                    .resolve_conflicts
                    .ok_or(ConfigError::MissingParameter("resolve_conflicts"))?,
            },
        };
        config.validate()?;
        Ok(config)
    }
}
