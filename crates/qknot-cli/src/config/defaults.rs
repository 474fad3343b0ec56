use qknot::engine::config::{
    DEFAULT_CONFLICT_PENALTY, DEFAULT_FILTER_FRACTION, DEFAULT_MIN_LOOP_LEN,
    DEFAULT_STACKING_BONUS,
};
use qknot::engine::sampler::DEFAULT_NUM_READS;

pub struct DefaultsConfig {
    pub min_loop_len: usize,
    pub filter_fraction: f64,
    pub conflict_penalty: f64,
    pub stacking_bonus: f64,
    pub resolve_conflicts: bool,
    pub num_reads: usize,
    pub solver_timeout_secs: u64,
    pub fold_timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            min_loop_len: DEFAULT_MIN_LOOP_LEN,
            filter_fraction: DEFAULT_FILTER_FRACTION,
            conflict_penalty: DEFAULT_CONFLICT_PENALTY,
            stacking_bonus: DEFAULT_STACKING_BONUS,
            resolve_conflicts: false,
            num_reads: DEFAULT_NUM_READS,
            solver_timeout_secs: 300,
            fold_timeout_secs: 60,
        }
    }
}
