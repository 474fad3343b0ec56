use phf::{Map, phf_map};

pub(super) const DEFAULT_FALLBACK_SCORE: f64 = -0.5;

/// Built-in pair scores keyed by the 5'->3' base identities of the pair.
pub(super) static DEFAULT_PAIR_SCORES: Map<&'static str, f64> = phf_map! {
    "GC" => -2.0,
    "CG" => -2.0,
    "AU" => -1.5,
    "UA" => -1.5,
    "GU" => -1.0,
    "UG" => -1.0,
};
