use crate::core::io::ct::CtRecord;
use crate::core::io::dbn::DbnRecord;
use crate::core::models::pair::PairSet;
use crate::core::models::sequence::Sequence;
use crate::core::models::structure::BracketPolicy;
use crate::engine::error::EngineError;
use crate::engine::folding::FoldingEngine;
use crate::engine::progress::{ProgressReporter, Stage};
use tracing::{info, instrument};

/// A reference structure produced by a folding engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldedReference {
    pub record: DbnRecord,
    pub pairs: PairSet,
}

impl FoldedReference {
    pub fn to_ct(&self, label: impl Into<String>) -> CtRecord {
        CtRecord {
            label: label.into(),
            energy: self.record.energy,
            sequence: self.record.sequence.clone(),
            pairs: self.pairs.clone(),
        }
    }
}

#[instrument(skip_all, name = "fold_workflow", fields(len = sequence.len()))]
pub fn run(
    sequence: &Sequence,
    engine: &dyn FoldingEngine,
    reporter: &ProgressReporter,
) -> Result<FoldedReference, EngineError> {
    reporter.stage(Stage::Folding, || {
        let result = engine.fold(sequence)?;
        let pairs = result.structure.pairs(BracketPolicy::Strict)?;
        let record = DbnRecord::new(sequence.clone(), result.structure)?.with_energy(result.energy);
        info!(
            "Folded reference with {} base pair(s) at {:.2} kcal/mol.",
            pairs.len(),
            result.energy
        );
        Ok(FoldedReference { record, pairs })
    })
}
