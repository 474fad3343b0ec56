/// Pipeline stages reported to front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Catalog,
    Filtering,
    MatrixConstruction,
    Sampling,
    Extraction,
    Folding,
    Evaluation,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Catalog => "Candidate Catalog",
            Stage::Filtering => "Candidate Filtering",
            Stage::MatrixConstruction => "QUBO Construction",
            Stage::Sampling => "Sampling",
            Stage::Extraction => "Structure Extraction",
            Stage::Folding => "Reference Folding",
            Stage::Evaluation => "Evaluation",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Progress {
    StageStart { stage: Stage },
    StageFinish { stage: Stage },

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `f` between a start and finish event for `stage`.
    ///
    /// The finish event is only sent when `f` succeeds.
    pub fn stage<T, E>(&self, stage: Stage, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        self.report(Progress::StageStart { stage });
        let value = f()?;
        self.report(Progress::StageFinish { stage });
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn stage_reports_start_and_finish_on_success() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|p| {
            events.lock().unwrap().push(format!("{:?}", p));
        }));
        let value: Result<u32, ()> = reporter.stage(Stage::Catalog, || Ok(7));
        assert_eq!(value, Ok(7));
        drop(reporter);
        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].contains("StageStart"));
        assert!(events[1].contains("StageFinish"));
    }

    #[test]
    fn stage_skips_finish_on_failure() {
        let count = Mutex::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|_| {
            *count.lock().unwrap() += 1;
        }));
        let result: Result<(), &str> = reporter.stage(Stage::Sampling, || Err("boom"));
        assert!(result.is_err());
        drop(reporter);
        assert_eq!(count.into_inner().unwrap(), 1);
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        ProgressReporter::new().report(Progress::Message("ignored".into()));
    }
}
