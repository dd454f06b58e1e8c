#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    EvaluationFinished { timestep: u64, total_area: f64 },

    SweepStart { index: usize, total_edges: u64 },
    EdgeAttempted { accepted: bool },
    SweepFinish { accepted: u64 },

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
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn reporter_forwards_events_to_callback() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| seen.lock().push(event)));
        reporter.report(Progress::EdgeAttempted { accepted: true });
        reporter.report(Progress::Message("done".into()));
        drop(reporter);
        assert_eq!(
            seen.into_inner(),
            vec![
                Progress::EdgeAttempted { accepted: true },
                Progress::Message("done".into())
            ]
        );
    }

    #[test]
    fn reporter_without_callback_ignores_events() {
        ProgressReporter::new().report(Progress::SweepFinish { accepted: 0 });
    }
}
