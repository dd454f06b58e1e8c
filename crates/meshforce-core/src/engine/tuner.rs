use super::config::{DEFAULT_WORK_GROUP_SIZE, TunerConfig};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunerState {
    /// Timings are discarded while caches and thread pools settle.
    Warmup,
    /// Each candidate is used in turn until it has enough samples.
    Scanning,
    /// The fastest candidate is used until the next re-scan.
    Converged,
}

/// Empirical search for the fastest work-group size of one kernel.
///
/// Each kernel owns its own tuner; the engine brackets every launch with
/// [`Autotuner::begin`] and [`Autotuner::end`]. The chosen parameter only affects how
/// work is split, never what is computed.
#[derive(Debug, Clone)]
pub struct Autotuner {
    name: &'static str,
    config: TunerConfig,
    state: TunerState,
    calls_in_state: u64,
    candidate: usize,
    samples: Vec<Vec<Duration>>,
    best: Option<usize>,
    started: Option<Instant>,
}

impl Autotuner {
    pub fn new(name: &'static str, config: TunerConfig) -> Self {
        let n_candidates = config.candidates.len();
        let state = if config.enabled && n_candidates > 0 {
            if config.warmup_calls > 0 {
                TunerState::Warmup
            } else {
                TunerState::Scanning
            }
        } else {
            TunerState::Converged
        };
        Self {
            name,
            config,
            state,
            calls_in_state: 0,
            candidate: 0,
            samples: vec![Vec::new(); n_candidates],
            best: None,
            started: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> TunerState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.candidates.is_empty()
    }

    /// The work-group size for the next launch. Never blocks.
    pub fn param(&self) -> usize {
        if !self.is_enabled() {
            return DEFAULT_WORK_GROUP_SIZE;
        }
        match self.state {
            TunerState::Warmup => self.fallback(),
            TunerState::Scanning => self.config.candidates[self.candidate],
            TunerState::Converged => self
                .best
                .map_or_else(|| self.fallback(), |i| self.config.candidates[i]),
        }
    }

    fn fallback(&self) -> usize {
        if self.config.candidates.contains(&DEFAULT_WORK_GROUP_SIZE) {
            DEFAULT_WORK_GROUP_SIZE
        } else {
            self.config
                .candidates
                .first()
                .copied()
                .unwrap_or(DEFAULT_WORK_GROUP_SIZE)
        }
    }

    /// Starts timing a launch and returns the parameter to launch with.
    pub fn begin(&mut self) -> usize {
        self.started = Some(Instant::now());
        self.param()
    }

    /// Stops timing the launch started by [`Autotuner::begin`].
    pub fn end(&mut self) {
        if let Some(start) = self.started.take() {
            self.record(start.elapsed());
        }
    }

    /// Feeds one latency measurement for the parameter last returned by
    /// [`Autotuner::param`].
    pub fn record(&mut self, elapsed: Duration) {
        if !self.is_enabled() {
            return;
        }
        self.calls_in_state += 1;

        match self.state {
            TunerState::Warmup => {
                if self.calls_in_state >= self.config.warmup_calls {
                    self.enter_scanning();
                }
            }
            TunerState::Scanning => {
                self.samples[self.candidate].push(elapsed);
                if self.samples[self.candidate].len() >= self.config.samples_per_candidate {
                    self.candidate += 1;
                    if self.candidate == self.config.candidates.len() {
                        self.converge();
                    }
                }
            }
            TunerState::Converged => {
                if self.config.period > 0 && self.calls_in_state >= self.config.period {
                    debug!("Autotuner '{}' re-scanning after {} calls", self.name, self.calls_in_state);
                    self.enter_scanning();
                }
            }
        }
    }

    fn enter_scanning(&mut self) {
        self.state = TunerState::Scanning;
        self.calls_in_state = 0;
        self.candidate = 0;
        for samples in &mut self.samples {
            samples.clear();
        }
    }

    fn converge(&mut self) {
        let best = self
            .samples
            .iter_mut()
            .enumerate()
            .filter_map(|(i, samples)| median(samples).map(|m| (i, m)))
            .min_by_key(|&(_, m)| m)
            .map(|(i, _)| i);

        self.best = best;
        self.state = TunerState::Converged;
        self.calls_in_state = 0;
        info!(
            "Autotuner '{}' converged on work-group size {}",
            self.name,
            self.param()
        );
    }
}

fn median(samples: &mut [Duration]) -> Option<Duration> {
    if samples.is_empty() {
        return None;
    }
    samples.sort_unstable();
    Some(samples[samples.len() / 2])
}
