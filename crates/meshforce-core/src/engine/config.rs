use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Which force engine implementation evaluates the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// Sequential evaluation, one triangle at a time.
    Reference,
    /// Data-parallel evaluation with tuned work partitioning.
    #[default]
    Accelerated,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Reference => write!(f, "reference"),
            Backend::Accelerated => write!(f, "accelerated"),
        }
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reference" | "cpu" => Ok(Backend::Reference),
            "accelerated" | "parallel" => Ok(Backend::Accelerated),
            other => Err(ConfigError::InvalidParameter {
                name: "backend",
                reason: format!("unknown backend '{other}'"),
            }),
        }
    }
}

/// Work-group size used whenever tuning is off or has not produced a choice yet.
pub const DEFAULT_WORK_GROUP_SIZE: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunerConfig {
    pub enabled: bool,
    /// Timed calls discarded before scanning starts.
    pub warmup_calls: u64,
    pub samples_per_candidate: usize,
    /// Calls spent in the converged state before the candidates are scanned again.
    /// Zero disables re-scanning.
    pub period: u64,
    pub candidates: Vec<usize>,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            warmup_calls: 1,
            samples_per_candidate: 5,
            period: 50_000,
            candidates: vec![32, 64, 128, 256, 512, 1024],
        }
    }
}

impl TunerConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.candidates.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "candidates",
                reason: "at least one work-group size is required".to_string(),
            });
        }
        if self.candidates.contains(&0) {
            return Err(ConfigError::InvalidParameter {
                name: "candidates",
                reason: "work-group sizes must be positive".to_string(),
            });
        }
        if self.samples_per_candidate == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "samples_per_candidate",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub backend: Backend,
    /// Accumulate per-particle virials. When off, the virial arrays stay zero.
    pub compute_virial: bool,
    pub tuner: TunerConfig,
}

#[derive(Default)]
pub struct EngineConfigBuilder {
    backend: Option<Backend>,
    compute_virial: Option<bool>,
    tuner: Option<TunerConfig>,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }
    pub fn compute_virial(mut self, enabled: bool) -> Self {
        self.compute_virial = Some(enabled);
        self
    }
    pub fn tuner(mut self, tuner: TunerConfig) -> Self {
        self.tuner = Some(tuner);
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        let tuner = self.tuner.unwrap_or_default();
        tuner.validate()?;
        Ok(EngineConfig {
            backend: self
                .backend
                .ok_or(ConfigError::MissingParameter("backend"))?,
            compute_virial: self.compute_virial.unwrap_or(true),
            tuner,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlipConfig {
    /// Metropolis temperature in energy units.
    pub temperature: f64,
    pub sweeps: usize,
    /// Fixed seed for reproducible runs; drawn from the OS when absent.
    pub seed: Option<u64>,
}

#[derive(Default)]
pub struct FlipConfigBuilder {
    temperature: Option<f64>,
    sweeps: Option<usize>,
    seed: Option<u64>,
}

impl FlipConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
    pub fn sweeps(mut self, sweeps: usize) -> Self {
        self.sweeps = Some(sweeps);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<FlipConfig, ConfigError> {
        let temperature = self
            .temperature
            .ok_or(ConfigError::MissingParameter("temperature"))?;
        if temperature.is_nan() || temperature <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "temperature",
                reason: format!("must be positive, got {temperature}"),
            });
        }
        Ok(FlipConfig {
            temperature,
            sweeps: self.sweeps.ok_or(ConfigError::MissingParameter("sweeps"))?,
            seed: self.seed,
        })
    }
}
