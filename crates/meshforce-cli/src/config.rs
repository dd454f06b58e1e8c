use crate::cli::{EvaluateArgs, FlipArgs};
use crate::error::{CliError, Result};
use meshforce::core::forcefield::params::ParamTable;
use meshforce::core::models::topology::MeshTopology;
use meshforce::engine::config::{
    Backend, EngineConfig, EngineConfigBuilder, FlipConfig, FlipConfigBuilder, TunerConfig,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const DEFAULT_STEPS: u64 = 1;
const DEFAULT_SWEEPS: usize = 10;
const DEFAULT_TEMPERATURE: f64 = 1.0;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialTunerConfig {
    enabled: Option<bool>,
    warmup_calls: Option<u64>,
    samples_per_candidate: Option<usize>,
    period: Option<u64>,
    candidates: Option<Vec<usize>>,
}

impl PartialTunerConfig {
    fn merge(self) -> TunerConfig {
        let defaults = TunerConfig::default();
        TunerConfig {
            enabled: self.enabled.unwrap_or(defaults.enabled),
            warmup_calls: self.warmup_calls.unwrap_or(defaults.warmup_calls),
            samples_per_candidate: self
                .samples_per_candidate
                .unwrap_or(defaults.samples_per_candidate),
            period: self.period.unwrap_or(defaults.period),
            candidates: self.candidates.unwrap_or(defaults.candidates),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEngineConfig {
    backend: Option<String>,
    compute_virial: Option<bool>,
    tuner: Option<PartialTunerConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEvaluateConfig {
    steps: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialFlipConfig {
    temperature: Option<f64>,
    sweeps: Option<usize>,
    seed: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ParamOverride {
    pub k: f64,
    pub a_mesh: f64,
}

/// Run configuration as read from a TOML file; every field is optional and is merged
/// with command-line overrides and built-in defaults.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    engine: Option<PartialEngineConfig>,
    evaluate: Option<PartialEvaluateConfig>,
    flip: Option<PartialFlipConfig>,
    /// Per-type parameters keyed by triangle type name. They replace the values stored
    /// in the mesh file.
    #[serde(default)]
    params: BTreeMap<String, ParamOverride>,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the file when one was given, otherwise starts from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn engine_config(&mut self, backend: Option<Backend>, no_virial: bool) -> Result<EngineConfig> {
        let engine = self.engine.take().unwrap_or_default();

        let backend = match (backend, engine.backend) {
            (Some(backend), _) => backend,
            (None, Some(name)) => name.parse::<Backend>()?,
            (None, None) => Backend::default(),
        };
        let compute_virial = !no_virial && engine.compute_virial.unwrap_or(true);
        let tuner = engine.tuner.unwrap_or_default().merge();

        Ok(EngineConfigBuilder::new()
            .backend(backend)
            .compute_virial(compute_virial)
            .tuner(tuner)
            .build()?)
    }

    pub fn merge_evaluate(mut self, args: &EvaluateArgs) -> Result<(EngineConfig, u64)> {
        let engine = self.engine_config(args.backend, args.no_virial)?;
        let steps = args
            .steps
            .or(self.evaluate.and_then(|e| e.steps))
            .unwrap_or(DEFAULT_STEPS);
        if steps == 0 {
            return Err(CliError::Config("`evaluate.steps` must be at least 1.".to_string()));
        }
        Ok((engine, steps))
    }

    /// Flip runs always use the sequential engine and skip virials; only the oracle and
    /// the before/after evaluations are needed.
    pub fn merge_flip(mut self, args: &FlipArgs) -> Result<(EngineConfig, FlipConfig)> {
        let engine = EngineConfig {
            backend: Backend::Reference,
            compute_virial: false,
            ..self.engine_config(None, true)?
        };

        let file = self.flip.take().unwrap_or_default();
        let mut builder = FlipConfigBuilder::new()
            .temperature(
                args.temperature
                    .or(file.temperature)
                    .unwrap_or(DEFAULT_TEMPERATURE),
            )
            .sweeps(args.sweeps.or(file.sweeps).unwrap_or(DEFAULT_SWEEPS));
        if let Some(seed) = args.seed.or(file.seed) {
            builder = builder.seed(seed);
        }
        Ok((engine, builder.build()?))
    }

    /// Writes the `[params]` overrides into `table`, resolving type names against the
    /// mesh.
    pub fn apply_params(&self, topology: &MeshTopology, table: &mut ParamTable) -> Result<()> {
        for (name, p) in &self.params {
            let type_id = topology.type_id(name).ok_or_else(|| {
                CliError::Config(format!(
                    "`params.{name}` names a triangle type that is not in the mesh."
                ))
            })?;
            table
                .set(type_id, p.k, p.a_mesh)
                .map_err(|e| CliError::Config(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshforce::core::models::ids::TriangleTypeId;
    use meshforce::core::models::topology::Triangle;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn evaluate_args() -> EvaluateArgs {
        EvaluateArgs {
            mesh: PathBuf::from("mesh.toml"),
            config: None,
            backend: None,
            steps: None,
            no_virial: false,
        }
    }

    fn flip_args() -> FlipArgs {
        FlipArgs {
            mesh: PathBuf::from("mesh.toml"),
            config: None,
            output: None,
            sweeps: None,
            temperature: None,
            seed: None,
        }
    }

    #[test]
    fn full_file_is_parsed_and_merged() {
        let file = write_config(
            r#"
[engine]
backend = "reference"
compute-virial = false

[engine.tuner]
enabled = true
warmup-calls = 3
samples-per-candidate = 2
period = 100
candidates = [64, 128]

[evaluate]
steps = 4

[flip]
temperature = 0.5
sweeps = 7
seed = 11

[params.membrane]
k = 2.0
a-mesh = 9.0
"#,
        );
        let config = PartialRunConfig::from_file(file.path()).unwrap();
        let (engine, steps) = config.merge_evaluate(&evaluate_args()).unwrap();

        assert_eq!(engine.backend, Backend::Reference);
        assert!(!engine.compute_virial);
        assert_eq!(engine.tuner.warmup_calls, 3);
        assert_eq!(engine.tuner.samples_per_candidate, 2);
        assert_eq!(engine.tuner.period, 100);
        assert_eq!(engine.tuner.candidates, vec![64, 128]);
        assert_eq!(steps, 4);

        let config = PartialRunConfig::from_file(file.path()).unwrap();
        let (_, flip) = config.merge_flip(&flip_args()).unwrap();
        assert_eq!(flip.temperature, 0.5);
        assert_eq!(flip.sweeps, 7);
        assert_eq!(flip.seed, Some(11));
    }

    #[test]
    fn cli_arguments_override_the_file() {
        let file = write_config("[engine]\nbackend = \"reference\"\n[evaluate]\nsteps = 4\n");
        let config = PartialRunConfig::from_file(file.path()).unwrap();
        let args = EvaluateArgs {
            backend: Some(Backend::Accelerated),
            steps: Some(9),
            no_virial: true,
            ..evaluate_args()
        };
        let (engine, steps) = config.merge_evaluate(&args).unwrap();
        assert_eq!(engine.backend, Backend::Accelerated);
        assert!(!engine.compute_virial);
        assert_eq!(steps, 9);
    }

    #[test]
    fn missing_file_sections_fall_back_to_defaults() {
        let (engine, steps) = PartialRunConfig::default()
            .merge_evaluate(&evaluate_args())
            .unwrap();
        assert_eq!(engine.backend, Backend::Accelerated);
        assert!(engine.compute_virial);
        assert_eq!(engine.tuner, TunerConfig::default());
        assert_eq!(steps, 1);

        let (engine, flip) = PartialRunConfig::default().merge_flip(&flip_args()).unwrap();
        assert_eq!(engine.backend, Backend::Reference);
        assert_eq!(flip.temperature, 1.0);
        assert_eq!(flip.sweeps, 10);
        assert_eq!(flip.seed, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config("[engine]\nthreads = 4\n");
        let result = PartialRunConfig::from_file(file.path());
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn unknown_backend_name_is_a_config_error() {
        let file = write_config("[engine]\nbackend = \"gpu\"\n");
        let config = PartialRunConfig::from_file(file.path()).unwrap();
        let result = config.merge_evaluate(&evaluate_args());
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn empty_tuner_candidates_are_rejected() {
        let file = write_config("[engine.tuner]\ncandidates = []\n");
        let config = PartialRunConfig::from_file(file.path()).unwrap();
        assert!(matches!(
            config.merge_evaluate(&evaluate_args()),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn non_positive_temperature_is_rejected() {
        let args = FlipArgs {
            temperature: Some(0.0),
            ..flip_args()
        };
        assert!(matches!(
            PartialRunConfig::default().merge_flip(&args),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn param_overrides_resolve_type_names() {
        let file = write_config("[params.stiff]\nk = 3.0\na-mesh = 2.0\n");
        let config = PartialRunConfig::from_file(file.path()).unwrap();
        let topology = MeshTopology::new(
            vec!["soft".into(), "stiff".into()],
            vec![Triangle::new(0, 1, 2, 0), Triangle::new(0, 2, 3, 1)],
        )
        .unwrap();
        let mut table = ParamTable::new(2);
        table.set(TriangleTypeId(1), 1.0, 1.0).unwrap();

        config.apply_params(&topology, &mut table).unwrap();

        let stiff = table.get(TriangleTypeId(1)).unwrap();
        assert_eq!((stiff.k, stiff.a_mesh), (3.0, 2.0));
        assert!(!table.is_set(TriangleTypeId(0)));
    }

    #[test]
    fn param_override_for_unknown_type_is_rejected() {
        let file = write_config("[params.missing]\nk = 3.0\na-mesh = 2.0\n");
        let config = PartialRunConfig::from_file(file.path()).unwrap();
        let topology =
            MeshTopology::new(vec!["soft".into()], vec![Triangle::new(0, 1, 2, 0)]).unwrap();
        let mut table = ParamTable::new(1);
        assert!(matches!(
            config.apply_params(&topology, &mut table),
            Err(CliError::Config(_))
        ));
    }
}
