//! Experiment description files.
//!
//! A run is described by one YAML document:
//!
//! ```yaml
//! system:
//!   n_sites: 6
//!   field_direction: z
//! drive:
//!   rabi_freq: 3.14159
//!   detuning: 0.1          # or one value per spin
//!   noise: 0.05
//! blocks:
//!   - elements: [[dd, 0.2], [x, 0.5]]
//!     repetitions: 1
//! program:
//!   mode: periodic
//!   n_steps: 100
//! initial_state: x
//! observables: [x, y, z]
//! output:
//!   data_dir: ./data
//!   file_name: dtc
//! ```
//!
//! Precedence (highest to lowest):
//! 1. Environment variables (`QNV_DATA_DIR`, `QNV_SAVE_EVERY`, `QNV_SEED`)
//! 2. The configuration file
//! 3. Default values

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use qnv_ops::PauliOp;
use qnv_store::{AttrValue, Attributes};
use qnv_system::SystemConfig;
use serde::{Deserialize, Serialize};

use crate::drive::{AcDrive, Detuning, DriveParams, Modulation};
use crate::engine::RunOptions;
use crate::error::ConfigError;
use crate::schedule::{DEFAULT_SEQUENCE_SEED, DriveProgram};
use crate::sequence::{BuildingBlock, RawBlock, blocks_from_raw};

/// Complete description of one experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Spin system.
    pub system: SystemConfig,

    /// Drive parameters.
    #[serde(default)]
    pub drive: DriveConfig,

    /// Building blocks.
    pub blocks: Vec<RawBlock>,

    /// Scheduling policy.
    pub program: ProgramConfig,

    /// Polarization axis of the initial product state.
    #[serde(default = "default_initial_state")]
    pub initial_state: String,

    /// Magnetization axes to measure.
    #[serde(default = "default_observables")]
    pub observables: Vec<String>,

    /// Where and how checkpoints are written.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Serialized drive parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Rabi frequency in units of `J`.
    #[serde(default)]
    pub rabi_freq: f64,

    /// Static detuning, scalar or per spin.
    #[serde(default)]
    pub detuning: Option<Detuning>,

    /// Continuous drive.
    #[serde(default)]
    pub ac: Option<AcConfig>,

    /// Relative duration noise.
    #[serde(default)]
    pub noise: Option<f64>,
}

/// Built-in continuous drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AcConfig {
    /// `amplitude · sin(ω t)`.
    Sine {
        /// Amplitude in units of `J`.
        amplitude: f64,
        /// Angular frequency.
        angular_frequency: f64,
    },
    /// `amplitude · cos(ω t)`.
    Cosine {
        /// Amplitude in units of `J`.
        amplitude: f64,
        /// Angular frequency.
        angular_frequency: f64,
    },
}

impl AcConfig {
    /// Materialize the drive.
    pub fn to_drive(&self) -> AcDrive {
        match *self {
            AcConfig::Sine {
                amplitude,
                angular_frequency,
            } => AcDrive::sine(amplitude, angular_frequency),
            AcConfig::Cosine {
                amplitude,
                angular_frequency,
            } => AcDrive::cosine(amplitude, angular_frequency),
        }
    }
}

/// Built-in duration modulations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModulationConfig {
    /// `nominal · (1 + rate · step)`.
    LinearRamp {
        /// Growth per step.
        rate: f64,
    },
    /// `nominal · (1 + amplitude · sin(2π · step / period))`.
    Sinusoidal {
        /// Relative amplitude.
        amplitude: f64,
        /// Period in steps.
        period: f64,
    },
}

impl ModulationConfig {
    /// Materialize the modulation.
    pub fn to_modulation(&self) -> Modulation {
        match *self {
            ModulationConfig::LinearRamp { rate } => Modulation::linear_ramp(rate),
            ModulationConfig::Sinusoidal { amplitude, period } => {
                Modulation::sinusoidal(amplitude, period)
            }
        }
    }
}

/// Serialized scheduling policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProgramConfig {
    /// All blocks in order, every step.
    Periodic {
        /// Outer iterations.
        n_steps: usize,
    },
    /// One random block per step.
    Random {
        /// Outer iterations.
        n_steps: usize,
        /// Seed of the block draws.
        #[serde(default = "default_sequence_seed")]
        sequence_seed: u64,
    },
    /// Explicit block per step.
    Sequential {
        /// Block indices.
        indices: Vec<usize>,
    },
    /// Periodic with per-block modulated durations.
    TimeDependent {
        /// Outer iterations.
        n_steps: usize,
        /// One entry per block, `null` for none.
        modulations: Vec<Option<ModulationConfig>>,
    },
}

impl ProgramConfig {
    /// Materialize the program.
    pub fn to_program(&self) -> DriveProgram {
        match self {
            ProgramConfig::Periodic { n_steps } => DriveProgram::Periodic { n_steps: *n_steps },
            ProgramConfig::Random {
                n_steps,
                sequence_seed,
            } => DriveProgram::Random {
                n_steps: *n_steps,
                sequence_seed: *sequence_seed,
            },
            ProgramConfig::Sequential { indices } => DriveProgram::Sequential {
                indices: indices.clone(),
            },
            ProgramConfig::TimeDependent {
                n_steps,
                modulations,
            } => DriveProgram::TimeDependent {
                n_steps: *n_steps,
                modulations: modulations
                    .iter()
                    .map(|m| m.as_ref().map(ModulationConfig::to_modulation))
                    .collect(),
            },
        }
    }
}

/// A caller-supplied metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Text.
    Text(String),
    /// List of floats.
    FloatList(Vec<f64>),
}

impl From<&ExtraValue> for AttrValue {
    fn from(v: &ExtraValue) -> Self {
        match v {
            ExtraValue::Int(i) => AttrValue::Int(*i),
            ExtraValue::Float(f) => AttrValue::Float(*f),
            ExtraValue::Text(s) => AttrValue::Text(s.clone()),
            ExtraValue::FloatList(vs) => AttrValue::FloatList(vs.clone()),
        }
    }
}

/// Checkpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory holding checkpoint containers.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Container name without extension.
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Requested group.
    #[serde(default = "default_group")]
    pub group: String,

    /// Checkpoint interval in outer iterations.
    #[serde(default = "default_save_every")]
    pub save_every: usize,

    /// Seed of the noise draws.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Extra attributes stored with every checkpoint.
    #[serde(default)]
    pub extra: BTreeMap<String, ExtraValue>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_name: default_file_name(),
            group: default_group(),
            save_every: default_save_every(),
            seed: default_seed(),
            extra: BTreeMap::new(),
        }
    }
}

impl OutputConfig {
    /// Path of the checkpoint container.
    pub fn container_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.file_name))
    }
}

fn default_initial_state() -> String {
    "z".to_string()
}

fn default_observables() -> Vec<String> {
    vec!["x".into(), "y".into(), "z".into()]
}

fn default_sequence_seed() -> u64 {
    DEFAULT_SEQUENCE_SEED
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_file_name() -> String {
    "qnv".to_string()
}

fn default_group() -> String {
    RunOptions::default().group
}

fn default_save_every() -> usize {
    RunOptions::default().save_every
}

fn default_seed() -> u64 {
    RunOptions::default().seed
}

fn parse_axis(name: &'static str, s: &str) -> Result<PauliOp, ConfigError> {
    PauliOp::from_str(s)
        .map_err(|e| ConfigError::Validation(format!("{name}: {e}")))
}

impl RunConfig {
    /// Load, apply environment overrides, and validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse, apply environment overrides, and validate.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: RunConfig = serde_yaml_ng::from_str(yaml)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `QNV_DATA_DIR`, `QNV_SAVE_EVERY` and `QNV_SEED`.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = lookup("QNV_DATA_DIR") {
            self.output.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("QNV_SAVE_EVERY") {
            self.output.save_every = value.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Env {
                    name: "QNV_SAVE_EVERY",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(value) = lookup("QNV_SEED") {
            self.output.seed = value.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Env {
                    name: "QNV_SEED",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(())
    }

    /// Check everything that can be checked without sampling the system.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.system.n_sites == 0 {
            return Err(ConfigError::Validation("system.n_sites must be at least 1".into()));
        }
        if self.output.save_every == 0 {
            return Err(ConfigError::Validation(
                "output.save_every must be at least 1".into(),
            ));
        }
        if self.output.file_name.is_empty() || self.output.group.is_empty() {
            return Err(ConfigError::Validation(
                "output.file_name and output.group must not be empty".into(),
            ));
        }
        parse_axis("initial_state", &self.initial_state)?;
        self.observable_axes()?;
        self.drive_params().validate(self.system.n_sites)?;
        let blocks = self.building_blocks()?;
        self.program.to_program().validate(blocks.len())?;
        Ok(())
    }

    /// Validated building blocks.
    pub fn building_blocks(&self) -> Result<Vec<BuildingBlock>, ConfigError> {
        Ok(blocks_from_raw(&self.blocks)?)
    }

    /// Drive parameters.
    pub fn drive_params(&self) -> DriveParams {
        DriveParams {
            rabi_freq: self.drive.rabi_freq,
            detuning: self.drive.detuning.clone(),
            ac: self.drive.ac.as_ref().map(AcConfig::to_drive),
            noise: self.drive.noise,
        }
    }

    /// Initial polarization axis.
    pub fn initial_axis(&self) -> Result<PauliOp, ConfigError> {
        parse_axis("initial_state", &self.initial_state)
    }

    /// Measured magnetization axes.
    pub fn observable_axes(&self) -> Result<Vec<PauliOp>, ConfigError> {
        self.observables
            .iter()
            .map(|s| parse_axis("observables", s))
            .collect()
    }

    /// Run options for the engine.
    pub fn run_options(&self) -> RunOptions {
        let extra: Attributes = self
            .output
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), AttrValue::from(v)))
            .collect();
        RunOptions {
            group: self.output.group.clone(),
            save_every: self.output.save_every,
            seed: self.output.seed,
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "
system:
  n_sites: 3
blocks:
  - elements: [[dd, 0.2], [x, 0.5]]
program:
  mode: periodic
  n_steps: 4
";

    fn parse(yaml: &str) -> Result<RunConfig, ConfigError> {
        let mut config: RunConfig = serde_yaml_ng::from_str(yaml)?;
        config.apply_overrides(|_| None)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_minimal_defaults() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(config.blocks[0].repetitions, 1);
        assert_eq!(config.initial_state, "z");
        assert_eq!(config.observable_axes().unwrap().len(), 3);
        assert_eq!(config.output.save_every, 1000);
        assert_eq!(config.output.container_path(), PathBuf::from("./data/qnv.json"));
        assert!(matches!(config.program.to_program(), DriveProgram::Periodic { n_steps: 4 }));
    }

    #[test]
    fn test_overrides() {
        let mut config: RunConfig = serde_yaml_ng::from_str(MINIMAL).unwrap();
        config
            .apply_overrides(|name| match name {
                "QNV_DATA_DIR" => Some("/tmp/qnv".into()),
                "QNV_SAVE_EVERY" => Some("5".into()),
                "QNV_SEED" => Some("42".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.output.data_dir, PathBuf::from("/tmp/qnv"));
        assert_eq!(config.run_options().save_every, 5);
        assert_eq!(config.run_options().seed, 42);

        let err = config
            .apply_overrides(|name| (name == "QNV_SEED").then(|| "minus one".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: "QNV_SEED", .. }));
    }

    #[test]
    fn test_detuning_length_is_rejected() {
        let yaml = format!("{MINIMAL}drive:\n  rabi_freq: 1.0\n  detuning: [0.1, 0.2]\n");
        assert!(matches!(parse(&yaml), Err(ConfigError::Dynamics(_))));
    }

    #[test]
    fn test_bad_element_kind() {
        let yaml = MINIMAL.replace("[x, 0.5]", "[w, 0.5]");
        let err = parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("building block 0"));
    }

    #[test]
    fn test_time_dependent_program() {
        let yaml = MINIMAL.replace(
            "  mode: periodic\n  n_steps: 4\n",
            "  mode: time_dependent\n  n_steps: 2\n  modulations:\n    - kind: linear_ramp\n      rate: 0.1\n",
        );
        let config = parse(&yaml).unwrap();
        let DriveProgram::TimeDependent { modulations, .. } = config.program.to_program() else {
            panic!("expected a time-dependent program");
        };
        assert!(modulations[0].is_some());
    }

    #[test]
    fn test_sequential_index_checked() {
        let yaml = MINIMAL.replace(
            "  mode: periodic\n  n_steps: 4\n",
            "  mode: sequential\n  indices: [0, 1]\n",
        );
        assert!(parse(&yaml).is_err());
    }

    #[test]
    fn test_extra_attributes() {
        let yaml = format!(
            "{MINIMAL}output:\n  extra:\n    description: test run\n    repeats: 3\n    ratio: 0.5\n"
        );
        let options = parse(&yaml).unwrap().run_options();
        assert_eq!(options.extra["description"], AttrValue::Text("test run".into()));
        assert_eq!(options.extra["repeats"], AttrValue::Int(3));
        assert_eq!(options.extra["ratio"], AttrValue::Float(0.5));
    }
}
