use anyhow::{Context, Result};
use scherzo_extruder::config::PressureAdvanceConfig;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Extruder sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pressure advance settings
    #[serde(default)]
    pub extruder: PressureAdvanceConfig,

    /// Sampling window and resolution
    #[serde(default)]
    pub sample: SampleConfig,

    /// Extrusion moves, queued in order
    #[serde(default)]
    pub moves: Vec<MoveConfig>,
}

/// Sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Time between samples in seconds
    #[serde(default = "default_interval")]
    pub interval: f64,

    /// First sampled print time; defaults to the start of extruder activity
    pub start: Option<f64>,

    /// Last sampled print time; defaults to the end of extruder activity
    pub end: Option<f64>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            start: None,
            end: None,
        }
    }
}

/// One extrusion move as a trapezoidal velocity profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveConfig {
    /// Start time; defaults to the end of the previous move
    pub print_time: Option<f64>,

    #[serde(default)]
    pub accel_t: f64,

    #[serde(default)]
    pub cruise_t: f64,

    #[serde(default)]
    pub decel_t: f64,

    /// Filament velocity at the start of the move (mm/s)
    #[serde(default)]
    pub start_v: f64,

    /// Filament velocity while cruising (mm/s)
    #[serde(default)]
    pub cruise_v: f64,

    /// Filament acceleration (mm/s^2)
    #[serde(default)]
    pub accel: f64,

    /// Whether pressure advance applies; unset for retracts and primes
    #[serde(default = "default_can_pressure_advance")]
    pub can_pressure_advance: bool,
}

impl MoveConfig {
    pub fn duration(&self) -> f64 {
        self.accel_t + self.cruise_t + self.decel_t
    }
}

fn default_interval() -> f64 {
    0.001
}

fn default_can_pressure_advance() -> bool {
    true
}

impl Config {
    /// Load configuration from a file, auto-detecting TOML or JSON format
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            // Try TOML first (preferred), fall back to JSON
            _ => Self::from_toml(&content).or_else(|_| Self::from_json(&content)),
        }
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse config as TOML")
    }

    /// Parse configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("failed to parse config as JSON")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.extruder.validate().context("invalid [extruder] section")?;

        if self.sample.interval.is_nan() || self.sample.interval <= 0.0 {
            anyhow::bail!("sample.interval must be positive");
        }
        if let (Some(start), Some(end)) = (self.sample.start, self.sample.end) {
            if start > end {
                anyhow::bail!("sample.start ({start}) is after sample.end ({end})");
            }
        }

        let mut prev_end = f64::NEG_INFINITY;
        for (i, m) in self.moves.iter().enumerate() {
            if m.accel_t < 0.0 || m.cruise_t < 0.0 || m.decel_t < 0.0 {
                anyhow::bail!("moves[{i}] has a negative phase duration");
            }
            if let Some(print_time) = m.print_time {
                if print_time < prev_end {
                    anyhow::bail!(
                        "moves[{i}] starts at {print_time} before the previous move ends"
                    );
                }
                prev_end = print_time;
            }
            prev_end += m.duration();
        }

        Ok(())
    }
}
