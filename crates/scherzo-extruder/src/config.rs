use crate::{itersolve::ActiveMargins, kinematics::extruder::ExtruderKin};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest accepted pressure advance smoothing window, in seconds.
pub const MAX_SMOOTH_TIME: f64 = 0.200;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("pressure_advance must be non-negative, got {0}")]
    NegativePressureAdvance(f64),
    #[error("smooth_time must be between 0 and {max}, got {value}")]
    SmoothTimeOutOfRange { value: f64, max: f64 },
}

/// Pressure advance settings for one extruder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureAdvanceConfig {
    /// Extra filament length per unit of nominal extrusion velocity
    #[serde(default)]
    pub pressure_advance: f64,

    /// Width of the smoothing window in seconds; zero disables pressure advance
    #[serde(default = "default_smooth_time")]
    pub smooth_time: f64,
}

impl Default for PressureAdvanceConfig {
    fn default() -> Self {
        Self {
            pressure_advance: 0.0,
            smooth_time: default_smooth_time(),
        }
    }
}

fn default_smooth_time() -> f64 {
    0.040
}

impl PressureAdvanceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pressure_advance.is_nan() || self.pressure_advance < 0.0 {
            return Err(ConfigError::NegativePressureAdvance(self.pressure_advance));
        }
        if !(0.0..=MAX_SMOOTH_TIME).contains(&self.smooth_time) {
            return Err(ConfigError::SmoothTimeOutOfRange {
                value: self.smooth_time,
                max: MAX_SMOOTH_TIME,
            });
        }
        Ok(())
    }

    /// Validate and configure `kin`, leaving it untouched on error.
    pub fn apply(&self, kin: &mut ExtruderKin) -> Result<ActiveMargins, ConfigError> {
        self.validate()?;
        Ok(kin.set_pressure_advance(self.pressure_advance, self.smooth_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: PressureAdvanceConfig = toml::from_str("").unwrap();
        assert_eq!(config, PressureAdvanceConfig::default());
        assert_eq!(config.smooth_time, 0.040);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config: PressureAdvanceConfig = toml::from_str(
            r#"
pressure_advance = 0.055
smooth_time = 0.03
"#,
        )
        .unwrap();
        assert_eq!(config.pressure_advance, 0.055);
        assert_eq!(config.smooth_time, 0.03);
    }

    #[test]
    fn test_parse_json() {
        let config: PressureAdvanceConfig =
            serde_json::from_str(r#"{"pressure_advance": 0.1}"#).unwrap();
        assert_eq!(config.pressure_advance, 0.1);
        assert_eq!(config.smooth_time, 0.040);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let negative = PressureAdvanceConfig {
            pressure_advance: -0.1,
            ..Default::default()
        };
        assert_eq!(
            negative.validate(),
            Err(ConfigError::NegativePressureAdvance(-0.1))
        );

        let too_smooth = PressureAdvanceConfig {
            smooth_time: 0.25,
            ..Default::default()
        };
        assert!(matches!(
            too_smooth.validate(),
            Err(ConfigError::SmoothTimeOutOfRange { value, .. }) if value == 0.25
        ));

        let nan = PressureAdvanceConfig {
            pressure_advance: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_apply_keeps_previous_state_on_error() {
        let mut kin = ExtruderKin::new();
        let margins = PressureAdvanceConfig {
            pressure_advance: 0.05,
            smooth_time: 0.04,
        }
        .apply(&mut kin)
        .unwrap();
        assert_eq!(margins, ActiveMargins::symmetric(0.02));

        let before = kin;
        let bad = PressureAdvanceConfig {
            pressure_advance: 0.05,
            smooth_time: 1.0,
        };
        assert!(bad.apply(&mut kin).is_err());
        assert_eq!(kin, before);
    }
}
