//! TOML-based monitor configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::balance::Scenario;

/// Top-level monitor configuration parsed from TOML.
///
/// All fields have defaults matching the baseline preset. Load from TOML
/// with [`MonitorConfig::from_toml_file`] or use [`MonitorConfig::baseline`]
/// for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Data source parameters.
    #[serde(default)]
    pub source: SourceConfig,
    /// Demand forecasting parameters.
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Load-balancing simulation parameters.
    #[serde(default)]
    pub balancing: BalancingConfig,
}

/// Data source parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Base demand level of the synthetic feed (MW).
    pub base_demand_mw: f64,
    /// Days of history to request (must be > 0).
    pub history_days: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_demand_mw: 320_000.0,
            history_days: 30,
        }
    }
}

/// Demand forecasting parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Days to forecast past the end of the history (must be > 0).
    pub horizon_days: usize,
    /// Trees in the demand model (must be > 0).
    pub trees: usize,
    /// Maximum tree depth (must be > 0).
    pub max_depth: usize,
    /// Seed for model training.
    pub seed: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            trees: 100,
            max_depth: 10,
            seed: 42,
        }
    }
}

/// Load-balancing simulation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BalancingConfig {
    /// Scenario name: `"normal"`, `"peak"`, `"renewable_surplus"`, or
    /// `"outage"`.
    pub scenario: String,
    /// Regions to balance; empty means all.
    pub regions: Vec<String>,
    /// Seed for scenario perturbation; omit for OS entropy.
    pub seed: Option<u64>,
}

impl Default for BalancingConfig {
    fn default() -> Self {
        Self {
            scenario: "normal".to_string(),
            regions: Vec::new(),
            seed: None,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"forecast.horizon_days"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl MonitorConfig {
    /// Returns the baseline configuration: 30-day synthetic history, 7-day
    /// forecast, normal scenario.
    pub fn baseline() -> Self {
        Self {
            source: SourceConfig::default(),
            forecast: ForecastConfig::default(),
            balancing: BalancingConfig::default(),
        }
    }

    /// Returns the peak-stress preset: longer history, demand spike
    /// scenario with a pinned seed.
    pub fn peak_stress() -> Self {
        Self {
            source: SourceConfig {
                history_days: 60,
                ..SourceConfig::default()
            },
            forecast: ForecastConfig::default(),
            balancing: BalancingConfig {
                scenario: "peak".to_string(),
                seed: Some(42),
                ..BalancingConfig::default()
            },
        }
    }

    /// Returns the outage-drill preset: single-region outage with a pinned
    /// seed and a short forecast.
    pub fn outage_drill() -> Self {
        Self {
            source: SourceConfig::default(),
            forecast: ForecastConfig {
                horizon_days: 3,
                ..ForecastConfig::default()
            },
            balancing: BalancingConfig {
                scenario: "outage".to_string(),
                seed: Some(7),
                ..BalancingConfig::default()
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "peak_stress", "outage_drill"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "peak_stress" => Ok(Self::peak_stress()),
            "outage_drill" => Ok(Self::outage_drill()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. The scenario name
    /// is checked strictly here even though the simulator itself treats
    /// unknown names as `normal`; a typo in a config file should be loud.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.source.history_days == 0 {
            errors.push(ConfigError {
                field: "source.history_days".into(),
                message: "must be > 0".into(),
            });
        }
        if !self.source.base_demand_mw.is_finite() || self.source.base_demand_mw <= 0.0 {
            errors.push(ConfigError {
                field: "source.base_demand_mw".into(),
                message: "must be a positive number".into(),
            });
        }

        let f = &self.forecast;
        if f.horizon_days == 0 {
            errors.push(ConfigError {
                field: "forecast.horizon_days".into(),
                message: "must be > 0".into(),
            });
        }
        if f.trees == 0 {
            errors.push(ConfigError {
                field: "forecast.trees".into(),
                message: "must be > 0".into(),
            });
        }
        if f.max_depth == 0 {
            errors.push(ConfigError {
                field: "forecast.max_depth".into(),
                message: "must be > 0".into(),
            });
        }

        if !Scenario::NAMES.contains(&self.balancing.scenario.as_str()) {
            errors.push(ConfigError {
                field: "balancing.scenario".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    Scenario::NAMES.join(", "),
                    self.balancing.scenario
                ),
            });
        }

        errors
    }
}
