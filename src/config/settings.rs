//! Planner settings loading from config.toml
//!
//! Settings live under a `[planner]` table. Every field has a default, so a missing file or a
//! missing table is not an error; a file that exists but does not parse is.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Structure of the whole config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Engine settings
    #[serde(default)]
    pub planner: PlannerSettings,
}

/// Tunables for the calculation engine and plan tracker
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlannerSettings {
    /// Upper bound for any single store or debt-source call, in milliseconds
    pub store_timeout_ms: u64,
    /// Share of a month's planned payment that counts as paid (percent)
    pub paid_threshold_percent: u32,
    /// Allowed drift between live and expected debt before a plan is outdated,
    /// as a percentage of the beginning debt
    pub outdated_tolerance_percent: f64,
    /// How many reports `list_recent_by_user` returns at most
    pub recent_report_limit: u64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            store_timeout_ms: 5_000,
            paid_threshold_percent: 99,
            outdated_tolerance_percent: 1.0,
            recent_report_limit: 10,
        }
    }
}

impl PlannerSettings {
    /// Timeout applied to collaborator calls.
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    fn validate(self) -> Result<Self> {
        if self.paid_threshold_percent == 0 || self.paid_threshold_percent > 100 {
            return Err(Error::Config {
                message: format!(
                    "paid_threshold_percent must be in 1..=100, got {}",
                    self.paid_threshold_percent
                ),
            });
        }
        if !self.outdated_tolerance_percent.is_finite() || self.outdated_tolerance_percent < 0.0 {
            return Err(Error::Config {
                message: "outdated_tolerance_percent must be a non-negative number".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parses planner settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<PlannerSettings> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.planner.validate()
}

/// Loads planner settings from a TOML file, falling back to defaults if it does not exist.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<PlannerSettings> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!("No config file at {:?}, using default planner settings", path);
        return Ok(PlannerSettings::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_settings(&contents)
}

/// Loads planner settings from the default location (./config.toml)
pub fn load_default_settings() -> Result<PlannerSettings> {
    load_settings("config.toml")
}
