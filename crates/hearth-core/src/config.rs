// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Hearth.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Coordinator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{StoveError, StoveResult};

pub const MIN_POLL_INTERVAL_SECS: u64 = 10;

fn default_name() -> String {
    "HWAM Stove".to_owned()
}

fn default_30() -> u64 {
    30
}

fn default_288() -> usize {
    288
}

fn default_300() -> u64 {
    300
}

fn default_5_samples() -> usize {
    5
}

fn default_5_minutes() -> u64 {
    5
}

fn default_min_operating_temperature() -> f32 {
    100.0
}

fn default_8760() -> u64 {
    8760
}

fn default_24() -> u64 {
    24
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Friendly device name, used in notifications and dedupe keys
    #[serde(default = "default_name")]
    pub name: String,

    /// Seconds between periodic refreshes (>= 10)
    #[serde(default = "default_30")]
    pub poll_interval_secs: u64,

    /// Number of samples kept in the rolling history (288 = 24h at 5 min)
    #[serde(default = "default_288")]
    pub history_capacity: usize,

    /// Seconds between prediction recomputations
    #[serde(default = "default_300")]
    pub prediction_interval_secs: u64,

    /// Samples required before refill estimate and efficiency are produced
    #[serde(default = "default_5_samples")]
    pub min_samples_for_prediction: usize,

    /// Wall-clock minutes represented by one history sample
    #[serde(default = "default_5_minutes")]
    pub sample_interval_minutes: u64,

    /// Stove temperature below which the fire needs refilling
    #[serde(default = "default_min_operating_temperature")]
    pub min_operating_temperature_c: f32,

    /// Hours since the last service after which maintenance is due
    #[serde(default = "default_8760")]
    pub maintenance_threshold_hours: u64,

    /// Minimum hours between two maintenance checks
    #[serde(default = "default_24")]
    pub maintenance_check_interval_hours: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            poll_interval_secs: 30,
            history_capacity: 288,
            prediction_interval_secs: 300,
            min_samples_for_prediction: 5,
            sample_interval_minutes: 5,
            min_operating_temperature_c: 100.0,
            maintenance_threshold_hours: 8760,
            maintenance_check_interval_hours: 24,
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> StoveResult<()> {
        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            return Err(StoveError::Config(format!(
                "poll_interval_secs must be at least {MIN_POLL_INTERVAL_SECS} seconds, got {}",
                self.poll_interval_secs
            )));
        }
        if self.history_capacity == 0 {
            return Err(StoveError::Config(
                "history_capacity must be at least 1".to_owned(),
            ));
        }
        if self.min_samples_for_prediction < 2 {
            return Err(StoveError::Config(
                "min_samples_for_prediction must be at least 2".to_owned(),
            ));
        }
        if self.sample_interval_minutes == 0 {
            return Err(StoveError::Config(
                "sample_interval_minutes must be positive".to_owned(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(StoveError::Config("name must not be empty".to_owned()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn prediction_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.prediction_interval_secs).unwrap_or(i64::MAX))
    }

    pub fn maintenance_check_interval(&self) -> chrono::Duration {
        chrono::Duration::hours(
            i64::try_from(self.maintenance_check_interval_hours).unwrap_or(i64::MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.history_capacity, 288);
        assert_eq!(config.min_samples_for_prediction, 5);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_poll_interval_too_low() {
        let config = CoordinatorConfig {
            poll_interval_secs: 5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least 10 seconds"));
    }

    #[test]
    fn test_validate_zero_capacity() {
        let config = CoordinatorConfig {
            history_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StoveError::Config(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CoordinatorConfig =
            serde_json::from_str(r#"{"name": "Living room", "poll_interval_secs": 60}"#).unwrap();
        assert_eq!(config.name, "Living room");
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.history_capacity, 288);
        assert_eq!(config.maintenance_threshold_hours, 8760);
    }
}
