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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::stove::StoveSnapshot;

/// Reading kept in the rolling history, one per successful poll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub timestamp: DateTime<Utc>,
    pub stove_temperature_c: f32,
    pub room_temperature_c: f32,
    pub oxygen_percent: f32,
}

impl HistorySample {
    pub fn from_snapshot(snapshot: &StoveSnapshot, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            stove_temperature_c: snapshot.temperatures.stove_temperature_c,
            room_temperature_c: snapshot.temperatures.room_temperature_c,
            oxygen_percent: snapshot.temperatures.oxygen_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureTrend {
    Rising,
    Falling,
    #[default]
    Stable,
}

impl fmt::Display for TemperatureTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
        })
    }
}

/// Metrics derived from the rolling history
///
/// Recomputed on its own cadence and cached in between; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionBundle {
    /// Time until the stove cools to its minimum operating temperature
    pub refill_estimate: Option<Duration>,
    pub temperature_trend: TemperatureTrend,
    /// 0-100
    pub efficiency_score: Option<f32>,
    /// When this bundle was computed, `None` for the empty default
    pub computed_at: Option<DateTime<Utc>>,
}

impl PredictionBundle {
    pub const OPTIMAL_EFFICIENCY: f32 = 80.0;

    /// Burning with an efficiency score above 80
    pub fn is_optimal_performance(&self, snapshot: &StoveSnapshot) -> bool {
        snapshot.is_actively_burning()
            && self
                .efficiency_score
                .is_some_and(|score| score > Self::OPTIMAL_EFFICIENCY)
    }
}
