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

//! Derived metrics computed from the rolling history
//!
//! All functions are pure: they read a history slice and return a value, so
//! the coordinator can recompute them on its own cadence and cache the result.

use chrono::{DateTime, Utc};
use hearth_types::{HistorySample, PredictionBundle, TemperatureTrend};
use std::time::Duration;

use crate::config::CoordinatorConfig;
use crate::history::HistoryRing;

/// Samples compared by the trend calculation
pub const TREND_WINDOW: usize = 3;

/// Average per-sample change (°C) that counts as a trend
pub const TREND_THRESHOLD_C: f32 = 5.0;

/// Samples used by the efficiency score
pub const EFFICIENCY_WINDOW: usize = 5;

const STABILITY_WEIGHT: f32 = 0.6;
const OXYGEN_WEIGHT: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionSettings {
    pub min_samples: usize,
    pub sample_interval_minutes: u64,
    pub min_operating_temperature_c: f32,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self::from(&CoordinatorConfig::default())
    }
}

impl From<&CoordinatorConfig> for PredictionSettings {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            min_samples: config.min_samples_for_prediction,
            sample_interval_minutes: config.sample_interval_minutes,
            min_operating_temperature_c: config.min_operating_temperature_c,
        }
    }
}

/// Compare the last three stove temperatures
///
/// Average change above +5 °C per sample is rising, below -5 °C falling.
pub fn temperature_trend(samples: &[HistorySample]) -> TemperatureTrend {
    if samples.len() < TREND_WINDOW {
        return TemperatureTrend::Stable;
    }

    let window = &samples[samples.len() - TREND_WINDOW..];
    let first = window[0].stove_temperature_c;
    let last = window[TREND_WINDOW - 1].stove_temperature_c;
    let avg_change = (last - first) / (TREND_WINDOW - 1) as f32;

    if avg_change > TREND_THRESHOLD_C {
        TemperatureTrend::Rising
    } else if avg_change < -TREND_THRESHOLD_C {
        TemperatureTrend::Falling
    } else {
        TemperatureTrend::Stable
    }
}

/// Least-squares slope and intercept of `values` against their index
pub fn linear_fit(values: &[f32]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().map(|v| f64::from(*v)).sum::<f64>() / n_f;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, value) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (f64::from(*value) - mean_y);
        den += dx * dx;
    }

    if den == 0.0 {
        return None;
    }

    let slope = num / den;
    Some((slope, mean_y - slope * mean_x))
}

/// Time until the stove cools down to the minimum operating temperature
///
/// Fits a straight line through every stove temperature in the history.
/// Returns `None` with too few samples or when the fire is not cooling.
pub fn refill_estimate(
    samples: &[HistorySample],
    settings: &PredictionSettings,
) -> Option<Duration> {
    if samples.len() < settings.min_samples {
        return None;
    }

    let temps: Vec<f32> = samples.iter().map(|s| s.stove_temperature_c).collect();
    let (slope, _) = linear_fit(&temps)?;
    if slope >= 0.0 {
        return None;
    }

    let current = f64::from(*temps.last()?);
    let headroom = (current - f64::from(settings.min_operating_temperature_c)).max(0.0);
    let samples_to_min = headroom / slope.abs();
    let minutes = (samples_to_min * settings.sample_interval_minutes as f64).floor();

    Some(Duration::from_secs(minutes as u64 * 60))
}

/// Efficiency score (0-100) from the last five samples
///
/// 60 % temperature stability (1 - range/max), 40 % oxygen economy
/// (1 - mean oxygen/100).
pub fn efficiency_score(samples: &[HistorySample], min_samples: usize) -> Option<f32> {
    if samples.len() < min_samples.max(1) {
        return None;
    }

    let skip = samples.len().saturating_sub(EFFICIENCY_WINDOW);
    let recent = &samples[skip..];

    let max_temp = recent
        .iter()
        .map(|s| s.stove_temperature_c)
        .fold(f32::NEG_INFINITY, f32::max);
    let min_temp = recent
        .iter()
        .map(|s| s.stove_temperature_c)
        .fold(f32::INFINITY, f32::min);
    if max_temp <= 0.0 {
        return None;
    }

    let stability = 1.0 - (max_temp - min_temp) / max_temp;
    let mean_oxygen = recent.iter().map(|s| s.oxygen_percent).sum::<f32>() / recent.len() as f32;
    let oxygen_economy = 1.0 - mean_oxygen / 100.0;

    let score = (stability * STABILITY_WEIGHT + oxygen_economy * OXYGEN_WEIGHT) * 100.0;
    Some(score.clamp(0.0, 100.0))
}

/// Recompute the full prediction bundle
pub fn compute_predictions(
    history: &HistoryRing,
    settings: &PredictionSettings,
    now: DateTime<Utc>,
) -> PredictionBundle {
    let samples = history.to_vec();
    PredictionBundle {
        refill_estimate: refill_estimate(&samples, settings),
        temperature_trend: temperature_trend(&samples),
        efficiency_score: efficiency_score(&samples, settings.min_samples),
        computed_at: Some(now),
    }
}
