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

use hearth_core::{CoordinatorStatus, FieldKey, FieldValue, StoveCoordinator};
use hearth_types::{PredictionBundle, StoveSnapshot};
use serde::Serialize;
use tracing::info;

/// Everything `hearth status` prints
#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    pub device: &'a str,
    pub snapshot: Option<&'a StoveSnapshot>,
    pub predictions: PredictionBundle,
    pub status: CoordinatorStatus,
}

pub fn status_json(coordinator: &StoveCoordinator) -> serde_json::Result<String> {
    let snapshot = coordinator.current_snapshot();
    let report = StatusReport {
        device: coordinator.name(),
        snapshot: snapshot.as_deref(),
        predictions: coordinator.predictions(),
        status: coordinator.status(),
    };
    serde_json::to_string_pretty(&report)
}

/// One-line summary of the key readings
pub fn summary_line(snapshot: &StoveSnapshot, predictions: &PredictionBundle) -> String {
    let field = |key: FieldKey| {
        let value = key.read(snapshot, predictions);
        match (value, key.description().unit) {
            (FieldValue::Absent, _) => format!("{}: -", key.description().label),
            (value, Some(unit)) => format!("{}: {value} {unit}", key.description().label),
            (value, None) => format!("{}: {value}", key.description().label),
        }
    };

    [
        FieldKey::Phase,
        FieldKey::BurnLevel,
        FieldKey::StoveTemperature,
        FieldKey::RoomTemperature,
        FieldKey::OxygenLevel,
        FieldKey::TemperatureTrend,
        FieldKey::RefillEstimate,
        FieldKey::EfficiencyScore,
    ]
    .into_iter()
    .map(field)
    .collect::<Vec<_>>()
    .join(", ")
}

pub fn log_current(coordinator: &StoveCoordinator) {
    let status = coordinator.status();
    let Some(snapshot) = coordinator.current_snapshot() else {
        info!(device = %coordinator.name(), state = %status.state, "No stove data yet");
        return;
    };

    let predictions = coordinator.predictions();
    info!(
        device = %coordinator.name(),
        state = %status.state,
        stale = status.is_stale(),
        "{}",
        summary_line(&snapshot, &predictions)
    );

    let alarms = snapshot.alarm_state.active_alarms();
    if !alarms.is_empty() {
        let labels: Vec<&str> = alarms.iter().map(|a| a.label()).collect();
        info!(device = %coordinator.name(), alarms = ?labels, "Active alarms");
    }
}
