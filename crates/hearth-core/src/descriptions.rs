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

//! Display metadata for every field a presentation layer can show
//!
//! A static table maps each [`FieldKey`] to its label, unit, kind and valid
//! range. Values are read through [`FieldKey::read`], a plain match over the
//! key, so the table itself holds only data.

use hearth_types::{PredictionBundle, StoveSnapshot};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    StoveTemperature,
    RoomTemperature,
    OxygenLevel,
    BurnLevel,
    Phase,
    OperationMode,
    Valve1,
    Valve2,
    Valve3,
    DoorOpen,
    Updating,
    NightLoweringActive,
    MaintenanceAlarms,
    SafetyAlarms,
    RefillAlarm,
    RemoteRefillAlarm,
    NightWindow,
    NewFirewoodIn,
    TimeSinceRemoteMessage,
    DeviceTime,
    FirmwareVersion,
    WifiVersion,
    RemoteVersion,
    Algorithm,
    ServiceDate,
    TemperatureTrend,
    RefillEstimate,
    EfficiencyScore,
    OptimalPerformance,
    OxygenOptimal,
    StoveCritical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Measurement,
    State,
    Alarm,
    Schedule,
    Diagnostic,
    Prediction,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldDescription {
    pub key: FieldKey,
    /// Stable identifier, e.g. for entity ids
    pub id: &'static str,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub kind: FieldKind,
    /// Inclusive bounds for numeric values
    pub range: Option<(f64, f64)>,
}

impl FieldDescription {
    /// Whether `value` is acceptable for this field
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self.range, value.as_f64()) {
            (Some((min, max)), Some(v)) => (min..=max).contains(&v),
            _ => true,
        }
    }
}

const fn describe(
    key: FieldKey,
    id: &'static str,
    label: &'static str,
    unit: Option<&'static str>,
    kind: FieldKind,
    range: Option<(f64, f64)>,
) -> FieldDescription {
    FieldDescription {
        key,
        id,
        label,
        unit,
        kind,
        range,
    }
}

const CELSIUS: Option<&str> = Some("°C");
const PERCENT: Option<&str> = Some("%");

pub static FIELD_DESCRIPTIONS: &[FieldDescription] = &[
    describe(
        FieldKey::StoveTemperature,
        "stove_temperature",
        "Stove temperature",
        CELSIUS,
        FieldKind::Measurement,
        Some((0.0, 800.0)),
    ),
    describe(
        FieldKey::RoomTemperature,
        "room_temperature",
        "Room temperature",
        CELSIUS,
        FieldKind::Measurement,
        Some((-20.0, 50.0)),
    ),
    describe(
        FieldKey::OxygenLevel,
        "oxygen_level",
        "Oxygen level",
        PERCENT,
        FieldKind::Measurement,
        Some((0.0, 100.0)),
    ),
    describe(
        FieldKey::BurnLevel,
        "burn_level",
        "Burn level",
        None,
        FieldKind::State,
        Some((0.0, 5.0)),
    ),
    describe(FieldKey::Phase, "burn_phase", "Combustion phase", None, FieldKind::State, None),
    describe(
        FieldKey::OperationMode,
        "operation_mode",
        "Operation mode",
        None,
        FieldKind::State,
        None,
    ),
    describe(
        FieldKey::Valve1,
        "valve1",
        "Valve 1",
        PERCENT,
        FieldKind::Measurement,
        Some((0.0, 100.0)),
    ),
    describe(
        FieldKey::Valve2,
        "valve2",
        "Valve 2",
        PERCENT,
        FieldKind::Measurement,
        Some((0.0, 100.0)),
    ),
    describe(
        FieldKey::Valve3,
        "valve3",
        "Valve 3",
        PERCENT,
        FieldKind::Measurement,
        Some((0.0, 100.0)),
    ),
    describe(FieldKey::DoorOpen, "door_open", "Door", None, FieldKind::State, None),
    describe(
        FieldKey::Updating,
        "updating",
        "Firmware update in progress",
        None,
        FieldKind::Diagnostic,
        None,
    ),
    describe(
        FieldKey::NightLoweringActive,
        "night_mode_active",
        "Night mode active",
        None,
        FieldKind::State,
        None,
    ),
    describe(
        FieldKey::MaintenanceAlarms,
        "maintenance_needed",
        "Maintenance required",
        None,
        FieldKind::Alarm,
        Some((0.0, f64::MAX)),
    ),
    describe(
        FieldKey::SafetyAlarms,
        "safety_alarm",
        "Safety alarm",
        None,
        FieldKind::Alarm,
        Some((0.0, f64::MAX)),
    ),
    describe(
        FieldKey::RefillAlarm,
        "refill_needed",
        "Refill required",
        None,
        FieldKind::Alarm,
        None,
    ),
    describe(
        FieldKey::RemoteRefillAlarm,
        "remote_refill_alarm",
        "Remote refill alarm",
        None,
        FieldKind::Alarm,
        None,
    ),
    describe(
        FieldKey::NightWindow,
        "night_window",
        "Night lowering window",
        None,
        FieldKind::Schedule,
        None,
    ),
    describe(
        FieldKey::NewFirewoodIn,
        "new_firewood_in",
        "New firewood in",
        Some("min"),
        FieldKind::Schedule,
        None,
    ),
    describe(
        FieldKey::TimeSinceRemoteMessage,
        "time_since_remote_msg",
        "Since last remote message",
        Some("s"),
        FieldKind::Diagnostic,
        None,
    ),
    describe(FieldKey::DeviceTime, "device_time", "Stove clock", None, FieldKind::Diagnostic, None),
    describe(
        FieldKey::FirmwareVersion,
        "firmware_version",
        "Firmware version",
        None,
        FieldKind::Diagnostic,
        None,
    ),
    describe(
        FieldKey::WifiVersion,
        "wifi_version",
        "Wi-Fi version",
        None,
        FieldKind::Diagnostic,
        None,
    ),
    describe(
        FieldKey::RemoteVersion,
        "remote_version",
        "Remote version",
        None,
        FieldKind::Diagnostic,
        None,
    ),
    describe(
        FieldKey::Algorithm,
        "algorithm",
        "Combustion algorithm",
        None,
        FieldKind::Diagnostic,
        None,
    ),
    describe(
        FieldKey::ServiceDate,
        "service_date",
        "Last service",
        None,
        FieldKind::Diagnostic,
        None,
    ),
    describe(
        FieldKey::TemperatureTrend,
        "temperature_trend",
        "Temperature trend",
        None,
        FieldKind::Prediction,
        None,
    ),
    describe(
        FieldKey::RefillEstimate,
        "refill_estimate",
        "Refill in",
        Some("min"),
        FieldKind::Prediction,
        None,
    ),
    describe(
        FieldKey::EfficiencyScore,
        "efficiency_score",
        "Efficiency score",
        PERCENT,
        FieldKind::Prediction,
        Some((0.0, 100.0)),
    ),
    describe(
        FieldKey::OptimalPerformance,
        "optimal_performance",
        "Optimal performance",
        None,
        FieldKind::Prediction,
        None,
    ),
    describe(
        FieldKey::OxygenOptimal,
        "oxygen_optimal",
        "Oxygen optimal",
        None,
        FieldKind::Measurement,
        None,
    ),
    describe(
        FieldKey::StoveCritical,
        "stove_critical",
        "Stove temperature critical",
        None,
        FieldKind::Alarm,
        None,
    ),
];

/// Value of one field, tagged by type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f32),
    Integer(i64),
    Bool(bool),
    Text(String),
    Duration(Duration),
    Absent,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Integer(v) => Some(*v as f64),
            Self::Bool(_) | Self::Text(_) | Self::Duration(_) | Self::Absent => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v:.1}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Bool(true) => f.write_str("on"),
            Self::Bool(false) => f.write_str("off"),
            Self::Text(s) => f.write_str(s),
            Self::Duration(d) => write!(f, "{}", d.as_secs() / 60),
            Self::Absent => f.write_str("unknown"),
        }
    }
}

impl FieldKey {
    pub fn description(self) -> &'static FieldDescription {
        // Every key has exactly one entry, see test_table_covers_every_key
        FIELD_DESCRIPTIONS
            .iter()
            .find(|d| d.key == self)
            .unwrap_or(&FIELD_DESCRIPTIONS[0])
    }

    pub fn from_id(id: &str) -> Option<Self> {
        FIELD_DESCRIPTIONS.iter().find(|d| d.id == id).map(|d| d.key)
    }

    pub fn read(self, snapshot: &StoveSnapshot, predictions: &PredictionBundle) -> FieldValue {
        let state = &snapshot.operational_state;
        let alarms = &snapshot.alarm_state;
        let temps = &snapshot.temperatures;
        let valves = &snapshot.valve_positions;
        let info = &snapshot.system_info;

        match self {
            Self::StoveTemperature => FieldValue::Float(temps.stove_temperature_c),
            Self::RoomTemperature => FieldValue::Float(temps.room_temperature_c),
            Self::OxygenLevel => FieldValue::Float(temps.oxygen_percent),
            Self::BurnLevel => FieldValue::Integer(i64::from(state.burn_level)),
            Self::Phase => FieldValue::Text(state.phase.label().to_owned()),
            Self::OperationMode => FieldValue::Text(state.operation_mode.label().to_owned()),
            Self::Valve1 => FieldValue::Integer(i64::from(valves.valve1_percent)),
            Self::Valve2 => FieldValue::Integer(i64::from(valves.valve2_percent)),
            Self::Valve3 => FieldValue::Integer(i64::from(valves.valve3_percent)),
            Self::DoorOpen => FieldValue::Bool(state.door_open),
            Self::Updating => FieldValue::Bool(state.updating),
            Self::NightLoweringActive => FieldValue::Bool(state.night_lowering_active),
            Self::MaintenanceAlarms => {
                FieldValue::Integer(i64::from(alarms.maintenance_alarm_count))
            }
            Self::SafetyAlarms => FieldValue::Integer(i64::from(alarms.safety_alarm_count)),
            Self::RefillAlarm => FieldValue::Bool(alarms.refill_alarm),
            Self::RemoteRefillAlarm => FieldValue::Bool(alarms.remote_refill_alarm),
            Self::NightWindow => FieldValue::Text(snapshot.schedule.night_window.to_string()),
            Self::NewFirewoodIn => FieldValue::Duration(snapshot.schedule.new_firewood_in),
            Self::TimeSinceRemoteMessage => {
                FieldValue::Duration(snapshot.schedule.time_since_remote_msg)
            }
            Self::DeviceTime => FieldValue::Text(
                snapshot.schedule.device_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
            Self::FirmwareVersion => FieldValue::Text(info.firmware_version.clone()),
            Self::WifiVersion => FieldValue::Text(info.wifi_version.clone()),
            Self::RemoteVersion => FieldValue::Text(info.remote_version.clone()),
            Self::Algorithm => FieldValue::Text(info.algorithm.clone()),
            Self::ServiceDate => FieldValue::Text(info.service_date.to_string()),
            Self::TemperatureTrend => FieldValue::Text(predictions.temperature_trend.to_string()),
            Self::RefillEstimate => predictions
                .refill_estimate
                .map_or(FieldValue::Absent, FieldValue::Duration),
            Self::EfficiencyScore => predictions
                .efficiency_score
                .map_or(FieldValue::Absent, FieldValue::Float),
            Self::OptimalPerformance => {
                FieldValue::Bool(predictions.is_optimal_performance(snapshot))
            }
            Self::OxygenOptimal => FieldValue::Bool(temps.oxygen_optimal()),
            Self::StoveCritical => FieldValue::Bool(temps.stove_critical()),
        }
    }
}
