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

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Combustion lifecycle stage reported by the stove
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Ignition,
    Startup,
    Combustion,
    Embers,
    Standby,
}

impl Phase {
    /// Map the device phase code (1-5) to a phase
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Ignition),
            2 => Some(Self::Startup),
            3 => Some(Self::Combustion),
            4 => Some(Self::Embers),
            5 => Some(Self::Standby),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Ignition => 1,
            Self::Startup => 2,
            Self::Combustion => 3,
            Self::Embers => 4,
            Self::Standby => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ignition => "Ignition",
            Self::Startup => "Startup",
            Self::Combustion => "Combustion",
            Self::Embers => "Embers",
            Self::Standby => "Standby",
        }
    }

    /// Fire is lit: ignition, startup or combustion
    pub fn is_burning(self) -> bool {
        matches!(self, Self::Ignition | Self::Startup | Self::Combustion)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Controller operation mode (device codes 0-10)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    Initialisation,
    SelfTest,
    Normal,
    TemperatureFault,
    OxygenFault,
    Calibration,
    Safety,
    Manual,
    MotorTest,
    SlowCombustion,
    LowVoltage,
}

impl OperationMode {
    const ALL: [OperationMode; 11] = [
        Self::Initialisation,
        Self::SelfTest,
        Self::Normal,
        Self::TemperatureFault,
        Self::OxygenFault,
        Self::Calibration,
        Self::Safety,
        Self::Manual,
        Self::MotorTest,
        Self::SlowCombustion,
        Self::LowVoltage,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    pub fn code(self) -> u8 {
        // ALL is ordered by device code
        Self::ALL
            .iter()
            .position(|mode| *mode == self)
            .map_or(0, |idx| idx as u8)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Initialisation => "Initialisation",
            Self::SelfTest => "Self test",
            Self::Normal => "Normal",
            Self::TemperatureFault => "Temperature fault",
            Self::OxygenFault => "O2 fault",
            Self::Calibration => "Calibration",
            Self::Safety => "Safety",
            Self::Manual => "Manual",
            Self::MotorTest => "Motor test",
            Self::SlowCombustion => "Slow combustion",
            Self::LowVoltage => "Low voltage",
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Combustion algorithm name (e.g. "IHS")
    pub algorithm: String,
    pub firmware_version: String,
    pub wifi_version: String,
    pub remote_version: String,
    /// Date of the last service visit
    pub service_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationalState {
    pub phase: Phase,
    /// Burn level 0-5
    pub burn_level: u8,
    pub operation_mode: OperationMode,
    pub door_open: bool,
    pub updating: bool,
    pub night_lowering_active: bool,
}

impl OperationalState {
    pub fn is_actively_burning(&self) -> bool {
        self.phase.is_burning()
    }
}

/// Alarm categories surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmKind {
    Maintenance,
    Safety,
    Refill,
    RemoteRefill,
}

impl AlarmKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Maintenance => "Maintenance required",
            Self::Safety => "Safety alarm",
            Self::Refill => "Refill required",
            Self::RemoteRefill => "Remote refill alarm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlarmState {
    pub maintenance_alarm_count: u32,
    pub safety_alarm_count: u32,
    pub refill_alarm: bool,
    pub remote_refill_alarm: bool,
    pub remote_refill_beep_count: u32,
}

impl AlarmState {
    pub fn has_alarms(&self) -> bool {
        !self.active_alarms().is_empty()
    }

    /// Active alarms in display order
    pub fn active_alarms(&self) -> Vec<AlarmKind> {
        let mut alarms = Vec::new();
        if self.maintenance_alarm_count > 0 {
            alarms.push(AlarmKind::Maintenance);
        }
        if self.safety_alarm_count > 0 {
            alarms.push(AlarmKind::Safety);
        }
        if self.refill_alarm {
            alarms.push(AlarmKind::Refill);
        }
        if self.remote_refill_alarm {
            alarms.push(AlarmKind::RemoteRefill);
        }
        alarms
    }
}

/// Measurements, already scaled from the device's centi-units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperatures {
    /// 0-800 °C
    pub stove_temperature_c: f32,
    /// -20-50 °C
    pub room_temperature_c: f32,
    /// 0-100 %
    pub oxygen_percent: f32,
}

impl Temperatures {
    pub const STOVE_CRITICAL_C: f32 = 500.0;

    pub fn stove_critical(&self) -> bool {
        self.stove_temperature_c > Self::STOVE_CRITICAL_C
    }

    /// Oxygen between 15 and 25 % indicates clean combustion
    pub fn oxygen_optimal(&self) -> bool {
        (15.0..=25.0).contains(&self.oxygen_percent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValvePositions {
    pub valve1_percent: u8,
    pub valve2_percent: u8,
    pub valve3_percent: u8,
}

/// Time-of-day range during which the stove lowers its burn level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NightWindow {
    pub begin: NaiveTime,
    pub end: NaiveTime,
}

impl NightWindow {
    pub fn new(begin: NaiveTime, end: NaiveTime) -> Self {
        Self { begin, end }
    }

    /// Parse two "HH:MM" strings
    pub fn parse(begin: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            begin: NaiveTime::parse_from_str(begin.trim(), "%H:%M")?,
            end: NaiveTime::parse_from_str(end.trim(), "%H:%M")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Whether `time` falls inside the window, handling windows that wrap midnight
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.begin <= self.end {
            time >= self.begin && time < self.end
        } else {
            time >= self.begin || time < self.end
        }
    }
}

impl fmt::Display for NightWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.begin.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub night_window: NightWindow,
    /// Wall clock reported by the stove itself
    pub device_time: NaiveDateTime,
    /// Elapsed since the remote last talked to the stove
    pub time_since_remote_msg: Duration,
    /// Countdown until new firewood should be added
    pub new_firewood_in: Duration,
}

/// One fully validated reading of the stove
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoveSnapshot {
    pub system_info: SystemInfo,
    pub operational_state: OperationalState,
    pub alarm_state: AlarmState,
    pub temperatures: Temperatures,
    pub valve_positions: ValvePositions,
    pub schedule: Schedule,
}

impl StoveSnapshot {
    pub fn is_actively_burning(&self) -> bool {
        self.operational_state.is_actively_burning()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_codes() {
        for code in 1..=5 {
            let phase = Phase::from_code(code).unwrap();
            assert_eq!(phase.code(), code);
        }
        assert!(Phase::from_code(0).is_none());
        assert!(Phase::from_code(6).is_none());
    }

    #[test]
    fn test_burning_phases() {
        assert!(Phase::Ignition.is_burning());
        assert!(Phase::Startup.is_burning());
        assert!(Phase::Combustion.is_burning());
        assert!(!Phase::Embers.is_burning());
        assert!(!Phase::Standby.is_burning());
    }

    #[test]
    fn test_operation_mode_codes() {
        assert_eq!(OperationMode::from_code(0), Some(OperationMode::Initialisation));
        assert_eq!(OperationMode::from_code(2), Some(OperationMode::Normal));
        assert_eq!(OperationMode::from_code(10), Some(OperationMode::LowVoltage));
        assert_eq!(OperationMode::from_code(11), None);
        assert_eq!(OperationMode::SlowCombustion.code(), 9);
    }

    #[test]
    fn test_active_alarms() {
        let quiet = AlarmState::default();
        assert!(!quiet.has_alarms());
        assert!(quiet.active_alarms().is_empty());

        let alarms = AlarmState {
            safety_alarm_count: 2,
            refill_alarm: true,
            ..Default::default()
        };
        assert!(alarms.has_alarms());
        assert_eq!(
            alarms.active_alarms(),
            vec![AlarmKind::Safety, AlarmKind::Refill]
        );
    }

    #[test]
    fn test_night_window_parse_and_contains() {
        let window = NightWindow::parse("22:00", "06:30").unwrap();
        assert_eq!(window.to_string(), "22:00-06:30");
        assert!(window.contains(NaiveTime::from_hms_opt(23, 15, 0).unwrap()));
        assert!(window.contains(NaiveTime::from_hms_opt(3, 0, 0).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));

        assert!(NightWindow::parse("25:00", "06:00").is_err());
        assert!(NightWindow::parse("22:00", "22:00").unwrap().is_empty());
    }

    #[test]
    fn test_oxygen_and_critical_flags() {
        let temps = Temperatures {
            stove_temperature_c: 520.0,
            room_temperature_c: 21.0,
            oxygen_percent: 20.0,
        };
        assert!(temps.stove_critical());
        assert!(temps.oxygen_optimal());
    }
}
