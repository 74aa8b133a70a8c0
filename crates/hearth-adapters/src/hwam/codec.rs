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

//! Decoder for the `/get_stove_data` payload
//!
//! The device reports everything as flat integer keys: temperatures in
//! hundredths of a degree, booleans as 0/1, dates and times split across
//! several keys. [`decode`] validates every field and assembles a
//! [`StoveSnapshot`], or reports the first offending key.

use chrono::{NaiveDate, NaiveTime};
use hearth_types::{
    AlarmState, DecodeError, NightWindow, OperationMode, OperationalState, Phase, Schedule,
    StoveSnapshot, SystemInfo, Temperatures, ValvePositions,
};
use serde_json::{Map, Value};
use std::time::Duration;

const STOVE_TEMPERATURE_RANGE: (f64, f64) = (0.0, 800.0);
const ROOM_TEMPERATURE_RANGE: (f64, f64) = (-20.0, 50.0);
const OXYGEN_RANGE: (f64, f64) = (0.0, 100.0);
const PERCENT_RANGE: (i64, i64) = (0, 100);

/// Decode a raw telemetry payload; pure, performs no I/O
pub fn decode(raw: &Value) -> Result<StoveSnapshot, DecodeError> {
    let fields = Fields::new(raw)?;

    Ok(StoveSnapshot {
        system_info: decode_system_info(&fields)?,
        operational_state: decode_operational_state(&fields)?,
        alarm_state: decode_alarm_state(&fields)?,
        temperatures: decode_temperatures(&fields)?,
        valve_positions: ValvePositions {
            valve1_percent: fields.percent("valve1_position")?,
            valve2_percent: fields.percent("valve2_position")?,
            valve3_percent: fields.percent("valve3_position")?,
        },
        schedule: decode_schedule(&fields)?,
    })
}

fn decode_system_info(fields: &Fields<'_>) -> Result<SystemInfo, DecodeError> {
    let service_date = fields.text("service_date")?;
    let service_date = NaiveDate::parse_from_str(service_date, "%Y-%m-%d").map_err(|e| {
        DecodeError::MalformedValue {
            field: "service_date".to_owned(),
            reason: format!("expected YYYY-MM-DD, got {service_date:?}: {e}"),
        }
    })?;

    Ok(SystemInfo {
        algorithm: fields.text("algorithm")?.to_owned(),
        firmware_version: fields.version("version")?,
        wifi_version: fields.version("wifi_version")?,
        remote_version: fields.version("remote_version")?,
        service_date,
    })
}

fn decode_operational_state(fields: &Fields<'_>) -> Result<OperationalState, DecodeError> {
    let phase_code = fields.bounded("phase", 1, 5)?;
    let phase = Phase::from_code(phase_code as u8).ok_or_else(|| DecodeError::MalformedValue {
        field: "phase".to_owned(),
        reason: format!("unknown phase code {phase_code}"),
    })?;

    let mode_code = fields.bounded("operation_mode", 0, 10)?;
    let operation_mode =
        OperationMode::from_code(mode_code as u8).ok_or_else(|| DecodeError::MalformedValue {
            field: "operation_mode".to_owned(),
            reason: format!("unknown operation mode {mode_code}"),
        })?;

    Ok(OperationalState {
        phase,
        burn_level: fields.bounded("burn_level", 0, 5)? as u8,
        operation_mode,
        door_open: fields.flag("door_open")?,
        updating: fields.flag("updating")?,
        night_lowering_active: fields.flag("night_lowering")?,
    })
}

fn decode_alarm_state(fields: &Fields<'_>) -> Result<AlarmState, DecodeError> {
    Ok(AlarmState {
        maintenance_alarm_count: fields.count("maintenance_alarms")?,
        safety_alarm_count: fields.count("safety_alarms")?,
        refill_alarm: fields.flag("refill_alarm")?,
        remote_refill_alarm: fields.flag("remote_refill_alarm")?,
        remote_refill_beep_count: fields.count("remote_refill_beeps")?,
    })
}

fn decode_temperatures(fields: &Fields<'_>) -> Result<Temperatures, DecodeError> {
    Ok(Temperatures {
        stove_temperature_c: fields.centi("stove_temperature", STOVE_TEMPERATURE_RANGE)?,
        room_temperature_c: fields.centi("room_temperature", ROOM_TEMPERATURE_RANGE)?,
        oxygen_percent: fields.centi("oxygen_level", OXYGEN_RANGE)?,
    })
}

fn decode_schedule(fields: &Fields<'_>) -> Result<Schedule, DecodeError> {
    let night_window = NightWindow::new(
        fields.time_of_day("night_begin_hour", "night_begin_minute")?,
        fields.time_of_day("night_end_hour", "night_end_minute")?,
    );

    let year = fields.int("year")?;
    let month = fields.bounded("month", 1, 12)?;
    let day = fields.bounded("day", 1, 31)?;
    let date = i32::try_from(year)
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, month as u32, day as u32))
        .ok_or_else(|| DecodeError::MalformedValue {
            field: "day".to_owned(),
            reason: format!("{year:04}-{month:02}-{day:02} is not a calendar date"),
        })?;
    let clock = NaiveTime::from_hms_opt(
        fields.bounded("hours", 0, 23)? as u32,
        fields.bounded("minutes", 0, 59)? as u32,
        fields.bounded("seconds", 0, 59)? as u32,
    )
    .ok_or_else(|| DecodeError::MalformedValue {
        field: "seconds".to_owned(),
        reason: "invalid time of day".to_owned(),
    })?;

    let since_remote = fields.bounded("time_since_remote_msg", 0, i64::from(u32::MAX))?;
    let firewood_hours = fields.bounded("new_fire_wood_hours", 0, 23)?;
    let firewood_minutes = fields.bounded("new_fire_wood_minutes", 0, 59)?;

    Ok(Schedule {
        night_window,
        device_time: date.and_time(clock),
        time_since_remote_msg: Duration::from_secs(since_remote as u64),
        new_firewood_in: Duration::from_secs(
            (firewood_hours * 3600 + firewood_minutes * 60) as u64,
        ),
    })
}

/// Typed accessors over the raw JSON object
struct Fields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn new(raw: &'a Value) -> Result<Self, DecodeError> {
        raw.as_object()
            .map(|map| Self { map })
            .ok_or_else(|| DecodeError::MalformedValue {
                field: "payload".to_owned(),
                reason: format!("expected a JSON object, got {}", json_kind(raw)),
            })
    }

    fn get(&self, key: &str) -> Result<&'a Value, DecodeError> {
        self.map
            .get(key)
            .ok_or_else(|| DecodeError::MissingField(key.to_owned()))
    }

    fn int(&self, key: &str) -> Result<i64, DecodeError> {
        let value = self.get(key)?;
        value.as_i64().ok_or_else(|| DecodeError::MalformedValue {
            field: key.to_owned(),
            reason: format!("expected an integer, got {value}"),
        })
    }

    fn bounded(&self, key: &str, min: i64, max: i64) -> Result<i64, DecodeError> {
        let value = self.int(key)?;
        if (min..=max).contains(&value) {
            Ok(value)
        } else {
            Err(DecodeError::OutOfRange {
                field: key.to_owned(),
                value: value as f64,
                min: min as f64,
                max: max as f64,
            })
        }
    }

    fn count(&self, key: &str) -> Result<u32, DecodeError> {
        Ok(self.bounded(key, 0, i64::from(u32::MAX))? as u32)
    }

    fn percent(&self, key: &str) -> Result<u8, DecodeError> {
        Ok(self.bounded(key, PERCENT_RANGE.0, PERCENT_RANGE.1)? as u8)
    }

    /// 0/1 encoded boolean; anything else is rejected
    fn flag(&self, key: &str) -> Result<bool, DecodeError> {
        Ok(self.bounded(key, 0, 1)? == 1)
    }

    /// Any JSON number, integer or float
    fn number(&self, key: &str) -> Result<f64, DecodeError> {
        let value = self.get(key)?;
        value.as_f64().ok_or_else(|| DecodeError::MalformedValue {
            field: key.to_owned(),
            reason: format!("expected a number, got {value}"),
        })
    }

    /// Hundredths range checked unrounded, then rounded to one decimal
    fn centi(&self, key: &str, (min, max): (f64, f64)) -> Result<f32, DecodeError> {
        let value = self.number(key)? / 100.0;
        if (min..=max).contains(&value) {
            Ok(((value * 10.0).round() / 10.0) as f32)
        } else {
            Err(DecodeError::OutOfRange {
                field: key.to_owned(),
                value,
                min,
                max,
            })
        }
    }

    fn text(&self, key: &str) -> Result<&'a str, DecodeError> {
        let value = self.get(key)?;
        value.as_str().ok_or_else(|| DecodeError::MalformedValue {
            field: key.to_owned(),
            reason: format!("expected a string, got {value}"),
        })
    }

    /// `<prefix>_major.<prefix>_minor.<prefix>_build`
    fn version(&self, prefix: &str) -> Result<String, DecodeError> {
        let major = self.int(&format!("{prefix}_major"))?;
        let minor = self.int(&format!("{prefix}_minor"))?;
        let build = self.int(&format!("{prefix}_build"))?;
        Ok(format!("{major}.{minor}.{build}"))
    }

    fn time_of_day(&self, hour_key: &str, minute_key: &str) -> Result<NaiveTime, DecodeError> {
        let hour = self.bounded(hour_key, 0, 23)?;
        let minute = self.bounded(minute_key, 0, 59)?;
        NaiveTime::from_hms_opt(hour as u32, minute as u32, 0).ok_or_else(|| {
            DecodeError::MalformedValue {
                field: hour_key.to_owned(),
                reason: format!("{hour}:{minute} is not a time of day"),
            }
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
