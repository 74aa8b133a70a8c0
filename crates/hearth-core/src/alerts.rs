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

//! Maintenance and alarm side-effect checks run after each successful poll

use chrono::{DateTime, Utc};
use hearth_types::StoveSnapshot;
use tracing::{debug, info};

use crate::traits::Notification;

/// Lowercase, underscore-separated form of a device name for dedupe keys
pub fn device_slug(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if slug.is_empty() {
        "stove".to_owned()
    } else {
        slug
    }
}

/// Hours elapsed between the last service date and `now`
pub fn hours_since_service(snapshot: &StoveSnapshot, now: DateTime<Utc>) -> i64 {
    let service_start = snapshot
        .system_info
        .service_date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc());
    service_start.map_or(0, |start| now.signed_duration_since(start).num_hours())
}

/// Rate-limited service-age check
#[derive(Debug, Clone)]
pub struct MaintenanceMonitor {
    device_name: String,
    threshold_hours: u64,
    check_interval: chrono::Duration,
    last_check: Option<DateTime<Utc>>,
}

impl MaintenanceMonitor {
    pub fn new(device_name: &str, threshold_hours: u64, check_interval: chrono::Duration) -> Self {
        Self {
            device_name: device_name.to_owned(),
            threshold_hours,
            check_interval,
            last_check: None,
        }
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }

    pub fn is_due(&self, snapshot: &StoveSnapshot, now: DateTime<Utc>) -> bool {
        let threshold = i64::try_from(self.threshold_hours).unwrap_or(i64::MAX);
        hours_since_service(snapshot, now) > threshold
    }

    /// Runs at most once per check interval; returns a notification when service is overdue
    pub fn check(&mut self, snapshot: &StoveSnapshot, now: DateTime<Utc>) -> Option<Notification> {
        if let Some(last) = self.last_check
            && now.signed_duration_since(last) < self.check_interval
        {
            return None;
        }
        self.last_check = Some(now);

        let hours = hours_since_service(snapshot, now);
        if !self.is_due(snapshot, now) {
            debug!(
                hours_since_service = hours,
                threshold = self.threshold_hours,
                "Maintenance not due"
            );
            return None;
        }

        info!(
            device = %self.device_name,
            hours_since_service = hours,
            "Maintenance overdue"
        );
        let days = self.threshold_hours / 24;
        Some(Notification {
            title: "HWAM maintenance recommended".to_owned(),
            message: format!(
                "Your HWAM stove {} has passed {days} days since its last service ({}). A service visit is recommended.",
                self.device_name, snapshot.system_info.service_date
            ),
            dedupe_key: format!("hearth_maintenance_{}", device_slug(&self.device_name)),
        })
    }
}

/// Notifications for alarms that became active since the previous snapshot
pub fn alarm_notifications(
    previous: Option<&StoveSnapshot>,
    current: &StoveSnapshot,
    device_name: &str,
) -> Vec<Notification> {
    let slug = device_slug(device_name);
    let before = previous.map(|p| p.alarm_state).unwrap_or_default();
    let now = current.alarm_state;
    let mut notifications = Vec::new();

    if now.safety_alarm_count > 0 && before.safety_alarm_count == 0 {
        notifications.push(Notification {
            title: "HWAM safety alarm".to_owned(),
            message: format!(
                "{device_name} reports {} safety alarm(s). Stove temperature {:.1} °C.",
                now.safety_alarm_count, current.temperatures.stove_temperature_c
            ),
            dedupe_key: format!("hearth_safety_{slug}"),
        });
    }

    if now.refill_alarm && !before.refill_alarm {
        notifications.push(Notification {
            title: "HWAM refill needed".to_owned(),
            message: format!("{device_name} needs new firewood."),
            dedupe_key: format!("hearth_refill_{slug}"),
        });
    }

    notifications
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_snapshot;
    use chrono::{NaiveDate, TimeZone};

    fn snapshot_serviced_on(date: NaiveDate) -> StoveSnapshot {
        let mut snapshot = sample_snapshot(245.0);
        snapshot.system_info.service_date = date;
        snapshot
    }

    #[test]
    fn test_device_slug() {
        assert_eq!(device_slug("Living Room Stove"), "living_room_stove");
        assert_eq!(device_slug("  "), "stove");
    }

    #[test]
    fn test_maintenance_due_notification() {
        let mut monitor =
            MaintenanceMonitor::new("Living Room", 24 * 365, chrono::Duration::hours(24));
        let snapshot = snapshot_serviced_on(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();

        let notification = monitor.check(&snapshot, now).unwrap();
        assert_eq!(notification.dedupe_key, "hearth_maintenance_living_room");
        assert!(notification.message.contains("365 days"));
        assert_eq!(monitor.last_check(), Some(now));
    }

    #[test]
    fn test_maintenance_checked_once_per_day() {
        let mut monitor = MaintenanceMonitor::new("Stove", 24, chrono::Duration::hours(24));
        let snapshot = snapshot_serviced_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();

        assert!(monitor.check(&snapshot, now).is_some());
        assert!(monitor.check(&snapshot, now + chrono::Duration::hours(23)).is_none());
        assert!(monitor.check(&snapshot, now + chrono::Duration::hours(24)).is_some());
    }

    #[test]
    fn test_maintenance_not_due() {
        let mut monitor = MaintenanceMonitor::new("Stove", 24 * 365, chrono::Duration::hours(24));
        let snapshot = snapshot_serviced_on(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();

        assert!(monitor.check(&snapshot, now).is_none());
        // The check still counts against the daily budget
        assert_eq!(monitor.last_check(), Some(now));
    }

    #[test]
    fn test_alarm_rising_edges() {
        let quiet = sample_snapshot(245.0);
        let mut alarmed = sample_snapshot(245.0);
        alarmed.alarm_state.safety_alarm_count = 1;
        alarmed.alarm_state.refill_alarm = true;

        let notifications = alarm_notifications(Some(&quiet), &alarmed, "Stove");
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].dedupe_key, "hearth_safety_stove");
        assert_eq!(notifications[1].dedupe_key, "hearth_refill_stove");

        // Already active alarms are not repeated
        assert!(alarm_notifications(Some(&alarmed), &alarmed, "Stove").is_empty());
        // First snapshot with an active alarm notifies
        assert_eq!(alarm_notifications(None, &alarmed, "Stove").len(), 2);
    }
}
