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

use chrono::{DateTime, Duration, Utc};
use hearth_core::{Notification, Notifier};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Notifier that writes to the log, suppressing repeats of the same key
#[derive(Debug)]
pub struct LogNotifier {
    quiet_period: Duration,
    last_sent: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}

impl LogNotifier {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    /// Record the notification; false when the key was sent within the quiet period
    fn should_send(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut last_sent = self.last_sent.lock();
        let recently_sent = last_sent
            .get(key)
            .is_some_and(|last| now.signed_duration_since(*last) < self.quiet_period);
        if !recently_sent {
            last_sent.insert(key.to_owned(), now);
        }
        !recently_sent
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        if !self.should_send(&notification.dedupe_key, Utc::now()) {
            debug!(key = %notification.dedupe_key, "Notification suppressed");
            return;
        }
        warn!(
            key = %notification.dedupe_key,
            title = %notification.title,
            "{}",
            notification.message
        );
    }
}
