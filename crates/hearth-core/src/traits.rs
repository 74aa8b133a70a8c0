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

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_types::{NightWindow, StoveSnapshot};

use crate::errors::StoveResult;

/// Device access used by the coordinator and the command façade
///
/// Implementations own their retry policy: a returned `ConnectionFailed`
/// means retries are already exhausted.
#[async_trait]
pub trait StoveTransport: Send + Sync {
    /// Fetch and decode the full telemetry payload
    async fn fetch_snapshot(&self) -> StoveResult<StoveSnapshot>;

    async fn set_burn_level(&self, level: u8) -> StoveResult<()>;

    async fn start_combustion(&self) -> StoveResult<()>;

    async fn set_night_window(&self, window: NightWindow) -> StoveResult<()>;

    /// Release the connection resource; must be idempotent
    async fn close(&self);
}

/// User-facing notification, deduplicated by key on the receiving side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub dedupe_key: String,
}

/// Sink for maintenance and alarm notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Wall clock, injectable for deterministic tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Notifier that drops everything; for setups without a notification channel
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, notification: Notification) {
        tracing::trace!(key = %notification.dedupe_key, "Dropping notification");
    }
}
