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

//! Hearth core: polling, caching, derived metrics and commands for HWAM stoves
//!
//! The device itself is reached through the [`StoveTransport`] trait; the
//! HTTP implementation lives in `hearth-adapters`.

pub mod alerts;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod descriptions;
pub mod errors;
pub mod history;
pub mod metrics;
pub mod registry;
pub mod traits;

pub use commands::{CommandFacade, validate_burn_level, validate_night_window};
pub use config::CoordinatorConfig;
pub use coordinator::{CoordinatorState, CoordinatorStatus, PollHandle, StoveCoordinator};
pub use descriptions::{FIELD_DESCRIPTIONS, FieldDescription, FieldKey, FieldKind, FieldValue};
pub use errors::{StoveError, StoveResult};
pub use history::HistoryRing;
pub use metrics::PredictionSettings;
pub use registry::CoordinatorRegistry;
pub use traits::{Clock, Notification, Notifier, NullNotifier, StoveTransport, SystemClock};
