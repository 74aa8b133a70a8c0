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

//! Command façade
//!
//! Every command validates its input, issues exactly one transport call and,
//! on success, refreshes through the coordinator so the cached snapshot
//! reflects the command before the call returns.

use hearth_types::{NightWindow, StoveSnapshot};
use std::sync::Arc;
use tracing::{info, warn};

use crate::coordinator::StoveCoordinator;
use crate::errors::{StoveError, StoveResult};

pub const MIN_BURN_LEVEL: u8 = 0;
pub const MAX_BURN_LEVEL: u8 = 5;

/// Reject burn levels outside 0-5
pub fn validate_burn_level(level: i64) -> StoveResult<u8> {
    u8::try_from(level)
        .ok()
        .filter(|l| (MIN_BURN_LEVEL..=MAX_BURN_LEVEL).contains(l))
        .ok_or_else(|| {
            StoveError::Validation(format!(
                "burn level must be between {MIN_BURN_LEVEL} and {MAX_BURN_LEVEL}, got {level}"
            ))
        })
}

/// Reject zero-length night windows
pub fn validate_night_window(window: NightWindow) -> StoveResult<NightWindow> {
    if window.is_empty() {
        return Err(StoveError::Validation(format!(
            "night window {window} has no duration"
        )));
    }
    Ok(window)
}

#[derive(Debug, Clone)]
pub struct CommandFacade {
    coordinator: Arc<StoveCoordinator>,
}

impl CommandFacade {
    pub fn new(coordinator: Arc<StoveCoordinator>) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Arc<StoveCoordinator> {
        &self.coordinator
    }

    pub async fn submit_burn_level(&self, level: i64) -> StoveResult<Arc<StoveSnapshot>> {
        let level = validate_burn_level(level).inspect_err(|e| {
            warn!(device = %self.coordinator.name(), error = %e, "Burn level rejected");
        })?;

        self.coordinator.transport().set_burn_level(level).await?;
        info!(device = %self.coordinator.name(), level, "Burn level set");
        self.coordinator.refresh_after_command().await
    }

    pub async fn submit_start_combustion(&self) -> StoveResult<Arc<StoveSnapshot>> {
        self.coordinator.transport().start_combustion().await?;
        info!(device = %self.coordinator.name(), "Combustion started");
        self.coordinator.refresh_after_command().await
    }

    pub async fn submit_night_window(
        &self,
        window: NightWindow,
    ) -> StoveResult<Arc<StoveSnapshot>> {
        let window = validate_night_window(window)?;

        self.coordinator.transport().set_night_window(window).await?;
        info!(device = %self.coordinator.name(), window = %window, "Night window set");
        self.coordinator.refresh_after_command().await
    }

    /// Parse "HH:MM" begin and end times, then submit the window
    pub async fn submit_night_window_str(
        &self,
        begin: &str,
        end: &str,
    ) -> StoveResult<Arc<StoveSnapshot>> {
        let window = NightWindow::parse(begin, end).map_err(|e| {
            StoveError::Validation(format!("invalid night window {begin}-{end}: {e}"))
        })?;
        self.submit_night_window(window).await
    }
}
