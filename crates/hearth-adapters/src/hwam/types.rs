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

use chrono::Timelike;
use hearth_types::NightWindow;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_GET_STOVE_DATA: &str = "/get_stove_data";
pub const ENDPOINT_START: &str = "/start";
pub const ENDPOINT_SET_BURN_LEVEL: &str = "/set_burn_level";
pub const ENDPOINT_SET_NIGHT_TIME: &str = "/set_night_time";

/// Body of `POST /set_burn_level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BurnLevelRequest {
    pub level: u8,
}

/// Body of `POST /set_night_time`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NightTimeRequest {
    pub begin_hour: u32,
    pub begin_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
}

impl From<NightWindow> for NightTimeRequest {
    fn from(window: NightWindow) -> Self {
        Self {
            begin_hour: window.begin.hour(),
            begin_minute: window.begin.minute(),
            end_hour: window.end.hour(),
            end_minute: window.end.minute(),
        }
    }
}

/// Reply to every command endpoint, `{"response": "OK"}` on success
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandReply {
    #[serde(default)]
    pub response: Option<String>,
}

impl CommandReply {
    pub fn is_ok(&self) -> bool {
        self.response.as_deref() == Some("OK")
    }
}
