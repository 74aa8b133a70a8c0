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

use thiserror::Error;

/// Reasons a raw telemetry payload is rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("missing field: {0}")]
    MissingField(String),

    #[error("field {field} out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("malformed value for {field}: {reason}")]
    MalformedValue { field: String, reason: String },
}

impl DecodeError {
    /// Name of the raw key that caused the failure
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField(field)
            | Self::OutOfRange { field, .. }
            | Self::MalformedValue { field, .. } => field,
        }
    }
}
