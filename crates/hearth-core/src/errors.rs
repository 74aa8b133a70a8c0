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

use hearth_types::DecodeError;
use thiserror::Error;

/// Failure taxonomy shared by the transport, the coordinator and the command façade
///
/// Cloneable so one refresh outcome can be handed to every coalesced waiter;
/// transport library errors are flattened to their message at the boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoveError {
    #[error("connection to {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("authentication failed for {endpoint}")]
    AuthenticationFailed { endpoint: String },

    #[error("invalid response from {endpoint}: status {status}")]
    InvalidResponse { endpoint: String, status: u16 },

    #[error("malformed body from {endpoint}: {reason}")]
    MalformedBody { endpoint: String, reason: String },

    #[error("stove rejected command {endpoint}: {reply}")]
    CommandRejected { endpoint: String, reply: String },

    #[error("telemetry decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("client closed")]
    Closed,

    #[error("configuration error: {0}")]
    Config(String),
}

impl StoveError {
    /// Only network-level failures are worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidResponse { status, .. } => Some(*status),
            Self::ConnectionFailed { .. }
            | Self::AuthenticationFailed { .. }
            | Self::MalformedBody { .. }
            | Self::CommandRejected { .. }
            | Self::Decode(_)
            | Self::Validation(_)
            | Self::Closed
            | Self::Config(_) => None,
        }
    }
}

pub type StoveResult<T> = Result<T, StoveError>;
