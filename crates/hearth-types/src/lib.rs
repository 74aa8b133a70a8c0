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

//! Shared domain types for Hearth.
//!
//! Everything in this crate is plain data: the validated stove snapshot, the
//! rolling history sample and the derived prediction bundle. Decoding and I/O
//! live in `hearth-adapters`, the polling logic in `hearth-core`.

pub mod error;
pub mod history;
pub mod stove;

pub use error::DecodeError;
pub use history::{HistorySample, PredictionBundle, TemperatureTrend};
pub use stove::{
    AlarmKind, AlarmState, NightWindow, OperationMode, OperationalState, Phase, Schedule,
    StoveSnapshot, SystemInfo, Temperatures, ValvePositions,
};
