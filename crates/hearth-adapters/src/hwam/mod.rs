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

//! HWAM SmartControl local HTTP API

pub mod client;
pub mod codec;
pub mod config;
pub mod types;

pub use client::{StoveClient, worst_case_request_time};
pub use codec::decode;
pub use config::StoveClientConfig;
pub use types::{BurnLevelRequest, CommandReply, NightTimeRequest};
