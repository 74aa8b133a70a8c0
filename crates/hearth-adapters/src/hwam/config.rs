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

//! Connection settings for one stove

use hearth_core::{StoveError, StoveResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

fn default_true() -> bool {
    true
}

fn default_10() -> u64 {
    10
}

fn default_3() -> u32 {
    3
}

fn default_500() -> u64 {
    500
}

fn default_5000() -> u64 {
    5000
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoveClientConfig {
    /// Hostname or IP of the stove, optionally with a port
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub use_tls: bool,

    /// Reject self-signed certificates when `use_tls` is set
    #[serde(default = "default_true")]
    pub verify_tls: bool,

    /// Basic auth user (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(default = "default_10")]
    pub timeout_secs: u64,

    /// Attempts per request, including the first one
    #[serde(default = "default_3")]
    pub max_retries: u32,

    #[serde(default = "default_500")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_5000")]
    pub retry_max_delay_ms: u64,

    /// Full base URL, overrides `host`/`use_tls` (for tests and proxies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for StoveClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            use_tls: false,
            verify_tls: true,
            username: None,
            password: None,
            timeout_secs: 10,
            max_retries: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 5000,
            base_url: None,
        }
    }
}

impl fmt::Debug for StoveClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoveClientConfig")
            .field("host", &self.host)
            .field("use_tls", &self.use_tls)
            .field("verify_tls", &self.verify_tls)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl StoveClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Point the client at an explicit URL, e.g. a mock server
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_retry(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay_ms = base_delay.as_millis() as u64;
        self
    }

    pub fn base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_owned();
        }
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}", self.host.trim().trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms.max(self.retry_base_delay_ms))
    }

    pub fn validate(&self) -> StoveResult<()> {
        if self.base_url.is_none() && self.host.trim().is_empty() {
            return Err(StoveError::Config("stove host must be set".to_owned()));
        }
        if self.timeout_secs == 0 {
            return Err(StoveError::Config("timeout_secs must be positive".to_owned()));
        }
        if self.max_retries == 0 {
            return Err(StoveError::Config("max_retries must be at least 1".to_owned()));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(StoveError::Config(
                "password given without username".to_owned(),
            ));
        }
        Ok(())
    }
}
