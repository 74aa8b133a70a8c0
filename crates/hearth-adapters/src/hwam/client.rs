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
use hearth_core::{StoveError, StoveResult, StoveTransport, validate_burn_level};
use hearth_types::{NightWindow, StoveSnapshot};
use parking_lot::RwLock;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use super::codec::decode;
use super::config::StoveClientConfig;
use super::types::{
    BurnLevelRequest, CommandReply, ENDPOINT_GET_STOVE_DATA, ENDPOINT_SET_BURN_LEVEL,
    ENDPOINT_SET_NIGHT_TIME, ENDPOINT_START, NightTimeRequest,
};

/// Status line and, for a 200, the fully read body
struct RawReply {
    status: StatusCode,
    body: Option<Vec<u8>>,
}

/// HTTP client for the HWAM SmartControl local API
///
/// Holds one reusable connection pool. [`StoveClient::close`] releases it
/// when the client built it; a pool handed in through
/// [`StoveClient::with_http_client`] stays owned by the caller.
pub struct StoveClient {
    config: StoveClientConfig,
    base_url: String,
    http: RwLock<Option<Client>>,
    owns_http: bool,
    closed: AtomicBool,
}

impl fmt::Debug for StoveClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoveClient")
            .field("base_url", &self.base_url)
            .field("username", &self.config.username)
            .field("authenticated", &self.config.password.is_some())
            .field("owns_http", &self.owns_http)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl StoveClient {
    /// Create a client with its own connection pool
    pub fn new(config: StoveClientConfig) -> StoveResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.use_tls && !config.verify_tls)
            .build()
            .map_err(|e| StoveError::Config(format!("Failed to build HTTP client: {e}")))?;

        info!(base_url = %config.base_url(), "Initializing HWAM stove client");
        Ok(Self::assemble(config, http, true))
    }

    /// Create a client on top of a caller-owned connection pool
    ///
    /// The pool's own timeout applies in addition to the per-request one.
    pub fn with_http_client(config: StoveClientConfig, http: Client) -> StoveResult<Self> {
        config.validate()?;
        Ok(Self::assemble(config, http, false))
    }

    fn assemble(config: StoveClientConfig, http: Client, owns_http: bool) -> Self {
        Self {
            base_url: config.base_url(),
            config,
            http: RwLock::new(Some(http)),
            owns_http,
            closed: AtomicBool::new(false),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Send one request and return the JSON body of a 200 reply
    ///
    /// Connection failures are retried with exponential backoff; HTTP error
    /// statuses are not.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> StoveResult<Value> {
        let http = self.http_client()?;
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, endpoint = path, "Sending stove request");

        let reply = self
            .retry_request(path, || {
                let mut request = http
                    .request(method.clone(), &url)
                    .timeout(self.config.timeout())
                    .header(ACCEPT, "application/json");
                if let Some(username) = &self.config.username {
                    request = request.basic_auth(username, self.config.password.as_deref());
                }
                if let Some(body) = body {
                    request = request.json(body);
                }
                async move {
                    let response = request.send().await?;
                    let status = response.status();
                    // A body cut short is a transport failure and is retried
                    let body = if status == StatusCode::OK {
                        Some(response.bytes().await?.to_vec())
                    } else {
                        None
                    };
                    Ok::<_, reqwest::Error>(RawReply { status, body })
                }
            })
            .await?;

        match (reply.status, reply.body) {
            (StatusCode::OK, Some(body)) => {
                let value = serde_json::from_slice::<Value>(&body).map_err(|e| {
                    error!(endpoint = path, error = %e, "Stove returned an unreadable body");
                    StoveError::MalformedBody {
                        endpoint: path.to_owned(),
                        reason: e.to_string(),
                    }
                })?;
                trace!(endpoint = path, body = %value, "Stove response");
                Ok(value)
            }
            (StatusCode::UNAUTHORIZED, _) => {
                error!(endpoint = path, "Stove rejected credentials");
                Err(StoveError::AuthenticationFailed {
                    endpoint: path.to_owned(),
                })
            }
            (status, _) => {
                error!(endpoint = path, status = status.as_u16(), "Unexpected stove response");
                Err(StoveError::InvalidResponse {
                    endpoint: path.to_owned(),
                    status: status.as_u16(),
                })
            }
        }
    }

    pub async fn fetch_snapshot(&self) -> StoveResult<StoveSnapshot> {
        let raw = self
            .request(Method::GET, ENDPOINT_GET_STOVE_DATA, None)
            .await?;
        decode(&raw).map_err(|e| {
            warn!(field = e.field(), error = %e, "Rejected stove telemetry");
            StoveError::from(e)
        })
    }

    /// Set the burn level (0-5); out-of-range levels never reach the stove
    pub async fn set_burn_level(&self, level: u8) -> StoveResult<()> {
        let level = validate_burn_level(i64::from(level))?;
        let body = serde_json::to_value(BurnLevelRequest { level }).map_err(|e| {
            StoveError::Validation(format!("Failed to encode burn level request: {e}"))
        })?;
        self.command(Method::POST, ENDPOINT_SET_BURN_LEVEL, Some(&body))
            .await
    }

    pub async fn start_combustion(&self) -> StoveResult<()> {
        self.command(Method::GET, ENDPOINT_START, None).await
    }

    pub async fn set_night_window(&self, window: NightWindow) -> StoveResult<()> {
        let body = serde_json::to_value(NightTimeRequest::from(window)).map_err(|e| {
            StoveError::Validation(format!("Failed to encode night window request: {e}"))
        })?;
        self.command(Method::POST, ENDPOINT_SET_NIGHT_TIME, Some(&body))
            .await
    }

    /// Whether the stove answers with decodable telemetry
    pub async fn test_connection(&self) -> bool {
        match self.fetch_snapshot().await {
            Ok(_) => {
                debug!(base_url = %self.base_url, "Connection test passed");
                true
            }
            Err(e) => {
                warn!(base_url = %self.base_url, error = %e, "Connection test failed");
                false
            }
        }
    }

    /// Release the connection pool if this client created it; idempotent
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let http = self.http.write().take();
        if self.owns_http {
            drop(http);
            debug!(base_url = %self.base_url, "Closed stove HTTP client");
        } else {
            debug!(base_url = %self.base_url, "Detached from caller-owned HTTP client");
        }
    }

    async fn command(&self, method: Method, path: &str, body: Option<&Value>) -> StoveResult<()> {
        let reply = self.request(method, path, body).await?;
        let accepted = serde_json::from_value::<CommandReply>(reply.clone())
            .is_ok_and(|r| r.is_ok());
        if accepted {
            info!(endpoint = path, "Stove accepted command");
            Ok(())
        } else {
            warn!(endpoint = path, reply = %reply, "Stove rejected command");
            Err(StoveError::CommandRejected {
                endpoint: path.to_owned(),
                reply: reply.to_string(),
            })
        }
    }

    fn http_client(&self) -> StoveResult<Client> {
        if self.is_closed() {
            return Err(StoveError::Closed);
        }
        self.http.read().clone().ok_or(StoveError::Closed)
    }

    /// Retry on transport errors with doubling, capped delay
    async fn retry_request<T, F, Fut>(&self, path: &str, mut request_fn: F) -> StoveResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, reqwest::Error>>,
    {
        let max_attempts = self.config.max_retries.max(1);
        let max_delay = self.config.retry_max_delay();
        let mut delay = self.config.retry_base_delay();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match request_fn().await {
                Ok(reply) => return Ok(reply),
                Err(e) if attempts >= max_attempts => {
                    error!(
                        endpoint = path,
                        attempts,
                        error = %e,
                        "Stove request failed"
                    );
                    return Err(StoveError::ConnectionFailed {
                        endpoint: path.to_owned(),
                        reason: describe_transport_error(&e),
                    });
                }
                Err(e) => {
                    warn!(
                        endpoint = path,
                        attempt = attempts,
                        max_attempts,
                        error = %e,
                        "Stove request failed, retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(max_delay);
                }
            }
        }
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("timed out: {error}")
    } else if error.is_connect() {
        format!("cannot connect: {error}")
    } else {
        error.to_string()
    }
}

#[async_trait]
impl StoveTransport for StoveClient {
    async fn fetch_snapshot(&self) -> StoveResult<StoveSnapshot> {
        StoveClient::fetch_snapshot(self).await
    }

    async fn set_burn_level(&self, level: u8) -> StoveResult<()> {
        StoveClient::set_burn_level(self, level).await
    }

    async fn start_combustion(&self) -> StoveResult<()> {
        StoveClient::start_combustion(self).await
    }

    async fn set_night_window(&self, window: NightWindow) -> StoveResult<()> {
        StoveClient::set_night_window(self, window).await
    }

    async fn close(&self) {
        StoveClient::close(self);
    }
}

/// Upper bound on the time a single request can spend in the retry loop
pub fn worst_case_request_time(config: &StoveClientConfig) -> Duration {
    let attempts = config.max_retries.max(1);
    let mut delay = config.retry_base_delay();
    let mut total = config.timeout() * attempts;
    for _ in 1..attempts {
        total += delay;
        delay = (delay * 2).min(config.retry_max_delay());
    }
    total
}
