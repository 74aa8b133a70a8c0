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

//! Process configuration: `[stove]`, `[coordinator]` and `log_level`

use anyhow::{Context, Result};
use hearth_adapters::StoveClientConfig;
use hearth_core::CoordinatorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "hearth.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub stove: StoveClientConfig,

    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    /// Tracing filter directive, e.g. "debug" or "hearth_core=trace"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Where the configuration came from, logged once tracing is up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Environment,
}

impl AppConfig {
    /// Load from a TOML file, or from defaults plus environment overrides
    /// when the file does not exist
    pub fn load(path: &Path) -> Result<(Self, ConfigSource)> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config = Self::from_toml(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            config.validate()?;
            return Ok((config, ConfigSource::File));
        }

        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok((config, ConfigSource::Environment))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `HEARTH_*` overrides; unparseable values are ignored
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("HEARTH_HOST") {
            self.stove.host = host;
        }
        if let Some(username) = lookup("HEARTH_USERNAME") {
            self.stove.username = Some(username);
        }
        if let Some(password) = lookup("HEARTH_PASSWORD") {
            self.stove.password = Some(password);
        }
        if let Some(interval) = lookup("HEARTH_POLL_INTERVAL_SECS")
            && let Ok(secs) = interval.parse::<u64>()
        {
            self.coordinator.poll_interval_secs = secs;
        }
        if let Some(use_tls) = lookup("HEARTH_USE_TLS")
            && let Ok(enabled) = use_tls.parse::<bool>()
        {
            self.stove.use_tls = enabled;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.stove.validate().context("Invalid [stove] configuration")?;
        self.coordinator
            .validate()
            .context("Invalid [coordinator] configuration")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[stove]
host = "192.168.1.50"
username = "admin"
password = "secret"

[coordinator]
name = "Living room"
poll_interval_secs = 60
"#
        )
        .unwrap();

        let (config, source) = AppConfig::load(file.path()).unwrap();
        assert_eq!(source, ConfigSource::File);
        assert_eq!(config.stove.host, "192.168.1.50");
        assert_eq!(config.stove.username.as_deref(), Some("admin"));
        assert_eq!(config.stove.timeout_secs, 10);
        assert_eq!(config.coordinator.name, "Living room");
        assert_eq!(config.coordinator.poll_interval_secs, 60);
        assert_eq!(config.coordinator.history_capacity, 288);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_poll_interval_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hearth.toml");
        std::fs::write(
            &path,
            "[stove]\nhost = \"stove.local\"\n[coordinator]\npoll_interval_secs = 5\n",
        )
        .unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("at least 10 seconds"));
    }

    #[test]
    fn test_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hearth.toml");
        std::fs::write(&path, "[stove\nhost = ").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("HEARTH_HOST", "10.0.0.7"),
            ("HEARTH_USERNAME", "admin"),
            ("HEARTH_PASSWORD", "secret"),
            ("HEARTH_POLL_INTERVAL_SECS", "45"),
            ("HEARTH_USE_TLS", "true"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| (*v).to_owned()));

        assert_eq!(config.stove.host, "10.0.0.7");
        assert_eq!(config.stove.password.as_deref(), Some("secret"));
        assert_eq!(config.coordinator.poll_interval_secs, 45);
        assert!(config.stove.use_tls);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| match key {
            "HEARTH_POLL_INTERVAL_SECS" => Some("soon".to_owned()),
            "HEARTH_USE_TLS" => Some("maybe".to_owned()),
            _ => None,
        });
        assert_eq!(config.coordinator.poll_interval_secs, 30);
        assert!(!config.stove.use_tls);
        // No host anywhere
        assert!(config.validate().is_err());
    }
}
