//! Configuration for the session browser, LAN source and announcer.
//!
//! Every section is `#[serde(default)]`, so a config file only needs the
//! values that differ.

use std::{fs, io, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DEFAULT_APP_VERSION, DEFAULT_MAX_PLAYERS};

/// Complete lobby client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    /// Sent with every join request; only equal versions meet.
    pub app_version: String,
    /// Session size when hosting or quick-joining.
    pub default_max_players: u16,
    pub browser: BrowserConfig,
    pub lan: LanConfig,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            app_version: DEFAULT_APP_VERSION.into(),
            default_max_players: DEFAULT_MAX_PLAYERS,
            browser: BrowserConfig::default(),
            lan: LanConfig::default(),
        }
    }
}

impl LobbyConfig {
    /// Loads a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the config, e.g. to write a template.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.browser.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "browser.refresh_interval_ms must be greater than 0".into(),
            ));
        }
        self.lan.validate()
    }
}

/// Session list settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// How often the view is recomputed.
    pub refresh_interval_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 2_000,
        }
    }
}

impl BrowserConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

/// LAN visibility (source and announcer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanConfig {
    pub enabled: bool,
    pub port: u16,
    /// A session silent for this long drops out of the list.
    pub entry_ttl_ms: u64,
    pub prune_interval_ms: u64,
    pub announce_interval_ms: u64,
}

impl Default for LanConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 50_000,
            entry_ttl_ms: 6_000,
            prune_interval_ms: 2_000,
            announce_interval_ms: 750,
        }
    }
}

impl LanConfig {
    pub fn entry_ttl(&self) -> Duration {
        Duration::from_millis(self.entry_ttl_ms)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_millis(self.prune_interval_ms)
    }

    pub fn announce_interval(&self) -> Duration {
        Duration::from_millis(self.announce_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("lan.port must not be 0".into()));
        }
        if self.entry_ttl_ms == 0 {
            return Err(ConfigError::Invalid(
                "lan.entry_ttl_ms must be greater than 0".into(),
            ));
        }
        if self.prune_interval_ms == 0 || self.announce_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "lan intervals must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Errors while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("toml serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = LobbyConfig::from_toml_str("").unwrap();
        assert_eq!(config, LobbyConfig::default());
        assert_eq!(config.app_version, "1.0.0");
        assert_eq!(config.default_max_players, 10);
        assert_eq!(config.browser.refresh_interval(), Duration::from_secs(2));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = LobbyConfig::from_toml_str(
            r#"
            [lan]
            port = 41000
            "#,
        )
        .unwrap();
        assert_eq!(config.lan.port, 41_000);
        assert_eq!(config.lan.entry_ttl_ms, 6_000);
        assert!(config.lan.enabled);
    }

    #[test]
    fn zero_port_is_rejected() {
        let err = LobbyConfig::from_toml_str("[lan]\nport = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        let err =
            LobbyConfig::from_toml_str("[browser]\nrefresh_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = LobbyConfig::from_toml_str("[lan\nport = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LobbyConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, LobbyConfig::default());
    }

    #[test]
    fn load_reads_written_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lobby.toml");
        let mut config = LobbyConfig::default();
        config.app_version = "2.1.0".into();
        config.lan.announce_interval_ms = 500;
        fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        assert_eq!(LobbyConfig::load(&path).unwrap(), config);
    }
}
