//! Configuration management
//!
//! Handles connection tuning options and loading configuration from
//! TOML files.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::ConnectionError;

/// Well-known option keys with typed accessors
pub mod options {
    /// Inactivity timeout in seconds
    pub const TIMEOUT: &str = "timeout";
    /// Dial/handshake timeout in seconds
    pub const CONNECT_TIMEOUT: &str = "connect_timeout";
    /// Keep-alive probe interval in seconds
    pub const KEEP_ALIVE_INTERVAL: &str = "keep_alive_interval";
    /// Capacity of the broadcast event channel
    pub const EVENT_BUFFER: &str = "event_buffer";
}

/// A single configuration option value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as float (integers widen)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Connection tuning options
///
/// An open key/value record fixed at connection construction. Known
/// options have typed accessors with defaults; unknown keys are carried
/// through untouched and never rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ConnectionConfiguration {
    entries: BTreeMap<String, OptionValue>,
}

impl ConnectionConfiguration {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an option, replacing any previous value for the key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`set`](Self::set)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Read an option by key
    ///
    /// Unknown keys yield `None`, never an error.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    /// Check whether a key is set
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of stored options
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no options are stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over stored options in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Inactivity timeout
    pub fn timeout(&self) -> Duration {
        self.duration_option(options::TIMEOUT)
            .unwrap_or_else(default_timeout)
    }

    /// Dial/handshake timeout
    pub fn connect_timeout(&self) -> Duration {
        self.duration_option(options::CONNECT_TIMEOUT)
            .unwrap_or_else(default_connect_timeout)
    }

    /// Keep-alive probe interval
    pub fn keep_alive_interval(&self) -> Duration {
        self.duration_option(options::KEEP_ALIVE_INTERVAL)
            .unwrap_or_else(default_keep_alive_interval)
    }

    /// Capacity of the broadcast event channel
    pub fn event_buffer(&self) -> usize {
        self.get(options::EVENT_BUFFER)
            .and_then(OptionValue::as_i64)
            .filter(|v| *v > 0)
            .map(|v| v as usize)
            .unwrap_or_else(default_event_buffer)
    }

    fn duration_option(&self, key: &str) -> Option<Duration> {
        self.get(key)
            .and_then(OptionValue::as_i64)
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs as u64))
    }

    /// Validate typed options
    ///
    /// Known keys, when present, must carry an integer number of seconds
    /// (or slots) greater than zero. Unknown keys are always permitted.
    pub fn validate(&self) -> std::result::Result<(), ConnectionError> {
        const SECONDS_KEYS: [&str; 3] = [
            options::TIMEOUT,
            options::CONNECT_TIMEOUT,
            options::KEEP_ALIVE_INTERVAL,
        ];

        for key in SECONDS_KEYS {
            if let Some(value) = self.get(key) {
                match value.as_i64() {
                    Some(secs) if secs > 0 => {}
                    Some(secs) => {
                        return Err(ConnectionError::InvalidConfiguration(format!(
                            "{key} must be > 0 (got {secs})"
                        )));
                    }
                    None => {
                        return Err(ConnectionError::InvalidConfiguration(format!(
                            "{key} must be an integer number of seconds (got {})",
                            value.type_name()
                        )));
                    }
                }
            }
        }

        if let Some(value) = self.get(options::EVENT_BUFFER) {
            match value.as_i64() {
                Some(slots) if slots > 0 => {}
                _ => {
                    return Err(ConnectionError::InvalidConfiguration(format!(
                        "{} must be a positive integer",
                        options::EVENT_BUFFER
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Connection tuning options
    #[serde(default)]
    pub connection: ConnectionConfiguration,
    /// Logging setup
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// Default value functions
fn default_timeout() -> Duration {
    Duration::from_secs(30)
}
fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}
fn default_keep_alive_interval() -> Duration {
    Duration::from_secs(15)
}
fn default_event_buffer() -> usize {
    64
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config =
            toml::from_str(&contents).with_context(|| "Failed to parse config file")?;

        config.connection.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_roundtrip() {
        let mut cfg = ConnectionConfiguration::new();
        assert!(cfg.is_empty());
        assert_eq!(cfg.get("timeout"), None);

        cfg.set("timeout", 30);
        cfg.set("label", "primary");
        assert_eq!(cfg.get("timeout"), Some(&OptionValue::Integer(30)));
        assert_eq!(cfg.get("label").and_then(OptionValue::as_str), Some("primary"));
        assert_eq!(cfg.len(), 2);
    }

    #[test]
    fn test_unknown_keys_permitted() {
        let cfg = ConnectionConfiguration::new()
            .with("x-custom-flag", true)
            .with("timeout", 5);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.get("x-custom-flag").and_then(OptionValue::as_bool), Some(true));
        assert_eq!(cfg.get("never-set"), None);
    }

    #[test]
    fn test_typed_accessor_defaults() {
        let cfg = ConnectionConfiguration::new();
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.keep_alive_interval(), Duration::from_secs(15));
        assert_eq!(cfg.event_buffer(), 64);

        let cfg = cfg.with("timeout", 120).with("event_buffer", 8);
        assert_eq!(cfg.timeout(), Duration::from_secs(120));
        assert_eq!(cfg.event_buffer(), 8);
    }

    #[test]
    fn test_validate_rejects_bad_typed_options() {
        let cfg = ConnectionConfiguration::new().with("timeout", 0);
        assert!(cfg.validate().is_err());

        let cfg = ConnectionConfiguration::new().with("timeout", "soon");
        assert!(cfg.validate().is_err());

        let cfg = ConnectionConfiguration::new().with("event_buffer", -4);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_parse_from_toml() {
        let raw = r#"
            [connection]
            timeout = 45
            keep_alive_interval = 20
            region = "eu-west"

            [logging]
            level = "debug"
            format = "json"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.connection.timeout(), Duration::from_secs(45));
        assert_eq!(
            config.connection.get("region").and_then(OptionValue::as_str),
            Some("eu-west")
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_copy_semantics() {
        let original = ConnectionConfiguration::new().with("timeout", 30);
        let mut retained = original.clone();
        retained.set("timeout", 99);

        // The handed-off copy is unaffected by later caller mutations.
        assert_eq!(original.get("timeout"), Some(&OptionValue::Integer(30)));
        assert_ne!(original, retained);
    }
}
