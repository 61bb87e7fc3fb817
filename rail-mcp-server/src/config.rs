use std::str::FromStr;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_GRAPHQL_URL: &str = "http://localhost:4000/graphql";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PORT: u16 = 3002;

/// Response language requested from the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    #[default]
    En,
    De,
    Fr,
    It,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EN" => Ok(Self::En),
            "DE" => Ok(Self::De),
            "FR" => Ok(Self::Fr),
            "IT" => Ok(Self::It),
            other => Err(format!("unsupported language {other:?} (expected EN, DE, FR or IT)")),
        }
    }
}

/// Which protocol the binary speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// JSON-RPC over stdin/stdout
    JsonRpc,
    Http,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonrpc" | "stdio" => Ok(Self::JsonRpc),
            "http" => Ok(Self::Http),
            other => Err(format!("unsupported mode {other:?} (expected jsonrpc or http)")),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub graphql_url: String,
    pub timeout: Duration,
    pub language: Language,
    pub mode: Mode,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            language: Language::En,
            mode: Mode::JsonRpc,
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from an arbitrary variable source; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("RAIL_GRAPHQL_URL") {
            config.graphql_url = url;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "RAIL_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(ConfigError {
                    var: "RAIL_TIMEOUT_SECS",
                    value: secs.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(language) = parse_var(&lookup, "RAIL_LANGUAGE")? {
            config.language = language;
        }
        if let Some(mode) = parse_var(&lookup, "RAIL_MCP_MODE")? {
            config.mode = mode;
        }
        if let Some(port) = parse_var(&lookup, "RAIL_MCP_PORT")? {
            config.port = port;
        }

        Ok(config)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|e: T::Err| ConfigError {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
