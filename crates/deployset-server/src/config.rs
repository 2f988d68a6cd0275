//! Process configuration from the environment.

use std::env;

use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid PORT value `{0}`")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// `PORT` defaults to 8080 when unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_port(env::var("PORT").ok().as_deref())?;
        Ok(Self { port })
    }
}

fn parse_port(value: Option<&str>) -> Result<u16, ConfigError> {
    match value {
        Some(value) if !value.is_empty() => value
            .parse()
            .map_err(|_| ConfigError::InvalidPort(value.to_string())),
        _ => Ok(DEFAULT_PORT),
    }
}
