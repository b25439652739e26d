//! Core error types for quizguard-core.
//!
//! Failures on the three remote calls are split by what the session machine
//! does with them: transport failures and shape failures both abort an
//! advance, configuration failures never reach the session at all.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for quizguard-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Network or HTTP-level failures talking to the grading service
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The grading service answered with something we cannot interpret
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The session runtime has stopped accepting input
    #[error("session has ended")]
    SessionClosed,
}

/// Transport-level failures on a remote call.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request never produced a response
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The endpoint URL could not be built from the configured base
    #[error("invalid endpoint URL '{0}'")]
    InvalidUrl(String),
}

/// Shape failures on the advance response.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Body was not the JSON we expected
    #[error("malformed response from {endpoint}: {message}")]
    Malformed { endpoint: String, message: String },

    /// A required field was absent
    #[error("response from {endpoint} is missing '{field}'")]
    MissingField { endpoint: String, field: &'static str },

    /// A field was present but outside its valid range
    #[error("response from {endpoint} has invalid '{field}': {message}")]
    InvalidField {
        endpoint: String,
        field: &'static str,
        message: String,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// No usable configuration directory
    #[error("configuration directory unavailable: {0}")]
    NoDataDir(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_endpoint_and_code() {
        let err = TransportError::Status {
            endpoint: "/api/next".into(),
            status: 502,
        };
        assert_eq!(err.to_string(), "/api/next returned HTTP 502");
    }

    #[test]
    fn protocol_error_converts_into_core_error() {
        let err: CoreError = ProtocolError::MissingField {
            endpoint: "/api/next".into(),
            field: "question",
        }
        .into();
        assert!(matches!(err, CoreError::Protocol(_)));
        assert!(err.to_string().contains("missing 'question'"));
    }

    #[test]
    fn toml_parse_error_becomes_parse_failed() {
        let bad = toml::from_str::<toml::Value>("= nope").unwrap_err();
        let err: ConfigError = bad.into();
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }
}
