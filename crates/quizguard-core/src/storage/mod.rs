mod config;

pub use config::{Config, ProbeConfig, ServiceConfig, SessionSettings};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/quizguard[-dev]/` based on QUIZGUARD_ENV.
///
/// Set QUIZGUARD_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("QUIZGUARD_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("quizguard-dev")
    } else {
        base_dir.join("quizguard")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::NoDataDir(e.to_string()))?;
    Ok(dir)
}
