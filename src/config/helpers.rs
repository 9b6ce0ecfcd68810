//! Environment-variable parsing helpers shared by config resolution.

use std::env;

use crate::error::ConfigError;

/// Read an environment variable, treating unset and empty as absent.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "value is not valid UTF-8".to_string(),
        }),
    }
}

/// Read a string from the environment, falling back to the settings value.
pub(crate) fn parse_string_env(key: &str, fallback: String) -> Result<String, ConfigError> {
    Ok(optional_env(key)?.unwrap_or(fallback))
}

/// Read a u64 from the environment, falling back to the settings value.
pub(crate) fn parse_u64_env(key: &str, fallback: u64) -> Result<u64, ConfigError> {
    match optional_env(key)? {
        Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a non-negative integer, got '{raw}'"),
        }),
        None => Ok(fallback),
    }
}

/// Read a u16 from the environment, falling back to the settings value.
pub(crate) fn parse_u16_env(key: &str, fallback: u16) -> Result<u16, ConfigError> {
    match optional_env(key)? {
        Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a non-negative integer, got '{raw}'"),
        }),
        None => Ok(fallback),
    }
}
