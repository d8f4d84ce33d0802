use std::{fmt::Display, str::FromStr};

use thiserror::Error;

/// Errors raised while reading configuration from the process environment.
#[derive(Debug, Error)]
pub enum EnvError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    Missing(String),

    /// The variable is set but its value does not parse into the requested type.
    #[error("Invalid value for environment variable {name}: {message}")]
    Invalid { name: String, message: String },
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// Surrounding whitespace is trimmed and an empty value counts as missing.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, EnvError> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EnvError::Missing(name.to_string()))
}

/// Reads and parses an optional environment variable.
///
/// Returns `Ok(None)` when the variable is unset or blank, and an
/// [`EnvError::Invalid`] when it is set to something that does not parse.
pub fn env_parse<T>(name: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: Display,
{
    match get_env_var(name) {
        Ok(raw) => raw.parse::<T>().map(Some).map_err(|e| EnvError::Invalid {
            name: name.to_string(),
            message: e.to_string(),
        }),
        Err(EnvError::Missing(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
