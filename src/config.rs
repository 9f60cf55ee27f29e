use std::env;
use std::fmt;
use thiserror::Error;

pub const USERNAME_VAR: &str = "GITHUB_USERNAME";
pub const API_TOKEN_VAR: &str = "GITORGFORK_GITHUB_API_TOKEN";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} needs to be set")]
    MissingVariable(&'static str),
}

/// Reads the account username from the environment.
///
/// # Errors
///
/// Returns [`ConfigError::MissingVariable`] when `GITHUB_USERNAME` is unset or empty.
pub fn github_username() -> Result<String, ConfigError> {
    require_var(USERNAME_VAR, |name| env::var(name).ok())
}

/// Reads the API access token from the environment.
///
/// # Errors
///
/// Returns [`ConfigError::MissingVariable`] when `GITORGFORK_GITHUB_API_TOKEN` is unset or empty.
pub fn api_token() -> Result<String, ConfigError> {
    require_var(API_TOKEN_VAR, |name| env::var(name).ok())
}

fn require_var<F>(name: &'static str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVariable(name)),
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Validates both secrets up front so a missing one fails before any request is made.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered, username first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            username: github_username()?,
            token: api_token()?,
        })
    }
}
