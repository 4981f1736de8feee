//! Credentials injected by the runner as environment variables.
//!
//! Values are never formatted into logs or errors: `Debug` is redacted and
//! errors only name the variable.

use crate::utils::error::{PicksError, Result};
use std::fmt;

pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const UPSTOX_ACCESS_TOKEN: &str = "UPSTOX_ACCESS_TOKEN";

/// A string that only reveals itself through `expose`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Reads a required variable through `lookup`; blank counts as missing.
fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(PicksError::MissingConfigError {
            field: name.to_string(),
        }),
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramSecrets {
    pub bot_token: Secret,
    /// Chat ids are not credentials, but stay out of logs all the same.
    pub chat_id: Secret,
}

impl TelegramSecrets {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: Secret::new(bot_token),
            chat_id: Secret::new(chat_id),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::new(
            required(&lookup, TELEGRAM_BOT_TOKEN)?,
            required(&lookup, TELEGRAM_CHAT_ID)?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstoxSecrets {
    pub access_token: Secret,
}

impl UpstoxSecrets {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::new(required(&lookup, UPSTOX_ACCESS_TOKEN)?))
    }
}
