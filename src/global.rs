use actix_web::cookie::Key;
use std::path::PathBuf;
use thiserror::Error;

/// Minimum length of SECRET_KEY; cookie keys are derived from 64 bytes.
const SECRET_KEY_MIN_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} cannot be parsed: {1}")]
    Invalid(&'static str, String),
}

/// Runtime configuration read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub secret_key: Option<String>,
    pub media_dir: PathBuf,
    pub cookie_secure: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| SettingsError::Missing("DATABASE_URL"))?;

        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8080".to_owned());

        let secret_key = match std::env::var("SECRET_KEY") {
            Ok(key) if key.len() < SECRET_KEY_MIN_LEN => {
                return Err(SettingsError::Invalid(
                    "SECRET_KEY",
                    format!("must be at least {} bytes", SECRET_KEY_MIN_LEN),
                ))
            }
            Ok(key) => Some(key),
            Err(_) => None,
        };

        let media_dir = PathBuf::from(
            std::env::var("DIR_MEDIA").unwrap_or_else(|_| "./media".to_owned()),
        );

        let cookie_secure = match std::env::var("COOKIE_SECURE") {
            Ok(v) => v
                .parse::<bool>()
                .map_err(|e| SettingsError::Invalid("COOKIE_SECURE", e.to_string()))?,
            Err(_) => false,
        };

        Ok(Self {
            database_url,
            bind_address,
            secret_key,
            media_dir,
            cookie_secure,
        })
    }

    /// Settings for a throwaway instance, used by tests.
    pub fn ephemeral(media_dir: PathBuf) -> Self {
        Self {
            database_url: "sqlite::memory:".to_owned(),
            bind_address: "127.0.0.1:0".to_owned(),
            secret_key: None,
            media_dir,
            cookie_secure: false,
        }
    }

    /// Returns the cookie signing key, generating one if SECRET_KEY is unset.
    /// Generated keys do not survive restarts, so every session is dropped.
    pub fn cookie_key(&self) -> Key {
        match &self.secret_key {
            Some(key) => Key::from(key.as_bytes()),
            None => {
                log::warn!("SECRET_KEY is not set; sessions will not survive a restart.");
                Key::generate()
            }
        }
    }
}
