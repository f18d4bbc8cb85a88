// ── Saved refresh token ──
//
// `galileo login` writes `~/.galileo` as
// `{"refresh_token": "...", "expires_in": "2024-05-01 12:00:00.000000"}`.
// `expires_in` is the local time at which the access token issued with it
// lapses; the refresh token itself outlives it.

use std::path::{Path, PathBuf};

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use directories::BaseDirs;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ConfigError;

const FILE_NAME: &str = ".galileo";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TIMESTAMP_PARSE: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TokenFile {
    refresh_token: String,
    expires_in: String,
}

/// Contents of the token file.
#[derive(Debug, Clone)]
pub struct StoredToken {
    pub refresh_token: SecretString,
    pub expires_at: NaiveDateTime,
}

impl StoredToken {
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now >= self.expires_at
    }
}

/// Reads and writes the token file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// `~/.galileo`.
    pub fn default_location() -> Result<Self, ConfigError> {
        let home = BaseDirs::new().ok_or_else(|| ConfigError::Validation {
            field: "home".into(),
            reason: "cannot determine the home directory".into(),
        })?;
        Ok(Self::at(home.home_dir().join(FILE_NAME)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when no token has been saved.
    pub fn load(&self) -> Result<Option<StoredToken>, ConfigError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: TokenFile = serde_json::from_str(&raw).map_err(|e| self.malformed(e))?;
        let expires_at = NaiveDateTime::parse_from_str(&file.expires_in, TIMESTAMP_PARSE)
            .map_err(|e| self.malformed(e))?;
        debug!(path = %self.path.display(), "loaded saved refresh token");

        Ok(Some(StoredToken {
            refresh_token: SecretString::from(file.refresh_token),
            expires_at,
        }))
    }

    /// Save `refresh_token`, recording an expiry `expires_in_secs` from now.
    pub fn save(&self, refresh_token: &str, expires_in_secs: u64) -> Result<StoredToken, ConfigError> {
        let secs = i64::try_from(expires_in_secs).unwrap_or(i64::MAX);
        let expires_at = Local::now().naive_local() + ChronoDuration::seconds(secs.min(i64::from(i32::MAX)));
        let file = TokenFile {
            refresh_token: refresh_token.to_owned(),
            expires_in: expires_at.format(TIMESTAMP_FORMAT).to_string(),
        };
        let json = serde_json::to_string(&file).map_err(|e| self.malformed(e))?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "saved refresh token");

        Ok(StoredToken {
            refresh_token: SecretString::from(file.refresh_token),
            expires_at,
        })
    }

    /// Delete the file. Returns whether one existed.
    pub fn remove(&self) -> Result<bool, ConfigError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn malformed(&self, err: impl ToString) -> ConfigError {
        ConfigError::TokenFile {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}
