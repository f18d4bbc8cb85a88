//! Shared configuration for Galileo tools.
//!
//! TOML profiles, password resolution (env + keyring + plaintext), the
//! saved refresh token, and translation to `galileo_core::SdkConfig`.
//! The CLI layers its global flags on top.

mod token_store;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use galileo_core::{SdkConfig, TlsMode};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use token_store::{StoredToken, TokenStore};

/// Keyring service name; entries are keyed `<profile>/password`.
pub const KEYRING_SERVICE: &str = "galileo";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("malformed token file {path}: {reason}")]
    TokenFile { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// `production`, `development`, or a base URL.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Universe id sent with every request.
    pub universe: Option<String>,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            universe: None,
            username: None,
            password: None,
            password_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

fn default_backend() -> String {
    "production".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "galileo", "galileo").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("galileo");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path`, then `GALILEO_PROFILE` as the
/// default profile.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::raw()
                .only(&["GALILEO_PROFILE"])
                .map(|_| "default_profile".into()),
        );

    Ok(figment.extract()?)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the profile password: `password_env`, then keyring, then
/// plaintext. `None` when the profile has no password anywhere.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    resolve_password_with(
        profile,
        profile_name,
        |key| std::env::var(key).ok(),
        keyring_password,
    )
}

/// [`resolve_password`] with injectable environment and keyring lookups.
pub fn resolve_password_with<E, K>(
    profile: &Profile,
    profile_name: &str,
    env: E,
    keyring: K,
) -> Option<SecretString>
where
    E: Fn(&str) -> Option<String>,
    K: Fn(&str) -> Option<String>,
{
    // 1. Profile's password_env → env var lookup
    if let Some(value) = profile.password_env.as_deref().and_then(&env) {
        return Some(SecretString::from(value));
    }

    // 2. System keyring
    if let Some(value) = keyring(profile_name) {
        return Some(SecretString::from(value));
    }

    // 3. Plaintext in config
    profile.password.clone().map(SecretString::from)
}

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.get_password())
        .ok()
}

/// Store a profile password in the system keyring.
pub fn store_keyring_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

// ── Translation to SDK settings ─────────────────────────────────────

/// Build `SdkConfig` from a profile, with no CLI flag overrides.
///
/// Credentials are left to `SdkConfig`'s own chain except for the
/// profile's username and password.
pub fn profile_to_sdk_config(
    profile: &Profile,
    password: Option<SecretString>,
    defaults: &Defaults,
) -> Result<SdkConfig, ConfigError> {
    if profile.backend.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "backend".into(),
            reason: "must not be empty".into(),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    Ok(SdkConfig {
        backend: Some(profile.backend.clone()),
        universe: profile.universe.clone(),
        username: profile.username.clone(),
        password,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        ..SdkConfig::default()
    })
}
