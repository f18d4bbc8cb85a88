//! CLI configuration: a thin layer over `galileo_config`.
//!
//! Merges the active profile with `GlobalOpts` overrides and picks the
//! credential source: explicit flags, then `GALILEO_*` env, then the token
//! saved by `galileo login`, then the profile's keyring or plaintext
//! password, then an interactive prompt.

use std::io::IsTerminal;
use std::time::Duration;

use chrono::Local;
use dialoguer::Input;
use secrecy::{ExposeSecret, SecretString};

use galileo_core::config::{ENV_PASSWORD, ENV_REFRESH_TOKEN, ENV_TOKEN, ENV_USER, non_empty};
use galileo_core::{AuthServer, Galileo, SdkConfig, TlsMode};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use galileo_config::{
    Config, Profile, StoredToken, TokenStore, config_path, load_config, load_config_or_default,
    save_config,
};

/// Token lifetime recorded when the server does not report one.
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 86_400;

/// Environment lookup handed to the SDK.
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Everything `Galileo::connect_with_env` needs.
pub struct Session {
    pub sdk: SdkConfig,
    pub env: EnvLookup,
    /// Set when the session runs on the token saved by `galileo login`.
    pub saved_token: Option<TokenStore>,
}

/// Where the credentials of a session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Flags,
    Environment,
    SavedToken,
    Profile,
    Prompt,
}

// ── Profile resolution ──────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Settings without credentials: the profile (if any) with flag overrides.
pub fn base_sdk_config(global: &GlobalOpts, cfg: &Config) -> Result<SdkConfig, CliError> {
    let mut sdk = match lookup_profile(global, cfg)? {
        Some((_, profile)) => galileo_config::profile_to_sdk_config(profile, None, &cfg.defaults)?,
        None => SdkConfig {
            timeout: Duration::from_secs(cfg.defaults.timeout),
            tls: if cfg.defaults.insecure {
                TlsMode::DangerAcceptInvalid
            } else {
                TlsMode::System
            },
            ..SdkConfig::default()
        },
    };

    if let Some(ref backend) = global.backend {
        sdk.backend = Some(backend.clone());
    }
    if let Some(ref universe) = global.universe {
        sdk.universe = Some(universe.clone());
    }
    if global.insecure {
        sdk.tls = TlsMode::DangerAcceptInvalid;
    } else if let Some(ref ca) = global.ca_cert {
        sdk.tls = TlsMode::CustomCa(ca.clone());
    }
    if let Some(secs) = global.timeout {
        sdk.timeout = Duration::from_secs(secs);
    }
    Ok(sdk)
}

/// The named profile, or `None` when no profile is configured and none
/// was asked for explicitly.
fn lookup_profile<'a>(
    global: &GlobalOpts,
    cfg: &'a Config,
) -> Result<Option<(&'a str, &'a Profile)>, CliError> {
    match cfg.profile(global.profile.as_deref()) {
        Ok(found) => Ok(Some(found)),
        Err(_) if global.profile.is_none() => Ok(None),
        Err(_) => Err(CliError::ProfileNotFound {
            name: active_profile_name(global, cfg),
            available: available_profiles(cfg),
        }),
    }
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Build a session from the config file, saved token, and process env.
pub fn resolve_session(global: &GlobalOpts) -> Result<Session, CliError> {
    let cfg = load_config()?;
    let store = TokenStore::default_location()?;
    let saved = store.load()?;
    let (sdk, source) = resolve_credentials(
        global,
        &cfg,
        |key| std::env::var(key).ok(),
        saved,
        |profile| galileo_config::resolve_password(profile.1, profile.0),
    )?;

    let sdk = match source {
        Some(source) => {
            tracing::debug!(?source, "credentials resolved");
            sdk
        }
        None => prompt_credentials(global, &cfg, sdk)?,
    };

    // Explicit flags must win over GALILEO_* credentials, which the SDK
    // would otherwise read first.
    let hide_env_credentials = global.username.is_some() && global.password.is_some();
    Ok(Session {
        sdk,
        env: env_lookup(hide_env_credentials),
        saved_token: (source == Some(CredentialSource::SavedToken)).then_some(store),
    })
}

/// Rewrite the saved token after the session exchanged it, recording the
/// lifetime of the access token just issued.
pub fn persist_refreshed_token(
    galileo: &Galileo,
    store: &TokenStore,
) -> Result<Option<StoredToken>, CliError> {
    let auth = galileo.client().auth();
    let Some(refresh) = auth.refresh_token() else {
        return Ok(None);
    };
    let lifetime = auth.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    Ok(Some(store.save(refresh.expose_secret(), lifetime)?))
}

/// Pick the first credential source that is complete. `None` means
/// nothing was found and the caller should prompt.
pub fn resolve_credentials<E, K>(
    global: &GlobalOpts,
    cfg: &Config,
    env: E,
    saved: Option<StoredToken>,
    keyring: K,
) -> Result<(SdkConfig, Option<CredentialSource>), CliError>
where
    E: Fn(&str) -> Option<String>,
    K: Fn((&str, &Profile)) -> Option<SecretString>,
{
    let mut sdk = base_sdk_config(global, cfg)?;

    // 1. Flags
    if let (Some(user), Some(pass)) = (&global.username, &global.password) {
        sdk.username = Some(user.clone());
        sdk.password = Some(SecretString::from(pass.clone()));
        return Ok((sdk, Some(CredentialSource::Flags)));
    }

    // 2. Environment, read by the SDK itself
    let set = |key: &str| non_empty(env(key)).is_some();
    let env_tokens = set(ENV_TOKEN) && set(ENV_REFRESH_TOKEN);
    let env_password = set(ENV_USER) && set(ENV_PASSWORD);
    if env_tokens || env_password {
        return Ok((sdk, Some(CredentialSource::Environment)));
    }

    // 3. Token saved by `galileo login`
    if global.username.is_none() {
        if let Some(token) = saved {
            if token.is_expired(Local::now().naive_local()) {
                tracing::debug!(expired_at = %token.expires_at, "saved access token lapsed, refreshing");
            }
            sdk.refresh_token = Some(token.refresh_token);
            sdk.auth_server = AuthServer::hosted();
            return Ok((sdk, Some(CredentialSource::SavedToken)));
        }
    }

    // 4. Profile username with keyring / env / plaintext password
    let profile = lookup_profile(global, cfg)?;
    let username = global
        .username
        .clone()
        .or_else(|| profile.and_then(|(_, p)| p.username.clone()));
    let password = global
        .password
        .clone()
        .map(SecretString::from)
        .or_else(|| profile.and_then(&keyring));
    if let (Some(user), Some(pass)) = (username, password) {
        sdk.username = Some(user);
        sdk.password = Some(pass);
        return Ok((sdk, Some(CredentialSource::Profile)));
    }

    Ok((sdk, None))
}

/// 5. Ask on the terminal. Fails with exit code 3 when stdin is not a TTY.
fn prompt_credentials(
    global: &GlobalOpts,
    cfg: &Config,
    mut sdk: SdkConfig,
) -> Result<SdkConfig, CliError> {
    let profile = active_profile_name(global, cfg);
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials { profile });
    }

    let known_user = global.username.clone().or_else(|| {
        cfg.profiles
            .get(&profile)
            .and_then(|p| p.username.clone())
    });
    let username = match known_user {
        Some(user) => user,
        None => Input::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(|e| CliError::Io(std::io::Error::other(e)))?,
    };
    let password = rpassword::prompt_password(format!("Password for {username}: "))?;
    if username.is_empty() || password.is_empty() {
        return Err(CliError::NoCredentials { profile });
    }

    tracing::debug!(source = ?CredentialSource::Prompt, "credentials resolved");
    sdk.username = Some(username);
    sdk.password = Some(SecretString::from(password));
    Ok(sdk)
}

fn env_lookup(hide_credentials: bool) -> EnvLookup {
    Box::new(move |key| {
        let credential = [ENV_TOKEN, ENV_REFRESH_TOKEN, ENV_USER, ENV_PASSWORD].contains(&key);
        if hide_credentials && credential {
            None
        } else {
            std::env::var(key).ok()
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use clap::Parser;
    use galileo_api::{AuthProvider, Credentials, GalileoClient, TokenEndpoint, TransportConfig};
    use url::Url;

    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["galileo"];
        argv.extend_from_slice(args);
        argv.push("logout");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_lab() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                backend: "development".into(),
                username: Some("ada".into()),
                timeout: Some(9),
                ..Profile::default()
            },
        );
        cfg
    }

    fn saved() -> StoredToken {
        StoredToken {
            refresh_token: SecretString::from("saved-rt"),
            expires_at: NaiveDate::from_ymd_opt(2030, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn keyring(pw: &'static str) -> impl Fn((&str, &Profile)) -> Option<SecretString> {
        move |_| Some(SecretString::from(pw))
    }

    #[test]
    fn flags_beat_everything() {
        let g = global(&["--username", "bob", "--password", "pw"]);
        let (sdk, source) = resolve_credentials(
            &g,
            &config_with_lab(),
            |_| Some("x".into()),
            Some(saved()),
            keyring("k"),
        )
        .unwrap();
        assert_eq!(source, Some(CredentialSource::Flags));
        assert_eq!(sdk.username.as_deref(), Some("bob"));
        assert_eq!(sdk.password.unwrap().expose_secret(), "pw");
    }

    #[test]
    fn env_pair_is_left_to_the_sdk() {
        let g = global(&[]);
        let env = |key: &str| (key == ENV_USER || key == ENV_PASSWORD).then(|| "v".to_owned());
        let (sdk, source) =
            resolve_credentials(&g, &config_with_lab(), env, Some(saved()), keyring("k")).unwrap();
        assert_eq!(source, Some(CredentialSource::Environment));
        assert!(sdk.username.is_none() && sdk.refresh_token.is_none());
    }

    #[test]
    fn blank_env_values_fall_through_to_saved_token() {
        let g = global(&[]);
        let env = |_: &str| Some(String::new());
        let (sdk, source) =
            resolve_credentials(&g, &config_with_lab(), env, Some(saved()), keyring("k")).unwrap();
        assert_eq!(source, Some(CredentialSource::SavedToken));
        assert_eq!(sdk.refresh_token.unwrap().expose_secret(), "saved-rt");

        let (_, source) =
            resolve_credentials(&g, &config_with_lab(), env, None, keyring("k")).unwrap();
        assert_eq!(source, Some(CredentialSource::Profile));
    }

    #[test]
    fn saved_token_uses_the_hosted_auth_server() {
        let g = global(&[]);
        let (sdk, source) =
            resolve_credentials(&g, &config_with_lab(), no_env, Some(saved()), keyring("k"))
                .unwrap();
        assert_eq!(source, Some(CredentialSource::SavedToken));
        assert_eq!(sdk.refresh_token.unwrap().expose_secret(), "saved-rt");
        assert!(matches!(sdk.auth_server, AuthServer::OAuth { .. }));
        assert_eq!(sdk.backend.as_deref(), Some("development"));
        assert_eq!(sdk.timeout, Duration::from_secs(9));
    }

    #[test]
    fn profile_password_when_nothing_else() {
        let g = global(&["--timeout", "3"]);
        let (sdk, source) =
            resolve_credentials(&g, &config_with_lab(), no_env, None, keyring("from-keyring"))
                .unwrap();
        assert_eq!(source, Some(CredentialSource::Profile));
        assert_eq!(sdk.username.as_deref(), Some("ada"));
        assert_eq!(sdk.password.unwrap().expose_secret(), "from-keyring");
        assert_eq!(sdk.timeout, Duration::from_secs(3));
    }

    #[test]
    fn nothing_found_asks_for_a_prompt() {
        let g = global(&["--backend", "http://127.0.0.1:9"]);
        let (sdk, source) =
            resolve_credentials(&g, &Config::default(), no_env, None, |_| None).unwrap();
        assert_eq!(source, None);
        assert_eq!(sdk.backend.as_deref(), Some("http://127.0.0.1:9"));
    }

    #[test]
    fn unknown_explicit_profile_is_an_error() {
        let g = global(&["--profile", "nope"]);
        let err = resolve_credentials(&g, &config_with_lab(), no_env, None, |_| None).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { ref available, .. } if available == "default"));
    }

    #[tokio::test]
    async fn refreshed_session_rewrites_the_saved_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join(".galileo"));
        let backend = Url::parse("http://127.0.0.1:9").unwrap();
        let http = TransportConfig::default().build_client().unwrap();
        let auth = AuthProvider::login(
            http.clone(),
            TokenEndpoint::backend(&backend).unwrap(),
            Credentials::Tokens {
                access: SecretString::from("at"),
                refresh: SecretString::from("rt-rotated"),
            },
        )
        .await
        .unwrap();
        let galileo = Galileo::from_client(GalileoClient::new(http, backend, Arc::new(auth)));

        let written = persist_refreshed_token(&galileo, &store).unwrap().unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.refresh_token.expose_secret(), "rt-rotated");
        assert_eq!(loaded.expires_at, written.expires_at);
        assert!(!loaded.is_expired(Local::now().naive_local()));
    }

    #[test]
    fn insecure_flag_overrides_ca_cert() {
        let g = global(&["-k", "--ca-cert", "/tmp/ca.pem"]);
        let sdk = base_sdk_config(&g, &Config::default()).unwrap();
        assert!(matches!(sdk.tls, TlsMode::DangerAcceptInvalid));
    }
}
