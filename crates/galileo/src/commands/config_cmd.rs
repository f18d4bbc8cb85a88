//! Config subcommand handlers.

use dialoguer::{Input, Select};

use galileo_core::Backend;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with every stored password replaced by a mask.
fn redacted(cfg: &Config) -> Config {
    let mut out = cfg.clone();
    for profile in out.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(MASK.into());
        }
    }
    out
}

/// TOML-shaped view of an already redacted config.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "backend = \"{}\"", p.backend);
        if let Some(ref u) = p.universe {
            let _ = writeln!(out, "universe = \"{u}\"");
        }
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if let Some(ref pw) = p.password {
            let _ = writeln!(out, "password = \"{pw}\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_flag(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

/// Apply one `config set` key to a profile.
fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "backend" => {
            value.parse::<Backend>()?;
            profile.backend = value;
        }
        "universe" => profile.universe = Some(value),
        "username" => profile.username = Some(value),
        "password" => profile.password = Some(value),
        "password_env" | "password-env" => profile.password_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_flag("insecure", &value)?),
        "timeout" => {
            profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                field: "timeout".into(),
                reason: "must be a number (seconds)".into(),
            })?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: backend, universe, username, \
                     password, password_env, ca_cert, insecure, timeout"
                ),
            });
        }
    }
    Ok(())
}

/// Ask where the password should live. `Some` means plaintext in the
/// config file, `None` means it went to the keyring.
fn prompt_password_storage(profile_name: &str, password: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        galileo_config::store_keyring_password(profile_name, password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password.to_owned()))
    }
}

fn prompt_backend() -> Result<String, CliError> {
    let choices = &["production", "development", "custom URL"];
    let selection = Select::new()
        .with_prompt("Backend")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    match selection {
        0 | 1 => Ok(choices[selection].to_owned()),
        _ => {
            let url: String = Input::new()
                .with_prompt("Backend URL")
                .validate_with(|v: &String| v.parse::<Backend>().map(|_| ()).map_err(|e| e.to_string()))
                .interact_text()
                .map_err(prompt_err)?;
            Ok(url)
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("Galileo CLI configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let backend = prompt_backend()?;

            let universe: String = Input::new()
                .with_prompt("Universe id (empty for none)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let auth_choices = &[
                "Browser login (run `galileo login` afterwards)",
                "Username/Password",
            ];
            let auth_selection = Select::new()
                .with_prompt("Authentication method")
                .items(auth_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let (username, password) = if auth_selection == 1 {
                let user: String = Input::new()
                    .with_prompt("Username")
                    .interact_text()
                    .map_err(prompt_err)?;
                let pass = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
                if user.is_empty() || pass.is_empty() {
                    return Err(CliError::Validation {
                        field: "credentials".into(),
                        reason: "username and password cannot be empty".into(),
                    });
                }
                (Some(user), prompt_password_storage(&profile_name, &pass)?)
            } else {
                (None, None)
            };

            let profile = Profile {
                backend,
                universe: Some(universe).filter(|u| !u.trim().is_empty()),
                username,
                password,
                ..Profile::default()
            };

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            if auth_selection == 0 {
                eprintln!("\n  Next: galileo login");
            } else {
                eprintln!("\n  Test it: galileo profiles self");
            }
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_key(profile, &key, value)?;

            save_config(&cfg)?;
            output::notice(&format!("✓ Set {key} on profile '{profile_name}'"), global.quiet);
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            output::notice(&format!("✓ Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                output::notice("No profiles configured. Run: galileo config init", global.quiet);
            } else {
                for name in cfg.profiles.keys() {
                    let marker = if name == default { " *" } else { "" };
                    output::print_output(&format!("{name}{marker}"), global.quiet);
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_key_validates_backend_and_flags() {
        let mut profile = Profile::default();
        set_key(&mut profile, "backend", "development".into()).unwrap();
        assert_eq!(profile.backend, "development");

        assert!(set_key(&mut profile, "backend", "not a url".into()).is_err());
        assert_eq!(profile.backend, "development");

        set_key(&mut profile, "insecure", "true".into()).unwrap();
        assert_eq!(profile.insecure, Some(true));
        assert!(set_key(&mut profile, "insecure", "yes".into()).is_err());

        set_key(&mut profile, "timeout", "12".into()).unwrap();
        assert_eq!(profile.timeout, Some(12));
    }

    #[test]
    fn unknown_key_lists_valid_ones() {
        let err = set_key(&mut Profile::default(), "controller", "x".into()).unwrap_err();
        assert!(err.to_string().contains("controller"));
        match err {
            CliError::Validation { reason, .. } => assert!(reason.contains("password_env")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn show_masks_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                username: Some("ada".into()),
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        let text = format_config(&redacted(&cfg));
        assert!(text.contains("[profiles.lab]"));
        assert!(text.contains("username = \"ada\""));
        assert!(text.contains(MASK));
        assert!(!text.contains("hunter2"));
    }
}
