//! `login` / `logout`: the device authorization flow and the saved token.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use url::Url;

use galileo_api::TransportConfig;
use galileo_api::device_flow::{DEFAULT_AUTH_DOMAIN, DEFAULT_CLIENT_ID, DeviceCode, DeviceFlow};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::{self, TokenStore};
use crate::error::CliError;
use crate::output;

/// Refresh-token lifetime recorded when the server does not send one.

fn print_instructions(code: &DeviceCode, color: bool) {
    let url = code
        .verification_uri_complete
        .as_deref()
        .unwrap_or(&code.verification_uri);
    if color {
        eprintln!("Open {} and confirm the code {}", url.underline(), code.user_code.bold());
    } else {
        eprintln!("Open {url} and confirm the code {}", code.user_code);
    }
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message("Waiting for approval...");
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

pub async fn login(args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let sdk = config::base_sdk_config(global, &cfg)?;
    let backend = sdk.resolve_backend(|key| std::env::var(key).ok())?;

    let http = TransportConfig::default()
        .with_tls(sdk.tls.clone())
        .with_timeout(sdk.timeout)
        .build_client()?;
    let domain = Url::parse(DEFAULT_AUTH_DOMAIN).map_err(|e| CliError::Settings {
        message: format!("invalid authorization server URL: {e}"),
    })?;
    let flow = DeviceFlow::new(http, domain, DEFAULT_CLIENT_ID, backend.audience());
    tracing::debug!(backend = %backend, "starting device authorization");

    let code = flow.request_code().await?;
    print_instructions(&code, output::should_color(&global.color));

    let bar = spinner(global.quiet);
    let polled = flow.poll(&code).await;
    bar.finish_and_clear();
    let tokens = polled?;

    let refresh = tokens.refresh_token.ok_or_else(|| CliError::AuthFailed {
        message: "the authorization server issued no refresh token".into(),
    })?;
    let store = match args.token_file {
        Some(path) => TokenStore::at(path),
        None => TokenStore::default_location()?,
    };
    let lifetime = tokens.expires_in.unwrap_or(config::DEFAULT_TOKEN_LIFETIME_SECS);
    let saved = store.save(&refresh, lifetime)?;

    output::notice(
        &format!(
            "Logged in to {backend}; token saved to {} (valid for {}, until {})",
            store.path().display(),
            humantime::format_duration(Duration::from_secs(lifetime)),
            saved.expires_at.format("%Y-%m-%d %H:%M"),
        ),
        global.quiet,
    );
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let store = TokenStore::default_location()?;
    if store.remove()? {
        output::notice(
            &format!("Removed saved token {}", store.path().display()),
            global.quiet,
        );
    } else {
        output::notice("No saved token", global.quiet);
    }
    Ok(())
}
