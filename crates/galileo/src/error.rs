//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use galileo_config::ConfigError;
use galileo_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(galileo::connection_failed),
        help(
            "Check the backend address and your network.\n\
             Reason: {reason}\n\
             Use --insecure (-k) or --ca-cert for TLS problems."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(galileo::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(galileo::auth_failed),
        help(
            "Check your username and password, or run: galileo login\n\
             A saved token may have been revoked; run: galileo logout"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials available for profile '{profile}'")]
    #[diagnostic(
        code(galileo::no_credentials),
        help(
            "Run: galileo login\n\
             Or pass --username/--password, set GALILEO_USER and GALILEO_PASSWORD,\n\
             or configure a profile with: galileo config init"
        )
    )]
    NoCredentials { profile: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(galileo::permission_denied),
        help("Your station role does not allow this action.")
    )]
    PermissionDenied { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(galileo::not_found),
        help("Run: galileo {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Conflict: {message}")]
    #[diagnostic(code(galileo::conflict))]
    Conflict { message: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(galileo::api_error))]
    ApiError {
        status: Option<u16>,
        message: String,
    },

    #[error("Invalid event stream data: {message}")]
    #[diagnostic(code(galileo::event))]
    Event { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(galileo::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(galileo::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: galileo config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("{message}")]
    #[diagnostic(code(galileo::settings))]
    Settings { message: String },

    #[error(transparent)]
    #[diagnostic(code(galileo::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(galileo::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Operation cancelled")]
    #[diagnostic(code(galileo::cancelled))]
    Cancelled,

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(galileo::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(galileo::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ──────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authentication { message } => Self::AuthFailed { message },

            CoreError::MissingCredentials => Self::NoCredentials {
                profile: "current".into(),
            },

            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::Timeout => Self::Timeout,

            CoreError::NotFound { entity, id } => Self::NotFound {
                list_command: list_command_for(&entity),
                resource_type: entity,
                identifier: id,
            },

            CoreError::Validation { field, reason } => Self::Validation { field, reason },

            CoreError::Api {
                message,
                status: Some(401),
            } => Self::AuthFailed { message },
            CoreError::Api {
                message,
                status: Some(403),
            } => Self::PermissionDenied { message },
            CoreError::Api {
                message,
                status: Some(409),
            } => Self::Conflict { message },
            CoreError::Api { message, status } => Self::ApiError { status, message },

            CoreError::Event(e) => Self::Event {
                message: e.to_string(),
            },

            CoreError::Config { message } => Self::Settings { message },

            CoreError::Io(e) => Self::Io(e),

            CoreError::Internal(message) => Self::ApiError {
                status: None,
                message,
            },
        }
    }
}

impl From<galileo_api::Error> for CliError {
    fn from(err: galileo_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

fn list_command_for(entity: &str) -> String {
    match entity {
        "machine" => "machines list".into(),
        "job" => "jobs list".into(),
        "mission" => "missions list".into(),
        "station" | "station member" | "volume" | "host path" => "stations list".into(),
        "role" => "stations roles <station>".into(),
        other => format!("{other}s list"),
    }
}
