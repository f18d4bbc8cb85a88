//! Clap derive structures for the `galileo` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use galileo_core::EventCategory;
use galileo_core::models::{JobStatus, VolumeAccess};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// galileo -- run jobs on Galileo landing zones from the command line
#[derive(Debug, Parser)]
#[command(
    name = "galileo",
    version,
    about = "Manage Galileo stations, machines, missions and jobs",
    long_about = "Command-line client for the Galileo job-orchestration platform.\n\n\
        Credentials come from flags, GALILEO_* environment variables, the token\n\
        saved by `galileo login`, or the active config profile.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config profile to use
    #[arg(long, short = 'p', env = "GALILEO_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend: production, development, or a base URL
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Universe id sent with every request
    #[arg(long, env = "GALILEO_UNIVERSE", global = true)]
    pub universe: Option<String>,

    /// Username for password login
    #[arg(long, short = 'u', global = true)]
    pub username: Option<String>,

    /// Password for password login (prompted when omitted)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GALILEO_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "GALILEO_INSECURE", global = true)]
    pub insecure: bool,

    /// PEM file with an extra trusted CA certificate
    #[arg(long, global = true)]
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds (overrides the profile)
    #[arg(long, env = "GALILEO_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in through the browser and save a refresh token
    Login(LoginArgs),

    /// Delete the saved refresh token
    Logout,

    /// Manage stations, their members, machines and volumes
    #[command(alias = "st")]
    Stations(StationsArgs),

    /// Manage landing zones (machines)
    #[command(alias = "lz")]
    Machines(MachinesArgs),

    /// Inspect and control jobs
    Jobs(JobsArgs),

    /// Manage missions and launch them as jobs
    Missions(MissionsArgs),

    /// Manage universes
    Universes(UniversesArgs),

    /// View cargo bays
    #[command(name = "cargobays", alias = "cargo-bays")]
    CargoBays(CargoBaysArgs),

    /// View user profiles
    Profiles(ProfilesArgs),

    /// Stream push events
    Events(EventsArgs),

    /// Send a message from inside a running job to its owner
    Notify(NotifyArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared List Arguments ────────────────────────────────────────────

/// Pagination arguments shared by list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Results per page
    #[arg(long, short = 'l', default_value = "25")]
    pub items: u32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LOGIN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Where to save the refresh token (default: ~/.galileo)
    #[arg(long)]
    pub token_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StationsArgs {
    #[command(subcommand)]
    pub command: StationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StationsCommand {
    /// List stations you belong to
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only stations with this name (repeatable)
        #[arg(long)]
        name: Vec<String>,
    },

    /// List public stations
    Public(ListArgs),

    /// Create a station
    Create {
        name: String,

        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Users to invite on creation (repeatable)
        #[arg(long = "user")]
        users: Vec<String>,
    },

    /// Update station metadata
    Update {
        station: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,

        #[arg(long)]
        public: Option<bool>,

        /// Let users join without approval
        #[arg(long)]
        auto_join: Option<bool>,
    },

    /// Delete a station
    #[command(alias = "rm")]
    Delete { station: String },

    /// Invite users to a station
    Invite {
        station: String,

        #[arg(required = true)]
        users: Vec<String>,

        /// Role id granted to the invited users
        #[arg(long)]
        role: String,
    },

    /// Accept an invitation
    Accept { station: String },

    /// Decline an invitation
    Reject { station: String },

    /// Ask to join a station
    Join { station: String },

    /// Approve join requests
    Approve {
        station: String,

        #[arg(required = true)]
        users: Vec<String>,
    },

    /// Deny join requests
    Deny {
        station: String,

        #[arg(required = true)]
        users: Vec<String>,
    },

    /// Leave a station or withdraw a pending request
    #[command(alias = "leave")]
    Withdraw { station: String },

    /// Remove a member from a station
    RemoveMember { station: String, user: String },

    /// Change a member's role
    SetRole {
        station: String,
        user: String,
        role: String,
    },

    /// Add machines to a station
    AddMachines {
        station: String,

        #[arg(required = true)]
        machines: Vec<String>,
    },

    /// Remove machines from a station
    RemoveMachines {
        station: String,

        #[arg(required = true)]
        machines: Vec<String>,
    },

    /// Create a shared volume
    AddVolume {
        station: String,
        name: String,
        mount_point: String,

        /// r or rw
        #[arg(long, default_value = "rw", value_parser = parse_access)]
        access: VolumeAccess,
    },

    /// Back a volume with a path on one machine
    AddHostPath {
        station: String,
        volume: String,
        machine: String,
        host_path: String,
    },

    /// Remove a host path from a volume
    RemoveHostPath {
        station: String,
        volume: String,
        host_path_id: String,
    },

    /// Delete a volume
    RemoveVolume { station: String, volume: String },

    /// List station roles
    Roles { station: String },

    /// Show your effective resource limits in a station
    Limits { station: String },
}

fn parse_access(s: &str) -> Result<VolumeAccess, String> {
    s.parse()
        .map_err(|_| format!("expected 'r' or 'rw', got '{s}'"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MACHINES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MachinesArgs {
    #[command(subcommand)]
    pub command: MachinesCommand,
}

#[derive(Debug, Subcommand)]
pub enum MachinesCommand {
    /// List machines
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only machines owned by this user (repeatable)
        #[arg(long)]
        user: Vec<String>,
    },

    /// Show one machine
    Get { machine: String },

    /// Update machine settings
    Update {
        machine: String,

        #[arg(long)]
        name: Option<String>,

        /// Maximum concurrent jobs
        #[arg(long)]
        jobs_limit: Option<i64>,

        #[arg(long)]
        active: Option<bool>,
    },

    /// Unregister a machine
    #[command(alias = "rm")]
    Delete { machine: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  JOBS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub command: JobsCommand,
}

#[derive(Debug, Subcommand)]
pub enum JobsCommand {
    /// List jobs
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only jobs in this station (repeatable)
        #[arg(long)]
        station: Vec<String>,

        /// Only jobs launched from this mission (repeatable)
        #[arg(long)]
        mission: Vec<String>,

        /// Only jobs in this status, e.g. running (repeatable)
        #[arg(long, value_parser = parse_status)]
        status: Vec<JobStatus>,
    },

    /// Show running processes of a job
    Top { job: String },

    /// Print a job's container log
    Logs { job: String },

    /// Ask the machine to stop a job
    Stop { job: String },

    /// Pause a running job
    Pause { job: String },

    /// Resume a paused job
    Start { job: String },

    /// Kill a job immediately
    Kill { job: String },

    /// Hide a job from default listings
    Archive { job: String },

    /// Restore an archived job
    Unarchive { job: String },

    /// List result files of a job
    Results { job: String },

    /// Download all result files of a job
    Download {
        job: String,

        /// Destination directory
        #[arg(long, short = 'd', default_value = ".")]
        dest: PathBuf,
    },
}

fn parse_status(s: &str) -> Result<JobStatus, String> {
    s.parse().map_err(|_| format!("unknown job status '{s}'"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MISSIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MissionsArgs {
    #[command(subcommand)]
    pub command: MissionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum MissionsCommand {
    /// List missions
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only missions with this name (repeatable)
        #[arg(long)]
        name: Vec<String>,
    },

    /// Create a mission, optionally uploading a directory into it
    Create {
        name: String,

        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Mission type id
        #[arg(long = "type")]
        mission_type: Option<String>,

        /// Directory to upload after creation
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Upload every file under a directory
    Upload { mission: String, dir: PathBuf },

    /// List files stored with a mission
    Files { mission: String },

    /// Launch a mission as a job
    Run {
        mission: String,

        #[arg(long, short = 's')]
        station: String,

        /// Pin the job to one machine
        #[arg(long, short = 'm')]
        machine: Option<String>,

        #[arg(long)]
        cpus: Option<u32>,

        /// Memory in MB
        #[arg(long)]
        memory: Option<u64>,

        #[arg(long)]
        gpus: Option<u32>,
    },

    /// Delete a mission
    #[command(alias = "rm")]
    Delete { mission: String },

    /// List mission types
    Types,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  UNIVERSES / CARGO BAYS / PROFILES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UniversesArgs {
    #[command(subcommand)]
    pub command: UniversesCommand,
}

#[derive(Debug, Subcommand)]
pub enum UniversesCommand {
    /// List universes
    #[command(alias = "ls")]
    List,

    /// Create a universe
    Create {
        name: String,

        /// Administrator user ids (repeatable)
        #[arg(long = "admin")]
        admins: Vec<String>,

        /// Refuse jobs when the credit balance is not positive
        #[arg(long)]
        require_credit: bool,

        /// Allow scheduling without a quota
        #[arg(long)]
        allow_without_quota: bool,
    },
}

#[derive(Debug, Args)]
pub struct CargoBaysArgs {
    #[command(subcommand)]
    pub command: CargoBaysCommand,
}

#[derive(Debug, Subcommand)]
pub enum CargoBaysCommand {
    /// List cargo bays
    #[command(alias = "ls")]
    List,
}

#[derive(Debug, Args)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    pub command: ProfilesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProfilesCommand {
    /// Show your own profile
    #[command(name = "self", alias = "me")]
    Me,

    /// List users
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Match usernames containing this text
        #[arg(long)]
        search: Option<String>,
    },

    /// List stations you have been invited to
    Invites,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EVENTS / NOTIFY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// Print events as they arrive until interrupted
    Watch {
        /// Only events of this category (repeatable)
        #[arg(long, short = 'c', value_parser = parse_category)]
        category: Vec<EventCategory>,

        /// Only events with this wire name (repeatable)
        #[arg(long, short = 'e')]
        event: Vec<String>,
    },
}

fn parse_category(s: &str) -> Result<EventCategory, String> {
    EventCategory::parse(s).map_err(|e| e.to_string())
}

#[derive(Debug, Args)]
pub struct NotifyArgs {
    /// Text to deliver
    pub message: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Show the current configuration (secrets masked)
    Show,

    /// Set a key in the active profile
    Set {
        /// One of: backend, universe, username, password, password_env,
        /// ca_cert, insecure, timeout
        key: String,
        value: String,
    },

    /// Make a profile the default
    Use { name: String },

    /// List configured profiles
    Profiles,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn repeatable_filters_and_value_parsers() {
        let cli = Cli::try_parse_from([
            "galileo", "jobs", "list", "--status", "running", "--status", "paused", "--station",
            "st-1",
        ])
        .unwrap();
        let Command::Jobs(JobsArgs {
            command: JobsCommand::List { status, station, list, .. },
        }) = cli.command
        else {
            panic!("parsed the wrong command");
        };
        assert_eq!(status, vec![JobStatus::Running, JobStatus::Paused]);
        assert_eq!(station, vec!["st-1".to_owned()]);
        assert_eq!((list.page, list.items), (1, 25));
    }

    #[test]
    fn bad_volume_access_is_a_parse_error() {
        let err = Cli::try_parse_from([
            "galileo", "stations", "add-volume", "st-1", "data", "/data", "--access", "x",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("expected 'r' or 'rw'"));
    }

    #[test]
    fn lz_alias_and_category_parser() {
        assert!(Cli::try_parse_from(["galileo", "lz", "list"]).is_ok());
        assert!(Cli::try_parse_from(["galileo", "events", "watch", "-c", "JOBS"]).is_ok());
        assert!(Cli::try_parse_from(["galileo", "events", "watch", "-c", "nope"]).is_err());
    }
}
