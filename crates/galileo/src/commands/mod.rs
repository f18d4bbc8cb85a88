//! Command dispatch: bridges CLI args -> SDK services -> output formatting.

pub mod auth;
pub mod cargo_bays;
pub mod config_cmd;
pub mod events;
pub mod jobs;
pub mod machines;
pub mod missions;
pub mod notify;
pub mod profiles;
pub mod stations;
pub mod universes;
pub mod util;

use galileo_core::Galileo;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, galileo: &Galileo, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Stations(args) => stations::handle(galileo, args, global).await,
        Command::Machines(args) => machines::handle(galileo, args, global).await,
        Command::Jobs(args) => jobs::handle(galileo, args, global).await,
        Command::Missions(args) => missions::handle(galileo, args, global).await,
        Command::Universes(args) => universes::handle(galileo, args, global).await,
        Command::CargoBays(args) => cargo_bays::handle(galileo, args, global).await,
        Command::Profiles(args) => profiles::handle(galileo, args, global).await,
        Command::Events(args) => events::handle(galileo, args, global).await,
        // Handled before a session is opened
        Command::Login(_)
        | Command::Logout
        | Command::Notify(_)
        | Command::Config(_)
        | Command::Completions(_) => Ok(()),
    }
}
