mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use galileo_core::Galileo;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Local commands: no backend session needed
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Logout => commands::auth::logout(&cli.global),
        Command::Login(args) => commands::auth::login(args, &cli.global).await,
        Command::Notify(args) => commands::notify::handle(args, &cli.global).await,

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "galileo", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to the backend
        cmd => {
            let config::Session {
                sdk,
                env,
                saved_token,
            } = config::resolve_session(&cli.global)?;
            let galileo = Galileo::connect_with_env(sdk, env).await?;
            if let Some(store) = saved_token {
                if let Err(e) = config::persist_refreshed_token(&galileo, &store) {
                    tracing::warn!(error = %e, "could not update the saved token");
                }
            }

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &galileo, &cli.global).await;
            galileo.disconnect().await;
            result
        }
    }
}
