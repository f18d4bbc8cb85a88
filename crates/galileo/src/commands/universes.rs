//! Universe command handlers.

use tabled::Tabled;

use galileo_core::Galileo;
use galileo_core::models::{CreateUniverseRequest, Universe};

use crate::cli::{GlobalOpts, UniversesArgs, UniversesCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct UniverseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Universe> for UniverseRow {
    fn from(u: &Universe) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            created: output::or_dash(u.creation_timestamp.as_deref()),
        }
    }
}

fn detail(u: &Universe) -> String {
    [
        format!("ID:      {}", u.id),
        format!("Name:    {}", u.name),
        format!("Created: {}", u.creation_timestamp.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

pub async fn handle(
    galileo: &Galileo,
    args: UniversesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let universes = galileo.universes();
    match args.command {
        UniversesCommand::List => {
            let found = universes.list().await?;
            let out = output::render_list(
                &global.output,
                &found,
                |u| UniverseRow::from(u),
                |u| u.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UniversesCommand::Create {
            name,
            admins,
            require_credit,
            allow_without_quota,
        } => {
            let universe = universes
                .create(&CreateUniverseRequest {
                    name,
                    require_positive_credit_balance: require_credit,
                    allow_scheduling_without_quota: allow_without_quota,
                    admin_user_ids: admins,
                })
                .await?;
            let out = output::render_single(&global.output, &universe, detail, |u| u.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
