//! User profile command handlers.

use tabled::Tabled;

use galileo_core::Galileo;
use galileo_core::models::{Profile, Station, UsersFilter};

use crate::cli::{GlobalOpts, ProfilesArgs, ProfilesCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "User ID")]
    user_id: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Machines")]
    machines: usize,
}

impl From<&Profile> for ProfileRow {
    fn from(p: &Profile) -> Self {
        Self {
            user_id: p.user_id.clone(),
            username: output::or_dash(p.username.as_deref()),
            machines: p.mids.len(),
        }
    }
}

#[derive(Tabled)]
struct InviteRow {
    #[tabled(rename = "Station ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn detail(p: &Profile) -> String {
    let mut lines = vec![
        format!("User ID:  {}", p.user_id),
        format!("Username: {}", p.username.as_deref().unwrap_or("-")),
        format!("Tier:     {}", p.pricing_tier_id.as_deref().unwrap_or("-")),
        format!("Cards:    {}", p.stored_cards.len()),
    ];
    if p.mids.is_empty() {
        lines.push("Machines: -".into());
    } else {
        lines.push(format!("Machines ({}):", p.mids.len()));
        lines.extend(p.mids.iter().map(|mid| format!("  {mid}")));
    }
    lines.join("\n")
}

pub async fn handle(
    galileo: &Galileo,
    args: ProfilesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let profiles = galileo.profiles();
    match args.command {
        ProfilesCommand::Me => {
            let me = profiles.get_self().await?;
            let out = output::render_single(&global.output, &me, detail, |p| p.user_id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfilesCommand::List { list, search } => {
            let found = profiles
                .list_users(&UsersFilter {
                    partial_usernames: search.into_iter().collect(),
                    page: list.page,
                    items: list.items,
                    ..UsersFilter::default()
                })
                .await?;
            let out = output::render_list(
                &global.output,
                &found,
                |p| ProfileRow::from(p),
                |p| p.user_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfilesCommand::Invites => {
            let invites = profiles.list_station_invites().await?;
            let out = output::render_list(
                &global.output,
                &invites,
                |s: &Station| InviteRow {
                    id: s.station_id.clone(),
                    name: s.name.clone(),
                    description: output::or_dash(s.description.as_deref()),
                },
                |s| s.station_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
