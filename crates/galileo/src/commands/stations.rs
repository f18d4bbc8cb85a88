//! Station command handlers.

use tabled::Tabled;

use galileo_core::Galileo;
use galileo_core::models::{
    CreateStationRequest, ResourceLimits, RolesFilter, Station, StationRole, StationsFilter,
    UpdateStationRequest, Volume,
};

use crate::cli::{GlobalOpts, ListArgs, StationsArgs, StationsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct StationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Members")]
    members: usize,
    #[tabled(rename = "Machines")]
    machines: usize,
    #[tabled(rename = "Volumes")]
    volumes: usize,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&Station> for StationRow {
    fn from(s: &Station) -> Self {
        Self {
            id: s.station_id.clone(),
            name: s.name.clone(),
            members: s.users.len(),
            machines: s.mids.len(),
            volumes: s.volumes.len(),
            description: output::or_dash(s.description.as_deref()),
        }
    }
}

#[derive(Tabled)]
struct RoleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    role_type: String,
    #[tabled(rename = "Protected")]
    protected: bool,
    #[tabled(rename = "Launch Jobs")]
    launch_jobs: bool,
    #[tabled(rename = "Invite Users")]
    invite_users: bool,
}

impl From<&StationRole> for RoleRow {
    fn from(r: &StationRole) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            role_type: output::or_dash(r.role_type.as_deref()),
            protected: r.protected_role,
            launch_jobs: r.permissions.launch_jobs,
            invite_users: r.permissions.invite_users,
        }
    }
}

fn detail(s: &Station) -> String {
    let mut lines = vec![
        format!("ID:          {}", s.station_id),
        format!("Name:        {}", s.name),
        format!("Description: {}", s.description.as_deref().unwrap_or("-")),
        format!("Status:      {}", s.status.as_deref().unwrap_or("-")),
        format!("Public:      {}", s.public.unwrap_or(false)),
        format!("Auto-join:   {}", s.allow_auto_join.unwrap_or(false)),
        format!("Machines:    {}", s.mids.join(", ")),
    ];
    lines.push(format!("Members ({}):", s.users.len()));
    for user in &s.users {
        lines.push(format!(
            "  {} {} [{}]",
            user.user_id,
            user.username.as_deref().unwrap_or("-"),
            user.status
        ));
    }
    if !s.volumes.is_empty() {
        lines.push(format!("Volumes ({}):", s.volumes.len()));
        for v in &s.volumes {
            lines.push(volume_line(v));
        }
    }
    lines.join("\n")
}

fn volume_line(v: &Volume) -> String {
    format!(
        "  {} {} -> {} ({}, {} host paths)",
        v.volume_id,
        v.name,
        v.mount_point,
        v.access,
        v.host_paths.len()
    )
}

fn limits_detail(l: &ResourceLimits) -> String {
    let Some(ref p) = l.resource_policy else {
        return "No resource policy applies.".into();
    };
    let num = |v: Option<f64>| v.map_or_else(|| "-".into(), |n| n.to_string());
    [
        format!("CPU per job:        {}", num(p.max_cpu_per_job)),
        format!("Memory per job:     {}", num(p.max_memory_per_job)),
        format!("GPU per job:        {}", num(p.max_gpu_per_job)),
        format!("CPU per station:    {}", num(p.max_cpu_per_station)),
        format!("Memory per station: {}", num(p.max_memory_per_station)),
        format!("GPU per station:    {}", num(p.max_gpu_per_station)),
    ]
    .join("\n")
}

fn filter(list: &ListArgs) -> StationsFilter {
    StationsFilter {
        page: list.page,
        items: list.items,
        ..StationsFilter::default()
    }
}

fn print_stations(stations: &[Station], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(
        &global.output,
        stations,
        |s| StationRow::from(s),
        |s| s.station_id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    galileo: &Galileo,
    args: StationsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let stations = galileo.stations();
    match args.command {
        StationsCommand::List { list, name } => {
            let found = stations
                .list(&StationsFilter {
                    names: name,
                    ..filter(&list)
                })
                .await?;
            print_stations(&found, global)
        }

        StationsCommand::Public(list) => {
            let found = stations.list_public(&filter(&list)).await?;
            print_stations(&found, global)
        }

        StationsCommand::Create {
            name,
            description,
            users,
        } => {
            let station = stations
                .create(&CreateStationRequest {
                    name,
                    user_ids: users,
                    description,
                })
                .await?;
            let out = output::render_single(&global.output, &station, detail, |s| {
                s.station_id.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StationsCommand::Update {
            station,
            name,
            description,
            public,
            auto_join,
        } => {
            let updated = stations
                .update(&UpdateStationRequest {
                    station_id: station,
                    name,
                    description,
                    public,
                    allow_auto_join: auto_join,
                })
                .await?;
            let out = output::render_single(&global.output, &updated, detail, |s| {
                s.station_id.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StationsCommand::Delete { station } => {
            util::require_confirmation(&format!("Delete station {station}?"), global.yes)?;
            stations.delete(&station).await?;
            output::notice(&format!("Station {station} deleted"), global.quiet);
            Ok(())
        }

        // ── Membership ──────────────────────────────────────────────
        StationsCommand::Invite {
            station,
            users,
            role,
        } => {
            stations.invite(&station, &users, &role).await?;
            output::notice(&format!("Invited {} user(s)", users.len()), global.quiet);
            Ok(())
        }

        StationsCommand::Accept { station } => {
            stations.accept_invite(&station).await?;
            output::notice(&format!("Joined station {station}"), global.quiet);
            Ok(())
        }

        StationsCommand::Reject { station } => {
            stations.reject_invite(&station).await?;
            output::notice("Invitation declined", global.quiet);
            Ok(())
        }

        StationsCommand::Join { station } => {
            stations.request_to_join(&station).await?;
            output::notice("Join request sent", global.quiet);
            Ok(())
        }

        StationsCommand::Approve { station, users } => {
            stations.approve_requests(&station, &users).await?;
            output::notice(&format!("Approved {} request(s)", users.len()), global.quiet);
            Ok(())
        }

        StationsCommand::Deny { station, users } => {
            stations.reject_requests(&station, &users).await?;
            output::notice(&format!("Denied {} request(s)", users.len()), global.quiet);
            Ok(())
        }

        StationsCommand::Withdraw { station } => {
            util::require_confirmation(&format!("Leave station {station}?"), global.yes)?;
            stations.leave(&station).await?;
            output::notice(&format!("Left station {station}"), global.quiet);
            Ok(())
        }

        StationsCommand::RemoveMember { station, user } => {
            util::require_confirmation(
                &format!("Remove {user} from station {station}?"),
                global.yes,
            )?;
            stations.remove_member(&station, &user).await?;
            output::notice(&format!("Removed {user}"), global.quiet);
            Ok(())
        }

        StationsCommand::SetRole {
            station,
            user,
            role,
        } => {
            let member = stations.update_member_role(&station, &user, &role).await?;
            output::notice(
                &format!(
                    "{} now has role {}",
                    member.user_id,
                    member.role_id.as_deref().unwrap_or(&role)
                ),
                global.quiet,
            );
            Ok(())
        }

        // ── Machines ────────────────────────────────────────────────
        StationsCommand::AddMachines { station, machines } => {
            stations.add_machines(&station, &machines).await?;
            output::notice(&format!("Added {} machine(s)", machines.len()), global.quiet);
            Ok(())
        }

        StationsCommand::RemoveMachines { station, machines } => {
            util::require_confirmation(
                &format!("Remove {} machine(s) from {station}?", machines.len()),
                global.yes,
            )?;
            stations.remove_machines(&station, &machines).await?;
            output::notice(&format!("Removed {} machine(s)", machines.len()), global.quiet);
            Ok(())
        }

        // ── Volumes ─────────────────────────────────────────────────
        StationsCommand::AddVolume {
            station,
            name,
            mount_point,
            access,
        } => {
            let volume = stations
                .add_volume(&station, &name, &mount_point, access)
                .await?;
            let out = output::render_single(&global.output, &volume, volume_line, |v| {
                v.volume_id.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StationsCommand::AddHostPath {
            station,
            volume,
            machine,
            host_path,
        } => {
            let volume = stations
                .add_host_path(&station, &volume, &machine, &host_path)
                .await?;
            let out = output::render_single(&global.output, &volume, volume_line, |v| {
                v.volume_id.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StationsCommand::RemoveHostPath {
            station,
            volume,
            host_path_id,
        } => {
            stations
                .remove_host_path(&station, &volume, &host_path_id)
                .await?;
            output::notice("Host path removed", global.quiet);
            Ok(())
        }

        StationsCommand::RemoveVolume { station, volume } => {
            util::require_confirmation(&format!("Delete volume {volume}?"), global.yes)?;
            stations.remove_volume(&station, &volume).await?;
            output::notice(&format!("Volume {volume} deleted"), global.quiet);
            Ok(())
        }

        // ── Roles & limits ──────────────────────────────────────────
        StationsCommand::Roles { station } => {
            let roles = stations.roles(&station, &RolesFilter::default()).await?;
            let out =
                output::render_list(&global.output, &roles, |r| RoleRow::from(r), |r| r.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StationsCommand::Limits { station } => {
            let limits = stations.self_resource_limits(&station).await?;
            let out = output::render_single(&global.output, &limits, limits_detail, |l| {
                l.machine_id.clone().unwrap_or_default()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
