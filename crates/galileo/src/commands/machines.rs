//! Machine (landing zone) command handlers.

use tabled::Tabled;

use galileo_core::Galileo;
use galileo_core::models::{Machine, MachinesFilter, UpdateMachineRequest};

use crate::cli::{GlobalOpts, MachinesArgs, MachinesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MachineRow {
    #[tabled(rename = "MID")]
    mid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "GPU")]
    gpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "OS")]
    os: String,
    #[tabled(rename = "Job Limit")]
    jobs_limit: String,
}

impl From<&Machine> for MachineRow {
    fn from(m: &Machine) -> Self {
        Self {
            mid: m.mid.clone(),
            name: output::or_dash(m.name.as_deref()),
            status: m.status.to_string(),
            cpu: output::or_dash(m.cpu.as_deref()),
            gpu: output::or_dash(m.gpu.as_deref()),
            memory: output::or_dash(m.memory.as_deref()),
            os: output::or_dash(m.os.as_deref()),
            jobs_limit: m
                .running_jobs_limit
                .map_or_else(|| "-".into(), |n| n.to_string()),
        }
    }
}

fn detail(m: &Machine, color: bool) -> String {
    [
        format!("MID:        {}", m.mid),
        format!("Name:       {}", m.name.as_deref().unwrap_or("-")),
        format!("Owner:      {}", m.user_id.as_deref().unwrap_or("-")),
        format!("Status:     {}", output::paint_status(&m.status.to_string(), color)),
        format!("CPU:        {}", m.cpu.as_deref().unwrap_or("-")),
        format!("GPU:        {}", m.gpu.as_deref().unwrap_or("-")),
        format!("Memory:     {}", m.memory.as_deref().unwrap_or("-")),
        format!("OS / Arch:  {} / {}", m.os.as_deref().unwrap_or("-"), m.arch.as_deref().unwrap_or("-")),
        format!(
            "Job limit:  {}",
            m.running_jobs_limit
                .map_or_else(|| "-".into(), |n| n.to_string())
        ),
        format!("Runner:     {}", m.job_runner.as_deref().unwrap_or("-")),
        format!("Containers: {}", m.container_technology.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    galileo: &Galileo,
    args: MachinesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let machines = galileo.machines();
    let color = output::should_color(&global.color);
    match args.command {
        MachinesCommand::List { list, user } => {
            let found = machines
                .list(&MachinesFilter {
                    user_ids: user,
                    page: list.page,
                    items: list.items,
                    ..MachinesFilter::default()
                })
                .await?;
            let out = output::render_list(
                &global.output,
                &found,
                |m| MachineRow::from(m),
                |m| m.mid.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MachinesCommand::Get { machine } => {
            let found = machines.get(&machine).await?;
            let out = output::render_single(
                &global.output,
                &found,
                |m| detail(m, color),
                |m| m.mid.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MachinesCommand::Update {
            machine,
            name,
            jobs_limit,
            active,
        } => {
            if name.is_none() && jobs_limit.is_none() && active.is_none() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "pass at least one of --name, --jobs-limit, --active".into(),
                });
            }
            let updated = machines
                .update(&UpdateMachineRequest {
                    mid: machine,
                    name,
                    running_jobs_limit: jobs_limit,
                    active,
                    ..UpdateMachineRequest::default()
                })
                .await?;
            let out = output::render_single(
                &global.output,
                &updated,
                |m| detail(m, color),
                |m| m.mid.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MachinesCommand::Delete { machine } => {
            util::require_confirmation(&format!("Unregister machine {machine}?"), global.yes)?;
            machines.delete(&machine).await?;
            output::notice(&format!("Machine {machine} deleted"), global.quiet);
            Ok(())
        }
    }
}
