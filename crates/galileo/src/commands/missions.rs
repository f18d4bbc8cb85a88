//! Mission command handlers.

use std::path::Path;

use serde::Serialize;
use tabled::Tabled;

use galileo_core::models::{
    CreateMissionRequest, Mission, MissionFile, MissionType, MissionsFilter, RunJobRequest,
};
use galileo_core::{Galileo, UploadedFile};

use crate::cli::{GlobalOpts, MissionsArgs, MissionsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct MissionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    mission_type: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&Mission> for MissionRow {
    fn from(m: &Mission) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            mission_type: output::or_dash(m.mission_type_id.as_deref()),
            created: output::or_dash(m.creation_timestamp.as_deref()),
            description: output::or_dash(m.description.as_deref()),
        }
    }
}

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "File")]
    filename: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
}

impl From<&MissionFile> for FileRow {
    fn from(f: &MissionFile) -> Self {
        Self {
            path: f.path.clone(),
            filename: f.filename.clone(),
            size: f.file_size.map_or_else(|| "-".into(), |n| n.to_string()),
            modified: output::or_dash(f.modification_date.as_deref()),
        }
    }
}

#[derive(Tabled)]
struct TypeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
}

#[derive(Clone, Serialize, Tabled)]
struct UploadRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Bytes")]
    bytes: u64,
}

impl From<&UploadedFile> for UploadRow {
    fn from(u: &UploadedFile) -> Self {
        Self {
            file: u.name.clone(),
            bytes: u.bytes,
        }
    }
}

fn detail(m: &Mission) -> String {
    [
        format!("ID:          {}", m.id),
        format!("Name:        {}", m.name),
        format!("Description: {}", m.description.as_deref().unwrap_or("-")),
        format!("Type:        {}", m.mission_type_id.as_deref().unwrap_or("-")),
        format!("Owner:       {}", m.user_id.as_deref().unwrap_or("-")),
        format!("Created:     {}", m.creation_timestamp.as_deref().unwrap_or("-")),
        format!("Updated:     {}", m.updated_timestamp.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

fn print_uploads(uploaded: &[UploadedFile], global: &GlobalOpts) -> Result<(), CliError> {
    let rows: Vec<UploadRow> = uploaded.iter().map(UploadRow::from).collect();
    let out = output::render_list(&global.output, &rows, UploadRow::clone, |r| r.file.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn require_dir(dir: &Path) -> Result<(), CliError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "dir".into(),
            reason: format!("{} is not a directory", dir.display()),
        })
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    galileo: &Galileo,
    args: MissionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let missions = galileo.missions();
    match args.command {
        MissionsCommand::List { list, name } => {
            let found = missions
                .list(&MissionsFilter {
                    names: name,
                    page: list.page,
                    items: list.items,
                    ..MissionsFilter::default()
                })
                .await?;
            let out = output::render_list(
                &global.output,
                &found,
                |m| MissionRow::from(m),
                |m| m.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MissionsCommand::Create {
            name,
            description,
            mission_type,
            dir,
        } => {
            let request = CreateMissionRequest {
                description,
                mission_type_id: mission_type,
                ..CreateMissionRequest::new(name)
            };
            let mission = match dir {
                Some(dir) => {
                    require_dir(&dir)?;
                    let (mission, uploaded) = missions.create_and_upload(&request, &dir).await?;
                    output::notice(
                        &format!("Uploaded {} file(s) from {}", uploaded.len(), dir.display()),
                        global.quiet,
                    );
                    mission
                }
                None => missions.create(&request).await?,
            };
            let out = output::render_single(&global.output, &mission, detail, |m| m.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MissionsCommand::Upload { mission, dir } => {
            require_dir(&dir)?;
            let uploaded = missions.upload(&mission, &dir).await?;
            print_uploads(&uploaded, global)
        }

        MissionsCommand::Files { mission } => {
            let files = missions.files(&mission).await?;
            let out = output::render_list(
                &global.output,
                &files,
                |f| FileRow::from(f),
                |f| format!("{}/{}", f.path.trim_end_matches('/'), f.filename),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MissionsCommand::Run {
            mission,
            station,
            machine,
            cpus,
            memory,
            gpus,
        } => {
            let job = missions
                .run(
                    &mission,
                    &RunJobRequest {
                        station_id: station,
                        machine_id: machine,
                        cpu_count: cpus,
                        memory_amount: memory,
                        gpu_count: gpus,
                    },
                )
                .await?;
            output::notice(
                &format!("Job {} launched ({})", job.job_id, job.status),
                global.quiet,
            );
            let out = output::render_single(
                &global.output,
                &job,
                |j| j.job_id.clone(),
                |j| j.job_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MissionsCommand::Delete { mission } => {
            util::require_confirmation(&format!("Delete mission {mission}?"), global.yes)?;
            missions.delete(&mission).await?;
            output::notice(&format!("Mission {mission} deleted"), global.quiet);
            Ok(())
        }

        MissionsCommand::Types => {
            let types = missions.types().await?;
            let out = output::render_list(
                &global.output,
                &types,
                |t: &MissionType| TypeRow {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    version: output::or_dash(t.version.as_deref()),
                },
                |t| t.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
