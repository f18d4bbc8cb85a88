//! Job command handlers.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use galileo_core::Galileo;
use galileo_core::models::{Job, JobsFilter, ResultFile, TopProcess};

use crate::cli::{GlobalOpts, JobsArgs, JobsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "Job ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Station")]
    station: String,
    #[tabled(rename = "Machine")]
    machine: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Runtime")]
    runtime: String,
}

impl From<&Job> for JobRow {
    fn from(j: &Job) -> Self {
        Self {
            id: j.job_id.clone(),
            name: output::or_dash(j.name.as_deref()),
            status: j.status.to_string(),
            station: output::or_dash(j.station_id.as_deref()),
            machine: output::or_dash(j.receiver_id.as_deref()),
            created: util::short_time(&j.time_created),
            runtime: runtime(j.total_runtime),
        }
    }
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "File")]
    filename: String,
}

fn runtime(secs: Option<f64>) -> String {
    secs.filter(|s| s.is_finite() && *s >= 0.0)
        .map_or_else(
            || "-".into(),
            |s| humantime::format_duration(Duration::from_secs_f64(s.round())).to_string(),
        )
}

fn detail(j: &Job, color: bool) -> String {
    let mut lines = vec![
        format!("Job ID:   {}", j.job_id),
        format!("Name:     {}", j.name.as_deref().unwrap_or("-")),
        format!("Status:   {}", output::paint_status(&j.status.to_string(), color)),
        format!("Station:  {}", j.station_id.as_deref().unwrap_or("-")),
        format!("Machine:  {}", j.receiver_id.as_deref().unwrap_or("-")),
        format!("Mission:  {}", j.project_id.as_deref().unwrap_or("-")),
        format!("Created:  {}", j.time_created.to_rfc3339()),
        format!("Updated:  {}", j.last_updated.to_rfc3339()),
        format!("Runtime:  {}", runtime(j.total_runtime)),
        format!("Archived: {}", j.archived),
    ];
    if !j.status_history.is_empty() {
        lines.push("History:".into());
        for entry in &j.status_history {
            lines.push(format!(
                "  {}  {}",
                util::short_time(&entry.timestamp),
                entry.status
            ));
        }
    }
    lines.join("\n")
}

/// `top` output: one table with the backend's column titles.
fn top_table(processes: &[TopProcess]) -> String {
    let Some(first) = processes.first() else {
        return "No processes running.".into();
    };
    let mut builder = tabled::builder::Builder::default();
    builder.push_record(first.details.iter().map(|d| d.title.clone()));
    for process in processes {
        builder.push_record(process.details.iter().map(|d| d.detail.clone()));
    }
    builder
        .build()
        .with(tabled::settings::Style::rounded())
        .to_string()
}

fn print_job(job: &Job, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let out = output::render_single(&global.output, job, |j| detail(j, color), |j| {
        j.job_id.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(galileo: &Galileo, args: JobsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let jobs = galileo.jobs();
    match args.command {
        JobsCommand::List {
            list,
            station,
            mission,
            status,
        } => {
            let found = jobs
                .list(&JobsFilter {
                    station_ids: station,
                    project_ids: mission,
                    statuses: status,
                    page: list.page,
                    items: list.items,
                    ..JobsFilter::default()
                })
                .await?;
            let out = output::render_list(
                &global.output,
                &found,
                |j| JobRow::from(j),
                |j| j.job_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        JobsCommand::Top { job } => {
            let processes = jobs.top(&job).await?;
            let out = output::render_single(&global.output, &processes, |p| top_table(p), |p| {
                p.len().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        JobsCommand::Logs { job } => {
            let logs = jobs.logs(&job).await?;
            output::print_output(logs.trim_end(), global.quiet);
            Ok(())
        }

        // ── Control ─────────────────────────────────────────────────
        JobsCommand::Stop { job } => {
            util::require_confirmation(&format!("Stop job {job}?"), global.yes)?;
            print_job(&jobs.stop(&job).await?, global)
        }

        JobsCommand::Pause { job } => print_job(&jobs.pause(&job).await?, global),

        JobsCommand::Start { job } => print_job(&jobs.start(&job).await?, global),

        JobsCommand::Kill { job } => {
            util::require_confirmation(&format!("Kill job {job}?"), global.yes)?;
            print_job(&jobs.kill(&job).await?, global)
        }

        JobsCommand::Archive { job } => print_job(&jobs.set_archived(&job, true).await?, global),

        JobsCommand::Unarchive { job } => {
            print_job(&jobs.set_archived(&job, false).await?, global)
        }

        // ── Results ─────────────────────────────────────────────────
        JobsCommand::Results { job } => {
            let files = jobs.results_metadata(&job).await?;
            let out = output::render_list(
                &global.output,
                &files,
                |f: &ResultFile| ResultRow {
                    path: f.path.clone(),
                    filename: f.filename.clone(),
                },
                |f| format!("{}/{}", f.path.trim_end_matches('/'), f.filename),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        JobsCommand::Download { job, dest } => {
            let files = jobs.results_metadata(&job).await?;
            let bar = if global.quiet {
                ProgressBar::hidden()
            } else {
                ProgressBar::new(u64::try_from(files.len()).unwrap_or(u64::MAX))
            };
            bar.set_style(
                ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            let client = galileo.client();
            let mut written = Vec::with_capacity(files.len());
            for file in &files {
                bar.set_message(file.filename.clone());
                written.push(client.download_results(&job, file, &dest).await?);
                bar.inc(1);
            }
            bar.finish_and_clear();

            for path in &written {
                output::print_output(&path.display().to_string(), global.quiet);
            }
            output::notice(
                &format!("Downloaded {} file(s) to {}", written.len(), dest.display()),
                global.quiet,
            );
            Ok(())
        }
    }
}
