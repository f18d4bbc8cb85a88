use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::epoch_seconds;
use crate::rest::query::QueryParams;

/// Server-side job phase. Mirrored only; the client never computes transitions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Uploaded,
    Submitted,
    Downloaded,
    BuildingImage,
    BuildingContainer,
    StartRequested,
    Running,
    PauseRequested,
    Paused,
    StopRequested,
    Stopped,
    Exited,
    CollectingResults,
    PostingResults,
    Terminated,
    Completed,
    RemovedByHost,
    PostProcessing,
    Started,
    BuiltImage,
    BuiltContainer,
    ResultsPosted,
    Error,
    BuildError,
    KillRequested,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Whether the job has stopped for good.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed
                | Self::Terminated
                | Self::Stopped
                | Self::Exited
                | Self::Error
                | Self::BuildError
                | Self::RemovedByHost
        )
    }
}

/// One entry of a job's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusEntry {
    #[serde(with = "epoch_seconds", alias = "time")]
    pub timestamp: DateTime<Utc>,
    pub status: JobStatus,
    #[serde(rename = "jobstatusid", default, skip_serializing_if = "Option::is_none")]
    pub job_status_id: Option<String>,
    #[serde(rename = "jobid", default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "jobid")]
    pub job_id: String,
    #[serde(rename = "receiverid", default)]
    pub receiver_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(with = "epoch_seconds")]
    pub time_created: DateTime<Utc>,
    #[serde(with = "epoch_seconds")]
    pub last_updated: DateTime<Utc>,
    pub status: JobStatus,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "stationid", default)]
    pub station_id: Option<String>,
    #[serde(rename = "userid", default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub oaid: Option<String>,
    #[serde(default)]
    pub pay_status: Option<String>,
    #[serde(default)]
    pub pay_interval: Option<i64>,
    /// Accumulated runtime in seconds.
    #[serde(default)]
    pub total_runtime: Option<f64>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub status_history: Vec<JobStatusEntry>,
}

/// Pre-signed transfer target returned by the upload/download handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLocation {
    pub location: String,
    pub filename: String,
}

/// Body of `POST /jobs` after the upload finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendJobRequest {
    pub destination_mid: String,
    pub filename: String,
    #[serde(rename = "stationid")]
    pub station_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateJobRequest {
    pub archived: bool,
}

/// Raw `top` listing: column titles plus one row per process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTop {
    #[serde(rename = "Titles", default)]
    pub titles: Vec<String>,
    #[serde(rename = "Processes", default)]
    pub processes: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopDetail {
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopProcess {
    pub details: Vec<TopDetail>,
}

impl JobTop {
    /// Pair every process row with the column titles.
    pub fn into_processes(self) -> Vec<TopProcess> {
        let titles = self.titles;
        self.processes
            .into_iter()
            .map(|row| TopProcess {
                details: titles
                    .iter()
                    .zip(row)
                    .map(|(title, detail)| TopDetail {
                        title: title.clone(),
                        detail,
                    })
                    .collect(),
            })
            .collect()
    }
}

/// One file in a job's results listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFile {
    pub filename: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Filters for `GET /jobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsFilter {
    pub job_ids: Vec<String>,
    pub receiver_ids: Vec<String>,
    pub oa_ids: Vec<String>,
    pub user_ids: Vec<String>,
    pub station_ids: Vec<String>,
    pub project_ids: Vec<String>,
    pub statuses: Vec<JobStatus>,
    pub page: u32,
    pub items: u32,
}

impl Default for JobsFilter {
    fn default() -> Self {
        Self {
            job_ids: Vec::new(),
            receiver_ids: Vec::new(),
            oa_ids: Vec::new(),
            user_ids: Vec::new(),
            station_ids: Vec::new(),
            project_ids: Vec::new(),
            statuses: Vec::new(),
            page: 1,
            items: 25,
        }
    }
}

impl JobsFilter {
    pub fn to_query(&self) -> QueryParams {
        let statuses: Vec<String> = self.statuses.iter().map(ToString::to_string).collect();
        QueryParams::new()
            .with("page", self.page)
            .with("items", self.items)
            .with("jobids", &self.job_ids)
            .with("receiverids", &self.receiver_ids)
            .with("oaids", &self.oa_ids)
            .with("userids", &self.user_ids)
            .with("stationids", &self.station_ids)
            .with("projectids", &self.project_ids)
            .with("statuses", statuses)
    }
}
