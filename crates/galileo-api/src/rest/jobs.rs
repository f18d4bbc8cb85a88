// Job lifecycle endpoints
//
// Uploads, submission, control (stop/pause/start/kill), monitoring
// (top, logs), listing, and result retrieval.

use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;
use serde_json::Value;
use tracing::debug;

use super::client::{GalileoClient, field};
use super::query::QueryParams;
use crate::error::Error;
use crate::models::{
    Job, JobTop, JobsFilter, ResultFile, SendJobRequest, TopProcess, TransferLocation,
    UpdateJobRequest,
};

impl GalileoClient {
    // ── Transfers ────────────────────────────────────────────────────

    /// Ask for an upload target before sending a job.
    pub async fn request_send_job(&self) -> Result<TransferLocation, Error> {
        self.get("/job/upload_request", &QueryParams::new()).await
    }

    /// Register an uploaded job with its destination machine.
    pub async fn request_send_job_completed(&self, request: &SendJobRequest) -> Result<Job, Error> {
        let resp: Value = self.post("/jobs", request).await?;
        field(resp, "job")
    }

    /// Ask for the download location of a job's results.
    pub async fn request_receive_job(&self, job_id: &str) -> Result<TransferLocation, Error> {
        self.get(&format!("/jobs/{job_id}/results/location"), &QueryParams::new())
            .await
    }

    /// Tell the backend the results were fetched.
    pub async fn request_receive_job_completed(&self, job_id: &str) -> Result<(), Error> {
        let _: IgnoredAny = self
            .put_empty(&format!("/jobs/{job_id}/results/download_complete"))
            .await?;
        Ok(())
    }

    pub async fn submit_job(&self, job_id: &str) -> Result<Job, Error> {
        let resp: Value = self.put_empty(&format!("/jobs/{job_id}/run")).await?;
        field(resp, "job")
    }

    // ── Control ──────────────────────────────────────────────────────

    pub async fn request_stop_job(&self, job_id: &str) -> Result<Job, Error> {
        self.job_action(job_id, "stop").await
    }

    pub async fn request_pause_job(&self, job_id: &str) -> Result<Job, Error> {
        self.job_action(job_id, "pause").await
    }

    pub async fn request_start_job(&self, job_id: &str) -> Result<Job, Error> {
        self.job_action(job_id, "start").await
    }

    pub async fn request_kill_job(&self, job_id: &str) -> Result<Job, Error> {
        self.job_action(job_id, "kill").await
    }

    async fn job_action(&self, job_id: &str, action: &str) -> Result<Job, Error> {
        let resp: Value = self.put_empty(&format!("/jobs/{job_id}/{action}")).await?;
        field(resp, "job")
    }

    // ── Monitoring ───────────────────────────────────────────────────

    /// Process table of a running job.
    pub async fn request_top_from_job(&self, job_id: &str) -> Result<Vec<TopProcess>, Error> {
        let resp: Value = self
            .get(&format!("/jobs/{job_id}/top"), &QueryParams::new())
            .await?;
        let top: JobTop = field(resp, "top")?;
        Ok(top.into_processes())
    }

    pub async fn request_logs_from_job(&self, job_id: &str) -> Result<String, Error> {
        let resp: Value = self
            .get(&format!("/jobs/{job_id}/logs"), &QueryParams::new())
            .await?;
        field(resp, "logs")
    }

    pub async fn list_jobs(&self, filter: &JobsFilter) -> Result<Vec<Job>, Error> {
        let resp: Value = self.get("/jobs", &filter.to_query()).await?;
        field(resp, "jobs")
    }

    pub async fn update_job(&self, job_id: &str, request: &UpdateJobRequest) -> Result<Job, Error> {
        let resp: Value = self.put(&format!("/jobs/{job_id}"), request).await?;
        field(resp, "job")
    }

    // ── Results ──────────────────────────────────────────────────────

    pub async fn get_results_metadata(&self, job_id: &str) -> Result<Vec<ResultFile>, Error> {
        let resp: Value = self
            .get(&format!("/jobs/{job_id}/results"), &QueryParams::new())
            .await?;
        field(resp, "files")
    }

    /// Download one result file to `dest_dir/<path>/<filename>`.
    pub async fn download_results(
        &self,
        job_id: &str,
        file: &ResultFile,
        dest_dir: &Path,
    ) -> Result<PathBuf, Error> {
        let query = QueryParams::new()
            .with("filename", &file.filename)
            .with("path", &file.path)
            .with("nonce", file.nonce.as_deref());

        let relative = file.path.trim_start_matches(['/', '\\']);
        let dest = dest_dir.join(relative).join(&file.filename);
        let bytes = self
            .download(&format!("/jobs/{job_id}/results"), &query, &dest)
            .await?;
        debug!(job_id, bytes, dest = %dest.display(), "result file written");
        Ok(dest)
    }
}
