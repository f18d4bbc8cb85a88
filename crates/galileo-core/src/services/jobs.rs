use std::path::{Path, PathBuf};
use std::sync::Arc;

use galileo_api::GalileoClient;
use galileo_api::models::{
    Job, JobsFilter, ResultFile, SendJobRequest, TopProcess, TransferLocation, UpdateJobRequest,
};
use tracing::info;

use crate::error::CoreError;

/// Job submission, control, monitoring, and results.
#[derive(Debug, Clone)]
pub struct JobsService {
    client: Arc<GalileoClient>,
}

impl JobsService {
    pub fn new(client: Arc<GalileoClient>) -> Self {
        Self { client }
    }

    // ── Submission ───────────────────────────────────────────────────

    pub async fn request_send_job(&self) -> Result<TransferLocation, CoreError> {
        Ok(self.client.request_send_job().await?)
    }

    pub async fn request_send_job_completed(&self, request: &SendJobRequest) -> Result<Job, CoreError> {
        Ok(self.client.request_send_job_completed(request).await?)
    }

    pub async fn submit(&self, job_id: &str) -> Result<Job, CoreError> {
        self.client
            .submit_job(job_id)
            .await
            .map_err(CoreError::not_found("job", job_id))
    }

    pub async fn request_receive_job(&self, job_id: &str) -> Result<TransferLocation, CoreError> {
        self.client
            .request_receive_job(job_id)
            .await
            .map_err(CoreError::not_found("job", job_id))
    }

    pub async fn request_receive_job_completed(&self, job_id: &str) -> Result<(), CoreError> {
        self.client
            .request_receive_job_completed(job_id)
            .await
            .map_err(CoreError::not_found("job", job_id))
    }

    // ── Control ──────────────────────────────────────────────────────

    pub async fn stop(&self, job_id: &str) -> Result<Job, CoreError> {
        self.client
            .request_stop_job(job_id)
            .await
            .map_err(CoreError::not_found("job", job_id))
    }

    pub async fn pause(&self, job_id: &str) -> Result<Job, CoreError> {
        self.client
            .request_pause_job(job_id)
            .await
            .map_err(CoreError::not_found("job", job_id))
    }

    pub async fn start(&self, job_id: &str) -> Result<Job, CoreError> {
        self.client
            .request_start_job(job_id)
            .await
            .map_err(CoreError::not_found("job", job_id))
    }

    pub async fn kill(&self, job_id: &str) -> Result<Job, CoreError> {
        self.client
            .request_kill_job(job_id)
            .await
            .map_err(CoreError::not_found("job", job_id))
    }

    /// Hide or unhide a job in listings.
    pub async fn set_archived(&self, job_id: &str, archived: bool) -> Result<Job, CoreError> {
        self.client
            .update_job(job_id, &UpdateJobRequest { archived })
            .await
            .map_err(CoreError::not_found("job", job_id))
    }

    // ── Monitoring ───────────────────────────────────────────────────

    pub async fn list(&self, filter: &JobsFilter) -> Result<Vec<Job>, CoreError> {
        Ok(self.client.list_jobs(filter).await?)
    }

    pub async fn top(&self, job_id: &str) -> Result<Vec<TopProcess>, CoreError> {
        self.client
            .request_top_from_job(job_id)
            .await
            .map_err(CoreError::not_found("job", job_id))
    }

    pub async fn logs(&self, job_id: &str) -> Result<String, CoreError> {
        self.client
            .request_logs_from_job(job_id)
            .await
            .map_err(CoreError::not_found("job", job_id))
    }

    // ── Results ──────────────────────────────────────────────────────

    pub async fn results_metadata(&self, job_id: &str) -> Result<Vec<ResultFile>, CoreError> {
        self.client
            .get_results_metadata(job_id)
            .await
            .map_err(CoreError::not_found("job", job_id))
    }

    /// Download every result file of `job_id` under `dest`.
    ///
    /// Returns the written paths in the order the backend listed them.
    pub async fn download_job_results(&self, job_id: &str, dest: &Path) -> Result<Vec<PathBuf>, CoreError> {
        let files = self.results_metadata(job_id).await?;
        let mut written = Vec::with_capacity(files.len());
        for file in &files {
            written.push(self.client.download_results(job_id, file, dest).await?);
        }
        info!(job_id, files = written.len(), dest = %dest.display(), "job results downloaded");
        Ok(written)
    }
}
