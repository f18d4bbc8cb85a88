// Mission (project) endpoints

use serde::de::IgnoredAny;
use serde_json::Value;

use super::client::{GalileoClient, field};
use super::query::QueryParams;
use crate::error::Error;
use crate::models::{
    CreateMissionRequest, Job, Mission, MissionFile, MissionType, MissionsFilter, RunJobRequest,
    UpdateMissionRequest,
};

impl GalileoClient {
    pub async fn list_missions(&self, filter: &MissionsFilter) -> Result<Vec<Mission>, Error> {
        let resp: Value = self.get("/projects", &filter.to_query()).await?;
        field(resp, "projects")
    }

    pub async fn create_mission(&self, request: &CreateMissionRequest) -> Result<Mission, Error> {
        let resp: Value = self.post("/projects", request).await?;
        field(resp, "project")
    }

    pub async fn update_mission(&self, request: &UpdateMissionRequest) -> Result<(), Error> {
        let _: IgnoredAny = self
            .put(&format!("/projects/{}", request.mission_id), request)
            .await?;
        Ok(())
    }

    pub async fn delete_mission(&self, mission_id: &str) -> Result<(), Error> {
        let _: IgnoredAny = self.delete(&format!("/projects/{mission_id}")).await?;
        Ok(())
    }

    /// Upload one file. `filename` is the `/`-separated path inside the mission.
    pub async fn upload_mission_file(
        &self,
        mission_id: &str,
        filename: &str,
        data: &[u8],
    ) -> Result<(), Error> {
        let _: IgnoredAny = self
            .upload(&format!("/projects/{mission_id}/files"), filename, data)
            .await?;
        Ok(())
    }

    pub async fn list_mission_files(&self, mission_id: &str) -> Result<Vec<MissionFile>, Error> {
        let resp: Value = self
            .get(&format!("/projects/{mission_id}/files"), &QueryParams::new())
            .await?;
        field(resp, "files")
    }

    /// Launch a job from the mission's files on a station, optionally pinned
    /// to one machine.
    pub async fn run_mission_job(&self, mission_id: &str, request: &RunJobRequest) -> Result<Job, Error> {
        let resp: Value = self
            .post(&format!("/projects/{mission_id}/jobs"), request)
            .await?;
        field(resp, "job")
    }

    pub async fn list_mission_types(&self) -> Result<Vec<MissionType>, Error> {
        let resp: Value = self
            .get("/projecttypes/summaries", &QueryParams::new())
            .await?;
        field(resp, "project_types")
    }
}
