use std::path::{Path, PathBuf};
use std::sync::Arc;

use galileo_api::GalileoClient;
use galileo_api::models::{
    CreateMissionRequest, Job, Mission, MissionFile, MissionType, MissionsFilter, RunJobRequest,
    UpdateMissionRequest,
};
use tracing::{debug, info};

use crate::error::CoreError;

/// One file sent by [`MissionsService::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// `/`-separated path inside the mission.
    pub name: String,
    pub bytes: u64,
}

/// Missions (projects): file bundles plus runtime settings, run as jobs.
#[derive(Debug, Clone)]
pub struct MissionsService {
    client: Arc<GalileoClient>,
}

impl MissionsService {
    pub fn new(client: Arc<GalileoClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &MissionsFilter) -> Result<Vec<Mission>, CoreError> {
        Ok(self.client.list_missions(filter).await?)
    }

    pub async fn create(&self, request: &CreateMissionRequest) -> Result<Mission, CoreError> {
        if request.name.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "name".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(self.client.create_mission(request).await?)
    }

    pub async fn update(&self, request: &UpdateMissionRequest) -> Result<(), CoreError> {
        self.client
            .update_mission(request)
            .await
            .map_err(CoreError::not_found("mission", &request.mission_id))
    }

    pub async fn delete(&self, mission_id: &str) -> Result<(), CoreError> {
        self.client
            .delete_mission(mission_id)
            .await
            .map_err(CoreError::not_found("mission", mission_id))
    }

    pub async fn files(&self, mission_id: &str) -> Result<Vec<MissionFile>, CoreError> {
        self.client
            .list_mission_files(mission_id)
            .await
            .map_err(CoreError::not_found("mission", mission_id))
    }

    pub async fn types(&self) -> Result<Vec<MissionType>, CoreError> {
        Ok(self.client.list_mission_types().await?)
    }

    pub async fn run(&self, mission_id: &str, request: &RunJobRequest) -> Result<Job, CoreError> {
        self.client
            .run_mission_job(mission_id, request)
            .await
            .map_err(CoreError::not_found("mission", mission_id))
    }

    // ── Composed operations ──────────────────────────────────────────

    /// Upload every file under `dir`, named by its path relative to `dir`.
    pub async fn upload(&self, mission_id: &str, dir: &Path) -> Result<Vec<UploadedFile>, CoreError> {
        let files = collect_files(dir).await?;
        let mut uploaded = Vec::with_capacity(files.len());

        for path in files {
            let name = relative_name(dir, &path)?;
            let data = tokio::fs::read(&path).await?;
            debug!(mission_id, file = %name, bytes = data.len(), "uploading mission file");
            self.client
                .upload_mission_file(mission_id, &name, &data)
                .await
                .map_err(CoreError::not_found("mission", mission_id))?;
            uploaded.push(UploadedFile {
                name,
                bytes: u64::try_from(data.len()).unwrap_or(u64::MAX),
            });
        }

        info!(mission_id, files = uploaded.len(), "mission upload complete");
        Ok(uploaded)
    }

    /// Create a mission and upload `dir` into it.
    pub async fn create_and_upload(
        &self,
        request: &CreateMissionRequest,
        dir: &Path,
    ) -> Result<(Mission, Vec<UploadedFile>), CoreError> {
        let mission = self.create(request).await?;
        let uploaded = self.upload(&mission.id, dir).await?;
        Ok((mission, uploaded))
    }

    /// Create, upload, then launch on `station_id` (optionally pinned to
    /// `machine_id`).
    pub async fn create_and_run(
        &self,
        request: &CreateMissionRequest,
        dir: &Path,
        station_id: &str,
        machine_id: Option<&str>,
    ) -> Result<Job, CoreError> {
        let (mission, _) = self.create_and_upload(request, dir).await?;
        let run = RunJobRequest {
            station_id: station_id.to_owned(),
            machine_id: machine_id.map(str::to_owned),
            ..RunJobRequest::default()
        };
        self.run(&mission.id, &run).await
    }
}

/// Regular files under `root`, depth first, sorted within each directory.
async fn collect_files(root: &Path) -> Result<Vec<PathBuf>, CoreError> {
    if !tokio::fs::metadata(root).await?.is_dir() {
        return Err(CoreError::Validation {
            field: "dir".into(),
            reason: format!("{} is not a directory", root.display()),
        });
    }

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            entries.push((entry.path(), entry.file_type().await?));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut subdirs = Vec::new();
        for (path, kind) in entries {
            if kind.is_dir() {
                subdirs.push(path);
            } else if kind.is_file() {
                files.push(path);
            }
        }
        // Reverse so the stack pops them in sorted order.
        pending.extend(subdirs.into_iter().rev());
    }
    Ok(files)
}

fn relative_name(root: &Path, path: &Path) -> Result<String, CoreError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| CoreError::Internal(format!("{} outside upload root: {e}", path.display())))?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn walks_nested_directories_in_order() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("src/util")).unwrap();
        std::fs::write(root.path().join("main.py"), "print(1)").unwrap();
        std::fs::write(root.path().join("src/a.py"), "").unwrap();
        std::fs::write(root.path().join("src/util/b.py"), "").unwrap();

        let names: Vec<String> = collect_files(root.path())
            .await
            .unwrap()
            .iter()
            .map(|p| relative_name(root.path(), p).unwrap())
            .collect();

        assert_eq!(names, vec!["main.py", "src/a.py", "src/util/b.py"]);
    }

    #[tokio::test]
    async fn rejects_a_plain_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("job.py");
        std::fs::write(&file, "").unwrap();
        assert!(matches!(
            collect_files(&file).await,
            Err(CoreError::Validation { .. })
        ));
    }
}
