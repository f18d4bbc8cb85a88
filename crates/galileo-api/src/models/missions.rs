use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::lenient_string;
use crate::rest::query::QueryParams;

/// An uploaded unit of work: files plus runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_storage_id: Option<String>,
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(default)]
    pub destination_storage_id: Option<String>,
    #[serde(default)]
    pub destination_path: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub creation_timestamp: Option<String>,
    #[serde(rename = "project_type_id", alias = "mission_type_id", default)]
    pub mission_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    pub version: Option<String>,
}

/// A file stored under a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionFile {
    pub filename: String,
    pub path: String,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    pub modification_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string::deserialize")]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Runtime-specific fields merged into the mission creation body.
///
/// Each variant only pre-populates body keys; the backend selects the
/// runtime through `project_type_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MissionRuntime {
    /// R: script runtime plus CRAN packages.
    R {
        filename: String,
        cpu: u32,
        arg: Vec<String>,
        dependencies: BTreeMap<String, String>,
        cran_dependencies: BTreeMap<String, String>,
        env: BTreeMap<String, String>,
    },
    /// Python, Julia, and Stata.
    Script {
        filename: String,
        cpu: u32,
        arg: Vec<String>,
        dependencies: BTreeMap<String, String>,
        env: BTreeMap<String, String>,
    },
    Octave {
        filename: String,
        dependencies: BTreeMap<String, String>,
        arg: Vec<String>,
    },
    Hecras {
        plan: String,
        files_to_run: Vec<String>,
        nfs: bool,
        input_path: String,
        output_path: String,
    },
    Blender {
        copy_in_path: String,
        copy_container_path: String,
    },
    AutoDockVina {
        #[serde(rename = "FILENAME")]
        filename: String,
    },
    /// SWMM5, Quantum ESPRESSO, MATLAB, FLO-2D.
    EntryFile { filename: String },
    /// Runtimes with no extra fields (Bioconductor).
    Plain {},
}

/// Body of `POST /projects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMissionRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source_storage_id: Option<String>,
    #[serde(default)]
    pub destination_storage_id: Option<String>,
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(default)]
    pub destination_path: Option<String>,
    #[serde(rename = "project_type_id", default)]
    pub mission_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(flatten)]
    pub runtime: Option<MissionRuntime>,
}

impl CreateMissionRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            source_storage_id: None,
            destination_storage_id: None,
            source_path: None,
            destination_path: None,
            mission_type_id: None,
            settings: None,
            public: None,
            runtime: None,
        }
    }
}

/// Body of `PUT /projects/{id}`. Unset fields are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateMissionRequest {
    #[serde(skip)]
    pub mission_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_storage_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
}

/// Body of `POST /projects/{id}/jobs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunJobRequest {
    pub station_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionsFilter {
    pub ids: Vec<String>,
    pub names: Vec<String>,
    pub user_ids: Vec<String>,
    pub mission_type_ids: Vec<String>,
    pub archived: bool,
    pub page: u32,
    pub items: u32,
}

impl Default for MissionsFilter {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            names: Vec::new(),
            user_ids: Vec::new(),
            mission_type_ids: Vec::new(),
            archived: false,
            page: 1,
            items: 25,
        }
    }
}

impl MissionsFilter {
    pub fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .with("ids", &self.ids)
            .with("names", &self.names)
            .with("user_ids", &self.user_ids)
            .with("page", self.page)
            .with("items", self.items)
            .with("mission_type_ids", &self.mission_type_ids)
            .with("archived", self.archived)
    }
}
