use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::lenient_string;
use crate::rest::query::QueryParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MachineStatus {
    Online,
    Offline,
    #[serde(other)]
    Unknown,
}

/// A landing zone: a compute node that accepts jobs.
///
/// Older agents report `gpu`/`cpu`/`os`/`memory`; newer ones report
/// `gpu_count`/`cpu_count`/`operating_system`/`memory_amount`. Both
/// spellings land in the same fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub mid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "userid", default)]
    pub user_id: Option<String>,
    pub status: MachineStatus,
    #[serde(default, alias = "gpu_count", deserialize_with = "lenient_string::deserialize")]
    pub gpu: Option<String>,
    #[serde(default, alias = "cpu_count", deserialize_with = "lenient_string::deserialize")]
    pub cpu: Option<String>,
    #[serde(default, alias = "operating_system")]
    pub os: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default, alias = "memory_amount", deserialize_with = "lenient_string::deserialize")]
    pub memory: Option<String>,
    #[serde(default)]
    pub running_jobs_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_runner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_technology: Option<String>,
}

/// Field-replacement update for `PUT /machines/{mid}`. Unset fields are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMachineRequest {
    #[serde(skip)]
    pub mid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running_jobs_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachinesFilter {
    pub mids: Vec<String>,
    pub user_ids: Vec<String>,
    pub page: u32,
    pub items: u32,
}

impl Default for MachinesFilter {
    fn default() -> Self {
        Self {
            mids: Vec::new(),
            user_ids: Vec::new(),
            page: 1,
            items: 25,
        }
    }
}

impl MachinesFilter {
    pub fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .with("mids", &self.mids)
            .with("userids", &self.user_ids)
            .with("page", self.page)
            .with("items", self.items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn both_hardware_spellings_decode() {
        let legacy: Machine = serde_json::from_value(json!({
            "mid": "m1", "status": "online", "gpu": "1", "cpu": "8",
            "os": "linux", "arch": "x86_64", "memory": "16GB", "running_jobs_limit": 2
        }))
        .expect("legacy machine");
        let lz: Machine = serde_json::from_value(json!({
            "mid": "m2", "status": "offline", "gpu_count": 2, "cpu_count": 16,
            "operating_system": "linux", "memory_amount": 64, "job_runner": "docker"
        }))
        .expect("landing zone");

        assert_eq!(legacy.cpu.as_deref(), Some("8"));
        assert_eq!(legacy.status, MachineStatus::Online);
        assert_eq!(lz.cpu.as_deref(), Some("16"));
        assert_eq!(lz.memory.as_deref(), Some("64"));
        assert_eq!(lz.os.as_deref(), Some("linux"));
        assert_eq!(lz.status, MachineStatus::Offline);
    }

    #[test]
    fn update_request_skips_unset_fields() {
        let req = UpdateMachineRequest {
            mid: "m1".into(),
            name: Some("render-box".into()),
            running_jobs_limit: Some(4),
            ..UpdateMachineRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&req).expect("json"),
            json!({"name": "render-box", "running_jobs_limit": 4})
        );
    }
}
