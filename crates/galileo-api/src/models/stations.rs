use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::rest::query::QueryParams;

// ── Members ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum StationUserStatus {
    Owner,
    Admin,
    Member,
    Pending,
    Invited,
    Blocked,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationUser {
    #[serde(rename = "stationuserid")]
    pub station_user_id: String,
    #[serde(rename = "userid")]
    pub user_id: String,
    pub status: StationUserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_timestamp: Option<String>,
}

// ── Volumes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum VolumeAccess {
    #[serde(rename = "r")]
    #[strum(serialize = "r")]
    Read,
    #[serde(rename = "rw")]
    #[strum(serialize = "rw")]
    ReadWrite,
}

/// Maps a machine to a filesystem path backing a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeHostPath {
    #[serde(rename = "volumehostpathid")]
    pub volume_host_path_id: String,
    pub mid: String,
    pub host_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    #[serde(rename = "volumeid")]
    pub volume_id: String,
    pub name: String,
    pub mount_point: String,
    #[serde(rename = "stationid")]
    pub station_id: String,
    pub access: VolumeAccess,
    #[serde(default)]
    pub host_paths: Vec<VolumeHostPath>,
}

// ── Stations ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "stationid")]
    pub station_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub users: Vec<StationUser>,
    #[serde(default)]
    pub mids: Vec<String>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_auto_join: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStationRequest {
    pub name: String,
    pub user_ids: Vec<String>,
    pub description: String,
}

/// Body of `PUT /station/{id}`. The id travels in the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStationRequest {
    #[serde(skip)]
    pub station_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_auto_join: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationsFilter {
    pub station_ids: Vec<String>,
    pub names: Vec<String>,
    pub mids: Vec<String>,
    pub user_roles: Vec<StationUserStatus>,
    pub volume_ids: Vec<String>,
    pub descriptions: Vec<String>,
    pub page: u32,
    pub items: u32,
}

impl Default for StationsFilter {
    fn default() -> Self {
        Self {
            station_ids: Vec::new(),
            names: Vec::new(),
            mids: Vec::new(),
            user_roles: Vec::new(),
            volume_ids: Vec::new(),
            descriptions: Vec::new(),
            page: 1,
            items: 25,
        }
    }
}

impl StationsFilter {
    pub fn to_query(&self) -> QueryParams {
        let roles: Vec<String> = self.user_roles.iter().map(ToString::to_string).collect();
        QueryParams::new()
            .with("stationids", &self.station_ids)
            .with("names", &self.names)
            .with("mids", &self.mids)
            .with("user_roles", roles)
            .with("volumeids", &self.volume_ids)
            .with("descriptions", &self.descriptions)
            .with("page", self.page)
            .with("items", self.items)
    }
}

// ── Roles ───────────────────────────────────────────────────────────

/// Permission switches carried by a station role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RolePermissions {
    pub edit_station_roles: bool,
    pub assign_user_roles: bool,
    pub assign_protected_user_roles: bool,
    pub launch_jobs: bool,
    pub invite_users: bool,
    pub remove_all_users: bool,
    pub remove_invited_users: bool,
    pub view_all_users: bool,
    pub edit_metadata: bool,
    pub add_machine: bool,
    pub remove_any_machine: bool,
    pub view_all_jobs: bool,
    pub control_all_jobs: bool,
    pub view_jobs_on_own_machines: bool,
    pub control_jobs_on_own_machines: bool,
    pub view_own_jobs: bool,
    pub control_own_jobs: bool,
    pub view_complete_activity: bool,
    pub edit_station_policy: bool,
    pub edit_own_machine_policy: bool,
    pub edit_machine_policy: bool,
    pub edit_user_policy: bool,
    pub edit_job_resource_limits: bool,
    pub add_autoscale: bool,
    pub edit_autoscale: bool,
    pub remove_autoscale: bool,
    pub manage_volumes: bool,
    pub reject_user_requests: bool,
    pub create_tunnels: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationRole {
    pub id: String,
    pub station_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub role_type: Option<String>,
    #[serde(default)]
    pub protected_role: bool,
    #[serde(flatten)]
    pub permissions: RolePermissions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_timestamp: Option<String>,
}

/// Body shared by role creation and role update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStationRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub role_type: String,
    #[serde(default)]
    pub protected_role: bool,
    #[serde(flatten)]
    pub permissions: RolePermissions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolesFilter {
    pub role_ids: Vec<String>,
    pub page: Option<u32>,
    pub items: Option<u32>,
}

impl RolesFilter {
    pub fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .with("stationroleids", &self.role_ids)
            .with("page", self.page)
            .with("items", self.items)
    }
}

// ── Resource policies ───────────────────────────────────────────────

/// Resource caps attached to a station, member, role, or machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcePolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub max_cpu_per_job: Option<f64>,
    pub max_memory_per_job: Option<f64>,
    pub max_gpu_per_job: Option<f64>,
    pub max_cpu_per_station: Option<f64>,
    pub max_memory_per_station: Option<f64>,
    pub max_gpu_per_station: Option<f64>,
    pub max_cpu_global: Option<f64>,
    pub max_memory_global: Option<f64>,
    pub max_gpu_global: Option<f64>,
    pub max_projects: Option<i64>,
    pub max_users_in_station: Option<i64>,
    pub max_stations: Option<i64>,
    pub max_project_types: Option<i64>,
    pub max_cloud_storage_space: Option<f64>,
    pub max_spend_per_day: Option<f64>,
    pub max_spend_per_week: Option<f64>,
    pub max_spend_per_month: Option<f64>,
    pub max_spend_per_year: Option<f64>,
    pub cpu_credits_per_hour: Option<f64>,
    pub memory_credits_per_hour: Option<f64>,
    pub gpu_credits_per_hour: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_timestamp: Option<String>,
}

/// Update body. Bookkeeping fields are left out when unset.
pub type UpdateResourcePolicyRequest = ResourcePolicy;

/// The caller's effective limits within a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default)]
    pub resource_policy: Option<ResourcePolicy>,
    #[serde(default)]
    pub machine_id: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn update_request_round_trips_against_response() {
        let request = UpdateStationRequest {
            station_id: "st-1".into(),
            name: Some("Render farm".into()),
            description: Some("GPU nodes".into()),
            public: Some(true),
            allow_auto_join: Some(false),
        };

        let body = serde_json::to_value(&request).expect("body");
        assert_eq!(
            body,
            json!({
                "name": "Render farm",
                "description": "GPU nodes",
                "public": true,
                "allow_auto_join": false
            })
        );

        let mut response = body;
        response["stationid"] = json!("st-1");
        let station: Station = serde_json::from_value(response).expect("station");
        assert_eq!(station.station_id, request.station_id);
        assert_eq!(Some(station.name), request.name);
        assert_eq!(station.description, request.description);
        assert_eq!(station.public, request.public);
        assert_eq!(station.allow_auto_join, request.allow_auto_join);
    }

    #[test]
    fn station_with_members_and_volumes() {
        let station: Station = serde_json::from_value(json!({
            "stationid": "st-1",
            "name": "lab",
            "description": "shared",
            "users": [{"stationuserid": "su-1", "userid": "u-1", "status": "OWNER"}],
            "mids": ["m-1"],
            "volumes": [{
                "volumeid": "v-1", "name": "data", "mount_point": "/data",
                "stationid": "st-1", "access": "rw",
                "host_paths": [{"volumehostpathid": "hp-1", "mid": "m-1", "host_path": "/srv"}]
            }]
        }))
        .expect("station");

        assert_eq!(station.users[0].status, StationUserStatus::Owner);
        assert_eq!(station.volumes[0].access, VolumeAccess::ReadWrite);
        assert_eq!(station.volumes[0].host_paths[0].host_path, "/srv");
    }

    #[test]
    fn role_permissions_flatten_into_body() {
        let req = CreateStationRoleRequest {
            name: "operator".into(),
            permissions: RolePermissions {
                launch_jobs: true,
                ..RolePermissions::default()
            },
            ..CreateStationRoleRequest::default()
        };
        let body = serde_json::to_value(&req).expect("body");
        assert_eq!(body["name"], "operator");
        assert_eq!(body["launch_jobs"], true);
        assert_eq!(body["manage_volumes"], false);
    }
}
