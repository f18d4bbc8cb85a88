use std::sync::Arc;

use galileo_api::models::{
    CreateStationRequest, CreateStationRoleRequest, ResourceLimits, ResourcePolicy, RolesFilter,
    Station, StationRole, StationUser, StationsFilter, UpdateResourcePolicyRequest,
    UpdateStationRequest, Volume, VolumeAccess,
};
use galileo_api::{GalileoClient, PolicyTarget};

use crate::error::CoreError;

/// Stations: groups of users and machines with shared access control.
#[derive(Debug, Clone)]
pub struct StationsService {
    client: Arc<GalileoClient>,
}

impl StationsService {
    pub fn new(client: Arc<GalileoClient>) -> Self {
        Self { client }
    }

    // ── Stations ─────────────────────────────────────────────────────

    pub async fn list(&self, filter: &StationsFilter) -> Result<Vec<Station>, CoreError> {
        Ok(self.client.list_stations(filter).await?)
    }

    pub async fn list_public(&self, filter: &StationsFilter) -> Result<Vec<Station>, CoreError> {
        Ok(self.client.list_public_stations(filter).await?)
    }

    pub async fn create(&self, request: &CreateStationRequest) -> Result<Station, CoreError> {
        if request.name.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "name".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(self.client.create_station(request).await?)
    }

    pub async fn update(&self, request: &UpdateStationRequest) -> Result<Station, CoreError> {
        self.client
            .update_station(request)
            .await
            .map_err(CoreError::not_found("station", &request.station_id))
    }

    pub async fn delete(&self, station_id: &str) -> Result<(), CoreError> {
        self.client
            .delete_station(station_id)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    // ── Membership ───────────────────────────────────────────────────

    pub async fn invite(&self, station_id: &str, user_ids: &[String], role_id: &str) -> Result<(), CoreError> {
        non_empty("user_ids", user_ids)?;
        self.client
            .invite_to_station(station_id, user_ids, role_id)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    pub async fn accept_invite(&self, station_id: &str) -> Result<(), CoreError> {
        self.client
            .accept_station_invite(station_id)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    pub async fn reject_invite(&self, station_id: &str) -> Result<(), CoreError> {
        self.client
            .reject_station_invite(station_id)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    pub async fn request_to_join(&self, station_id: &str) -> Result<(), CoreError> {
        self.client
            .request_to_join(station_id)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    pub async fn approve_requests(&self, station_id: &str, user_ids: &[String]) -> Result<(), CoreError> {
        non_empty("user_ids", user_ids)?;
        self.client
            .approve_request_to_join(station_id, user_ids)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    pub async fn reject_requests(&self, station_id: &str, user_ids: &[String]) -> Result<(), CoreError> {
        non_empty("user_ids", user_ids)?;
        self.client
            .reject_request_to_join(station_id, user_ids)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    /// Leave the station, withdrawing the caller's machines.
    pub async fn leave(&self, station_id: &str) -> Result<(), CoreError> {
        self.client
            .leave_station(station_id)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    pub async fn update_member_role(
        &self,
        station_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<StationUser, CoreError> {
        self.client
            .update_station_member(station_id, user_id, role_id)
            .await
            .map_err(CoreError::not_found("station member", user_id))
    }

    pub async fn remove_member(&self, station_id: &str, user_id: &str) -> Result<(), CoreError> {
        self.client
            .remove_member_from_station(station_id, user_id)
            .await
            .map_err(CoreError::not_found("station member", user_id))
    }

    // ── Machines ─────────────────────────────────────────────────────

    pub async fn add_machines(&self, station_id: &str, mids: &[String]) -> Result<(), CoreError> {
        non_empty("mids", mids)?;
        self.client
            .add_machines_to_station(station_id, mids)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    pub async fn remove_machines(&self, station_id: &str, mids: &[String]) -> Result<(), CoreError> {
        non_empty("mids", mids)?;
        self.client
            .remove_machines_from_station(station_id, mids)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    // ── Volumes ──────────────────────────────────────────────────────

    pub async fn add_volume(
        &self,
        station_id: &str,
        name: &str,
        mount_point: &str,
        access: VolumeAccess,
    ) -> Result<Volume, CoreError> {
        self.client
            .add_volume_to_station(station_id, name, mount_point, access)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    pub async fn add_host_path(
        &self,
        station_id: &str,
        volume_id: &str,
        mid: &str,
        host_path: &str,
    ) -> Result<Volume, CoreError> {
        self.client
            .add_host_path_to_volume(station_id, volume_id, mid, host_path)
            .await
            .map_err(CoreError::not_found("volume", volume_id))
    }

    pub async fn remove_host_path(
        &self,
        station_id: &str,
        volume_id: &str,
        host_path_id: &str,
    ) -> Result<(), CoreError> {
        self.client
            .delete_host_path_from_volume(station_id, volume_id, host_path_id)
            .await
            .map_err(CoreError::not_found("host path", host_path_id))
    }

    pub async fn remove_volume(&self, station_id: &str, volume_id: &str) -> Result<(), CoreError> {
        self.client
            .remove_volume_from_station(station_id, volume_id)
            .await
            .map_err(CoreError::not_found("volume", volume_id))
    }

    // ── Roles ────────────────────────────────────────────────────────

    pub async fn roles(&self, station_id: &str, filter: &RolesFilter) -> Result<Vec<StationRole>, CoreError> {
        self.client
            .list_station_roles(station_id, filter)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    pub async fn create_role(
        &self,
        station_id: &str,
        request: &CreateStationRoleRequest,
    ) -> Result<StationRole, CoreError> {
        self.client
            .create_station_role(station_id, request)
            .await
            .map_err(CoreError::not_found("station", station_id))
    }

    pub async fn update_role(
        &self,
        station_id: &str,
        role_id: &str,
        request: &CreateStationRoleRequest,
    ) -> Result<StationRole, CoreError> {
        self.client
            .update_station_role(station_id, role_id, request)
            .await
            .map_err(CoreError::not_found("role", role_id))
    }

    pub async fn delete_role(&self, station_id: &str, role_id: &str) -> Result<(), CoreError> {
        self.client
            .delete_station_role(station_id, role_id)
            .await
            .map_err(CoreError::not_found("role", role_id))
    }

    // ── Resource policies ────────────────────────────────────────────

    /// `None` when no policy is set for the target.
    pub async fn resource_policy(
        &self,
        station_id: &str,
        target: PolicyTarget<'_>,
    ) -> Result<Option<ResourcePolicy>, CoreError> {
        Ok(self.client.get_resource_policy(station_id, target).await?)
    }

    pub async fn update_resource_policy(
        &self,
        station_id: &str,
        target: PolicyTarget<'_>,
        request: &UpdateResourcePolicyRequest,
    ) -> Result<Option<ResourcePolicy>, CoreError> {
        Ok(self
            .client
            .update_resource_policy(station_id, target, request)
            .await?)
    }

    pub async fn delete_resource_policy(
        &self,
        station_id: &str,
        target: PolicyTarget<'_>,
    ) -> Result<(), CoreError> {
        Ok(self.client.delete_resource_policy(station_id, target).await?)
    }

    /// The caller's effective limits in `station_id`.
    pub async fn self_resource_limits(&self, station_id: &str) -> Result<ResourceLimits, CoreError> {
        Ok(self.client.get_self_resource_limits(station_id).await?)
    }

    pub async fn machine_resource_limits(
        &self,
        station_id: &str,
        mid: &str,
    ) -> Result<Option<ResourcePolicy>, CoreError> {
        Ok(self.client.get_machine_resource_limits(station_id, mid).await?)
    }
}

fn non_empty(field: &str, values: &[String]) -> Result<(), CoreError> {
    if values.is_empty() {
        return Err(CoreError::Validation {
            field: field.into(),
            reason: "at least one value is required".into(),
        });
    }
    Ok(())
}
