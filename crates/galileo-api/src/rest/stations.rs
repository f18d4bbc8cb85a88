// Station endpoints
//
// Membership, machines, and volumes live under `/station/{id}`; roles and
// resource policies live under `/stations/{id}`.

use serde::de::IgnoredAny;
use serde_json::{Value, json};

use super::client::{GalileoClient, field};
use super::query::QueryParams;
use crate::error::Error;
use crate::models::{
    CreateStationRequest, CreateStationRoleRequest, ResourceLimits, ResourcePolicy, RolesFilter,
    Station, StationRole, StationUser, StationsFilter, UpdateResourcePolicyRequest,
    UpdateStationRequest, Volume, VolumeAccess,
};

/// Owner of a resource policy within a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyTarget<'a> {
    Station,
    User(&'a str),
    Role(&'a str),
    Machine(&'a str),
}

impl PolicyTarget<'_> {
    fn endpoint(self, station_id: &str) -> String {
        match self {
            Self::Station => format!("/stations/{station_id}/resource_policy"),
            Self::User(id) => format!("/stations/{station_id}/users/{id}/resource_policy"),
            Self::Role(id) => format!("/stations/{station_id}/roles/{id}/resource_policy"),
            Self::Machine(id) => format!("/stations/{station_id}/machines/{id}/resource_policy"),
        }
    }
}

impl GalileoClient {
    // ── Stations ─────────────────────────────────────────────────────

    pub async fn list_stations(&self, filter: &StationsFilter) -> Result<Vec<Station>, Error> {
        let resp: Value = self.get("/stations", &filter.to_query()).await?;
        field(resp, "stations")
    }

    pub async fn list_public_stations(&self, filter: &StationsFilter) -> Result<Vec<Station>, Error> {
        let resp: Value = self.get("/stations/public", &filter.to_query()).await?;
        field(resp, "stations")
    }

    pub async fn create_station(&self, request: &CreateStationRequest) -> Result<Station, Error> {
        let resp: Value = self.post("/station", request).await?;
        field(resp, "station")
    }

    pub async fn update_station(&self, request: &UpdateStationRequest) -> Result<Station, Error> {
        let resp: Value = self
            .put(&format!("/station/{}", request.station_id), request)
            .await?;
        field(resp, "station")
    }

    pub async fn delete_station(&self, station_id: &str) -> Result<(), Error> {
        let _: IgnoredAny = self.delete(&format!("/station/{station_id}")).await?;
        Ok(())
    }

    // ── Membership ───────────────────────────────────────────────────

    pub async fn invite_to_station(
        &self,
        station_id: &str,
        user_ids: &[String],
        role_id: &str,
    ) -> Result<(), Error> {
        let body = json!({ "userids": user_ids, "role_id": role_id });
        let _: IgnoredAny = self
            .post(&format!("/station/{station_id}/users/invite"), &body)
            .await?;
        Ok(())
    }

    pub async fn accept_station_invite(&self, station_id: &str) -> Result<(), Error> {
        let _: IgnoredAny = self
            .put_empty(&format!("/station/{station_id}/users/accept"))
            .await?;
        Ok(())
    }

    pub async fn reject_station_invite(&self, station_id: &str) -> Result<(), Error> {
        let _: IgnoredAny = self
            .put_empty(&format!("/station/{station_id}/users/reject"))
            .await?;
        Ok(())
    }

    pub async fn request_to_join(&self, station_id: &str) -> Result<(), Error> {
        let _: IgnoredAny = self
            .post_empty(&format!("/station/{station_id}/requests"))
            .await?;
        Ok(())
    }

    pub async fn approve_request_to_join(
        &self,
        station_id: &str,
        user_ids: &[String],
    ) -> Result<(), Error> {
        let _: IgnoredAny = self
            .put(
                &format!("/station/{station_id}/requests/approve"),
                &json!({ "userids": user_ids }),
            )
            .await?;
        Ok(())
    }

    pub async fn reject_request_to_join(
        &self,
        station_id: &str,
        user_ids: &[String],
    ) -> Result<(), Error> {
        let _: IgnoredAny = self
            .put(
                &format!("/station/{station_id}/requests/reject"),
                &json!({ "userids": user_ids }),
            )
            .await?;
        Ok(())
    }

    /// Leave a station the caller belongs to.
    pub async fn leave_station(&self, station_id: &str) -> Result<(), Error> {
        let _: IgnoredAny = self
            .put_empty(&format!("/station/{station_id}/user/withdraw"))
            .await?;
        Ok(())
    }

    pub async fn update_station_member(
        &self,
        station_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<StationUser, Error> {
        let resp: Value = self
            .put(
                &format!("/station/{station_id}/user/{user_id}"),
                &json!({ "role_id": role_id }),
            )
            .await?;
        field(resp, "station_user")
    }

    pub async fn remove_member_from_station(
        &self,
        station_id: &str,
        user_id: &str,
    ) -> Result<(), Error> {
        let _: IgnoredAny = self
            .delete(&format!("/station/{station_id}/user/{user_id}/delete"))
            .await?;
        Ok(())
    }

    // ── Machines ─────────────────────────────────────────────────────

    pub async fn add_machines_to_station(&self, station_id: &str, mids: &[String]) -> Result<(), Error> {
        let _: IgnoredAny = self
            .post(&format!("/station/{station_id}/machines"), &json!({ "mids": mids }))
            .await?;
        Ok(())
    }

    pub async fn remove_machines_from_station(
        &self,
        station_id: &str,
        mids: &[String],
    ) -> Result<(), Error> {
        let _: IgnoredAny = self
            .delete_with_body(&format!("/station/{station_id}/machines"), &json!({ "mids": mids }))
            .await?;
        Ok(())
    }

    // ── Volumes ──────────────────────────────────────────────────────

    pub async fn add_volume_to_station(
        &self,
        station_id: &str,
        name: &str,
        mount_point: &str,
        access: VolumeAccess,
    ) -> Result<Volume, Error> {
        let body = json!({ "name": name, "mount_point": mount_point, "access": access });
        let resp: Value = self
            .post(&format!("/station/{station_id}/volumes"), &body)
            .await?;
        field(resp, "volumes")
    }

    pub async fn add_host_path_to_volume(
        &self,
        station_id: &str,
        volume_id: &str,
        mid: &str,
        host_path: &str,
    ) -> Result<Volume, Error> {
        let resp: Value = self
            .post(
                &format!("/station/{station_id}/volumes/{volume_id}/host_paths"),
                &json!({ "mid": mid, "host_path": host_path }),
            )
            .await?;
        field(resp, "volume")
    }

    pub async fn delete_host_path_from_volume(
        &self,
        station_id: &str,
        volume_id: &str,
        host_path_id: &str,
    ) -> Result<(), Error> {
        let _: IgnoredAny = self
            .delete(&format!(
                "/station/{station_id}/volumes/{volume_id}/host_paths/{host_path_id}"
            ))
            .await?;
        Ok(())
    }

    pub async fn remove_volume_from_station(&self, station_id: &str, volume_id: &str) -> Result<(), Error> {
        let _: IgnoredAny = self
            .delete(&format!("/station/{station_id}/volumes/{volume_id}"))
            .await?;
        Ok(())
    }

    // ── Roles ────────────────────────────────────────────────────────

    pub async fn list_station_roles(
        &self,
        station_id: &str,
        filter: &RolesFilter,
    ) -> Result<Vec<StationRole>, Error> {
        let resp: Value = self
            .get(&format!("/stations/{station_id}/roles"), &filter.to_query())
            .await?;
        field(resp, "roles")
    }

    pub async fn create_station_role(
        &self,
        station_id: &str,
        request: &CreateStationRoleRequest,
    ) -> Result<StationRole, Error> {
        let resp: Value = self
            .post(&format!("/stations/{station_id}/roles"), request)
            .await?;
        field(resp, "role")
    }

    pub async fn update_station_role(
        &self,
        station_id: &str,
        role_id: &str,
        request: &CreateStationRoleRequest,
    ) -> Result<StationRole, Error> {
        let resp: Value = self
            .put(&format!("/stations/{station_id}/roles/{role_id}"), request)
            .await?;
        field(resp, "role")
    }

    pub async fn delete_station_role(&self, station_id: &str, role_id: &str) -> Result<(), Error> {
        let _: IgnoredAny = self
            .delete(&format!("/stations/{station_id}/roles/{role_id}"))
            .await?;
        Ok(())
    }

    // ── Resource policies ────────────────────────────────────────────

    /// `None` when no policy is attached to the target.
    pub async fn get_resource_policy(
        &self,
        station_id: &str,
        target: PolicyTarget<'_>,
    ) -> Result<Option<ResourcePolicy>, Error> {
        let resp: Value = self
            .get(&target.endpoint(station_id), &QueryParams::new())
            .await?;
        field(resp, "resource_policy")
    }

    pub async fn update_resource_policy(
        &self,
        station_id: &str,
        target: PolicyTarget<'_>,
        request: &UpdateResourcePolicyRequest,
    ) -> Result<Option<ResourcePolicy>, Error> {
        let resp: Value = self.put(&target.endpoint(station_id), request).await?;
        field(resp, "resource_policy")
    }

    pub async fn delete_resource_policy(
        &self,
        station_id: &str,
        target: PolicyTarget<'_>,
    ) -> Result<(), Error> {
        let _: IgnoredAny = self.delete(&target.endpoint(station_id)).await?;
        Ok(())
    }

    /// The caller's effective limits in a station.
    pub async fn get_self_resource_limits(&self, station_id: &str) -> Result<ResourceLimits, Error> {
        self.get(
            &format!("/stations/{station_id}/resource_limits"),
            &QueryParams::new(),
        )
        .await
    }

    pub async fn get_machine_resource_limits(
        &self,
        station_id: &str,
        mid: &str,
    ) -> Result<Option<ResourcePolicy>, Error> {
        let resp: Value = self
            .get(
                &format!("/stations/{station_id}/machines/{mid}/resource_limits"),
                &QueryParams::new(),
            )
            .await?;
        field(resp, "resource_policy")
    }
}
