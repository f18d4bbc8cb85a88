//! Wire records exchanged with the Galileo REST API.
//!
//! Field names follow the backend's JSON (`jobid`, `stationid`, `mids`)
//! through serde renames; the Rust side uses `snake_case` ids. Required
//! keys are plain fields, so a missing key fails deserialization instead
//! of producing a half-filled record.

mod cargo_bays;
mod jobs;
mod machines;
mod missions;
mod profiles;
mod stations;
mod universes;

pub use cargo_bays::CargoBay;
pub use jobs::{
    JobStatus, Job, JobStatusEntry, JobTop, JobsFilter, ResultFile, SendJobRequest, TopDetail,
    TopProcess, TransferLocation, UpdateJobRequest,
};
pub use machines::{Machine, MachineStatus, MachinesFilter, UpdateMachineRequest};
pub use missions::{
    CreateMissionRequest, MissionRuntime, Mission, MissionFile, MissionType, MissionsFilter,
    RunJobRequest, UpdateMissionRequest,
};
pub use profiles::{Profile, ProfileCard, UsersFilter};
pub use stations::{
    CreateStationRequest, CreateStationRoleRequest, ResourceLimits, ResourcePolicy, RolePermissions,
    RolesFilter, Station, StationRole, StationUser, StationUserStatus, StationsFilter,
    UpdateResourcePolicyRequest, UpdateStationRequest, Volume, VolumeAccess, VolumeHostPath,
};
pub use universes::{CreateUniverseRequest, Universe};

/// Serde adapter for epoch-second timestamps.
///
/// The backend sends integers or floats; both are accepted.
pub(crate) mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.timestamp())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        from_secs(secs).ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {secs}")))
    }

    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub(super) fn from_secs(secs: f64) -> Option<DateTime<Utc>> {
        let whole = secs.trunc();
        let nanos = ((secs - whole) * 1e9).round() as u32;
        DateTime::from_timestamp(whole as i64, nanos)
    }
}

/// Accepts a string, a number, or null, producing an optional string.
///
/// Hardware descriptors arrive as either depending on the agent version.
pub(crate) mod lenient_string {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
            Raw::Text(s) => s,
            Raw::Int(n) => n.to_string(),
            Raw::Float(f) => f.to_string(),
        }))
    }
}
