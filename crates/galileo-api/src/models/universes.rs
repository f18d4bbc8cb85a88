use serde::{Deserialize, Serialize};

/// Top-level tenancy boundary above stations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    #[serde(alias = "universe_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub creation_timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUniverseRequest {
    pub name: String,
    pub require_positive_credit_balance: bool,
    pub allow_scheduling_without_quota: bool,
    pub admin_user_ids: Vec<String>,
}
