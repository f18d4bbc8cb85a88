use serde::{Deserialize, Serialize};

/// A storage backend that missions read from and write results to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoBay {
    #[serde(alias = "storage_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub storage_type: Option<String>,
    #[serde(default, alias = "creation_timestamp")]
    pub creation_date: Option<String>,
}
