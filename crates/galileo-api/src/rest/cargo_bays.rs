// Cargo bay (storage) endpoints

use serde_json::Value;

use super::client::{GalileoClient, field};
use super::query::QueryParams;
use crate::error::Error;
use crate::models::CargoBay;

impl GalileoClient {
    pub async fn list_cargo_bays(&self) -> Result<Vec<CargoBay>, Error> {
        let resp: Value = self.get("/storage", &QueryParams::new()).await?;
        field(resp, "storage")
    }
}
