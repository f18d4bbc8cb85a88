// Universe endpoints

use serde_json::Value;

use super::client::{GalileoClient, field};
use super::query::QueryParams;
use crate::error::Error;
use crate::models::{CreateUniverseRequest, Universe};

impl GalileoClient {
    pub async fn list_universes(&self) -> Result<Vec<Universe>, Error> {
        let resp: Value = self.get("/universe", &QueryParams::new()).await?;
        field(resp, "universes")
    }

    pub async fn create_universe(&self, request: &CreateUniverseRequest) -> Result<Universe, Error> {
        let resp: Value = self.post("/universe", request).await?;
        field(resp, "universe")
    }
}
