use std::sync::Arc;

use galileo_api::GalileoClient;
use galileo_api::models::CargoBay;

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct CargoBaysService {
    client: Arc<GalileoClient>,
}

impl CargoBaysService {
    pub fn new(client: Arc<GalileoClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<CargoBay>, CoreError> {
        Ok(self.client.list_cargo_bays().await?)
    }
}
