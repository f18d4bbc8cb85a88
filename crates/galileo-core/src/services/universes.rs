use std::sync::Arc;

use galileo_api::GalileoClient;
use galileo_api::models::{CreateUniverseRequest, Universe};

use crate::error::CoreError;

/// Billing tenancies the caller belongs to.
#[derive(Debug, Clone)]
pub struct UniversesService {
    client: Arc<GalileoClient>,
}

impl UniversesService {
    pub fn new(client: Arc<GalileoClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Universe>, CoreError> {
        Ok(self.client.list_universes().await?)
    }

    pub async fn create(&self, request: &CreateUniverseRequest) -> Result<Universe, CoreError> {
        if request.name.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "name".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(self.client.create_universe(request).await?)
    }
}
