use std::sync::Arc;

use galileo_api::GalileoClient;
use galileo_api::models::{Machine, MachinesFilter, UpdateMachineRequest};

use crate::error::CoreError;

/// Landing zones: machines that accept jobs.
#[derive(Debug, Clone)]
pub struct MachinesService {
    client: Arc<GalileoClient>,
}

impl MachinesService {
    pub fn new(client: Arc<GalileoClient>) -> Self {
        Self { client }
    }

    pub async fn get(&self, mid: &str) -> Result<Machine, CoreError> {
        self.client
            .get_machine_by_id(mid)
            .await
            .map_err(CoreError::not_found("machine", mid))
    }

    pub async fn list(&self, filter: &MachinesFilter) -> Result<Vec<Machine>, CoreError> {
        Ok(self.client.list_machines(filter).await?)
    }

    pub async fn update(&self, request: &UpdateMachineRequest) -> Result<Machine, CoreError> {
        self.client
            .update_machine(request)
            .await
            .map_err(CoreError::not_found("machine", &request.mid))
    }

    pub async fn delete(&self, mid: &str) -> Result<(), CoreError> {
        self.client
            .delete_machine(mid)
            .await
            .map_err(CoreError::not_found("machine", mid))
    }
}
