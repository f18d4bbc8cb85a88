// Landing zone (machine) endpoints

use serde::de::IgnoredAny;
use serde_json::Value;

use super::client::{GalileoClient, field};
use super::query::QueryParams;
use crate::error::Error;
use crate::models::{Machine, MachinesFilter, UpdateMachineRequest};

impl GalileoClient {
    pub async fn get_machine_by_id(&self, mid: &str) -> Result<Machine, Error> {
        let resp: Value = self
            .get(&format!("/machines/{mid}"), &QueryParams::new())
            .await?;
        field(resp, "machine")
    }

    pub async fn list_machines(&self, filter: &MachinesFilter) -> Result<Vec<Machine>, Error> {
        let resp: Value = self.get("/machines", &filter.to_query()).await?;
        field(resp, "machines")
    }

    pub async fn update_machine(&self, request: &UpdateMachineRequest) -> Result<Machine, Error> {
        let resp: Value = self
            .put(&format!("/machines/{}", request.mid), request)
            .await?;
        field(resp, "machine")
    }

    pub async fn delete_machine(&self, mid: &str) -> Result<(), Error> {
        let _: IgnoredAny = self.delete(&format!("/machines/{mid}")).await?;
        Ok(())
    }
}
