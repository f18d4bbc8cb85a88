use std::sync::Arc;

use galileo_api::GalileoClient;
use galileo_api::models::{Profile, Station, UsersFilter};

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct ProfilesService {
    client: Arc<GalileoClient>,
}

impl ProfilesService {
    pub fn new(client: Arc<GalileoClient>) -> Self {
        Self { client }
    }

    /// The authenticated user.
    pub async fn get_self(&self) -> Result<Profile, CoreError> {
        Ok(self.client.get_self().await?)
    }

    pub async fn list_users(&self, filter: &UsersFilter) -> Result<Vec<Profile>, CoreError> {
        Ok(self.client.list_users(filter).await?)
    }

    /// Stations that have invited the caller.
    pub async fn list_station_invites(&self) -> Result<Vec<Station>, CoreError> {
        Ok(self.client.list_station_invites().await?)
    }
}
