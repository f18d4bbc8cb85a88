// User profile endpoints

use serde_json::Value;

use super::client::{GalileoClient, field};
use super::query::QueryParams;
use crate::error::Error;
use crate::models::{Profile, Station, UsersFilter};

impl GalileoClient {
    /// The authenticated user's own profile.
    pub async fn get_self(&self) -> Result<Profile, Error> {
        self.get("/users/self", &QueryParams::new()).await
    }

    pub async fn list_users(&self, filter: &UsersFilter) -> Result<Vec<Profile>, Error> {
        let resp: Value = self.get("/users", &filter.to_query()).await?;
        field(resp, "users")
    }

    /// Stations the user has been invited to.
    pub async fn list_station_invites(&self) -> Result<Vec<Station>, Error> {
        let resp: Value = self.get("/users/invites", &QueryParams::new()).await?;
        field(resp, "stations")
    }
}
