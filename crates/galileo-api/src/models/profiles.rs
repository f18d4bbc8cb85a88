use serde::{Deserialize, Serialize};

use crate::rest::query::QueryParams;

/// A payment card on file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCard {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub stripe_payment_method_id: Option<String>,
    #[serde(default)]
    pub creation_timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "userid")]
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub mids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_tier_id: Option<String>,
    #[serde(default)]
    pub stored_cards: Vec<ProfileCard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersFilter {
    pub user_ids: Vec<String>,
    pub usernames: Vec<String>,
    pub partial_usernames: Vec<String>,
    pub page: u32,
    pub items: u32,
}

impl Default for UsersFilter {
    fn default() -> Self {
        Self {
            user_ids: Vec::new(),
            usernames: Vec::new(),
            partial_usernames: Vec::new(),
            page: 1,
            items: 25,
        }
    }
}

impl UsersFilter {
    pub fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .with("page", self.page)
            .with("items", self.items)
            .with("userids", &self.user_ids)
            .with("usernames", &self.usernames)
            .with("partial_usernames", &self.partial_usernames)
    }
}
