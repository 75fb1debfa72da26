use super::ArmClient;
use super::paging::Enumeration;
use crate::cmd::select::Choice;
use serde::Deserialize;

pub const API_VERSION: &str = "2020-01-01";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default)]
    pub id: String,
    pub subscription_id: String,
    pub display_name: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl Choice for Subscription {
    fn id(&self) -> &str {
        &self.subscription_id
    }

    fn label(&self) -> &str {
        &self.display_name
    }
}

/// Stream the subscriptions visible to the client's credential
pub fn list(client: &ArmClient) -> Enumeration<Subscription> {
    client.enumerate(format!("subscriptions?api-version={}", API_VERSION))
}
