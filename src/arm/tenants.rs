use super::ArmClient;
use super::paging::Enumeration;
use crate::cmd::select::Choice;
use serde::Deserialize;

pub const API_VERSION: &str = "2020-01-01";

/// A tenant the signed-in account belongs to
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TenantIdDescription {
    #[serde(default)]
    pub id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub default_domain: Option<String>,
}

impl Choice for TenantIdDescription {
    fn id(&self) -> &str {
        &self.tenant_id
    }

    /// Display name, falling back to the default domain and then the id
    fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.default_domain.as_deref())
            .unwrap_or(&self.tenant_id)
    }
}

/// Stream the tenants visible to the client's credential
pub fn list(client: &ArmClient) -> Enumeration<TenantIdDescription> {
    client.enumerate(format!("tenants?api-version={}", API_VERSION))
}
