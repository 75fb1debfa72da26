use super::ArmClient;
use super::paging::Enumeration;
use crate::error::{Result, VaultScoutError};
use serde::Deserialize;

pub const API_VERSION: &str = "2019-09-01";

/// A key vault as returned by the management plane
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Vault {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Check a resource group name against Azure's naming rules: 1-90 letters,
/// digits, `_`, `-`, `.`, `(` or `)`, not ending in a period. Anything that
/// passes is safe to splice into a URL path.
pub fn check_resource_group(name: &str) -> Result<&str> {
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '(' | ')');

    if name.is_empty() || name.chars().count() > 90 {
        return Err(VaultScoutError::Config(format!(
            "resource group name must be 1-90 characters, got '{}'",
            name
        )));
    }
    if let Some(bad) = name.chars().find(|c| !allowed(*c)) {
        return Err(VaultScoutError::Config(format!(
            "resource group name '{}' contains '{}'",
            name, bad
        )));
    }
    if name.ends_with('.') {
        return Err(VaultScoutError::Config(format!(
            "resource group name '{}' cannot end with a period",
            name
        )));
    }
    Ok(name)
}

/// Listing path for the vaults of a subscription, optionally narrowed to one
/// resource group. `top` caps the page size; later pages come from `nextLink`.
pub fn endpoint(subscription_id: &str, resource_group: Option<&str>, top: u32) -> String {
    let scope = match resource_group {
        Some(rg) => format!("subscriptions/{}/resourceGroups/{}", subscription_id, rg),
        None => format!("subscriptions/{}", subscription_id),
    };
    format!(
        "{}/providers/Microsoft.KeyVault/vaults?api-version={}&$top={}",
        scope, API_VERSION, top
    )
}

/// Stream the key vaults in a subscription (or one of its resource groups)
pub fn list(
    client: &ArmClient,
    subscription_id: &str,
    resource_group: Option<&str>,
    top: u32,
) -> Enumeration<Vault> {
    client.enumerate(endpoint(subscription_id, resource_group, top))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_for_subscription() {
        assert_eq!(
            endpoint("sub-1", None, 30),
            "subscriptions/sub-1/providers/Microsoft.KeyVault/vaults?api-version=2019-09-01&$top=30"
        );
    }

    #[test]
    fn test_endpoint_for_resource_group() {
        assert_eq!(
            endpoint("sub-1", Some("rg-app"), 10),
            "subscriptions/sub-1/resourceGroups/rg-app/providers/Microsoft.KeyVault/vaults?api-version=2019-09-01&$top=10"
        );
    }

    #[test]
    fn test_check_resource_group() {
        for ok in ["rg-app", "My_RG.v2", "rg(prod)", "grüppe"] {
            assert_eq!(check_resource_group(ok).unwrap(), ok);
        }
        let too_long = "r".repeat(91);
        for bad in ["", "a/b", "rg?x=1", "rg%2F", "rg name", "trailing.", too_long.as_str()] {
            assert!(
                matches!(check_resource_group(bad), Err(VaultScoutError::Config(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_deserialize_vault() {
        let vault: Vault = serde_json::from_value(serde_json::json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.KeyVault/vaults/kv-prod",
            "name": "kv-prod",
            "type": "Microsoft.KeyVault/vaults",
            "location": "westeurope",
            "properties": { "tenantId": "t" }
        }))
        .unwrap();
        assert_eq!(vault.name, "kv-prod");
        assert_eq!(vault.location.as_deref(), Some("westeurope"));
    }
}
