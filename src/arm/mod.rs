pub mod auth;
pub mod paging;
pub mod subscriptions;
pub mod tenants;
pub mod vaults;

use crate::arm::auth::Credential;
use crate::config::Settings;
use crate::error::{Result, VaultScoutError};
use paging::{Enumeration, Page};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Resource Manager client bound to one credential
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ArmClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl std::fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ArmClient {
    pub fn new(base_url: &str, access_token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vaultscout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// Client for `settings.resource_manager_endpoint`, authorized by `credential`
    pub fn from_settings(settings: &Settings, credential: &Credential) -> Result<Self> {
        Self::new(
            &settings.resource_manager_endpoint,
            credential.access_token().to_string(),
            settings.request_timeout(),
        )
    }

    /// Fetch one page of a listing, relative to the base URL
    pub async fn get_page<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Page<T>> {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        self.get_page_url(&url).await
    }

    /// Fetch one page from an absolute URL (a `nextLink`)
    pub async fn get_page_url<T: DeserializeOwned>(&self, url: &str) -> Result<Page<T>> {
        tracing::debug!("GET {}", url);

        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| VaultScoutError::Fetch(format!("GET {} failed: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            let enhanced_error = crate::error::enhance_arm_error(&error_text);
            return Err(VaultScoutError::Fetch(format!(
                "HTTP {}: {}",
                status, enhanced_error
            )));
        }

        resp.json::<Page<T>>()
            .await
            .map_err(|e| VaultScoutError::Fetch(format!("Unexpected response from {}: {}", url, e)))
    }

    /// Stream every item of a paginated listing, following `nextLink`
    pub fn enumerate<T>(&self, endpoint: String) -> Enumeration<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let first_client = self.clone();
        let next_client = self.clone();

        paging::enumerate(
            move || async move { first_client.get_page::<T>(&endpoint).await },
            move |next_link| {
                let client = next_client.clone();
                async move { client.get_page_url::<T>(&next_link).await }
            },
        )
    }
}
