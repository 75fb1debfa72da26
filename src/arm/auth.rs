use super::ArmClient;
use super::tenants;
use crate::config::Settings;
use crate::error::{Result, VaultScoutError};
use chrono::{DateTime, Utc};
use colored::Colorize;
use oauth2::{
    AuthUrl, ClientId, DeviceAuthorizationResponse, DeviceAuthorizationUrl,
    ExtraDeviceAuthorizationFields, Scope, TokenResponse, TokenUrl, basic::BasicClient,
    reqwest::async_http_client,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Directory used before the caller's tenant is known
pub const COMMON_TENANT: &str = "common";

/// Fields Azure adds to the device authorization response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureDeviceFields {
    /// Ready-made sign-in instructions for the operator
    #[serde(default)]
    pub message: Option<String>,
}

impl ExtraDeviceAuthorizationFields for AzureDeviceFields {}

/// Bearer credential for Resource Manager
///
/// Never mutated: scoping to a tenant consumes the credential and returns a
/// new one carrying the same token material.
#[derive(Clone)]
pub struct Credential {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
    tenant_id: Option<Uuid>,
    token_url: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .field("tenant_id", &self.tenant_id)
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl Credential {
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_at: DateTime<Utc>,
        token_url: String,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
            tenant_id: None,
            token_url,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// `None` until the credential has been scoped to a tenant
    pub fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }

    /// Token endpoint any later refresh must go to
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Past `expires_at`; nothing refreshes the token, so this is final
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Re-issue this credential for a single tenant, keeping the token material
    pub fn scoped_to(self, authority_host: &str, tenant_id: Uuid) -> Result<Self> {
        let token_url = tenant_endpoint(authority_host, &tenant_id.to_string(), "token")?;

        Ok(Self {
            tenant_id: Some(tenant_id),
            token_url,
            ..self
        })
    }
}

fn tenant_endpoint(authority_host: &str, tenant: &str, leaf: &str) -> Result<String> {
    let url = format!(
        "{}/{}/oauth2/v2.0/{}",
        authority_host.trim_end_matches('/'),
        tenant,
        leaf
    );
    reqwest::Url::parse(&url)
        .map_err(|e| VaultScoutError::Auth(format!("Invalid {} URL {}: {}", leaf, url, e)))?;
    Ok(url)
}

/// Device code sign-in followed by tenant discovery
pub struct DeviceCodeAuth {
    settings: Settings,
}

impl DeviceCodeAuth {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Sign in and return a credential scoped to the account's only tenant
    pub async fn acquire(&self) -> Result<Credential> {
        let credential = self.sign_in().await?;
        self.scope_to_single_tenant(credential).await
    }

    fn oauth_client(&self, tenant: &str) -> Result<BasicClient> {
        let host = &self.settings.authority_host;
        let client_id = ClientId::new(self.settings.client_id.clone());

        let auth_url = AuthUrl::new(tenant_endpoint(host, tenant, "authorize")?)
            .map_err(|e| VaultScoutError::Auth(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(tenant_endpoint(host, tenant, "token")?)
            .map_err(|e| VaultScoutError::Auth(format!("Invalid token URL: {}", e)))?;
        let device_auth_url =
            DeviceAuthorizationUrl::new(tenant_endpoint(host, tenant, "devicecode")?).map_err(
                |e| VaultScoutError::Auth(format!("Invalid device auth URL: {}", e)),
            )?;

        Ok(BasicClient::new(client_id, None, auth_url, Some(token_url))
            .set_device_authorization_url(device_auth_url))
    }

    /// Run the device code flow against the multi-tenant directory. Blocks
    /// until the operator approves or the code expires.
    pub async fn sign_in(&self) -> Result<Credential> {
        let client = self.oauth_client(COMMON_TENANT)?;

        let details: DeviceAuthorizationResponse<AzureDeviceFields> = client
            .exchange_device_code()
            .map_err(|e| VaultScoutError::Auth(format!("Device code exchange failed: {}", e)))?
            .add_scope(Scope::new(self.settings.scope.clone()))
            .add_scope(Scope::new("offline_access".to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                VaultScoutError::Auth(format!("Device authorization request failed: {}", e))
            })?;

        match &details.extra_fields().message {
            Some(message) => println!("\n{}\n", message.bold()),
            None => {
                println!("\nPlease visit: {}", details.verification_uri().as_str());
                println!("Enter code: {}\n", details.user_code().secret().bold());
            }
        }
        tracing::debug!(
            "Device code issued, expires in {:?}, poll interval {:?}",
            details.expires_in(),
            details.interval()
        );

        let token = client
            .exchange_device_access_token(&details)
            .request_async(async_http_client, tokio::time::sleep, None)
            .await
            .map_err(|e| VaultScoutError::Auth(format!("Token exchange failed: {}", e)))?;

        let lifetime = token.expires_in().unwrap_or(Duration::from_secs(3600));
        let expires_at = Utc::now()
            + chrono::Duration::from_std(lifetime).unwrap_or_else(|_| chrono::Duration::hours(1));

        println!("{} Signed in", "✓".green());

        Ok(Credential::new(
            token.access_token().secret().clone(),
            token.refresh_token().map(|t| t.secret().clone()),
            expires_at,
            tenant_endpoint(&self.settings.authority_host, COMMON_TENANT, "token")?,
        ))
    }

    /// Discover the account's tenants and scope the credential to the single
    /// one. Zero or several tenants is fatal.
    pub async fn scope_to_single_tenant(&self, credential: Credential) -> Result<Credential> {
        let arm = ArmClient::from_settings(&self.settings, &credential)?;
        let found = tenants::list(&arm).collect().await?;

        let [tenant] = found.as_slice() else {
            tracing::debug!("Tenant discovery returned {} tenants", found.len());
            return Err(VaultScoutError::TenantCount(found.len()));
        };

        let tenant_id = Uuid::parse_str(&tenant.tenant_id).map_err(|e| {
            VaultScoutError::Auth(format!("Tenant id '{}' is not a UUID: {}", tenant.tenant_id, e))
        })?;
        tracing::info!("Using tenant {}", tenant_id);

        credential.scoped_to(&self.settings.authority_host, tenant_id)
    }
}
