use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultScoutError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("zero or multiple tenants associated with this account (found {0})")]
    TenantCount(usize),

    #[error("Resource Manager request failed: {0}")]
    Fetch(String),

    #[error("{0}")]
    EmptyResult(String),

    #[error("No selection was made")]
    SelectionAborted,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Interactive prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Interrupted")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, VaultScoutError>;

pub use VaultScoutError as Error;

impl VaultScoutError {
    /// Process exit status for this error. Every fatal class gets its own code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Auth(_) => 2,
            Self::TenantCount(_) => 3,
            Self::Fetch(_) | Self::Http(_) | Self::Serde(_) => 4,
            Self::EmptyResult(_) => 5,
            Self::SelectionAborted | Self::Prompt(_) => 6,
            Self::Config(_) | Self::Toml(_) => 7,
            Self::Cancelled => 130,
        }
    }
}

/// Parse a Resource Manager error body into `code: message` with a hint for
/// the codes an operator can act on.
pub fn enhance_arm_error(error_response: &str) -> String {
    if let Ok(error_json) = serde_json::from_str::<serde_json::Value>(error_response) {
        if let Some(error_obj) = error_json.get("error") {
            let code = error_obj
                .get("code")
                .and_then(|c| c.as_str())
                .unwrap_or("Unknown");
            let message = error_obj
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("No message");

            let hint = match code {
                "InvalidAuthenticationToken" | "ExpiredAuthenticationToken" => {
                    "\nHint: the sign-in may have expired. Run vaultscout again to get a fresh device code."
                }
                "AuthorizationFailed" => {
                    "\nHint: the signed-in account has no read access on this scope."
                }
                "SubscriptionNotFound" | "InvalidSubscriptionId" => {
                    "\nHint: the subscription is not visible to this account in this tenant."
                }
                "ResourceGroupNotFound" => {
                    "\nHint: check the --rg value against the selected subscription."
                }
                _ => "",
            };

            return format!("{}: {}{}", code, message, hint);
        }
    }

    error_response.to_string()
}
