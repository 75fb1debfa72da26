use crate::arm::auth::{Credential, DeviceCodeAuth};
use crate::arm::{ArmClient, subscriptions, vaults};
use crate::cmd::progress;
use crate::cmd::select::{self, Choice, LinePrompter, PickerPrompter, Prompter};
use crate::config::{ConfigManager, Settings};
use crate::error::{Result, VaultScoutError};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// The name of the resource group to scrape for key vaults
    #[arg(long = "rg", visible_alias = "resource-group", value_name = "NAME")]
    pub resource_group: Option<String>,

    /// Public client id used for the device code sign-in
    #[arg(long)]
    pub client_id: Option<String>,

    /// Vaults requested per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Pick the subscription with an arrow-key menu instead of typing its number
    #[arg(long)]
    pub picker: bool,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ScanArgs {
    /// Settings from the config file with flag overrides applied
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => ConfigManager::load_settings_from(path)?,
            None => ConfigManager::new()?.load_settings()?,
        };

        if let Some(client_id) = &self.client_id {
            settings.client_id = client_id.clone();
        }
        if let Some(page_size) = self.page_size {
            settings.page_size = page_size;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// The `--rg` value, rejected up front if Azure would never accept it
    pub fn resource_group(&self) -> Result<Option<&str>> {
        self.resource_group
            .as_deref()
            .map(vaults::check_resource_group)
            .transpose()
    }
}

/// Sign in, pick a subscription and print its key vaults
pub async fn scan(args: ScanArgs) -> Result<()> {
    let settings = args.settings()?;
    let resource_group = args.resource_group()?;

    let credential = DeviceCodeAuth::new(settings.clone()).acquire().await?;

    let mut stdout = std::io::stdout();
    if args.picker {
        list_vaults(&settings, &credential, resource_group, &mut PickerPrompter, &mut stdout).await
    } else {
        let mut prompter = LinePrompter::stdio();
        list_vaults(&settings, &credential, resource_group, &mut prompter, &mut stdout).await
    }
}

/// Everything after sign-in: enumerate subscriptions, resolve one, then
/// stream its key vaults to `out`.
pub async fn list_vaults<P, W>(
    settings: &Settings,
    credential: &Credential,
    resource_group: Option<&str>,
    prompter: &mut P,
    out: &mut W,
) -> Result<()>
where
    P: Prompter,
    W: Write,
{
    if credential.is_expired() {
        return Err(VaultScoutError::Auth(
            "access token expired before the listing started; sign in again".into(),
        ));
    }
    let arm = ArmClient::from_settings(settings, credential)?;

    let spinner = progress::create_spinner("Listing subscriptions...");
    let found = match subscriptions::list(&arm).collect().await {
        Ok(found) => {
            progress::finish_spinner_success(
                &spinner,
                &format!("Found {} subscription(s)", found.len()),
            );
            found
        }
        Err(e) => {
            progress::finish_spinner_error(&spinner, "Listing subscriptions failed");
            return Err(e);
        }
    };

    let subscription = select::resolve("subscription", &found, prompter)?;
    tracing::info!(
        "Using subscription {} ({})",
        subscription.label(),
        subscription.id()
    );
    if let Some(rg) = resource_group {
        tracing::info!("Limiting to resource group {}", rg);
    }

    let mut vaults = vaults::list(&arm, subscription.id(), resource_group, settings.page_size);

    writeln!(out, "Resources Found:")?;
    let mut count = 0usize;
    while let Some(vault) = vaults.next().await {
        writeln!(out, "\t {}", vault.name)?;
        count += 1;
    }
    vaults.finish().await?;

    if count == 0 {
        tracing::info!("No key vaults in scope");
    }
    Ok(())
}
