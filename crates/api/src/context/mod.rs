//! Application context - dependency injection container
//!
//! Every adapter is built exactly once here and handed to the services
//! explicitly. Nothing in the app reaches for a global.

use std::path::PathBuf;
use std::sync::Arc;

use streamsnap_common::{CredentialVault, OAuthClient};
use streamsnap_core::{
    DriveAccountRegistry, DriveService, TokenRefreshEngine, YouTubeAccountRegistry,
    YouTubeService,
};
use streamsnap_domain::constants::{
    DRIVE_ACCOUNTS_FILE, DRIVE_FALLBACK_TOKEN_FILE, LEGACY_DRIVE_VAULT_KEY, YOUTUBE_ACCOUNTS_FILE,
};
use streamsnap_domain::{
    AppConfig, DriveAccountsDocument, Result, StreamSnapError, YouTubeAccountRecord,
};
use streamsnap_infra::oauth::google_oauth_config;
use streamsnap_infra::{
    config, BrowserLauncher, GoogleDriveGateway, GoogleYouTubeGateway, HttpClient, JsonFileStore,
    KeychainVault, LoopbackAuthorizationFlow, SystemBrowser,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: AppConfig,
    pub data_dir: PathBuf,
    pub vault: Arc<dyn CredentialVault>,
    pub refresher: Arc<TokenRefreshEngine>,
    pub drive: Arc<DriveService>,
    pub youtube: Arc<YouTubeService>,
}

impl AppContext {
    /// Load configuration from the environment (or a config file) and wire
    /// the production adapters.
    ///
    /// # Errors
    /// Configuration errors, or a registry document that cannot be read.
    pub async fn new() -> Result<Self> {
        let config = config::load()?;
        Self::new_with_config(config).await
    }

    /// Production adapters over an explicit configuration.
    ///
    /// # Errors
    /// See [`AppContext::with_components`].
    pub async fn new_with_config(config: AppConfig) -> Result<Self> {
        let config = config::resolve_data_dir(config)?;
        let data_dir = data_dir(&config)?;

        let vault = KeychainVault::new(config.storage.keychain_service.clone())
            .with_fallback(data_dir.join(DRIVE_FALLBACK_TOKEN_FILE), LEGACY_DRIVE_VAULT_KEY);

        Self::with_components(config, Arc::new(vault), Arc::new(SystemBrowser)).await
    }

    /// Wire the services over a caller-provided vault and browser launcher.
    ///
    /// # Errors
    /// Returns `Config` when no data directory is configured, or the store
    /// error when a registry document cannot be read.
    pub async fn with_components(
        config: AppConfig,
        vault: Arc<dyn CredentialVault>,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Result<Self> {
        config.validate()?;
        let data_dir = data_dir(&config)?;

        // Refresh only needs the client credentials, so one engine serves
        // both providers and dedups per vault key.
        let token_client = OAuthClient::new(google_oauth_config(&config, &[]));
        let refresher = Arc::new(TokenRefreshEngine::new(vault.clone(), Arc::new(token_client)));

        let http = HttpClient::new()?;

        let drive_gateway = Arc::new(GoogleDriveGateway::new(http.clone(), &config.endpoints));
        let drive_store =
            JsonFileStore::<DriveAccountsDocument>::new(data_dir.join(DRIVE_ACCOUNTS_FILE));
        let drive_registry = DriveAccountRegistry::load(
            Arc::new(drive_store),
            Arc::new(LoopbackAuthorizationFlow::drive(&config, launcher.clone())),
            drive_gateway.clone(),
            refresher.clone(),
        )
        .await?;
        let drive =
            Arc::new(DriveService::new(Arc::new(drive_registry), refresher.clone(), drive_gateway));

        let youtube_registry = YouTubeAccountRegistry::load(
            Arc::new(JsonFileStore::<Vec<YouTubeAccountRecord>>::new(
                data_dir.join(YOUTUBE_ACCOUNTS_FILE),
            )),
            refresher.clone(),
        )
        .await?;
        let youtube = Arc::new(YouTubeService::new(
            Arc::new(youtube_registry),
            refresher.clone(),
            Arc::new(GoogleYouTubeGateway::new(http, &config.endpoints)),
            Arc::new(LoopbackAuthorizationFlow::youtube(&config, launcher)),
        ));

        info!(data_dir = %data_dir.display(), "application context ready");
        Ok(Self { config, data_dir, vault, refresher, drive, youtube })
    }

    /// Startup maintenance.
    ///
    /// The legacy Drive migration runs to completion first. Profile backfill
    /// and the proactive refresh sweeps then run in the background; the
    /// returned handles let callers wait for them.
    pub async fn startup(&self) -> Vec<JoinHandle<()>> {
        match self.drive.registry().migrate_legacy_tokens_if_needed().await {
            Ok(true) => info!("legacy drive account migrated"),
            Ok(false) => {}
            Err(err) => warn!(error = %err, "legacy drive migration failed"),
        }

        let backfill = {
            let registry = self.drive.registry().clone();
            tokio::spawn(async move {
                let updated = registry.backfill_missing_profiles().await;
                info!(updated, "drive profile backfill finished");
            })
        };
        let drive_sweep = {
            let registry = self.drive.registry().clone();
            tokio::spawn(async move {
                let refreshed = registry.refresh_all_tokens().await;
                info!(refreshed, "drive token sweep finished");
            })
        };
        let youtube_sweep = {
            let registry = self.youtube.registry().clone();
            tokio::spawn(async move {
                let refreshed = registry.refresh_all_tokens().await;
                info!(refreshed, "youtube token sweep finished");
            })
        };

        vec![backfill, drive_sweep, youtube_sweep]
    }

    /// Run startup maintenance and wait for every background task.
    ///
    /// One-shot callers use this so a sweep is never cut off mid-refresh
    /// by the process exiting.
    pub async fn run_maintenance(&self) {
        for handle in self.startup().await {
            if let Err(err) = handle.await {
                warn!(error = %err, "startup maintenance task failed");
            }
        }
    }
}

fn data_dir(config: &AppConfig) -> Result<PathBuf> {
    config
        .storage
        .data_dir
        .clone()
        .ok_or_else(|| StreamSnapError::Config("storage.data_dir is not set".to_string()))
}
