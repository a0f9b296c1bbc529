use std::{path::PathBuf, sync::Arc};

use compact_str::ToCompactString;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    client::{ClientConfig, GitlabApi, GitlabService},
    config::PanelConfig,
    credentials::CredentialStore,
    logging::{init_logging, LoggingConfig},
    result::{PanelError, Result},
    view::ViewRegistry,
    viewmodel::settings::SettingsViewModel,
};

/// Everything a command needs, assembled once at startup
pub struct AppComponents {
    pub config: PanelConfig,
    pub store: CredentialStore,
    /// Present once a token has been saved
    pub service: Option<GitlabService>,
    pub views: ViewRegistry,
    pub _log_guard: Option<WorkerGuard>,
}

impl AppComponents {
    /// The API client, or [`PanelError::MissingToken`] when no token is saved
    pub fn api(&self) -> Result<Arc<GitlabApi>> {
        self.service
            .as_ref()
            .map(|service| service.api().clone())
            .ok_or(PanelError::MissingToken)
    }

    pub fn settings(&self) -> SettingsViewModel {
        SettingsViewModel::new(self.store.clone(), self.service.clone())
    }
}

pub fn initialize_app(
    config: PanelConfig,
    credentials_path: Option<PathBuf>,
    debug: bool,
) -> Result<AppComponents> {
    color_eyre::install().map_err(|e| PanelError::GeneralError(e.to_compact_string()))?;

    let log_guard = initialize_logging(&config)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Tanuki Panel starting up");

    let store = credentials_path.map(CredentialStore::at).unwrap_or_else(CredentialStore::discover);
    let service = create_gitlab_service(&config, &store, debug)?;

    Ok(AppComponents {
        config,
        store,
        service,
        views: ViewRegistry::with_defaults(),
        _log_guard: log_guard,
    })
}

fn initialize_logging(config: &PanelConfig) -> Result<Option<WorkerGuard>> {
    let logging_config = LoggingConfig::default()
        .with_level_setting(config.log_level.as_deref())
        .with_env();

    init_logging(logging_config).map_err(|e| PanelError::LoggingError(e.to_string()))
}

fn create_gitlab_service(
    config: &PanelConfig,
    store: &CredentialStore,
    debug: bool,
) -> Result<Option<GitlabService>> {
    let Some(credential) = store.load() else {
        warn!(path = %store.path().display(), "No saved token");
        return Ok(None);
    };

    let client_config = ClientConfig::from_panel(config, credential.token).with_debug_logging(debug);
    client_config.validate()?;

    let api = Arc::new(GitlabApi::new(client_config)?);
    Ok(Some(GitlabService::from_api(api)))
}
