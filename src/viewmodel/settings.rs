use compact_str::{format_compact, CompactString};

use super::ViewStatus;
use crate::{
    client::GitlabService,
    credentials::{Credential, CredentialStore},
};

/// Token management and connection check
pub struct SettingsViewModel {
    store: CredentialStore,
    service: Option<GitlabService>,
    current_user: Option<CompactString>,
    status: ViewStatus,
}

impl SettingsViewModel {
    /// `service` is absent until a token is available
    pub fn new(store: CredentialStore, service: Option<GitlabService>) -> Self {
        Self { store, service, current_user: None, status: ViewStatus::default() }
    }

    pub fn save_token(&mut self, token: &str) -> bool {
        if token.trim().is_empty() {
            self.status.failed("The token must not be empty");
            return false;
        }

        let saved = self.store.save(token);
        if saved {
            self.status
                .loaded(format_compact!("Token saved to {}", self.store.path().display()));
        } else {
            self.status.failed(format_compact!(
                "Could not write the token to {}",
                self.store.path().display()
            ));
        }
        saved
    }

    pub fn credential(&self) -> Option<Credential> {
        self.store.load()
    }

    /// Checks the connection and, when it works, fetches the user name
    pub async fn test_connection(&mut self) -> bool {
        let Some(service) = &self.service else {
            self.status.failed("No token saved");
            return false;
        };

        self.status.loading("Testing connection");
        if !service.test_connection().await {
            self.current_user = None;
            self.status.failed(format_compact!(
                "Could not connect to {} with the saved token",
                service.config().base_url
            ));
            return false;
        }

        let user = service.get_current_user().await;
        self.status.loaded(format_compact!("Connected as {user}"));
        self.current_user = Some(user);
        true
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }
}
