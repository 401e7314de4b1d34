pub mod account;
pub mod auth;
pub mod avatars;
pub mod catalog;
pub mod config;
pub mod core;
pub mod databases;
#[cfg(feature = "seed")]
pub mod seed;
pub mod storage;

use account::Account;
use auth::FoodAuth;
use avatars::Avatars;
use catalog::FoodCatalog;
use config::{AppwriteConfig, ConfigError};
use crate::core::session::SessionStore;
use crate::core::Clients;
use databases::Databases;
use storage::Storage;

/// Handle to the backend, shared by every operation.
///
/// Build it once at startup and pass it (or the services it hands out) to
/// whatever needs backend access. Clones share the HTTP connection pool and the
/// session.
#[derive(Clone)]
pub struct FoodApp {
    config: AppwriteConfig,
    clients: Clients,
    session: SessionStore,
}

impl FoodApp {
    pub fn new(config: AppwriteConfig) -> Result<Self, ConfigError> {
        let session = SessionStore::new();
        let clients = crate::core::build_clients(&config, session.clone())?;
        Ok(Self {
            config,
            clients,
            session,
        })
    }

    /// Builds the handle from environment variables. See [`config`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(AppwriteConfig::from_env()?)
    }

    pub fn config(&self) -> &AppwriteConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn account(&self) -> Account {
        Account::new(self.clients.clone(), &self.config.endpoint, self.session.clone())
    }

    pub fn databases(&self) -> Databases {
        Databases::new(self.clients.clone(), &self.config.endpoint, &self.config.database_id)
    }

    pub fn storage(&self) -> Storage {
        Storage::new(
            self.clients.clone(),
            &self.config.endpoint,
            &self.config.bucket_id,
            &self.config.project_id,
        )
    }

    pub fn avatars(&self) -> Avatars {
        Avatars::new(&self.config.endpoint, &self.config.project_id)
    }

    pub fn auth(&self) -> FoodAuth {
        FoodAuth::new(
            self.account(),
            self.databases(),
            self.avatars(),
            self.config.collections.users.clone(),
        )
    }

    pub fn catalog(&self) -> FoodCatalog {
        FoodCatalog::new(self.databases(), self.config.collections.clone())
    }
}
