//! Backend connection parameters.
//!
//! The endpoint and project id come from the environment; everything else is
//! fixed at compile time.
//!
//! # Environment Variables
//!
//! ## Required
//! - `APPWRITE_ENDPOINT` - API endpoint, e.g. `https://cloud.appwrite.io/v1`
//! - `APPWRITE_PROJECT_ID` - Project identifier
//!
//! Both also accept the `EXPO_PUBLIC_` prefixed names used by the mobile app.
//!
//! ## Optional
//! - `APPWRITE_API_KEY` - Server API key, sent as `X-Appwrite-Key`
//! - `APPWRITE_MAX_RETRIES` - Retries for transient failures (default: 3)

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

pub const PLATFORM: &str = "com.jsm.foodordering";
pub const DATABASE_ID: &str = "6990dd04000f4642748e";
pub const BUCKET_ID: &str = "6994e12b001fccabcf44";

pub const USER_COLLECTION_ID: &str = "user";
pub const CATEGORIES_COLLECTION_ID: &str = "categories";
pub const MENU_COLLECTION_ID: &str = "menu";
pub const CUSTOMIZATIONS_COLLECTION_ID: &str = "customizations";
pub const MENU_CUSTOMIZATIONS_COLLECTION_ID: &str = "menu_customizations";

const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),
}

/// Collection ids within the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionIds {
    pub users: String,
    pub categories: String,
    pub menu: String,
    pub customizations: String,
    pub menu_customizations: String,
}

impl Default for CollectionIds {
    fn default() -> Self {
        Self {
            users: USER_COLLECTION_ID.to_string(),
            categories: CATEGORIES_COLLECTION_ID.to_string(),
            menu: MENU_COLLECTION_ID.to_string(),
            customizations: CUSTOMIZATIONS_COLLECTION_ID.to_string(),
            menu_customizations: MENU_CUSTOMIZATIONS_COLLECTION_ID.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppwriteConfig {
    /// API endpoint without trailing slash, e.g. `https://cloud.appwrite.io/v1`
    pub endpoint: String,
    pub project_id: String,
    pub platform: String,
    pub database_id: String,
    pub bucket_id: String,
    pub collections: CollectionIds,
    pub api_key: Option<SecretString>,
    /// Retries for transient failures; 0 disables the retry layer.
    pub max_retries: u32,
}

impl AppwriteConfig {
    /// Creates a configuration with the compiled-in identifiers.
    pub fn new(endpoint: impl Into<String>, project_id: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            platform: PLATFORM.to_string(),
            database_id: DATABASE_ID.to_string(),
            bucket_id: BUCKET_ID.to_string(),
            collections: CollectionIds::default(),
            api_key: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Loads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = required(&lookup, "APPWRITE_ENDPOINT")?;
        Url::parse(&endpoint)
            .map_err(|e| ConfigError::InvalidEnvVar("APPWRITE_ENDPOINT".into(), e.to_string()))?;
        let project_id = required(&lookup, "APPWRITE_PROJECT_ID")?;

        let mut config = Self::new(endpoint, project_id);
        config.api_key = optional(&lookup, "APPWRITE_API_KEY").map(SecretString::from);

        if let Some(raw) = optional(&lookup, "APPWRITE_MAX_RETRIES") {
            config.max_retries = raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnvVar("APPWRITE_MAX_RETRIES".into(), e.to_string())
            })?;
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .or_else(|| lookup(&format!("EXPO_PUBLIC_{key}")))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}
