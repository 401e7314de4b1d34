pub mod middleware;
pub mod session;

use crate::config::{AppwriteConfig, ConfigError};
use middleware::AppwriteMiddleware;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use session::SessionStore;
use std::fmt;
use thiserror::Error;

/// Placeholder id that asks the backend to generate one.
pub const UNIQUE_ID: &str = "unique()";

#[derive(Debug, Deserialize)]
pub struct AppwriteErrorResponse {
    pub message: String,
    pub code: u16,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub version: Option<String>,
}

/// An error reported by the Appwrite API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppwriteException {
    pub code: u16,
    /// Machine readable error type, e.g. `user_invalid_credentials`.
    pub kind: Option<String>,
    pub message: String,
}

impl fmt::Display for AppwriteException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)
    }
}

/// Errors that can occur while talking to Appwrite.
#[derive(Error, Debug)]
pub enum AppwriteError {
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    /// Errors returned by the Appwrite API.
    #[error("API error: {0}")]
    ApiError(AppwriteException),
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppwriteError {
    /// HTTP status reported by the API, if the error came from the API.
    pub fn code(&self) -> Option<u16> {
        match self {
            AppwriteError::ApiError(e) => Some(e.code),
            _ => None,
        }
    }
}

pub async fn parse_error_response(response: reqwest::Response, default_msg: &str) -> AppwriteException {
    let status = response.status();
    match response.json::<AppwriteErrorResponse>().await {
        Ok(error_resp) => AppwriteException {
            code: error_resp.code,
            kind: error_resp.kind,
            message: error_resp.message,
        },
        Err(_) => AppwriteException {
            code: status.as_u16(),
            kind: None,
            message: format!("{}: {}", default_msg, status),
        },
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    default_msg: &str,
) -> Result<T, AppwriteError> {
    if !response.status().is_success() {
        return Err(AppwriteError::ApiError(parse_error_response(response, default_msg).await));
    }
    Ok(response.json().await?)
}

pub(crate) async fn expect_success(
    response: reqwest::Response,
    default_msg: &str,
) -> Result<(), AppwriteError> {
    if !response.status().is_success() {
        return Err(AppwriteError::ApiError(parse_error_response(response, default_msg).await));
    }
    Ok(())
}

/// HTTP clients shared by every service.
#[derive(Clone)]
pub struct Clients {
    /// Client for reads and deletes, retrying transient failures.
    pub api: ClientWithMiddleware,
    /// Client for creates and uploads. A replayed create would store a second
    /// record, so this one has no retry layer.
    pub writes: ClientWithMiddleware,
}

pub fn build_clients(config: &AppwriteConfig, session: SessionStore) -> Result<Clients, ConfigError> {
    let middleware = AppwriteMiddleware::new(config, session)?;
    let http = Client::new();

    let mut api = ClientBuilder::new(http.clone());
    if config.max_retries > 0 {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        api = api.with(RetryTransientMiddleware::new_with_policy(retry_policy));
    }
    let api = api.with(middleware.clone()).build();

    let writes = ClientBuilder::new(http).with(middleware).build();

    Ok(Clients { api, writes })
}
