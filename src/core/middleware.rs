use crate::config::{AppwriteConfig, ConfigError};
use crate::core::session::SessionStore;
use http::Extensions;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ORIGIN};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use secrecy::ExposeSecret;

pub const PROJECT_HEADER: HeaderName = HeaderName::from_static("x-appwrite-project");
pub const KEY_HEADER: HeaderName = HeaderName::from_static("x-appwrite-key");
pub const RESPONSE_FORMAT_HEADER: HeaderName = HeaderName::from_static("x-appwrite-response-format");
pub const FALLBACK_COOKIES_HEADER: HeaderName = HeaderName::from_static("x-fallback-cookies");

const RESPONSE_FORMAT: &str = "1.6.0";

/// Adds the project headers to every request and carries the session.
///
/// The session cookies arrive in the `X-Fallback-Cookies` response header when
/// a session is created; they are replayed on every later request.
#[derive(Clone)]
pub struct AppwriteMiddleware {
    headers: HeaderMap,
    session: SessionStore,
}

impl AppwriteMiddleware {
    pub fn new(config: &AppwriteConfig, session: SessionStore) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            PROJECT_HEADER,
            HeaderValue::from_str(&config.project_id)
                .map_err(|_| ConfigError::InvalidHeader("X-Appwrite-Project"))?,
        );
        headers.insert(RESPONSE_FORMAT_HEADER, HeaderValue::from_static(RESPONSE_FORMAT));
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(&format!("appwrite-{}://{}", std::env::consts::OS, config.platform))
                .map_err(|_| ConfigError::InvalidHeader("Origin"))?,
        );
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(key.expose_secret())
                .map_err(|_| ConfigError::InvalidHeader("X-Appwrite-Key"))?;
            value.set_sensitive(true);
            headers.insert(KEY_HEADER, value);
        }

        Ok(Self { headers, session })
    }
}

#[async_trait::async_trait]
impl Middleware for AppwriteMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let headers = req.headers_mut();
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }

        if let Some(cookies) = self.session.get() {
            let mut value = HeaderValue::from_str(&cookies).map_err(|e| {
                reqwest_middleware::Error::Middleware(anyhow::anyhow!("Invalid session cookies: {}", e))
            })?;
            value.set_sensitive(true);
            headers.insert(FALLBACK_COOKIES_HEADER, value);
        }

        let response = next.run(req, extensions).await?;

        if let Some(cookies) = response
            .headers()
            .get(FALLBACK_COOKIES_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
        {
            self.session.set(cookies.to_string());
        }

        Ok(response)
    }
}
