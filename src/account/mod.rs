//! Appwrite Account module.
//!
//! Account creation and email/password sessions for the current client. The
//! session returned by the backend is captured by the client middleware, so
//! every later request made through the same [`crate::FoodApp`] is
//! authenticated.

pub mod models;


use crate::account::models::{CreateAccountRequest, CreateEmailSessionRequest, Session, User};
use crate::core::session::SessionStore;
use crate::core::{expect_success, read_json, AppwriteError, Clients, UNIQUE_ID};
use reqwest::header;

#[derive(Clone)]
pub struct Account {
    clients: Clients,
    base_url: String,
    session: SessionStore,
}

impl Account {
    pub fn new(clients: Clients, endpoint: &str, session: SessionStore) -> Self {
        Self {
            clients,
            base_url: format!("{}/account", endpoint),
            session,
        }
    }

    /// Creates a new account with a backend-generated id.
    pub async fn create(&self, email: &str, password: &str, name: Option<&str>) -> Result<User, AppwriteError> {
        let request = CreateAccountRequest {
            user_id: UNIQUE_ID,
            email,
            password,
            name,
        };

        let response = self
            .clients
            .writes
            .post(&self.base_url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        read_json(response, "Create account failed").await
    }

    pub async fn create_email_password_session(&self, email: &str, password: &str) -> Result<Session, AppwriteError> {
        let url = format!("{}/sessions/email", self.base_url);
        let request = CreateEmailSessionRequest { email, password };

        let response = self
            .clients
            .writes
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        read_json(response, "Create session failed").await
    }

    /// Gets the account of the active session.
    pub async fn get(&self) -> Result<User, AppwriteError> {
        let response = self.clients.api.get(&self.base_url).send().await?;

        read_json(response, "Get account failed").await
    }

    /// Deletes a session; `"current"` ends the active one.
    pub async fn delete_session(&self, session_id: &str) -> Result<(), AppwriteError> {
        let url = format!("{}/sessions/{}", self.base_url, session_id);

        let response = self.clients.api.delete(&url).send().await?;
        expect_success(response, "Delete session failed").await?;

        if session_id == "current" {
            self.session.clear();
        }
        Ok(())
    }

    pub fn has_session(&self) -> bool {
        self.session.is_active()
    }

    /// Forgets the stored session cookies without contacting the backend.
    pub fn clear_session(&self) {
        self.session.clear();
    }
}
