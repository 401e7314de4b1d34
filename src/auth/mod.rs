//! Sign-up, sign-in and current-user lookup.
//!
//! Every account has exactly one profile document in the users collection,
//! linked through its `accountId` attribute. [`FoodAuth::create_account`]
//! creates both; [`FoodAuth::get_current_user`] resolves the profile of the
//! active session.

pub mod models;


use crate::account::models::Session;
use crate::account::Account;
use crate::auth::models::{CreateAccountParams, SignInParams, UserProfile};
use crate::avatars::Avatars;
use crate::core::AppwriteError;
use crate::databases::models::{Document, DocumentList};
use crate::databases::query::Query;
use crate::databases::Databases;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid request: {0}")]
    InvalidParams(String),
    #[error("Account creation failed: {0}")]
    AccountCreation(#[source] AppwriteError),
    #[error("Authentication failed: {0}")]
    Authentication(#[source] AppwriteError),
    #[error("No active session")]
    NoActiveSession,
    #[error("No profile found for account {0}")]
    ProfileNotFound(String),
    #[error("Profile request failed: {0}")]
    Profile(#[source] AppwriteError),
    #[error("Session request failed: {0}")]
    Session(#[source] AppwriteError),
}

const UNAUTHORIZED: u16 = 401;

#[derive(Clone)]
pub struct FoodAuth {
    account: Account,
    databases: Databases,
    avatars: Avatars,
    users_collection: String,
}

impl FoodAuth {
    pub fn new(account: Account, databases: Databases, avatars: Avatars, users_collection: String) -> Self {
        Self {
            account,
            databases,
            avatars,
            users_collection,
        }
    }

    /// Creates an account, signs it in and stores its profile.
    ///
    /// If the profile cannot be written the account is left in place.
    #[instrument(skip(self, params), fields(email = %params.email))]
    pub async fn create_account(&self, params: &CreateAccountParams) -> Result<Document<UserProfile>, AuthError> {
        params.validate().map_err(AuthError::InvalidParams)?;

        let name = params.display_name();
        let account = self
            .account
            .create(&params.email, &params.password, Some(name))
            .await
            .map_err(AuthError::AccountCreation)?;
        info!(account_id = %account.id, "Account created");

        self.sign_in(&params.sign_in_params()).await?;

        let profile = UserProfile {
            account_id: account.id.clone(),
            email: params.email.clone(),
            name: name.to_string(),
            avatar: self.avatars.initials_url(name),
        };

        let document = self
            .databases
            .create_document(&self.users_collection, &profile)
            .await
            .map_err(|e| {
                error!(account_id = %account.id, error = %e, "Profile creation failed, account has no profile");
                AuthError::Profile(e)
            })?;

        info!(account_id = %account.id, profile_id = %document.id, "Profile created");
        Ok(document)
    }

    /// Opens an email/password session for this client.
    #[instrument(skip(self, params), fields(email = %params.email))]
    pub async fn sign_in(&self, params: &SignInParams) -> Result<Session, AuthError> {
        params.validate().map_err(AuthError::InvalidParams)?;

        let session = self
            .account
            .create_email_password_session(&params.email, &params.password)
            .await
            .map_err(AuthError::Authentication)?;

        info!(user_id = %session.user_id, "Signed in");
        Ok(session)
    }

    /// Returns the profile of the account behind the active session.
    ///
    /// Accounts are expected to have exactly one profile. When the backend
    /// returns several, the first one in listing order wins.
    #[instrument(skip(self))]
    pub async fn get_current_user(&self) -> Result<Document<UserProfile>, AuthError> {
        if !self.account.has_session() {
            return Err(AuthError::NoActiveSession);
        }

        let account = match self.account.get().await {
            Ok(account) => account,
            Err(e) if e.code() == Some(UNAUTHORIZED) => {
                self.account.clear_session();
                return Err(AuthError::NoActiveSession);
            }
            Err(e) => return Err(AuthError::Session(e)),
        };

        let list: DocumentList<UserProfile> = self
            .databases
            .list_documents(
                &self.users_collection,
                &[Query::equal("accountId", account.id.as_str())],
            )
            .await
            .map_err(AuthError::Profile)?;

        let matches = list.documents.len();
        match list.documents.into_iter().next() {
            Some(profile) => {
                if matches > 1 {
                    warn!(account_id = %account.id, matches, "Multiple profiles for account, using the first");
                }
                Ok(profile)
            }
            None => {
                error!(account_id = %account.id, "Account has no profile document");
                Err(AuthError::ProfileNotFound(account.id))
            }
        }
    }

    /// Ends the active session.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if !self.account.has_session() {
            return Err(AuthError::NoActiveSession);
        }

        match self.account.delete_session("current").await {
            Ok(()) => {
                info!("Signed out");
                Ok(())
            }
            Err(e) if e.code() == Some(UNAUTHORIZED) => {
                self.account.clear_session();
                Err(AuthError::NoActiveSession)
            }
            Err(e) => Err(AuthError::Session(e)),
        }
    }
}
