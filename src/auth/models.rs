use serde::{Deserialize, Serialize};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 256;
const MAX_NAME_LEN: usize = 128;

/// The profile document kept for every account.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub account_id: String,
    pub email: String,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct SignInParams {
    pub email: String,
    pub password: String,
}

impl CreateAccountParams {
    pub fn new(email: impl Into<String>, password: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: name.into(),
        }
    }

    /// Checks the request locally before it is sent.
    pub fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        let len = self.password.chars().count();
        if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
            return Err(format!(
                "password must be between {} and {} characters",
                MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
            ));
        }
        let name = self.display_name();
        if name.is_empty() {
            return Err("name must not be empty".to_string());
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(format!("name must be at most {} characters", MAX_NAME_LEN));
        }
        Ok(())
    }

    /// The name as stored on the account and profile.
    pub fn display_name(&self) -> &str {
        self.name.trim()
    }

    pub fn sign_in_params(&self) -> SignInParams {
        SignInParams {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

impl SignInParams {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err("password must not be empty".to_string());
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), String> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace) => {
            Ok(())
        }
        _ => Err(format!("invalid email address: {:?}", email)),
    }
}
