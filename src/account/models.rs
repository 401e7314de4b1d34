use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An Appwrite account.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_verification: bool,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// A login session.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub expire: Option<DateTime<Utc>>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub current: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest<'a> {
    pub user_id: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct CreateEmailSessionRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}
