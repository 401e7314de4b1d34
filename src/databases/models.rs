use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document as returned by the database API, with the record fields
/// flattened into `data`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document<T> {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$collectionId", default)]
    pub collection_id: String,
    #[serde(rename = "$databaseId", default)]
    pub database_id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "$updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "$permissions", default)]
    pub permissions: Vec<String>,
    #[serde(flatten)]
    pub data: T,
}

/// A document whose fields are kept as raw JSON.
pub type RawDocument = Document<Map<String, Value>>;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DocumentList<T> {
    pub total: u64,
    pub documents: Vec<Document<T>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest<'a, T> {
    pub document_id: &'a str,
    pub data: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<&'a [String]>,
}
