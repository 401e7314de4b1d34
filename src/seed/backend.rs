//! The remote calls the seeder depends on.
//!
//! [`Databases`] and [`Storage`] implement these traits against the backend;
//! tests substitute in-memory stores.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::core::AppwriteError;
use crate::databases::models::RawDocument;
use crate::databases::Databases;
use crate::storage::models::FileUpload;
use crate::storage::Storage;

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_document_ids(&self, collection_id: &str) -> Result<Vec<String>, AppwriteError>;

    /// Creates a document and returns its id.
    async fn create_document(&self, collection_id: &str, data: Value) -> Result<String, AppwriteError>;

    async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<(), AppwriteError>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn list_file_ids(&self) -> Result<Vec<String>, AppwriteError>;

    /// Uploads a file and returns its id.
    async fn upload_file(&self, upload: FileUpload) -> Result<String, AppwriteError>;

    async fn delete_file(&self, file_id: &str) -> Result<(), AppwriteError>;

    fn file_view_url(&self, file_id: &str) -> String;
}

/// Fetches the source images of menu items.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<FileUpload>;
}

#[async_trait]
impl DocumentStore for Databases {
    async fn list_document_ids(&self, collection_id: &str) -> Result<Vec<String>, AppwriteError> {
        let documents = self.list_all_documents(collection_id).await?;
        Ok(documents.into_iter().map(|d| d.id).collect())
    }

    async fn create_document(&self, collection_id: &str, data: Value) -> Result<String, AppwriteError> {
        let document: RawDocument = Databases::create_document(self, collection_id, &data).await?;
        Ok(document.id)
    }

    async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<(), AppwriteError> {
        Databases::delete_document(self, collection_id, document_id).await
    }
}

#[async_trait]
impl FileStore for Storage {
    async fn list_file_ids(&self) -> Result<Vec<String>, AppwriteError> {
        let files = self.list_all_files().await?;
        Ok(files.into_iter().map(|f| f.id).collect())
    }

    async fn upload_file(&self, upload: FileUpload) -> Result<String, AppwriteError> {
        Ok(self.create_file(upload).await?.id)
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), AppwriteError> {
        Storage::delete_file(self, file_id).await
    }

    fn file_view_url(&self, file_id: &str) -> String {
        Storage::file_view_url(self, file_id)
    }
}

/// Downloads images over plain HTTP, without backend headers.
#[derive(Clone, Default)]
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> anyhow::Result<FileUpload> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();

        let data = response.bytes().await?;

        Ok(FileUpload {
            name: file_name_from_url(url),
            mime_type,
            data,
        })
    }
}

/// Last path segment of the URL, or a timestamped fallback.
pub(crate) fn file_name_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("file-{}.jpg", chrono::Utc::now().timestamp_millis()))
}
