//! Appwrite Storage module.
//!
//! Lists, uploads and deletes the files of one bucket, and builds the public
//! view URL of a stored file.
//!
//! # Examples
//!
//! ```rust,ignore
//! # use appwrite_food::FoodApp;
//! # use appwrite_food::storage::models::FileUpload;
//! # async fn run(app: FoodApp) {
//! let storage = app.storage();
//! let file = storage
//!     .create_file(FileUpload {
//!         name: "burger.png".into(),
//!         mime_type: "image/png".into(),
//!         data: bytes::Bytes::from_static(b"..."),
//!     })
//!     .await
//!     .unwrap();
//! println!("{}", storage.file_view_url(&file.id));
//! # }
//! ```

pub mod models;


use crate::core::{expect_success, read_json, AppwriteError, Clients, UNIQUE_ID};
use crate::databases::query::{to_query_params, Query};
use models::{FileList, FileRecord, FileUpload};
use reqwest::multipart::{Form, Part};
use url::form_urlencoded;

const PAGE_SIZE: u32 = 100;

/// Client for the files of one bucket.
#[derive(Clone)]
pub struct Storage {
    clients: Clients,
    base_url: String,
    project_id: String,
}

impl Storage {
    pub fn new(
        clients: Clients,
        endpoint: &str,
        bucket_id: &str,
        project_id: &str,
    ) -> Self {
        Self {
            clients,
            base_url: format!("{}/storage/buckets/{}/files", endpoint, bucket_id),
            project_id: project_id.to_string(),
        }
    }

    pub async fn list_files(&self, queries: &[Query]) -> Result<FileList, AppwriteError> {
        let params = to_query_params(queries)?;

        let response = self.clients.api.get(&self.base_url).query(&params).send().await?;

        read_json(response, "List files failed").await
    }

    /// Lists every file of the bucket, following cursors across pages.
    pub async fn list_all_files(&self) -> Result<Vec<FileRecord>, AppwriteError> {
        let mut files: Vec<FileRecord> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut queries = vec![Query::limit(PAGE_SIZE)];
            if let Some(last) = cursor.take() {
                queries.push(Query::cursor_after(&last));
            }

            let page = self.list_files(&queries).await?;
            let fetched = page.files.len();
            files.extend(page.files);

            match files.last() {
                Some(last) if fetched as u32 == PAGE_SIZE => cursor = Some(last.id.clone()),
                _ => break,
            }
        }

        Ok(files)
    }

    /// Uploads a file with a backend-generated id.
    pub async fn create_file(&self, upload: FileUpload) -> Result<FileRecord, AppwriteError> {
        let part = Part::bytes(upload.data.to_vec())
            .file_name(upload.name)
            .mime_str(&upload.mime_type)?;
        let form = Form::new().text("fileId", UNIQUE_ID).part("file", part);

        let response = self
            .clients
            .writes
            .post(&self.base_url)
            .multipart(form)
            .send()
            .await?;

        read_json(response, "Upload failed").await
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<(), AppwriteError> {
        let url = format!("{}/{}", self.base_url, file_id);

        let response = self.clients.api.delete(&url).send().await?;

        expect_success(response, "Delete file failed").await
    }

    /// Public URL rendering the file inline.
    pub fn file_view_url(&self, file_id: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("project", &self.project_id)
            .finish();
        format!("{}/{}/view?{}", self.base_url, file_id, query)
    }
}
