//! Appwrite Databases module.
//!
//! Lists, creates and deletes documents in the collections of one database.
//! Filters are expressed with [`Query`].

pub mod models;
pub mod query;


use self::models::{CreateDocumentRequest, Document, DocumentList, RawDocument};
use self::query::{to_query_params, Query};
use crate::core::{expect_success, read_json, AppwriteError, Clients, UNIQUE_ID};
use reqwest::header;
use serde::de::DeserializeOwned;
use serde::Serialize;

const PAGE_SIZE: u32 = 100;

/// Client for the documents of one database.
#[derive(Clone)]
pub struct Databases {
    clients: Clients,
    base_url: String,
}

impl Databases {
    pub fn new(clients: Clients, endpoint: &str, database_id: &str) -> Self {
        Self {
            clients,
            base_url: format!("{}/databases/{}", endpoint, database_id),
        }
    }

    fn documents_url(&self, collection_id: &str) -> String {
        format!("{}/collections/{}/documents", self.base_url, collection_id)
    }

    /// Lists one page of documents matching every query.
    pub async fn list_documents<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList<T>, AppwriteError> {
        let params = to_query_params(queries)?;

        let response = self
            .clients
            .api
            .get(self.documents_url(collection_id))
            .query(&params)
            .send()
            .await?;

        read_json(response, "List documents failed").await
    }

    /// Lists every document of a collection, following cursors across pages.
    pub async fn list_all_documents(&self, collection_id: &str) -> Result<Vec<RawDocument>, AppwriteError> {
        let mut documents: Vec<RawDocument> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut queries = vec![Query::limit(PAGE_SIZE)];
            if let Some(last) = cursor.take() {
                queries.push(Query::cursor_after(&last));
            }

            let page = self.list_documents(collection_id, &queries).await?;
            let fetched = page.documents.len();
            documents.extend(page.documents);

            match documents.last() {
                Some(last) if fetched as u32 == PAGE_SIZE => cursor = Some(last.id.clone()),
                _ => break,
            }
        }

        Ok(documents)
    }

    /// Creates a document with a backend-generated id.
    pub async fn create_document<D, T>(&self, collection_id: &str, data: &D) -> Result<Document<T>, AppwriteError>
    where
        D: Serialize,
        T: DeserializeOwned,
    {
        let request = CreateDocumentRequest {
            document_id: UNIQUE_ID,
            data,
            permissions: None,
        };

        let response = self
            .clients
            .writes
            .post(self.documents_url(collection_id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        read_json(response, "Create document failed").await
    }

    pub async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<(), AppwriteError> {
        let url = format!("{}/{}", self.documents_url(collection_id), document_id);

        let response = self.clients.api.delete(&url).send().await?;

        expect_success(response, "Delete document failed").await
    }
}
