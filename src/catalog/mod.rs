//! Read access to the menu catalog.

pub mod models;


use crate::catalog::models::{Category, MenuItem};
use crate::config::CollectionIds;
use crate::core::AppwriteError;
use crate::databases::models::{Document, DocumentList};
use crate::databases::query::Query;
use crate::databases::Databases;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Query failed: {0}")]
    Query(#[from] AppwriteError),
}

/// Filters for [`FoodCatalog::list_menu`]. Blank values are ignored.
#[derive(Debug, Clone, Default)]
pub struct MenuFilter {
    /// Category document id.
    pub category: Option<String>,
    /// Text searched in item names.
    pub query: Option<String>,
}

impl MenuFilter {
    pub fn category(mut self, category_id: impl Into<String>) -> Self {
        self.category = Some(category_id.into());
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.query = Some(text.into());
        self
    }

    fn to_queries(&self) -> Vec<Query> {
        let mut queries = Vec::new();
        if let Some(category) = non_blank(&self.category) {
            queries.push(Query::equal("categories", category));
        }
        if let Some(text) = non_blank(&self.query) {
            queries.push(Query::search("name", text));
        }
        queries
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct FoodCatalog {
    databases: Databases,
    collections: CollectionIds,
}

impl FoodCatalog {
    pub fn new(databases: Databases, collections: CollectionIds) -> Self {
        Self { databases, collections }
    }

    /// Lists menu items, narrowed by category and/or name search. Both filters
    /// must hold when both are set.
    #[instrument(skip(self))]
    pub async fn list_menu(&self, filter: &MenuFilter) -> Result<Vec<Document<MenuItem>>, CatalogError> {
        let queries = filter.to_queries();
        let list: DocumentList<MenuItem> = self
            .databases
            .list_documents(&self.collections.menu, &queries)
            .await?;

        debug!(count = list.documents.len(), total = list.total, "Menu listed");
        Ok(list.documents)
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Document<Category>>, CatalogError> {
        let list: DocumentList<Category> = self
            .databases
            .list_documents(&self.collections.categories, &[])
            .await?;

        debug!(count = list.documents.len(), "Categories listed");
        Ok(list.documents)
    }
}
