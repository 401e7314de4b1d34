//! Wipe-and-reload of the catalog reference data.
//!
//! A run goes through five phases, strictly in order:
//!
//! 1. wipe the category, customization, menu and link collections and the
//!    image bucket,
//! 2. create the categories,
//! 3. create the customizations,
//! 4. create the menu items, uploading each image first,
//! 5. link menu items to their customizations.
//!
//! Deletions in the wipe phase run concurrently and every outcome is kept;
//! the run stops after the wipe if any of them failed. All other phases are
//! sequential because they need the ids created before them. An image that
//! cannot be fetched or uploaded is replaced by its source URL. Any other
//! failure aborts the run and leaves the records created so far in place.

pub mod backend;
pub mod data;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::catalog::models::{DocumentRef, MenuCustomization, MenuItem};
use crate::config::CollectionIds;
use crate::core::AppwriteError;
use backend::{DocumentStore, FileStore, ImageSource};
use data::{SeedData, SeedMenuItem};

const DEFAULT_CONCURRENCY: usize = 8;
const BUCKET_TARGET: &str = "bucket";

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Invalid seed data: {}", .0.join("; "))]
    InvalidData(Vec<String>),
    #[error("Failed to read seed data: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Wipe incomplete: {} deletion(s) failed", .0.failures.len())]
    WipeIncomplete(WipeReport),
    #[error("{context}: {source}")]
    Remote {
        context: String,
        #[source]
        source: AppwriteError,
    },
}

impl SeedError {
    fn remote(context: impl Into<String>) -> impl FnOnce(AppwriteError) -> SeedError {
        let context = context.into();
        move |source| SeedError::Remote { context, source }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipeFailure {
    /// Collection id, or `bucket` for files.
    pub target: String,
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct WipeReport {
    /// Records deleted per collection id (`bucket` for files).
    pub deleted: BTreeMap<String, usize>,
    pub failures: Vec<WipeFailure>,
}

impl WipeReport {
    fn record(&mut self, target: &str, outcomes: Vec<(String, Result<(), AppwriteError>)>) {
        let mut deleted = 0;
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => deleted += 1,
                Err(e) => self.failures.push(WipeFailure {
                    target: target.to_string(),
                    id,
                    error: e.to_string(),
                }),
            }
        }
        self.deleted.insert(target.to_string(), deleted);
    }

    pub fn total_deleted(&self) -> usize {
        self.deleted.values().sum()
    }
}

/// How a menu item's image ended up being referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedImage {
    Uploaded { file_id: String, view_url: String },
    /// The upload failed; the source URL is stored instead.
    Fallback(String),
}

impl ResolvedImage {
    pub fn url(&self) -> &str {
        match self {
            ResolvedImage::Uploaded { view_url, .. } => view_url,
            ResolvedImage::Fallback(url) => url,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    pub wiped: WipeReport,
    pub categories: usize,
    pub customizations: usize,
    pub menu_items: usize,
    pub links: usize,
    /// Names of menu items stored with their source image URL.
    pub image_fallbacks: Vec<String>,
}

pub struct Seeder<'a> {
    documents: &'a dyn DocumentStore,
    files: &'a dyn FileStore,
    images: &'a dyn ImageSource,
    collections: CollectionIds,
    concurrency: usize,
}

impl<'a> Seeder<'a> {
    pub fn new(
        documents: &'a dyn DocumentStore,
        files: &'a dyn FileStore,
        images: &'a dyn ImageSource,
        collections: CollectionIds,
    ) -> Self {
        Self {
            documents,
            files,
            images,
            collections,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Maximum number of deletions in flight during the wipe.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Replaces the catalog with `data`.
    ///
    /// The dataset is validated before anything is deleted.
    #[instrument(skip_all, fields(
        categories = data.categories.len(),
        customizations = data.customizations.len(),
        menu = data.menu.len()
    ))]
    pub async fn run(&self, data: &SeedData) -> Result<SeedReport, SeedError> {
        match self.run_phases(data).await {
            Ok(report) => {
                info!(
                    categories = report.categories,
                    customizations = report.customizations,
                    menu_items = report.menu_items,
                    links = report.links,
                    image_fallbacks = report.image_fallbacks.len(),
                    "Seeding complete"
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Seeding failed");
                Err(e)
            }
        }
    }

    async fn run_phases(&self, data: &SeedData) -> Result<SeedReport, SeedError> {
        data.validate().map_err(SeedError::InvalidData)?;

        info!("Clearing existing data");
        let wiped = self.wipe().await?;

        info!("Creating categories");
        let category_ids = self.load_named(&self.collections.categories, &data.categories, |c| &c.name).await?;

        info!("Creating customizations");
        let customization_ids = self
            .load_named(&self.collections.customizations, &data.customizations, |c| &c.name)
            .await?;

        info!("Creating menu items");
        let mut menu_ids = Vec::with_capacity(data.menu.len());
        let mut image_fallbacks = Vec::new();
        for item in &data.menu {
            let (id, image) = self.create_menu_item(item, &category_ids).await?;
            if matches!(image, ResolvedImage::Fallback(_)) {
                image_fallbacks.push(item.name.clone());
            }
            menu_ids.push(id);
        }

        info!("Linking customizations");
        let mut links = 0;
        for (item, menu_id) in data.menu.iter().zip(&menu_ids) {
            links += self.link_customizations(item, menu_id, &customization_ids).await?;
        }

        Ok(SeedReport {
            wiped,
            categories: data.categories.len(),
            customizations: data.customizations.len(),
            menu_items: menu_ids.len(),
            links,
            image_fallbacks,
        })
    }

    /// Deletes every document of the seeded collections and every file of
    /// the bucket. All deletions are attempted before failures are reported.
    pub async fn wipe(&self) -> Result<WipeReport, SeedError> {
        let mut report = WipeReport::default();

        let collections = [
            &self.collections.categories,
            &self.collections.customizations,
            &self.collections.menu,
            &self.collections.menu_customizations,
        ];

        for collection in collections {
            let ids = self
                .documents
                .list_document_ids(collection)
                .await
                .map_err(SeedError::remote(format!("List {} failed", collection)))?;

            let outcomes: Vec<_> = stream::iter(ids)
                .map(|id| async move {
                    let outcome = self.documents.delete_document(collection, &id).await;
                    (id, outcome)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
            report.record(collection, outcomes);
        }

        let file_ids = self
            .files
            .list_file_ids()
            .await
            .map_err(SeedError::remote("List files failed"))?;

        let outcomes: Vec<_> = stream::iter(file_ids)
            .map(|id| async move {
                let outcome = self.files.delete_file(&id).await;
                (id, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        report.record(BUCKET_TARGET, outcomes);

        if report.failures.is_empty() {
            info!(deleted = report.total_deleted(), "Existing data cleared");
            Ok(report)
        } else {
            for failure in &report.failures {
                warn!(collection = %failure.target, id = %failure.id, error = %failure.error, "Delete failed");
            }
            Err(SeedError::WipeIncomplete(report))
        }
    }

    /// Creates one document per record, in order, and maps names to ids.
    async fn load_named<T, F>(
        &self,
        collection: &str,
        records: &[T],
        name: F,
    ) -> Result<HashMap<String, String>, SeedError>
    where
        T: Serialize,
        F: Fn(&T) -> &String,
    {
        let mut ids = HashMap::with_capacity(records.len());
        for record in records {
            let id = self.create(collection, record).await?;
            ids.insert(name(record).clone(), id);
        }
        Ok(ids)
    }

    async fn create_menu_item(
        &self,
        item: &SeedMenuItem,
        category_ids: &HashMap<String, String>,
    ) -> Result<(String, ResolvedImage), SeedError> {
        info!(name = %item.name, "Processing menu item");
        let image = self.resolve_image(&item.image_url).await;

        let category_id = category_ids
            .get(&item.category_name)
            .cloned()
            .ok_or_else(|| SeedError::InvalidData(vec![format!("{}: unknown category", item.name)]))?;

        let document = MenuItem {
            name: item.name.clone(),
            description: item.description.clone(),
            image_url: image.url().to_string(),
            price: item.price,
            rating: item.rating,
            calories: item.calories,
            protein: item.protein,
            categories: Some(DocumentRef::Id(category_id)),
        };

        let id = self.create(&self.collections.menu, &document).await?;
        Ok((id, image))
    }

    async fn link_customizations(
        &self,
        item: &SeedMenuItem,
        menu_id: &str,
        customization_ids: &HashMap<String, String>,
    ) -> Result<usize, SeedError> {
        for name in &item.customizations {
            let customization_id = customization_ids
                .get(name)
                .cloned()
                .ok_or_else(|| SeedError::InvalidData(vec![format!("{}: unknown customization {:?}", item.name, name)]))?;

            let link = MenuCustomization {
                menu: DocumentRef::Id(menu_id.to_string()),
                customizations: DocumentRef::Id(customization_id),
            };
            self.create(&self.collections.menu_customizations, &link).await?;
        }
        Ok(item.customizations.len())
    }

    /// Uploads the image behind `url`, falling back to the URL itself.
    async fn resolve_image(&self, url: &str) -> ResolvedImage {
        let uploaded = async {
            let upload = self.images.fetch(url).await?;
            let file_id = self.files.upload_file(upload).await?;
            Ok::<_, anyhow::Error>(file_id)
        }
        .await;

        match uploaded {
            Ok(file_id) => {
                info!(%file_id, "Image uploaded");
                ResolvedImage::Uploaded {
                    view_url: self.files.file_view_url(&file_id),
                    file_id,
                }
            }
            Err(e) => {
                warn!(url, error = %e, "Image upload failed, using source URL");
                ResolvedImage::Fallback(url.to_string())
            }
        }
    }

    async fn create<T: Serialize>(&self, collection: &str, record: &T) -> Result<String, SeedError> {
        let data = serde_json::to_value(record)?;
        self.documents
            .create_document(collection, data)
            .await
            .map_err(SeedError::remote(format!("Create document in {} failed", collection)))
    }
}
