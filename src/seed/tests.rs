use super::backend::{file_name_from_url, DocumentStore, FileStore, HttpImageSource, ImageSource};
use super::data::{SeedData, SeedMenuItem};
use super::*;
use crate::catalog::models::{Category, Customization, CustomizationKind};
use crate::config::AppwriteConfig;
use crate::core::AppwriteException;
use crate::storage::models::FileUpload;
use crate::FoodApp;
use async_trait::async_trait;
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Backend that keeps documents and files in memory.
#[derive(Default)]
struct MemoryBackend {
    documents: Mutex<HashMap<String, Vec<(String, Value)>>>,
    files: Mutex<Vec<String>>,
    next_id: AtomicUsize,
    failing_deletes: HashSet<String>,
    /// File names whose upload is rejected.
    failing_uploads: HashSet<String>,
    creates: AtomicUsize,
}

impl MemoryBackend {
    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn count(&self, collection: &str) -> usize {
        self.documents.lock().unwrap().get(collection).map_or(0, Vec::len)
    }

    fn docs(&self, collection: &str) -> Vec<(String, Value)> {
        self.documents.lock().unwrap().get(collection).cloned().unwrap_or_default()
    }

    fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    fn insert(&self, collection: &str, id: &str) {
        self.documents
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push((id.to_string(), json!({})));
    }
}

fn api_error(message: &str) -> AppwriteError {
    AppwriteError::ApiError(AppwriteException {
        code: 500,
        kind: Some("general_unknown".into()),
        message: message.into(),
    })
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn list_document_ids(&self, collection_id: &str) -> Result<Vec<String>, AppwriteError> {
        Ok(self.docs(collection_id).into_iter().map(|(id, _)| id).collect())
    }

    async fn create_document(&self, collection_id: &str, data: Value) -> Result<String, AppwriteError> {
        let id = self.next_id("doc");
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.documents
            .lock()
            .unwrap()
            .entry(collection_id.to_string())
            .or_default()
            .push((id.clone(), data));
        Ok(id)
    }

    async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<(), AppwriteError> {
        if self.failing_deletes.contains(document_id) {
            return Err(api_error("delete refused"));
        }
        if let Some(docs) = self.documents.lock().unwrap().get_mut(collection_id) {
            docs.retain(|(id, _)| id != document_id);
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for MemoryBackend {
    async fn list_file_ids(&self) -> Result<Vec<String>, AppwriteError> {
        Ok(self.files.lock().unwrap().clone())
    }

    async fn upload_file(&self, upload: FileUpload) -> Result<String, AppwriteError> {
        if self.failing_uploads.contains(&upload.name) {
            return Err(api_error("upload refused"));
        }
        let id = self.next_id("file");
        self.files.lock().unwrap().push(id.clone());
        Ok(id)
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), AppwriteError> {
        if self.failing_deletes.contains(file_id) {
            return Err(api_error("delete refused"));
        }
        self.files.lock().unwrap().retain(|id| id != file_id);
        Ok(())
    }

    fn file_view_url(&self, file_id: &str) -> String {
        format!("https://backend.test/files/{}/view", file_id)
    }
}

/// Serves a fixed image for every URL except the broken ones.
#[derive(Default)]
struct FakeImages {
    broken: HashSet<String>,
}

#[async_trait]
impl ImageSource for FakeImages {
    async fn fetch(&self, url: &str) -> anyhow::Result<FileUpload> {
        if self.broken.contains(url) {
            anyhow::bail!("404 Not Found");
        }
        Ok(FileUpload {
            name: file_name_from_url(url),
            mime_type: "image/png".into(),
            data: bytes::Bytes::from_static(b"\x89PNG"),
        })
    }
}

fn menu_item(name: &str, category: &str, customizations: &[&str]) -> SeedMenuItem {
    SeedMenuItem {
        name: name.into(),
        description: format!("{} description", name),
        image_url: format!("https://images.test/{}.png", name.to_lowercase().replace(' ', "-")),
        price: 12.5,
        rating: 4.5,
        calories: 500,
        protein: 20,
        category_name: category.into(),
        customizations: customizations.iter().map(|c| c.to_string()).collect(),
    }
}

fn small_dataset() -> SeedData {
    SeedData {
        categories: vec![
            Category { name: "Burgers".into(), description: "Buns".into() },
            Category { name: "Pizzas".into(), description: "Slices".into() },
        ],
        customizations: vec![
            Customization { name: "Extra Cheese".into(), price: 25.0, kind: CustomizationKind::Topping },
            Customization { name: "Fries".into(), price: 35.0, kind: CustomizationKind::Side },
            Customization { name: "Large".into(), price: 10.0, kind: CustomizationKind::Size },
        ],
        menu: vec![menu_item("Classic Burger", "Pizzas", &["Extra Cheese", "Fries"])],
    }
}

fn collections() -> CollectionIds {
    CollectionIds::default()
}

#[tokio::test]
async fn test_seed_small_dataset() {
    let backend = MemoryBackend::default();
    let images = FakeImages::default();
    let seeder = Seeder::new(&backend, &backend, &images, collections());

    let report = seeder.run(&small_dataset()).await.unwrap();

    assert_eq!(report.categories, 2);
    assert_eq!(report.customizations, 3);
    assert_eq!(report.menu_items, 1);
    assert_eq!(report.links, 2);
    assert!(report.image_fallbacks.is_empty());

    assert_eq!(backend.count("categories"), 2);
    assert_eq!(backend.count("customizations"), 3);
    assert_eq!(backend.count("menu"), 1);
    assert_eq!(backend.count("menu_customizations"), 2);
    assert_eq!(backend.file_count(), 1);

    let category_id = backend
        .docs("categories")
        .into_iter()
        .find(|(_, data)| data["name"] == "Pizzas")
        .map(|(id, _)| id)
        .unwrap();
    let (menu_id, menu) = backend.docs("menu").remove(0);
    assert_eq!(menu["categories"], json!(category_id));
    assert!(menu["image_url"].as_str().unwrap().starts_with("https://backend.test/files/"));

    let customization_ids: HashMap<String, String> = backend
        .docs("customizations")
        .into_iter()
        .map(|(id, data)| (data["name"].as_str().unwrap().to_string(), id))
        .collect();
    let linked: HashSet<String> = backend
        .docs("menu_customizations")
        .into_iter()
        .map(|(_, link)| {
            assert_eq!(link["menu"], json!(menu_id));
            link["customizations"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        linked,
        HashSet::from([customization_ids["Extra Cheese"].clone(), customization_ids["Fries"].clone()])
    );
}

#[tokio::test]
async fn test_seed_twice_leaves_same_counts() {
    let backend = MemoryBackend::default();
    let images = FakeImages::default();
    let seeder = Seeder::new(&backend, &backend, &images, collections()).with_concurrency(2);
    let data = SeedData::bundled().unwrap();

    seeder.run(&data).await.unwrap();
    let first = (
        backend.count("categories"),
        backend.count("customizations"),
        backend.count("menu"),
        backend.count("menu_customizations"),
        backend.file_count(),
    );

    let report = seeder.run(&data).await.unwrap();
    let second = (
        backend.count("categories"),
        backend.count("customizations"),
        backend.count("menu"),
        backend.count("menu_customizations"),
        backend.file_count(),
    );

    assert_eq!(first, second);
    assert_eq!(first.2, data.menu.len());
    assert_eq!(report.wiped.total_deleted(), first.0 + first.1 + first.2 + first.3 + first.4);
    assert_eq!(report.wiped.deleted["bucket"], data.menu.len());
}

#[tokio::test]
async fn test_failed_image_falls_back_to_source_url() {
    let backend = MemoryBackend::default();
    let mut data = small_dataset();
    data.menu.push(menu_item("Margherita", "Pizzas", &[]));
    data.menu.push(menu_item("Cheese Pizza", "Pizzas", &["Large"]));

    let broken_url = data.menu[1].image_url.clone();
    let images = FakeImages {
        broken: HashSet::from([broken_url.clone()]),
    };
    let seeder = Seeder::new(&backend, &backend, &images, collections());

    let report = seeder.run(&data).await.unwrap();

    assert_eq!(report.menu_items, 3);
    assert_eq!(report.image_fallbacks, vec!["Margherita".to_string()]);
    assert_eq!(backend.file_count(), 2);

    let menu = backend.docs("menu");
    let stored = menu
        .iter()
        .find(|(_, item)| item["name"] == "Margherita")
        .map(|(_, item)| item["image_url"].clone())
        .unwrap();
    assert_eq!(stored, json!(broken_url));
    assert!(menu
        .iter()
        .filter(|(_, item)| item["name"] != "Margherita")
        .all(|(_, item)| item["image_url"].as_str().unwrap().starts_with("https://backend.test/")));

    // An item without customizations gets no links.
    assert_eq!(report.links, 3);
}

#[tokio::test]
async fn test_rejected_upload_falls_back_to_source_url() {
    let mut backend = MemoryBackend::default();
    backend.failing_uploads.insert("margherita.png".to_string());

    let mut data = small_dataset();
    data.menu.push(menu_item("Margherita", "Pizzas", &["Large"]));
    let source_url = data.menu[1].image_url.clone();

    let images = FakeImages::default();
    let seeder = Seeder::new(&backend, &backend, &images, collections());

    let report = seeder.run(&data).await.unwrap();

    assert_eq!(report.menu_items, 2);
    assert_eq!(report.links, 3);
    assert_eq!(report.image_fallbacks, vec!["Margherita".to_string()]);
    assert_eq!(backend.file_count(), 1);

    let menu = backend.docs("menu");
    assert_eq!(menu.len(), 2);
    for (_, item) in &menu {
        if item["name"] == "Margherita" {
            assert_eq!(item["image_url"], json!(source_url));
        } else {
            assert!(item["image_url"].as_str().unwrap().starts_with("https://backend.test/files/"));
        }
    }
}

#[tokio::test]
async fn test_wipe_of_empty_backend_is_noop() {
    let backend = MemoryBackend::default();
    let images = FakeImages::default();
    let seeder = Seeder::new(&backend, &backend, &images, collections());

    let report = seeder.wipe().await.unwrap();

    assert_eq!(report.total_deleted(), 0);
    assert!(report.failures.is_empty());
    assert_eq!(report.deleted.len(), 5);
}

#[tokio::test]
async fn test_partial_wipe_failure_is_reported_and_aborts() {
    let mut backend = MemoryBackend::default();
    backend.failing_deletes.insert("stuck".to_string());
    for id in ["a", "stuck", "b"] {
        backend.insert("menu", id);
    }
    backend.insert("categories", "c");
    let images = FakeImages::default();
    let seeder = Seeder::new(&backend, &backend, &images, collections());

    let err = seeder.run(&small_dataset()).await.unwrap_err();

    match err {
        SeedError::WipeIncomplete(report) => {
            assert_eq!(
                report.failures,
                vec![WipeFailure {
                    target: "menu".into(),
                    id: "stuck".into(),
                    error: "API error: delete refused (code: 500)".into(),
                }]
            );
            assert_eq!(report.deleted["menu"], 2);
            assert_eq!(report.deleted["categories"], 1);
        }
        other => panic!("Expected WipeIncomplete, got {other:?}"),
    }

    assert_eq!(backend.docs("menu"), vec![("stuck".to_string(), json!({}))]);
    assert_eq!(backend.count("categories"), 0);
    assert_eq!(backend.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_dataset_touches_nothing() {
    let backend = MemoryBackend::default();
    backend.insert("categories", "keep");
    let images = FakeImages::default();
    let seeder = Seeder::new(&backend, &backend, &images, collections());

    let mut data = small_dataset();
    data.menu.push(menu_item("Taco", "Tacos", &[]));

    let err = seeder.run(&data).await.unwrap_err();

    assert!(matches!(err, SeedError::InvalidData(ref errors) if errors.len() == 1));
    assert_eq!(backend.count("categories"), 1);
}

#[tokio::test]
async fn test_seed_over_http() {
    let server = MockServer::start();
    let mut config = AppwriteConfig::new(server.url("/v1"), "test-project").with_max_retries(0);
    config.database_id = "db".into();
    config.bucket_id = "bucket".into();
    let app = FoodApp::new(config).unwrap();

    let databases = app.databases();
    let storage = app.storage();
    let images = HttpImageSource::new();

    let mut list_mocks = Vec::new();
    for collection in ["categories", "customizations", "menu", "menu_customizations"] {
        list_mocks.push(server.mock(|when, then| {
            when.method(GET)
                .path(format!("/v1/databases/db/collections/{}/documents", collection))
                .header("x-appwrite-project", "test-project");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "total": 0, "documents": [] }));
        }));
    }

    let list_files = server.mock(|when, then| {
        when.method(GET).path("/v1/storage/buckets/bucket/files");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "total": 1, "files": [{ "$id": "old-file", "name": "old.png" }] }));
    });
    let delete_file = server.mock(|when, then| {
        when.method(DELETE).path("/v1/storage/buckets/bucket/files/old-file");
        then.status(204);
    });
    let image = server.mock(|when, then| {
        when.method(GET).path("/images/burger.png");
        then.status(200).header("content-type", "image/png").body("png-bytes");
    });
    let upload = server.mock(|when, then| {
        when.method(POST).path("/v1/storage/buckets/bucket/files");
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({ "$id": "file-1", "bucketId": "bucket", "name": "burger.png" }));
    });
    let create_category = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/databases/db/collections/categories/documents")
            .json_body(json!({
                "documentId": "unique()",
                "data": { "name": "Burgers", "description": "Buns" }
            }));
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({ "$id": "cat-1", "name": "Burgers", "description": "Buns" }));
    });
    let create_customization = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/databases/db/collections/customizations/documents")
            .json_body(json!({
                "documentId": "unique()",
                "data": { "name": "Fries", "price": 35.0, "type": "side" }
            }));
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({ "$id": "cus-1" }));
    });
    let view_url = format!(
        "{}/storage/buckets/bucket/files/file-1/view?project=test-project",
        server.url("/v1")
    );
    let create_menu = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/databases/db/collections/menu/documents")
            .json_body(json!({
                "documentId": "unique()",
                "data": {
                    "name": "Classic Burger",
                    "description": "Beef",
                    "image_url": view_url,
                    "price": 9.5,
                    "rating": 4.5,
                    "calories": 550,
                    "protein": 25,
                    "categories": "cat-1"
                }
            }));
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({ "$id": "menu-1" }));
    });
    let create_link = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/databases/db/collections/menu_customizations/documents")
            .json_body(json!({
                "documentId": "unique()",
                "data": { "menu": "menu-1", "customizations": "cus-1" }
            }));
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({ "$id": "link-1" }));
    });

    let data = SeedData {
        categories: vec![Category { name: "Burgers".into(), description: "Buns".into() }],
        customizations: vec![Customization { name: "Fries".into(), price: 35.0, kind: CustomizationKind::Side }],
        menu: vec![SeedMenuItem {
            name: "Classic Burger".into(),
            description: "Beef".into(),
            image_url: server.url("/images/burger.png"),
            price: 9.5,
            rating: 4.5,
            calories: 550,
            protein: 25,
            category_name: "Burgers".into(),
            customizations: vec!["Fries".into()],
        }],
    };

    let seeder = Seeder::new(&databases, &storage, &images, app.config().collections.clone());
    let report = seeder.run(&data).await.unwrap();

    assert_eq!(report.wiped.deleted["bucket"], 1);
    assert_eq!(report.links, 1);
    assert!(report.image_fallbacks.is_empty());

    for mock in &list_mocks {
        mock.assert();
    }
    list_files.assert();
    delete_file.assert();
    image.assert();
    upload.assert();
    create_category.assert();
    create_customization.assert();
    create_menu.assert();
    create_link.assert();
}

#[test]
fn test_file_name_from_url() {
    assert_eq!(
        backend::file_name_from_url("https://images.test/menu/burger.png?w=200"),
        "burger.png"
    );
    assert!(backend::file_name_from_url("https://images.test/").starts_with("file-"));
}
