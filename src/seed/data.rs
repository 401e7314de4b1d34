//! Reference dataset loaded by the seeder.
//!
//! ## JSON Format
//!
//! ```json
//! {
//!   "categories": [{ "name": "Burgers", "description": "Juicy grilled burgers" }],
//!   "customizations": [{ "name": "Extra Cheese", "price": 25, "type": "topping" }],
//!   "menu": [{
//!     "name": "Classic Cheeseburger",
//!     "description": "Beef patty, cheese, lettuce, tomato",
//!     "image_url": "https://example.com/burger.png",
//!     "price": 25.99, "rating": 4.5, "calories": 550, "protein": 25,
//!     "category_name": "Burgers",
//!     "customizations": ["Extra Cheese"]
//!   }]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::SeedError;
use crate::catalog::models::{Category, Customization};

const BUNDLED: &str = include_str!("../../data/seed.json");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedMenuItem {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub price: f64,
    pub rating: f64,
    pub calories: u32,
    pub protein: u32,
    pub category_name: String,
    /// Customization names.
    #[serde(default)]
    pub customizations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeedData {
    pub categories: Vec<Category>,
    pub customizations: Vec<Customization>,
    pub menu: Vec<SeedMenuItem>,
}

impl SeedData {
    /// The dataset shipped with the crate.
    pub fn bundled() -> Result<Self, SeedError> {
        Ok(serde_json::from_str(BUNDLED)?)
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Checks that every name a menu item refers to exists in the dataset.
    ///
    /// Returns one message per dangling reference.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let categories: HashSet<&str> = self.categories.iter().map(|c| c.name.as_str()).collect();
        let customizations: HashSet<&str> = self.customizations.iter().map(|c| c.name.as_str()).collect();

        let mut errors = Vec::new();
        for item in &self.menu {
            if !categories.contains(item.category_name.as_str()) {
                errors.push(format!("{}: unknown category {:?}", item.name, item.category_name));
            }
            for name in &item.customizations {
                if !customizations.contains(name.as_str()) {
                    errors.push(format!("{}: unknown customization {:?}", item.name, name));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
