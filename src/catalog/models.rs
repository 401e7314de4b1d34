use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub description: String,
}

/// Tag of a customization. The set is open: unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomizationKind {
    Topping,
    Side,
    Size,
    Crust,
    Bread,
    Spice,
    Sauce,
    Other(String),
}

impl From<String> for CustomizationKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "topping" => Self::Topping,
            "side" => Self::Side,
            "size" => Self::Size,
            "crust" => Self::Crust,
            "bread" => Self::Bread,
            "spice" => Self::Spice,
            "sauce" => Self::Sauce,
            _ => Self::Other(tag),
        }
    }
}

impl From<CustomizationKind> for String {
    fn from(kind: CustomizationKind) -> Self {
        match kind {
            CustomizationKind::Topping => "topping".into(),
            CustomizationKind::Side => "side".into(),
            CustomizationKind::Size => "size".into(),
            CustomizationKind::Crust => "crust".into(),
            CustomizationKind::Bread => "bread".into(),
            CustomizationKind::Spice => "spice".into(),
            CustomizationKind::Sauce => "sauce".into(),
            CustomizationKind::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Customization {
    pub name: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub kind: CustomizationKind,
}

/// Reference to another document: a bare id on write, either a bare id or
/// the expanded related document on read.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum DocumentRef {
    Id(String),
    Expanded {
        #[serde(rename = "$id")]
        id: String,
    },
}

impl DocumentRef {
    pub fn id(&self) -> &str {
        match self {
            DocumentRef::Id(id) => id,
            DocumentRef::Expanded { id } => id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MenuItem {
    pub name: String,
    pub description: String,
    /// File view URL, or the source URL when the upload did not succeed.
    pub image_url: String,
    pub price: f64,
    pub rating: f64,
    pub calories: u32,
    pub protein: u32,
    /// The category document.
    #[serde(default)]
    pub categories: Option<DocumentRef>,
}

impl MenuItem {
    pub fn category_id(&self) -> Option<&str> {
        self.categories.as_ref().map(DocumentRef::id)
    }
}

/// Join record between a menu item and one of its customizations.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MenuCustomization {
    pub menu: DocumentRef,
    pub customizations: DocumentRef,
}
