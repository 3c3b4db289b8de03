use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A downloaded page as it is persisted by the page store.
///
/// `url` is the normalized site-relative path (see [`crate::frontier::normalize_url`])
/// and is the identity of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    pub url: String,
    pub url_root: String,
    pub source: String,
    pub raw_text: String,
    #[serde(rename = "utc_timestamp")]
    pub fetched_at: DateTime<Utc>,
    #[serde(rename = "name", default)]
    pub title: String,
    #[serde(default)]
    pub referenced_urls: Vec<String>,
}

impl RawPage {
    /// Absolute URL of the page (`url_root` + `url`)
    pub fn canonical_url(&self) -> String {
        format!("{}{}", self.url_root.trim_end_matches('/'), self.url)
    }
}

impl fmt::Display for RawPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source, self.title)
    }
}

/// Where a recipe came from. Keeps the identifying bits of the [`RawPage`]
/// without holding on to its markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageInfo {
    pub url: String,
    pub url_root: String,
    pub source: String,
    pub title: String,
}

impl PageInfo {
    pub fn canonical_url(&self) -> String {
        format!("{}{}", self.url_root.trim_end_matches('/'), self.url)
    }
}

impl From<&RawPage> for PageInfo {
    fn from(page: &RawPage) -> Self {
        PageInfo {
            url: page.url.clone(),
            url_root: page.url_root.clone(),
            source: page.source.clone(),
            title: page.title.clone(),
        }
    }
}

/// Normalized ingredient text, used as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IngredientName(String);

impl IngredientName {
    pub fn new(name: impl AsRef<str>) -> Self {
        IngredientName(name.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IngredientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingredient {
    /// The list entry as it appeared on the page
    pub declaration: String,
    pub name: IngredientName,
    pub quantity: String,
    pub detail: String,
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.declaration)
    }
}

/// A successfully extracted recipe. Always has at least two ingredients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub ingredients: Vec<Ingredient>,
    pub page: PageInfo,
}

/// Outcome of running the classifier over one recipe's ingredient names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientClassification {
    /// ingredient name -> winning rule (class) name
    pub classified: HashMap<IngredientName, String>,
    pub unclassified: HashSet<IngredientName>,
}

impl IngredientClassification {
    pub fn class_of(&self, name: &IngredientName) -> Option<&str> {
        self.classified.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecipe {
    pub recipe: Recipe,
    pub classification: IngredientClassification,
}

/// Position of an ingredient class in the taxonomy, e.g. type "potatoes" in
/// group "starchy veggies".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IngredientType {
    #[serde(rename = "type")]
    pub type_name: String,
    pub group: String,
}
