//! Preference scoring and ranking of classified recipes.

use crate::classify::TypeHierarchy;
use crate::error::QueryError;
use crate::model::ClassifiedRecipe;
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

static SPECIAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^a-zA-Z0-9_/\.,:;&#"'\- \t]+"#).expect("valid regex"));

/// Smallest strictness accepted; anything below is raised to this.
pub const MIN_STRICTNESS: f64 = 1e-4;

/// How much a user likes each ingredient type. Types not listed are neutral.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceVector {
    scores: HashMap<String, i32>,
}

impl PreferenceVector {
    /// Parse a JSON object of `type name -> integer score`. Scores may also be
    /// strings holding an integer, e.g. `{"greens": "2"}`.
    pub fn from_json(json: &str) -> Result<Self, QueryError> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut scores = HashMap::with_capacity(object.len());
        for (name, value) in object {
            let score = match &value {
                serde_json::Value::String(text) => text.trim().parse::<i32>().ok(),
                other => other.as_i64().and_then(|v| i32::try_from(v).ok()),
            };
            let score = score.ok_or_else(|| QueryError::InvalidPreference {
                name: name.clone(),
                value: value.to_string(),
            })?;
            scores.insert(name, score);
        }
        Ok(Self { scores })
    }

    pub fn score(&self, type_name: &str) -> i32 {
        self.scores.get(type_name).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, i32)> for PreferenceVector {
    fn from_iter<I: IntoIterator<Item = (K, i32)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A validated ranking request.
#[derive(Debug, Clone)]
pub struct RankingQuery {
    pub preferences: PreferenceVector,
    pub strictness: f64,
    pub limit: usize,
}

impl RankingQuery {
    pub fn new(preferences: PreferenceVector, strictness: f64, limit: usize) -> Result<Self, QueryError> {
        if limit == 0 {
            return Err(QueryError::InvalidLimit(limit));
        }
        if !strictness.is_finite() {
            return Err(QueryError::InvalidStrictness(strictness));
        }
        Ok(Self {
            preferences,
            strictness: strictness.max(MIN_STRICTNESS),
            limit,
        })
    }
}

/// A recipe with its score and the declarations that drove it.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult<'a> {
    #[serde(skip)]
    pub recipe: &'a ClassifiedRecipe,
    pub title: String,
    pub url: String,
    pub score: f64,
    pub positives: Vec<String>,
    pub neutrals: Vec<String>,
    pub negatives: Vec<String>,
}

/// Score one recipe: the mean contribution over all of its ingredients, where
/// unclassified ingredients count towards the mean but contribute nothing and
/// dislikes are amplified by `strictness`.
pub fn score_recipe<'a>(
    recipe: &'a ClassifiedRecipe,
    types: &TypeHierarchy,
    preferences: &PreferenceVector,
    strictness: f64,
) -> RankedResult<'a> {
    let strictness = strictness.max(MIN_STRICTNESS);
    let mut total = 0.0;
    let mut positives = Vec::new();
    let mut neutrals = Vec::new();
    let mut negatives = Vec::new();

    for ingredient in &recipe.recipe.ingredients {
        let Some(class) = recipe.classification.class_of(&ingredient.name) else {
            continue;
        };
        let Some(ingredient_type) = types.type_of(class) else {
            debug!("class '{}' has no ingredient type, ignoring", class);
            continue;
        };

        let mut contribution = f64::from(preferences.score(&ingredient_type.type_name));
        if contribution < 0.0 {
            contribution *= strictness;
        }
        total += contribution;

        let bucket = if contribution > 0.0 {
            &mut positives
        } else if contribution < 0.0 {
            &mut negatives
        } else {
            &mut neutrals
        };
        let declaration = sanitize(&ingredient.declaration);
        if !bucket.contains(&declaration) {
            bucket.push(declaration);
        }
    }

    let count = recipe.recipe.ingredients.len();
    let score = if count == 0 { 0.0 } else { total / count as f64 };

    RankedResult {
        recipe,
        title: recipe.recipe.page.title.clone(),
        url: recipe.recipe.page.canonical_url(),
        score,
        positives,
        neutrals,
        negatives,
    }
}

/// Score every recipe and return the best `query.limit`, highest first.
/// Equal scores keep their input order.
pub fn rank<'a>(
    recipes: &'a [ClassifiedRecipe],
    types: &TypeHierarchy,
    query: &RankingQuery,
) -> Vec<RankedResult<'a>> {
    let mut results: Vec<RankedResult<'a>> = recipes
        .iter()
        .map(|r| score_recipe(r, types, &query.preferences, query.strictness))
        .collect();
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(query.limit);
    results
}

/// Drop characters that have no business in a short display string.
pub fn sanitize(text: &str) -> String {
    SPECIAL_CHARS.replace_all(text, "").into_owned()
}
