use super::{collect_links, fetch_with, LinkPolicy, RecipeSource, SourceKind};
use crate::error::FetchError;
use crate::extract::{
    document_body, ingredient_list, split_non_empty, title_starts_with_number, ExtractFailure,
    MissingHint,
};
use crate::fetch::{FetchedPage, HttpFetcher};
use crate::model::{RawPage, Recipe};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static RECIPE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/[^/]+/$").expect("valid regex"));
static ITEM_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</li>|<br\s*/>").expect("valid regex"));
static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^",
        r"([0-9/â„]+\sto\s)?",
        r"([0-9/\- â„]+|half|one third|one quarter|one|two|three|four|five|six|seven|eight|nine|ten|a few)?",
        r"(\s?(lbs?|pounds?|grams?|quarts?|oz|ounces?|cups?|tsps?|tbsps?|half|halves|thirds?|quarters?|pinch(es)?|cloves?|links?|sprigs?|tea\s?spoons?|table\s?spoons?|inch(es)?))?",
        r"(\s?\([^)]+\))?",
        r"(\s?(bag|pouch|box|bottle|pack)[^a-zA-Z]+)?",
        r"(\s?of)?",
    ))
    .expect("valid regex")
});

const LINKS: LinkPolicy = LinkPolicy {
    allowed_prefixes: &["/"],
    excluded_suffixes: &["/print/", "/feed/"],
    require_trailing_slash: true,
};

pub struct SkinnyTaste {
    url_root: String,
    fetcher: HttpFetcher,
}

impl SkinnyTaste {
    pub fn new(url_root: impl Into<String>, fetcher: HttpFetcher) -> Self {
        Self {
            url_root: url_root.into(),
            fetcher,
        }
    }
}

#[async_trait]
impl RecipeSource for SkinnyTaste {
    fn kind(&self) -> SourceKind {
        SourceKind::SkinnyTaste
    }

    fn url_root(&self) -> &str {
        &self.url_root
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        fetch_with(self, &self.fetcher, url).await
    }

    fn filter_links(&self, html: &str) -> Vec<String> {
        collect_links(html, &self.url_root, &LINKS)
    }

    fn extract(&self, page: &RawPage) -> Result<Recipe, ExtractFailure> {
        let body = document_body(page, &RECIPE_URL)?;
        let section = ingredient_section(body, page)?;
        ingredient_list(page, section, &ITEM_END, &QUANTITY)
    }
}

/// Markup following the ingredient heading. The heading is not always there,
/// so weaker markers are tried in a fixed order.
fn ingredient_section<'a>(body: &'a str, page: &RawPage) -> Result<&'a str, ExtractFailure> {
    let mut pieces = split_non_empty(body, "ngredients:");
    if pieces.len() < 2 {
        // calories are listed right before the ingredients on some pages
        let by_calories = split_non_empty(body, "alories:");
        if by_calories.len() >= 2 && by_calories[1].contains("</ul>") {
            pieces = by_calories;
        }
    }
    if pieces.len() < 2 {
        let by_servings = split_non_empty(body, "ervings:");
        if by_servings.len() >= 3 && by_servings[2].contains("</ul>") {
            pieces = by_servings[1..].to_vec();
        } else if by_servings.len() >= 2 && by_servings[1].contains("</ul>") {
            pieces = by_servings;
        }
    }
    if pieces.len() < 2 {
        let by_servings_tag = split_non_empty(body, "ervings<");
        if by_servings_tag.len() >= 2 && by_servings_tag[1].contains("</ul>") {
            pieces = by_servings_tag;
        }
    }
    if pieces.len() < 2 {
        let hint = if title_starts_with_number(page) {
            MissingHint::NumberedTitle
        } else {
            MissingHint::None
        };
        return Err(ExtractFailure::IngredientsMissing(hint));
    }
    if pieces.len() > 2 {
        let by_heading_tag = split_non_empty(body, "ngredients:<");
        if by_heading_tag.len() == 2 {
            pieces = by_heading_tag;
        }
    }
    if pieces.len() > 2 {
        return Err(ExtractFailure::MultipleIngredientSections);
    }
    Ok(pieces[1])
}
