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
static ITEM_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</li>").expect("valid regex"));
static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^",
        r"([0-9/â„]+\sto\s)?",
        r"(Â½|[0-9/\- â„]+|0\.5|0\.25|0\.75|1\.5|half|one third|one quarter|one|two|three|four|five|six|seven|eight|nine|ten|a few)?",
        r"(\s?(lbs?|pounds?|grams?|quarts?|oz|ounces?|cups?|tsps?|tbsp?|tbsps?|half|halves|thirds?|quarters?|pinch(es)?|cloves?|links?|sprigs?|tea\s?spoons?|table\s?spoons?|inch(es)?)\.?)?",
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

pub struct PaleoLeap {
    url_root: String,
    fetcher: HttpFetcher,
}

impl PaleoLeap {
    pub fn new(url_root: impl Into<String>, fetcher: HttpFetcher) -> Self {
        Self {
            url_root: url_root.into(),
            fetcher,
        }
    }
}

#[async_trait]
impl RecipeSource for PaleoLeap {
    fn kind(&self) -> SourceKind {
        SourceKind::PaleoLeap
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

fn ingredient_section<'a>(body: &'a str, page: &RawPage) -> Result<&'a str, ExtractFailure> {
    let mut pieces = split_non_empty(body, ">Ingredients<");
    if pieces.len() < 2 {
        return Err(ExtractFailure::IngredientsMissing(missing_hint(page)));
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

/// Articles share the recipe URL shape; their slugs give them away.
fn missing_hint(page: &RawPage) -> MissingHint {
    if title_starts_with_number(page) {
        MissingHint::NumberedTitle
    } else if page.url.starts_with("/all-about-") {
        MissingHint::AllAboutPage
    } else if page.url.starts_with("/about-") {
        MissingHint::AboutPage
    } else if page.url.starts_with("/are-") {
        MissingHint::ArePage
    } else if page.url.starts_with("/is-") {
        MissingHint::IsPage
    } else {
        MissingHint::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn page(url: &str, title: &str, body: &str) -> RawPage {
        RawPage {
            url: url.to_string(),
            url_root: "http://paleoleap.com".to_string(),
            source: "PaleoLeap".to_string(),
            raw_text: format!("<html><body>{body}</body></html>"),
            fetched_at: Utc::now(),
            title: title.to_string(),
            referenced_urls: vec![],
        }
    }

    fn source() -> PaleoLeap {
        PaleoLeap::new("http://paleoleap.com", HttpFetcher::new(None, "test").unwrap())
    }

    #[test]
    fn test_extracts_list_after_heading() {
        let body = concat!(
            "<h2>Ingredients</h2><ul>",
            "<li>2 lbs. beef chuck, cubed</li>",
            "<li>Â½ cup coconut milk</li>",
            "<li>3 carrots (peeled)</li>",
            "</ul><h2>Preparation</h2><ol><li>Brown the beef in a large pot over medium heat for about ten minutes.</li></ol>"
        );
        let recipe = source().extract(&page("/beef-stew/", "Beef Stew", body)).unwrap();
        assert_eq!(recipe.ingredients.len(), 3);
        assert_eq!(recipe.ingredients[0].quantity, "2 lbs.");
        assert_eq!(recipe.ingredients[0].name.as_str(), "beef chuck");
        assert_eq!(recipe.ingredients[0].detail, "cubed");
        assert_eq!(recipe.ingredients[1].quantity, "1/2 cup");
        assert_eq!(recipe.ingredients[2].name.as_str(), "carrots");
        assert_eq!(recipe.ingredients[2].detail, "(peeled)");
    }

    #[test]
    fn test_list_split_in_two_is_joined() {
        let body = concat!(
            "<h2>Ingredients</h2><ul><li>2 eggs</li><li>1 onion</li></ul>",
            "<p>For the sauce</p><ul><li>1 cup tomatoes</li><li>salt</li></ul>",
        );
        let recipe = source().extract(&page("/shakshuka/", "Shakshuka", body)).unwrap();
        let names: Vec<_> = recipe.ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["eggs", "onion", "tomatoes", "salt"]);
    }

    #[test]
    fn test_repeated_heading_needs_a_single_tagged_marker() {
        let body = concat!(
            "<h2>Ingredients</h2><p>Gather these first</p>",
            "<h2>Ingredients</h2><h3>Ingredients:</h3><ul><li>2 eggs</li><li>salt</li></ul><p>end</p>",
        );
        let recipe = source().extract(&page("/eggs/", "Eggs", body)).unwrap();
        let names: Vec<_> = recipe.ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["eggs", "salt"]);

        let body = concat!(
            "<h2>Ingredients</h2><p>Gather these first</p>",
            "<h2>Ingredients</h2><ul><li>2 eggs</li><li>salt</li></ul><p>end</p>",
        );
        let failure = source().extract(&page("/eggs/", "Eggs", body)).unwrap_err();
        assert_eq!(failure, ExtractFailure::MultipleIngredientSections);

        let body = concat!(
            "<h2>Ingredients</h2><h3>Ingredients:</h3><p>Gather these first</p>",
            "<h2>Ingredients</h2><h3>Ingredients:</h3><ul><li>2 eggs</li><li>salt</li></ul><p>end</p>",
        );
        let failure = source().extract(&page("/eggs/", "Eggs", body)).unwrap_err();
        assert_eq!(failure, ExtractFailure::MultipleIngredientSections);
    }

    #[test]
    fn test_article_pages_are_reported() {
        let failure = source()
            .extract(&page("/all-about-ghee/", "Ghee", "<p>ghee is great</p>"))
            .unwrap_err();
        assert_eq!(failure, ExtractFailure::IngredientsMissing(MissingHint::AllAboutPage));
        assert_eq!(
            failure.to_string(),
            "didn't find ingredients, but this is an 'all about' web page"
        );

        let failure = source()
            .extract(&page("/about-us/", "About", "<p>us</p>"))
            .unwrap_err();
        assert_eq!(failure, ExtractFailure::IngredientsMissing(MissingHint::AboutPage));
    }

    #[test]
    fn test_body_tag_problems() {
        let mut p = page("/stew/", "Stew", "");
        p.raw_text = "<html><p>no body</p></html>".to_string();
        assert_eq!(source().extract(&p).unwrap_err(), ExtractFailure::BodyMissing);

        p.raw_text = "<body>one</body><BODY>two</BODY>".to_string();
        assert_eq!(source().extract(&p).unwrap_err(), ExtractFailure::MultipleBodies);
    }

    #[test]
    fn test_end_of_list_and_single_item() {
        let body = "<h2>Ingredients</h2><ul><li>2 eggs</li>";
        let failure = source().extract(&page("/eggs/", "Eggs", body)).unwrap_err();
        assert_eq!(failure, ExtractFailure::EndOfListMissing);

        let body = "<h2>Ingredients</h2><p>just eggs</p></ul><p>end</p>";
        let failure = source().extract(&page("/eggs/", "Eggs", body)).unwrap_err();
        assert_eq!(failure, ExtractFailure::NoListItems);

        let body = "<h2>Ingredients</h2><ul><li>2 eggs</li></ul><p>end</p>";
        let failure = source().extract(&page("/eggs/", "Eggs", body)).unwrap_err();
        assert_eq!(failure, ExtractFailure::TooFewIngredients);
    }
}
