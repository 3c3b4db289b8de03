//! Heuristic ingredient-list extraction shared by the per-source extractors.
//!
//! Recipe sites in scope do not publish structured data, so the ingredient
//! list is cut out of the raw markup by splitting on marker strings. Each
//! source decides how to find the start of its ingredient section; from there
//! on the steps are common and live here.

use crate::model::{Ingredient, IngredientName, PageInfo, RawPage, Recipe};
use html_escape::decode_html_entities;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static BODY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body[^>]*>").expect("valid regex"));
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<li[^>]*>").expect("valid regex"));
static ALLOWED_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?(a|p|b|u|div|span|img)\s?[^>]*>").expect("valid regex"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Entries longer than this many whitespace-separated fields read like
/// directions, not ingredients.
const DIRECTION_WORD_THRESHOLD: usize = 10;

/// Why a page did not yield a recipe. The `Display` text is the key used when
/// failures are counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ExtractFailure {
    #[error("not a recipe web page")]
    NotARecipeUrl,
    #[error("body tag not found")]
    BodyMissing,
    #[error("more than one body tag found")]
    MultipleBodies,
    #[error("{0}")]
    IngredientsMissing(MissingHint),
    #[error("more than one ingredient section found")]
    MultipleIngredientSections,
    #[error("end-of-list not found")]
    EndOfListMissing,
    #[error("not a single ingredient found")]
    NoListItems,
    #[error("less than two ingredients")]
    TooFewIngredients,
}

/// What the page looked like when no ingredient section was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissingHint {
    None,
    /// title starts with a digit, usually a "10 best ..." roundup
    NumberedTitle,
    AllAboutPage,
    AboutPage,
    ArePage,
    IsPage,
}

impl fmt::Display for MissingHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self {
            MissingHint::None => "",
            MissingHint::NumberedTitle => ", but the title starts with numbers",
            MissingHint::AllAboutPage => ", but this is an 'all about' web page",
            MissingHint::AboutPage => ", but this is an 'about' web page",
            MissingHint::ArePage => ", but this is an 'are' web page",
            MissingHint::IsPage => ", but this is an 'is' web page",
        };
        write!(f, "didn't find ingredients{suffix}")
    }
}

/// Split on `marker`, dropping empty pieces.
pub(crate) fn split_non_empty<'a>(text: &'a str, marker: &str) -> Vec<&'a str> {
    text.split(marker).filter(|piece| !piece.is_empty()).collect()
}

pub(crate) fn title_starts_with_number(page: &RawPage) -> bool {
    page.title.starts_with(|c: char| c.is_ascii_digit())
}

/// Check the URL shape and return the markup after the single `<body>` tag.
pub(crate) fn document_body<'a>(
    page: &'a RawPage,
    recipe_url: &Regex,
) -> Result<&'a str, ExtractFailure> {
    if !recipe_url.is_match(&page.url) {
        return Err(ExtractFailure::NotARecipeUrl);
    }
    let pieces: Vec<&str> = BODY_TAG.split(&page.raw_text).collect();
    match pieces.len() {
        0 | 1 => Err(ExtractFailure::BodyMissing),
        2 => Ok(pieces[1]),
        _ => Err(ExtractFailure::MultipleBodies),
    }
}

/// Turn the markup that follows an ingredient-section marker into a recipe.
pub(crate) fn ingredient_list(
    page: &RawPage,
    section: &str,
    item_end: &Regex,
    quantity: &Regex,
) -> Result<Recipe, ExtractFailure> {
    let parts = if section.contains("irections:") {
        split_non_empty(section, "irections:")
    } else {
        split_non_empty(section, "</ul>")
    };
    if parts.len() < 2 {
        return Err(ExtractFailure::EndOfListMissing);
    }

    // the list is sometimes split across two <ul> elements
    let window = if looks_like_more_ingredients(parts[1], &LIST_ITEM, item_end) {
        Cow::Owned(format!("{}</ul>{}", parts[0], parts[1]))
    } else {
        Cow::Borrowed(parts[0])
    };

    let mut starts = LIST_ITEM.find_iter(&window).peekable();
    if starts.peek().is_none() {
        return Err(ExtractFailure::NoListItems);
    }

    let mut ingredients = Vec::new();
    for start in starts {
        match list_entry(&window, start.end(), item_end) {
            Some(entry) => ingredients.push(parse_ingredient(&entry, quantity)),
            None => break,
        }
    }
    if ingredients.len() < 2 {
        return Err(ExtractFailure::TooFewIngredients);
    }

    let mut info = PageInfo::from(page);
    info.title = clean_text(&info.title);
    Ok(Recipe {
        ingredients,
        page: info,
    })
}

/// True when the first list item of `text` is a usable entry and none of the
/// items that follow it read like directions.
pub(crate) fn looks_like_more_ingredients(text: &str, item_start: &Regex, item_end: &Regex) -> bool {
    let mut starts = item_start.find_iter(text);
    let Some(first) = starts.next() else {
        return false;
    };
    let Some(first_entry) = list_entry(text, first.end(), item_end) else {
        return false;
    };
    if first_entry.is_empty() {
        return false;
    }

    let mut entries = vec![first_entry];
    for start in starts {
        match list_entry(text, start.end(), item_end) {
            Some(entry) => entries.push(entry),
            None => break,
        }
    }
    !entries
        .iter()
        .any(|e| e.split([' ', '\t', '\n']).count() > DIRECTION_WORD_THRESHOLD)
}

/// The cleaned text of the list item that starts at byte `start`, or `None`
/// when it has no end marker or carries markup we do not understand.
pub(crate) fn list_entry(text: &str, start: usize, item_end: &Regex) -> Option<String> {
    let end = item_end.find_at(text, start)?;
    let found = &text[start..end.start()];
    let stripped = ALLOWED_TAGS.replace_all(found, "");
    let flattened = stripped.trim().replace('\n', " ").replace('\r', "");
    let entry = fix_mis_encoding(flattened.trim_end_matches([';', ',']));
    if ANY_TAG.is_match(&entry) {
        return None;
    }
    Some(decode_entities(&entry).trim().to_string())
}

/// Split an entry into quantity, name and detail.
///
/// `"2 cups chopped kale, washed"` gives quantity `"2 cups"`, name
/// `"chopped kale"` and detail `"washed"`.
pub fn parse_ingredient(entry: &str, quantity: &Regex) -> Ingredient {
    let declaration = entry.trim();
    let (amount, rest) = match quantity.find(declaration) {
        Some(m) => (m.as_str().trim(), declaration[m.end()..].trim()),
        None => ("", declaration),
    };

    let (name, detail) = match rest.find([',', '(']) {
        Some(at) => (
            &rest[..at],
            rest[at..].trim_matches([',', '\t', ' ']).trim(),
        ),
        None => (rest, ""),
    };

    Ingredient {
        declaration: declaration.to_string(),
        name: IngredientName::new(clean_text(name)),
        quantity: amount.to_string(),
        detail: detail.to_string(),
    }
}

/// Decode entities and the mis-encoded accents seen in titles and names.
pub fn clean_text(text: &str) -> String {
    decode_entities(text).replace("Ã©", "e")
}

fn decode_entities(text: &str) -> String {
    decode_html_entities(text).replace('\u{a0}', " ")
}

fn fix_mis_encoding(text: &str) -> String {
    text.replace("Â½", "1/2")
        .replace("Â⅓", "1/3")
        .replace("Â⅔", "2/3")
        .replace("Â¼", "1/4")
        .replace('Â', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    static END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</li>").unwrap());
    static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^([0-9/]+\sto\s)?([0-9/\- ]+|half|one|two)?(\s?(cups?|tbsps?|tsps?|cloves?|lbs?))?(\s?of)?")
            .unwrap()
    });

    #[test]
    fn test_parse_ingredient_quantity_name_detail() {
        let i = parse_ingredient("2 cups chopped kale, washed", &QUANTITY);
        assert_eq!(i.quantity, "2 cups");
        assert_eq!(i.name.as_str(), "chopped kale");
        assert_eq!(i.detail, "washed");
        assert_eq!(i.declaration, "2 cups chopped kale, washed");
    }

    #[test]
    fn test_parse_ingredient_parenthesis_before_comma() {
        let i = parse_ingredient("1 to 2 cloves garlic (minced), optional", &QUANTITY);
        assert_eq!(i.quantity, "1 to 2 cloves");
        assert_eq!(i.name.as_str(), "garlic");
        assert_eq!(i.detail, "(minced), optional");
    }

    #[test]
    fn test_parse_ingredient_without_quantity_or_detail() {
        let i = parse_ingredient("salt", &QUANTITY);
        assert_eq!(i.quantity, "");
        assert_eq!(i.name.as_str(), "salt");
        assert_eq!(i.detail, "");
    }

    #[test]
    fn test_list_entry_strips_inline_tags_and_entities() {
        let text = r#"<li><a href="/kale/">kale</a>&nbsp;leaves;</li>"#;
        let start = LIST_ITEM.find(text).unwrap().end();
        assert_eq!(list_entry(text, start, &END).as_deref(), Some("kale leaves"));
    }

    #[test]
    fn test_list_entry_rejects_unknown_tags() {
        let text = "<li><strong>Note:</strong> serve hot</li>";
        let start = LIST_ITEM.find(text).unwrap().end();
        assert_eq!(list_entry(text, start, &END), None);
    }

    #[test]
    fn test_list_entry_fixes_mis_encoded_fractions() {
        let text = "<li>Â½ cup milk</li>";
        let start = LIST_ITEM.find(text).unwrap().end();
        assert_eq!(list_entry(text, start, &END).as_deref(), Some("1/2 cup milk"));
    }

    #[test]
    fn test_looks_like_more_ingredients() {
        let more = "<ul><li>1 cup rice</li><li>2 eggs</li></ul>";
        assert!(looks_like_more_ingredients(more, &LIST_ITEM, &END));

        let directions = "<ol><li>1 cup rice</li><li>Bring the water to a boil and then add the rice and stir for a while</li></ol>";
        assert!(!looks_like_more_ingredients(directions, &LIST_ITEM, &END));

        assert!(!looks_like_more_ingredients("<p>Enjoy!</p>", &LIST_ITEM, &END));
        assert!(!looks_like_more_ingredients("<li></li><li>salt</li>", &LIST_ITEM, &END));
    }

    #[test]
    fn test_split_non_empty_drops_empty_pieces() {
        assert_eq!(split_non_empty("a::b::", "::"), vec!["a", "b"]);
        assert_eq!(split_non_empty("::", "::").len(), 0);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("Mac &amp; Cheese"), "Mac & Cheese");
        assert_eq!(clean_text("Caf&eacute; Ã©clair"), "Café eclair");
        assert_eq!(clean_text("a&nbsp;b"), "a b");
    }

    #[test]
    fn test_missing_hint_messages() {
        assert_eq!(
            ExtractFailure::IngredientsMissing(MissingHint::None).to_string(),
            "didn't find ingredients"
        );
        assert_eq!(
            ExtractFailure::IngredientsMissing(MissingHint::NumberedTitle).to_string(),
            "didn't find ingredients, but the title starts with numbers"
        );
    }
}
