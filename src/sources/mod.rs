use crate::error::{FetchError, RankerError};
use crate::extract::ExtractFailure;
use crate::fetch::{FetchedPage, HttpFetcher};
use crate::frontier::normalize_url;
use crate::model::{RawPage, Recipe};
use async_trait::async_trait;
use reqwest::Url;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

mod paleo_leap;
mod skinny_taste;

pub use paleo_leap::PaleoLeap;
pub use skinny_taste::SkinnyTaste;

/// Everything that differs from one recipe site to the next.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Root URL that site-relative page URLs are resolved against
    fn url_root(&self) -> &str;

    /// Download one page and return its title, markup and filtered links.
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;

    /// Same-site links from `html` that may lead to recipes, normalized.
    fn filter_links(&self, html: &str) -> Vec<String>;

    /// Cut the ingredient list out of a downloaded page.
    fn extract(&self, page: &RawPage) -> Result<Recipe, ExtractFailure>;

    fn name(&self) -> &'static str {
        self.kind().name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    SkinnyTaste,
    PaleoLeap,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::SkinnyTaste, SourceKind::PaleoLeap];

    /// Name used in page records and as the store subdirectory
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::SkinnyTaste => "SkinnyTaste",
            SourceKind::PaleoLeap => "PaleoLeap",
        }
    }

    pub fn default_url_root(&self) -> &'static str {
        match self {
            SourceKind::SkinnyTaste => "http://skinnytaste.com",
            SourceKind::PaleoLeap => "http://paleoleap.com",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceKind {
    type Err = RankerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| RankerError::UnknownSource(s.to_string()))
    }
}

/// Build the source implementation for `kind`, rooted at `url_root`.
pub fn build_source(
    kind: SourceKind,
    url_root: impl Into<String>,
    fetcher: HttpFetcher,
) -> Box<dyn RecipeSource> {
    match kind {
        SourceKind::SkinnyTaste => Box::new(SkinnyTaste::new(url_root, fetcher)),
        SourceKind::PaleoLeap => Box::new(PaleoLeap::new(url_root, fetcher)),
    }
}

/// Which outbound links a source follows.
pub(crate) struct LinkPolicy {
    /// a link is kept if its path starts with one of these
    pub allowed_prefixes: &'static [&'static str],
    pub excluded_suffixes: &'static [&'static str],
    pub require_trailing_slash: bool,
}

pub(crate) async fn fetch_with(
    source: &dyn RecipeSource,
    fetcher: &HttpFetcher,
    url: &str,
) -> Result<FetchedPage, FetchError> {
    let html = fetcher.fetch(source.url_root(), url).await?;
    Ok(FetchedPage {
        title: page_title(&html),
        links: source.filter_links(&html),
        html,
    })
}

pub(crate) fn page_title(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Resolve every `href` against `url_root` and keep same-host links the policy
/// allows, normalized and without duplicates, in document order.
pub(crate) fn collect_links(html: &str, url_root: &str, policy: &LinkPolicy) -> Vec<String> {
    let Ok(base) = Url::parse(url_root) else {
        return Vec::new();
    };
    let Some(host) = base.host_str().map(strip_www) else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for href in document.select(&selector).filter_map(|a| a.value().attr("href")) {
        let Ok(target) = base.join(href.trim()) else {
            continue;
        };
        if !matches!(target.scheme(), "http" | "https") {
            continue;
        }
        if target.host_str().map(strip_www) != Some(host) {
            continue;
        }
        let path = normalize_url(target.path());
        if policy.require_trailing_slash && !path.ends_with('/') {
            continue;
        }
        if !policy.allowed_prefixes.iter().any(|p| path.starts_with(p)) {
            continue;
        }
        if policy.excluded_suffixes.iter().any(|s| path.ends_with(s)) {
            continue;
        }
        if seen.insert(path.clone()) {
            links.push(path);
        }
    }
    links
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: LinkPolicy = LinkPolicy {
        allowed_prefixes: &["/recipes/", "/everyday-meals/"],
        excluded_suffixes: &["/print/"],
        require_trailing_slash: false,
    };

    #[test]
    fn test_source_kind_from_str() {
        assert_eq!("skinnytaste".parse::<SourceKind>().unwrap(), SourceKind::SkinnyTaste);
        assert_eq!("PaleoLeap".parse::<SourceKind>().unwrap(), SourceKind::PaleoLeap);
        assert!("kraft".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_collect_links_filters_by_host_and_prefix() {
        let html = r#"
            <a href="/recipes/chili/?utm=feed#comments">chili</a>
            <a href="http://www.example.com/recipes/stew">stew</a>
            <a href="https://example.com/everyday-meals/tacos/">tacos</a>
            <a href="http://other.com/recipes/pie/">elsewhere</a>
            <a href="/about/">about</a>
            <a href="/recipes/chili/print/">print</a>
            <a href="mailto:me@example.com">mail</a>
            <a href="/recipes/chili/">dupe</a>
        "#;
        let links = collect_links(html, "http://www.example.com", &POLICY);
        assert_eq!(
            links,
            vec!["/recipes/chili/", "/recipes/stew", "/everyday-meals/tacos/"]
        );
    }

    #[test]
    fn test_page_title() {
        assert_eq!(
            page_title("<html><head><title> Turkey Chili | Skinnytaste </title></head></html>"),
            "Turkey Chili | Skinnytaste"
        );
        assert_eq!(page_title("<html><body>no title</body></html>"), "");
    }
}
