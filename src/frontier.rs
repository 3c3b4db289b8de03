//! Per-source crawl frontier.
//!
//! The frontier tracks which URLs of one site have been seen, which still need
//! downloading and which failed and should be tried again later. It is owned by
//! exactly one crawl loop; `download_next` takes `&mut self`, so nothing can
//! observe a half-updated frontier.

use crate::error::{CrawlError, StoreError};
use crate::model::RawPage;
use crate::sources::RecipeSource;
use crate::store::PageStore;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

/// Strip the query string and fragment; an empty result becomes `/`.
///
/// `"/recipes/x?ref=1#top"` normalizes to `"/recipes/x"`.
pub fn normalize_url(url: &str) -> String {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let trimmed = &url[..end];
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

pub struct Frontier<S: PageStore> {
    source: String,
    url_root: String,
    discovered: HashSet<String>,
    to_download: HashSet<String>,
    /// url -> storage key
    downloaded: HashMap<String, String>,
    retry_later: HashSet<String>,
    store: S,
}

impl<S: PageStore> Frontier<S> {
    /// Rebuild the frontier from everything `store` holds. `seed` (usually
    /// `/`) is treated as discovered so an empty store has somewhere to start.
    pub fn rebuild(
        source: impl Into<String>,
        url_root: impl Into<String>,
        seed: &str,
        store: S,
    ) -> Result<Self, StoreError> {
        let source = source.into();
        let mut discovered = HashSet::new();
        let mut downloaded = HashMap::new();

        discovered.insert(normalize_url(seed));
        for stored in store.load_all()? {
            let url = normalize_url(&stored.page.url);
            discovered.insert(url.clone());
            discovered.extend(stored.page.referenced_urls.iter().map(|u| normalize_url(u)));
            downloaded.insert(url, stored.key);
        }

        let to_download = discovered
            .iter()
            .filter(|url| !downloaded.contains_key(*url))
            .cloned()
            .collect();

        debug!(
            "{}: rebuilt frontier with {} downloaded of {} discovered",
            source,
            downloaded.len(),
            discovered.len()
        );

        Ok(Self {
            source,
            url_root: url_root.into(),
            discovered,
            to_download,
            downloaded,
            retry_later: HashSet::new(),
            store,
        })
    }

    /// Nothing left to download, even after giving failed URLs another go.
    pub fn is_finished(&self) -> bool {
        self.to_download.is_empty() && self.retry_later.is_empty()
    }

    /// Download one page, record its links and persist it.
    ///
    /// Returns `Ok(None)` once the frontier is finished. On failure the URL
    /// has been moved to the retry set; the caller decides whether to log,
    /// back off or stop.
    pub async fn download_next<R>(&mut self, source: &R) -> Result<Option<RawPage>, CrawlError>
    where
        R: RecipeSource + ?Sized,
    {
        if self.to_download.is_empty() {
            self.to_download.extend(
                self.retry_later
                    .drain()
                    .filter(|u| !self.downloaded.contains_key(u)),
            );
        }
        let Some(url) = self.to_download.iter().next().cloned() else {
            return Ok(None);
        };
        self.to_download.remove(&url);

        info!(
            "{}: downloaded {} out of {} discovered pages, fetching {}",
            self.source,
            self.downloaded.len(),
            self.discovered.len(),
            url
        );

        let fetched = match source.fetch(&url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Problem when downloading {} (will try later): {}", url, e);
                self.retry_later.insert(url.clone());
                return Err(CrawlError::Fetch { url, source: e });
            }
        };

        let referenced_urls: Vec<String> = fetched.links.iter().map(|u| normalize_url(u)).collect();
        let page = RawPage {
            url: url.clone(),
            url_root: self.url_root.clone(),
            source: self.source.clone(),
            raw_text: fetched.html,
            fetched_at: Utc::now(),
            title: fetched.title,
            referenced_urls,
        };

        let key = match self.store.save(&page) {
            Ok(key) => key,
            Err(e) => {
                warn!("Could not store {} (will try later): {}", url, e);
                self.retry_later.insert(url.clone());
                return Err(CrawlError::Store { url, source: e });
            }
        };
        // a sibling may have re-queued a URL that is also waiting in the retry set
        self.retry_later.remove(&url);
        self.downloaded.insert(url, key);

        for link in &page.referenced_urls {
            self.discovered.insert(link.clone());
            if !self.downloaded.contains_key(link) {
                self.to_download.insert(link.clone());
            }
        }

        Ok(Some(page))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn discovered(&self) -> &HashSet<String> {
        &self.discovered
    }

    pub fn to_download(&self) -> &HashSet<String> {
        &self.to_download
    }

    pub fn downloaded(&self) -> &HashMap<String, String> {
        &self.downloaded
    }

    pub fn retry_later(&self) -> &HashSet<String> {
        &self.retry_later
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
