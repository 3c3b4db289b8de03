//! Crawl driver: one paced, sequential loop per source, sources side by side.

use crate::config::Settings;
use crate::error::RankerError;
use crate::fetch::HttpFetcher;
use crate::frontier::Frontier;
use crate::sources::{build_source, RecipeSource, SourceKind};
use crate::store::{FsPageStore, PageStore};
use log::{error, info, warn};
use rand::Rng;
use std::time::Duration;

/// Random delay between two fetches from the same site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Pacing {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        let (lo, hi) = if min_ms <= max_ms { (min_ms, max_ms) } else { (max_ms, min_ms) };
        Self {
            min: Duration::from_millis(lo),
            max: Duration::from_millis(hi),
        }
    }

    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub source: String,
    pub downloaded: usize,
    pub failed: usize,
    /// the frontier ran dry, as opposed to hitting the page limit
    pub finished: bool,
}

/// Drive `frontier` until it is finished or `max_pages` pages were stored.
/// Failed steps are logged and retried later; they never stop the loop.
pub async fn crawl_source<S: PageStore>(
    source: &dyn RecipeSource,
    frontier: &mut Frontier<S>,
    pacing: Pacing,
    max_pages: Option<usize>,
) -> CrawlSummary {
    let mut summary = CrawlSummary {
        source: source.name().to_string(),
        ..Default::default()
    };

    while !frontier.is_finished() {
        if max_pages.is_some_and(|max| summary.downloaded >= max) {
            info!("{}: reached the limit of {} pages", summary.source, summary.downloaded);
            break;
        }
        match frontier.download_next(source).await {
            Ok(Some(page)) => {
                summary.downloaded += 1;
                info!("{}: stored {}", summary.source, page);
            }
            Ok(None) => break,
            Err(e) => {
                summary.failed += 1;
                warn!("{}: {}", summary.source, e);
            }
        }
        if !frontier.is_finished() {
            tokio::time::sleep(pacing.next_delay()).await;
        }
    }

    summary.finished = frontier.is_finished();
    info!(
        "{}: crawl stopped after {} downloads and {} failures",
        summary.source, summary.downloaded, summary.failed
    );
    summary
}

/// Crawl every source in `kinds` concurrently, each in its own task with its
/// own frontier and store directory.
pub async fn crawl_all(settings: &Settings, kinds: &[SourceKind]) -> Result<Vec<CrawlSummary>, RankerError> {
    let fetcher = HttpFetcher::new(
        Some(Duration::from_secs(settings.crawl.timeout_secs)),
        &settings.crawl.user_agent,
    )?;
    let pacing = Pacing::new(settings.crawl.min_delay_ms, settings.crawl.max_delay_ms);
    let max_pages = settings.crawl.max_pages;

    let mut handles = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let source = build_source(kind, kind.default_url_root(), fetcher.clone());
        let store = FsPageStore::open(&settings.spider_path, kind.name())?;
        let mut frontier = Frontier::rebuild(kind.name(), source.url_root(), "/", store)?;
        handles.push(tokio::spawn(async move {
            crawl_source(source.as_ref(), &mut frontier, pacing, max_pages).await
        }));
    }

    let mut summaries = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(summary) => summaries.push(summary),
            Err(e) => error!("crawl task failed: {}", e),
        }
    }
    Ok(summaries)
}
