//! Crawl recipe sites, pull the ingredient lists out of their pages, classify
//! every ingredient and rank the recipes against a user's taste.
//!
//! ```no_run
//! use recipe_ranker::{Catalog, PreferenceVector, RankingQuery};
//!
//! # fn run(recipes: Vec<recipe_ranker::model::ClassifiedRecipe>) -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::load("classification.tsv", "types.by.sensitivity.tsv")?;
//! let prefs = PreferenceVector::from_json(r#"{"greens": 2, "pork": -3}"#)?;
//! let query = RankingQuery::new(prefs, 1.0, 10)?;
//! for result in recipe_ranker::rank(&recipes, catalog.types(), &query) {
//!     println!("{:.3} {}", result.score, result.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod frontier;
pub mod ingest;
pub mod model;
pub mod rank;
pub mod sources;
pub mod store;

pub use classify::{Catalog, ClassificationRule, RuleSet, TypeHierarchy};
pub use config::{load_config, Settings};
pub use crawl::{crawl_all, crawl_source, CrawlSummary, Pacing};
pub use error::{CrawlError, FetchError, LoadError, QueryError, RankerError, StoreError};
pub use extract::{ExtractFailure, MissingHint};
pub use fetch::{FetchedPage, HttpFetcher};
pub use frontier::{normalize_url, Frontier};
pub use ingest::{IngestReport, Ingestion};
pub use rank::{rank, score_recipe, PreferenceVector, RankedResult, RankingQuery};
pub use sources::{build_source, RecipeSource, SourceKind};
pub use store::{FsPageStore, PageStore};

use std::path::Path;

/// Extract and classify every page stored for `kinds` under the configured
/// spider path. With `ingredient_log`, one line per interpreted ingredient is
/// written there as well.
pub fn ingest_all(
    settings: &Settings,
    catalog: &Catalog,
    kinds: &[SourceKind],
    ingredient_log: Option<&Path>,
) -> Result<(Vec<model::ClassifiedRecipe>, IngestReport), RankerError> {
    // extraction never touches the network; the fetcher only completes the source
    let fetcher = HttpFetcher::new(None, &settings.crawl.user_agent)?;
    let mut ingestion = Ingestion::new(catalog);
    if let Some(path) = ingredient_log {
        let file = std::fs::File::create(path)?;
        ingestion = ingestion.with_ingredient_log(std::io::BufWriter::new(file))?;
    }
    for &kind in kinds {
        let source = build_source(kind, kind.default_url_root(), fetcher.clone());
        let store = FsPageStore::open(&settings.spider_path, kind.name())?;
        ingestion.ingest_store(source.as_ref(), &store)?;
    }
    let (recipes, report) = ingestion.finish()?;
    report.log_summary();
    Ok((recipes, report))
}

/// Resolve source names from configuration or the command line.
pub fn parse_sources<S: AsRef<str>>(names: &[S]) -> Result<Vec<SourceKind>, RankerError> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}
