use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching a page from a recipe site
#[derive(Error, Debug)]
pub enum FetchError {
    /// The HTTP request itself failed (connection, timeout, body decoding)
    #[error("Failed to fetch URL: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },

    /// The page URL could not be joined onto the source root
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised by the on-disk page store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed page record {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of a single frontier step. The URL has already been queued for retry
/// when this is returned.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Fetch of {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Could not persist {url}: {source}")]
    Store {
        url: String,
        #[source]
        source: StoreError,
    },
}

/// Fatal errors while loading the classification rules or the type hierarchy
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("in {path} at line #{line}: expected {expected} columns, found {found}")]
    ColumnCount {
        path: PathBuf,
        line: usize,
        expected: &'static str,
        found: usize,
    },

    #[error("in {path} at line #{line}: priority '{value}' is not an integer")]
    InvalidPriority {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("in {path} at line #{line}: invalid pattern for class '{name}': {source}")]
    InvalidPattern {
        path: PathBuf,
        line: usize,
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("in {path} at line #{line}: duplicate declaration of class '{name}'")]
    DuplicateClass {
        path: PathBuf,
        line: usize,
        name: String,
    },

    #[error("in {path} at line #{line}: type '{type_name}' already belongs to group '{existing}', but class '{class}' puts it into group '{group}'")]
    TypeGroupConflict {
        path: PathBuf,
        line: usize,
        type_name: String,
        existing: String,
        class: String,
        group: String,
    },

    #[error("can't find an ingredient type for class(es) {}", .classes.join(", "))]
    MissingTypes { classes: Vec<String> },
}

/// Invalid ranking query parameters
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("limit {0} is not a positive integer")]
    InvalidLimit(usize),

    #[error("strictness {0} is not a finite number")]
    InvalidStrictness(f64),

    #[error("preference '{name}' has a score of {value}, which is not an integer")]
    InvalidPreference { name: String, value: String },

    #[error("preferences are not a JSON object: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Top-level error for the ranking pipeline
#[derive(Error, Debug)]
pub enum RankerError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crawl(#[from] CrawlError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Unknown source '{0}'")]
    UnknownSource(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}
