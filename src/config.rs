use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Tab-separated classification rules (name, pattern, priority)
    #[serde(default = "default_classification_file")]
    pub classification_file: PathBuf,
    /// Tab-separated type hierarchy (class, type, group)
    #[serde(default = "default_types_file")]
    pub types_file: PathBuf,
    /// Root directory of the page store; every source gets a subdirectory
    #[serde(default = "default_spider_path")]
    pub spider_path: PathBuf,
    /// Sources to crawl and ingest, by name
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    /// Crawl pacing and HTTP settings
    #[serde(default)]
    pub crawl: CrawlConfig,
    /// Ranking defaults
    #[serde(default)]
    pub ranking: RankingConfig,
}

/// Configuration for the crawl loops
#[derive(Debug, Deserialize, Clone)]
pub struct CrawlConfig {
    /// Minimum delay between two fetches of the same source, in milliseconds
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    /// Maximum delay between two fetches of the same source, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Stop each source after this many successful downloads
    #[serde(default)]
    pub max_pages: Option<usize>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            max_pages: None,
        }
    }
}

/// Defaults applied when a ranking query leaves a parameter out
#[derive(Debug, Deserialize, Clone)]
pub struct RankingConfig {
    #[serde(default = "default_strictness")]
    pub strictness: f64,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            strictness: default_strictness(),
            limit: default_limit(),
        }
    }
}

// Default value functions
fn default_classification_file() -> PathBuf {
    PathBuf::from("classification.tsv")
}

fn default_types_file() -> PathBuf {
    PathBuf::from("types.by.sensitivity.tsv")
}

fn default_spider_path() -> PathBuf {
    PathBuf::from("pages")
}

fn default_sources() -> Vec<String> {
    vec!["SkinnyTaste".to_string(), "PaleoLeap".to_string()]
}

fn default_min_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; RecipeRankerBot/0.3)".to_string()
}

fn default_strictness() -> f64 {
    1.0
}

fn default_limit() -> usize {
    15
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPES__ prefix
    /// 2. recipe-ranker.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPES__CRAWL__MAX_DELAY_MS
    pub fn load() -> Result<Self, ConfigError> {
        load_config(None)
    }
}

/// Load configuration, optionally from an explicit file instead of
/// `recipe-ranker.toml`. An explicit file must exist.
pub fn load_config(file: Option<&str>) -> Result<Settings, ConfigError> {
    let file_source = match file {
        Some(path) => File::with_name(path).required(true),
        None => File::with_name("recipe-ranker").required(false),
    };
    let settings = Config::builder()
        .add_source(file_source)
        // Use double underscore for nested: RECIPES__CRAWL__MAX_PAGES
        .add_source(
            Environment::with_prefix("RECIPES")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("sources"),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        assert_eq!(default_min_delay_ms(), 1000);
        assert_eq!(default_max_delay_ms(), 5000);
        assert_eq!(default_timeout(), 30);
        assert_eq!(default_strictness(), 1.0);
        assert_eq!(default_limit(), 15);
        assert_eq!(default_sources(), vec!["SkinnyTaste", "PaleoLeap"]);
    }

    #[test]
    fn test_crawl_config_default() {
        let crawl = CrawlConfig::default();
        assert_eq!(crawl.min_delay_ms, 1000);
        assert_eq!(crawl.max_delay_ms, 5000);
        assert!(crawl.max_pages.is_none());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
spider_path = "/var/spider"
sources = ["PaleoLeap"]

[crawl]
max_pages = 40
min_delay_ms = 10

[ranking]
limit = 3
"#
        )
        .unwrap();

        let settings = load_config(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(settings.spider_path, PathBuf::from("/var/spider"));
        assert_eq!(settings.sources, vec!["PaleoLeap"]);
        assert_eq!(settings.crawl.max_pages, Some(40));
        assert_eq!(settings.crawl.min_delay_ms, 10);
        assert_eq!(settings.crawl.max_delay_ms, 5000);
        assert_eq!(settings.ranking.limit, 3);
        assert_eq!(settings.ranking.strictness, 1.0);
        assert_eq!(settings.types_file, default_types_file());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(load_config(Some("/definitely/not/here/recipe-ranker")).is_err());
    }
}
