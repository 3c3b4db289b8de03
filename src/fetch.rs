use crate::error::FetchError;
use log::debug;
use reqwest::{Client, Url};
use std::time::Duration;

/// A page as returned by a source's fetch: title, markup and the outbound
/// links that survived the source's link filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedPage {
    pub title: String,
    pub html: String,
    pub links: Vec<String>,
}

/// Thin wrapper around a `reqwest::Client` that fetches site-relative paths
/// under one root URL.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>, user_agent: &str) -> Result<Self, FetchError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch `path` relative to `url_root` and return the body text.
    pub async fn fetch(&self, url_root: &str, path: &str) -> Result<String, FetchError> {
        let url = join_url(url_root, path)?;
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

pub(crate) fn join_url(url_root: &str, path: &str) -> Result<Url, FetchError> {
    let base = Url::parse(url_root).map_err(|e| FetchError::InvalidUrl(format!("{url_root}: {e}")))?;
    base.join(path)
        .map_err(|e| FetchError::InvalidUrl(format!("{path}: {e}")))
}
