//! Where the catalog comes from.
//!
//! The host serves `<base>/data/index.json` and one raw text file per leaf.
//! Every request carries a per-request cache-busting parameter because the
//! host allows aggressive caching.

use chrono::Utc;
use futures::future::BoxFuture;
use reqwest::Url;

use crate::config::BrowserConfig;
use crate::error::FetchError;

/// Read-only access to the index and to leaf contents.
pub trait CatalogSource: Send + Sync + 'static {
    /// Raw bytes of the index document.
    fn fetch_index(&self) -> BoxFuture<'_, Result<Vec<u8>, FetchError>>;

    /// Text body of one leaf, addressed by its `Leaf.path`.
    fn fetch_content<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String, FetchError>>;
}

pub struct HttpCatalogSource {
    http_client: reqwest::Client,
    base_url: String,
    index_path: String,
    cache_bust_param: String,
    timeout_secs: u64,
}

impl HttpCatalogSource {
    pub fn new(config: &BrowserConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(config, http_client))
    }

    pub fn with_client(config: &BrowserConfig, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: config.normalized_base_url().to_string(),
            index_path: config.index_path.clone(),
            cache_bust_param: config.cache_bust_param.clone(),
            timeout_secs: config.timeout().as_secs(),
        }
    }

    pub fn index_url(&self, stamp: i64) -> Result<Url, FetchError> {
        self.resource_url(&self.index_path, stamp)
    }

    pub fn content_url(&self, leaf_path: &str, stamp: i64) -> Result<Url, FetchError> {
        self.resource_url(leaf_path, stamp)
    }

    fn resource_url(&self, relative: &str, stamp: i64) -> Result<Url, FetchError> {
        let raw = format!("{}/{}", self.base_url, relative.trim_start_matches('/'));
        let mut url = Url::parse(&raw)
            .map_err(|e| FetchError::Network(format!("invalid URL {}: {}", raw, e)))?;
        url.query_pairs_mut()
            .append_pair(&self.cache_bust_param, &stamp.to_string());
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, FetchError> {
        tracing::debug!("[SOURCE] GET {}", url);
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(FetchError::Http {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

fn cache_stamp() -> i64 {
    Utc::now().timestamp_millis()
}

impl CatalogSource for HttpCatalogSource {
    fn fetch_index(&self) -> BoxFuture<'_, Result<Vec<u8>, FetchError>> {
        Box::pin(async move {
            let url = self.index_url(cache_stamp())?;
            let response = self.get(url).await?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| FetchError::from_reqwest(e, self.timeout_secs))?;
            Ok(bytes.to_vec())
        })
    }

    fn fetch_content<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        Box::pin(async move {
            let url = self.content_url(path, cache_stamp())?;
            let response = self.get(url).await?;
            response
                .text()
                .await
                .map_err(|e| FetchError::from_reqwest(e, self.timeout_secs))
        })
    }
}
