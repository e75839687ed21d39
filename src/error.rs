//! Error taxonomy for the catalog browser.
//!
//! Loaders catch these at their boundary and turn them into state; they never
//! reach the rendering code.

use thiserror::Error;

/// Transport-level failure for a single GET.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("could not read response body: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout_secs)
        } else if err.is_decode() || err.is_body() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// The index document arrived but does not describe a valid catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogParseError {
    #[error("index is not valid JSON: {0}")]
    Json(String),
    #[error("index root must be a JSON object")]
    RootNotObject,
    #[error("entry '{at}' must be a string leaf path or an object, found {found}")]
    MalformedNode { at: String, found: &'static str },
    #[error("leaf '{at}' has an empty path")]
    EmptyLeafPath { at: String },
    #[error("leaf path '{path}' appears more than once (at '{first}' and '{second}')")]
    DuplicateLeafPath {
        path: String,
        first: String,
        second: String,
    },
}

/// Fatal to the whole view: no partial catalog is ever shown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexLoadError {
    #[error("failed to fetch catalog index: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to parse catalog index: {0}")]
    Parse(#[from] CatalogParseError),
}

/// Local to the viewer pane for one selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load '{path}': {source}")]
pub struct ContentLoadError {
    pub path: String,
    #[source]
    pub source: FetchError,
}

impl ContentLoadError {
    pub fn new(path: impl Into<String>, source: FetchError) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
