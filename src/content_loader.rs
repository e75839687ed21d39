//! Viewer-pane slice.
//!
//! Every selection gets a fresh, strictly increasing token. A response is
//! committed only if its token is still the latest one issued, so a slow
//! fetch for an earlier selection can never overwrite a newer one.

use std::path::Path;

use crate::error::ContentLoadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTicket {
    pub token: u64,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentState {
    Idle,
    Loading { path: String },
    Loaded { path: String, text: String },
    Failed { path: String, message: String },
}

/// Outcome of handing a response to the slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Committed,
    /// A newer selection was issued; the response was dropped.
    StaleDiscarded,
}

/// What the viewer pane shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentView {
    pub path: String,
    pub text: String,
    pub language: &'static str,
    pub failed: bool,
}

#[derive(Debug)]
pub struct ContentSlice {
    state: ContentState,
    latest_token: u64,
    fallback: String,
}

impl ContentSlice {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            state: ContentState::Idle,
            latest_token: 0,
            fallback: fallback.into(),
        }
    }

    pub fn state(&self) -> &ContentState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ContentState::Loading { .. })
    }

    pub fn latest_token(&self) -> u64 {
        self.latest_token
    }

    /// Mark the slice loading and issue the token for `path`.
    pub fn begin(&mut self, path: &str) -> ContentTicket {
        self.latest_token += 1;
        self.state = ContentState::Loading {
            path: path.to_string(),
        };
        ContentTicket {
            token: self.latest_token,
            path: path.to_string(),
        }
    }

    pub fn resolve(
        &mut self,
        ticket: &ContentTicket,
        result: Result<String, ContentLoadError>,
    ) -> Resolution {
        if ticket.token != self.latest_token {
            return Resolution::StaleDiscarded;
        }
        self.state = match result {
            Ok(text) => ContentState::Loaded {
                path: ticket.path.clone(),
                text,
            },
            Err(e) => ContentState::Failed {
                path: ticket.path.clone(),
                message: e.to_string(),
            },
        };
        Resolution::Committed
    }

    /// Back to `Idle`; anything still in flight becomes stale.
    pub fn reset(&mut self) {
        self.latest_token += 1;
        self.state = ContentState::Idle;
    }

    /// Loaded text, or the fallback line after a failure. Nothing while idle
    /// or loading.
    pub fn view(&self) -> Option<ContentView> {
        match &self.state {
            ContentState::Loaded { path, text } => Some(ContentView {
                path: path.clone(),
                text: text.clone(),
                language: language_for(path),
                failed: false,
            }),
            ContentState::Failed { path, .. } => Some(ContentView {
                path: path.clone(),
                text: self.fallback.clone(),
                language: language_for(path),
                failed: true,
            }),
            ContentState::Idle | ContentState::Loading { .. } => None,
        }
    }
}

/// Language tag handed to the code renderer.
pub fn language_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jsx") => "jsx",
        Some("ts") => "typescript",
        Some("tsx") => "tsx",
        Some("css") => "css",
        Some("json") => "json",
        Some("html") => "markup",
        Some("md") => "markdown",
        // js, mjs, cjs and anything unknown
        _ => "javascript",
    }
}
