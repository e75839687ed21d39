//! Browsing session state.
//!
//! All UI state lives in named slices and is changed only through
//! [`SessionState::apply`]. Applying an action never performs I/O; it returns
//! the fetches the caller has to run.

use std::sync::Arc;

use crate::catalog::{Folder, FolderPath};
use crate::catalog_loader::{CatalogLoader, CatalogState, IndexTicket};
use crate::collapse::CollapseSet;
use crate::content_loader::{ContentSlice, ContentTicket, ContentView, Resolution};
use crate::error::{ContentLoadError, IndexLoadError};
use crate::explorer::{project, TreeRow};
use crate::filter::{FilterMemo, QueryState};

#[derive(Debug)]
pub enum Action {
    Mount,
    IndexResolved {
        ticket: IndexTicket,
        result: Result<Arc<Folder>, IndexLoadError>,
    },
    /// Drop everything and fetch the index again.
    Reload,
    SetQuery(String),
    ToggleFolder(FolderPath),
    Select(String),
    ContentResolved {
        ticket: ContentTicket,
        result: Result<String, ContentLoadError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchIndex(IndexTicket),
    FetchContent(ContentTicket),
}

#[derive(Debug)]
pub struct SessionState {
    catalog: CatalogLoader,
    query: QueryState,
    collapse: CollapseSet,
    selection: Option<String>,
    content: ContentSlice,
    memo: FilterMemo,
}

impl SessionState {
    pub fn new(content_fallback: impl Into<String>) -> Self {
        Self {
            catalog: CatalogLoader::new(),
            query: QueryState::default(),
            collapse: CollapseSet::new(),
            selection: None,
            content: ContentSlice::new(content_fallback),
            memo: FilterMemo::new(),
        }
    }

    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Mount => self.catalog.begin().map(Effect::FetchIndex).into_iter().collect(),
            Action::IndexResolved { ticket, result } => {
                if let Err(e) = &result {
                    tracing::warn!("[CATALOG] Index load failed: {}", e);
                }
                if self.catalog.resolve(ticket, result) {
                    if let Some(root) = self.catalog.state().root() {
                        tracing::info!("[CATALOG] Loaded {} snippets", root.leaf_count());
                        self.collapse.prune(root);
                    }
                    self.memo.clear();
                } else {
                    tracing::debug!("[CATALOG] Discarded index response for {:?}", ticket);
                }
                Vec::new()
            }
            Action::Reload => {
                tracing::info!("[CATALOG] Reloading catalog");
                self.catalog.reset();
                self.collapse.clear();
                self.selection = None;
                self.content.reset();
                self.memo.clear();
                self.catalog.begin().map(Effect::FetchIndex).into_iter().collect()
            }
            Action::SetQuery(raw) => {
                self.query = QueryState::new(raw);
                Vec::new()
            }
            Action::ToggleFolder(path) => {
                self.toggle_folder(&path);
                Vec::new()
            }
            Action::Select(path) => self.select(path).map(Effect::FetchContent).into_iter().collect(),
            Action::ContentResolved { ticket, result } => {
                if let Err(e) = &result {
                    tracing::warn!("[CONTENT] {}", e);
                }
                match self.content.resolve(&ticket, result) {
                    Resolution::Committed => {
                        tracing::debug!("[CONTENT] Committed {}", ticket.path)
                    }
                    Resolution::StaleDiscarded => tracing::debug!(
                        "[CONTENT] Discarded stale response for {} (token {}, latest {})",
                        ticket.path,
                        ticket.token,
                        self.content.latest_token()
                    ),
                }
                Vec::new()
            }
        }
    }

    fn toggle_folder(&mut self, path: &FolderPath) -> bool {
        let Some(root) = self.catalog.state().root() else {
            return false;
        };
        if path.is_root() || root.folder_at(path).is_none() {
            tracing::debug!("[CATALOG] Ignoring toggle for unknown folder '{}'", path);
            return false;
        }
        self.collapse.toggle(path);
        true
    }

    fn select(&mut self, path: String) -> Option<ContentTicket> {
        let root = self.catalog.state().root()?;
        if !root.contains_leaf(&path) {
            tracing::warn!("[CONTENT] '{}' is not a leaf of the loaded catalog", path);
            return None;
        }
        if self.selection.as_deref() == Some(path.as_str()) && !self.content_failed() {
            return None;
        }
        let ticket = self.content.begin(&path);
        self.selection = Some(path);
        Some(ticket)
    }

    fn content_failed(&self) -> bool {
        self.content.view().is_some_and(|view| view.failed)
    }

    pub fn catalog(&self) -> &CatalogState {
        self.catalog.state()
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn collapse(&self) -> &CollapseSet {
        &self.collapse
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn content(&self) -> &ContentSlice {
        &self.content
    }

    pub fn content_view(&self) -> Option<ContentView> {
        self.content.view()
    }

    /// Catalog as filtered by the current query. `None` when nothing is
    /// loaded or nothing matches.
    pub fn filtered(&mut self) -> Option<Arc<Folder>> {
        let root = Arc::clone(self.catalog.state().root()?);
        self.memo.get(&root, &self.query)
    }

    pub fn rows(&mut self) -> Vec<TreeRow> {
        match self.filtered() {
            Some(view) => project(&view, &self.collapse, self.selection.as_deref()),
            None => Vec::new(),
        }
    }
}
