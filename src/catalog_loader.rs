use std::sync::Arc;

use crate::catalog::{parse_index, Folder};
use crate::error::IndexLoadError;
use crate::source::CatalogSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    NotLoaded,
    Loading,
    Loaded(Arc<Folder>),
    Failed(String),
}

impl CatalogState {
    pub fn root(&self) -> Option<&Arc<Folder>> {
        match self {
            CatalogState::Loaded(root) => Some(root),
            _ => None,
        }
    }
}

/// Identifies one index request so a superseded load cannot land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexTicket(u64);

/// Index slice: fetched once per mount, replaced wholesale on reload.
#[derive(Debug)]
pub struct CatalogLoader {
    state: CatalogState,
    generation: u64,
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self {
            state: CatalogState::NotLoaded,
            generation: 0,
        }
    }
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    /// Start the index request. Only a `NotLoaded` slice issues one.
    pub fn begin(&mut self) -> Option<IndexTicket> {
        if self.state != CatalogState::NotLoaded {
            return None;
        }
        self.generation += 1;
        self.state = CatalogState::Loading;
        Some(IndexTicket(self.generation))
    }

    /// Forget the current catalog so the next `begin` fetches again.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = CatalogState::NotLoaded;
    }

    /// Returns false when the ticket is stale and the result was dropped.
    pub fn resolve(
        &mut self,
        ticket: IndexTicket,
        result: Result<Arc<Folder>, IndexLoadError>,
    ) -> bool {
        if ticket.0 != self.generation || self.state != CatalogState::Loading {
            return false;
        }
        self.state = match result {
            Ok(root) => CatalogState::Loaded(root),
            Err(e) => CatalogState::Failed(e.to_string()),
        };
        true
    }
}

/// Fetch and parse the index in one step.
pub async fn load_index<S: CatalogSource + ?Sized>(
    source: &S,
) -> Result<Arc<Folder>, IndexLoadError> {
    let bytes = source.fetch_index().await?;
    Ok(parse_index(&bytes)?)
}
