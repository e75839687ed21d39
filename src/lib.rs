//! Snipdex: a browser for a remote, hierarchical snippet catalog.
//!
//! The engine is UI-agnostic. `SessionState` holds the state slices and is
//! driven by `CatalogBrowser`, which performs the two network fetches (index
//! and content) against a `CatalogSource`.

pub mod browser;
pub mod catalog;
pub mod catalog_loader;
pub mod collapse;
pub mod config;
pub mod content_loader;
pub mod error;
pub mod explorer;
pub mod filter;
pub mod logging;
pub mod session;
pub mod source;

pub use browser::CatalogBrowser;
pub use catalog::{parse_index, CatalogNode, Folder, FolderPath};
pub use catalog_loader::CatalogState;
pub use collapse::CollapseSet;
pub use config::BrowserConfig;
pub use content_loader::{language_for, ContentState, ContentView};
pub use error::{CatalogParseError, ContentLoadError, FetchError, IndexLoadError};
pub use explorer::{project, render_rows, RowKind, TreeRow};
pub use filter::{filter_catalog, QueryState};
pub use session::{Action, Effect, SessionState};
pub use source::{CatalogSource, HttpCatalogSource};
