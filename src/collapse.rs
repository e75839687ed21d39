use std::collections::BTreeSet;

use crate::catalog::{Folder, FolderPath};

/// Folders the user has collapsed, keyed by `FolderPath`.
///
/// Only consulted when deciding what to show; it never affects which entries
/// match a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseSet {
    collapsed: BTreeSet<FolderPath>,
}

impl CollapseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership. Returns true if the path is now collapsed.
    pub fn toggle(&mut self, path: &FolderPath) -> bool {
        if self.collapsed.remove(path) {
            false
        } else {
            self.collapsed.insert(path.clone());
            true
        }
    }

    pub fn is_collapsed(&self, path: &FolderPath) -> bool {
        self.collapsed.contains(path)
    }

    /// Whether `folder`'s children are shown. Folders without a direct leaf
    /// child are always expanded, whatever the set says.
    pub fn is_expanded(&self, folder: &Folder, path: &FolderPath) -> bool {
        !folder.has_direct_leaf_children() || !self.is_collapsed(path)
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    pub fn clear(&mut self) {
        self.collapsed.clear();
    }

    /// Drop entries that no longer name a folder in `root`.
    pub fn prune(&mut self, root: &Folder) {
        self.collapsed.retain(|path| root.folder_at(path).is_some());
    }
}
