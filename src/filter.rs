//! Incremental catalog search.
//!
//! `filter_catalog` is pure: the same `(root, query)` pair always yields an
//! equal tree, and untouched subtrees are shared with the input by `Arc`.

use std::sync::Arc;

use crate::catalog::{CatalogNode, Folder};

/// Current search text plus its matching form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    raw: String,
    needle: String,
}

impl QueryState {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let needle = normalize_query(&raw);
        Self { raw, needle }
    }

    /// Text as typed by the user.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Trimmed, lower-cased form used for matching.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Filter `root` by `query`.
///
/// An empty query returns `root` itself. Otherwise a leaf stays when its name
/// or fetch path contains the query, a folder whose own name matches stays
/// with its whole original subtree, and any other folder stays only with the
/// descendants that matched. `None` means nothing matched.
pub fn filter_catalog(root: &Arc<Folder>, query: &str) -> Option<Arc<Folder>> {
    let needle = normalize_query(query);
    if needle.is_empty() {
        return Some(Arc::clone(root));
    }
    filter_folder(root, &needle)
}

fn filter_folder(folder: &Arc<Folder>, needle: &str) -> Option<Arc<Folder>> {
    let mut kept: Vec<(String, CatalogNode)> = Vec::new();
    let mut unchanged = true;

    for (name, node) in folder.entries() {
        let keep = match node {
            CatalogNode::Leaf(path) => {
                if contains_ci(name, needle) || contains_ci(path, needle) {
                    Some(node.clone())
                } else {
                    None
                }
            }
            CatalogNode::Folder(child) => {
                if contains_ci(name, needle) {
                    Some(node.clone())
                } else {
                    filter_folder(child, needle).map(|filtered| {
                        if !Arc::ptr_eq(&filtered, child) {
                            unchanged = false;
                        }
                        CatalogNode::Folder(filtered)
                    })
                }
            }
        };

        match keep {
            // A name-matched folder without a single leaf below it is empty.
            Some(CatalogNode::Folder(ref child)) if child.leaf_count() == 0 => unchanged = false,
            Some(node) => kept.push((name.clone(), node)),
            None => unchanged = false,
        }
    }

    if kept.is_empty() {
        None
    } else if unchanged {
        Some(Arc::clone(folder))
    } else {
        Some(Arc::new(Folder::new(kept)))
    }
}

/// Single-slot memo over `(catalog identity, normalised query)`.
#[derive(Debug, Default)]
pub struct FilterMemo {
    slot: Option<MemoSlot>,
}

#[derive(Debug)]
struct MemoSlot {
    root: Arc<Folder>,
    needle: String,
    result: Option<Arc<Folder>>,
}

impl FilterMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, root: &Arc<Folder>, query: &QueryState) -> Option<Arc<Folder>> {
        if let Some(slot) = &self.slot {
            if Arc::ptr_eq(&slot.root, root) && slot.needle == query.needle() {
                return slot.result.clone();
            }
        }
        let result = filter_catalog(root, query.needle());
        self.slot = Some(MemoSlot {
            root: Arc::clone(root),
            needle: query.needle().to_string(),
            result: result.clone(),
        });
        result
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_index;
    use crate::catalog::tests::sample;
    use std::collections::BTreeSet;

    fn spec_catalog() -> Arc<Folder> {
        parse_index(
            br#"{"basics": {"useState": "basics/useState.js"},
                 "advanced": {"hooks": {"a": "advanced/hooks/a.js"}}}"#,
        )
        .unwrap()
    }

    fn leaf_paths(folder: &Folder) -> BTreeSet<String> {
        folder.leaves().iter().map(|l| l.path.to_string()).collect()
    }

    /// Every kept leaf matches itself or sits under a folder whose name matches.
    fn assert_reveal_law(folder: &Folder, needle: &str, under_match: bool) {
        for (name, node) in folder.entries() {
            match node {
                CatalogNode::Leaf(path) => assert!(
                    under_match || contains_ci(name, needle) || contains_ci(path, needle),
                    "leaf {name} ({path}) kept without a match"
                ),
                CatalogNode::Folder(child) => {
                    assert_reveal_law(child, needle, under_match || contains_ci(name, needle))
                }
            }
        }
    }

    #[test]
    fn test_empty_query_returns_same_tree() {
        let root = sample();
        let filtered = filter_catalog(&root, "").unwrap();
        assert!(Arc::ptr_eq(&filtered, &root));

        let filtered = filter_catalog(&root, "   ").unwrap();
        assert!(Arc::ptr_eq(&filtered, &root));
    }

    #[test]
    fn test_descendant_match_drops_unrelated_branches() {
        let root = spec_catalog();
        let filtered = filter_catalog(&root, "use").unwrap();

        assert_eq!(filtered.len(), 1);
        let basics = filtered.get("basics").unwrap().as_folder().unwrap();
        assert_eq!(
            basics.get("useState"),
            Some(&CatalogNode::Leaf("basics/useState.js".to_string()))
        );
        assert!(filtered.get("advanced").is_none());
    }

    #[test]
    fn test_folder_name_match_reveals_full_subtree() {
        let root = spec_catalog();
        let filtered = filter_catalog(&root, "advanced").unwrap();

        let advanced = filtered.get("advanced").unwrap().as_folder().unwrap();
        let original = root.get("advanced").unwrap().as_folder().unwrap();
        assert!(Arc::ptr_eq(advanced, original));
        let hooks = advanced.get("hooks").unwrap().as_folder().unwrap();
        assert_eq!(
            hooks.get("a"),
            Some(&CatalogNode::Leaf("advanced/hooks/a.js".to_string()))
        );
        // "advanced" also occurs in the leaf path, but basics has nothing to show.
        assert!(filtered.get("basics").is_none());
    }

    #[test]
    fn test_name_match_differs_from_partial_reveal() {
        let root = sample();

        // Folder name match: both custom hooks come back.
        let by_folder = filter_catalog(&root, "CUSTOM").unwrap();
        let custom = by_folder.get("custom").unwrap().as_folder().unwrap();
        assert_eq!(custom.len(), 2);

        // Leaf match inside the same folder: only the matching hook.
        let by_leaf = filter_catalog(&root, "toggle").unwrap();
        let custom = by_leaf.get("custom").unwrap().as_folder().unwrap();
        assert_eq!(custom.len(), 1);
        assert!(custom.get("useToggle").is_some());
    }

    #[test]
    fn test_leaf_path_match_counts() {
        let root = sample();
        let filtered = filter_catalog(&root, "effect-reducer.js").unwrap();
        assert_eq!(
            leaf_paths(&filtered),
            BTreeSet::from(["data/basics/useEffect/effect-reducer.js".to_string()])
        );
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(filter_catalog(&sample(), "zzz-nothing").is_none());
    }

    #[test]
    fn test_filter_preserves_order() {
        let root = sample();
        let filtered = filter_catalog(&root, "e").unwrap();
        let original: Vec<&str> = root.entries().iter().map(|(n, _)| n.as_str()).collect();
        let kept: Vec<&str> = filtered.entries().iter().map(|(n, _)| n.as_str()).collect();
        let mut cursor = original.iter();
        for name in kept {
            assert!(cursor.any(|o| *o == name), "{name} out of order");
        }
    }

    #[test]
    fn test_reveal_law_and_idempotence() {
        let root = sample();
        for query in ["use", "effect", "a", "hooks", "JS", "custom/use", "basics"] {
            let needle = normalize_query(query);
            let Some(once) = filter_catalog(&root, query) else {
                continue;
            };
            assert_reveal_law(&once, &needle, false);

            let twice = filter_catalog(&once, query).unwrap();
            assert_eq!(leaf_paths(&once), leaf_paths(&twice), "query {query}");
        }
    }

    #[test]
    fn test_matching_name_on_empty_folder_is_dropped() {
        let root = parse_index(br#"{"empty": {}, "full": {"x": "x.js"}}"#).unwrap();
        assert!(filter_catalog(&root, "empty").is_none());
        // The identity filter still keeps it.
        assert_eq!(filter_catalog(&root, "").unwrap().len(), 2);
    }

    #[test]
    fn test_matching_name_on_leafless_subtree_is_dropped() {
        let root = parse_index(br#"{"adv": {"e": {}}, "basics": {"x": "x.js"}}"#).unwrap();
        assert!(filter_catalog(&root, "adv").is_none());

        let filtered = filter_catalog(&root, "a").unwrap();
        let names: Vec<&str> = filtered.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["basics"]);
    }

    #[test]
    fn test_unchanged_subtrees_are_shared() {
        let root = sample();
        let filtered = filter_catalog(&root, "use").unwrap();
        // Every custom leaf matches "use", so the folder is reused untouched.
        let custom = filtered.get("custom").unwrap().as_folder().unwrap();
        assert!(Arc::ptr_eq(custom, root.get("custom").unwrap().as_folder().unwrap()));
    }

    #[test]
    fn test_memo_reuses_result_for_same_inputs() {
        let root = sample();
        let mut memo = FilterMemo::new();
        let first = memo.get(&root, &QueryState::new("use")).unwrap();
        let second = memo.get(&root, &QueryState::new("  USE ")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other_root = sample();
        let third = memo.get(&other_root, &QueryState::new("use")).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn test_query_state_normalises() {
        let q = QueryState::new("  UseState ");
        assert_eq!(q.raw(), "  UseState ");
        assert_eq!(q.needle(), "usestate");
        assert!(QueryState::new(" \t").is_empty());
    }
}
