use serde::Serialize;
use std::fmt::Write as _;

use crate::catalog::{CatalogNode, Folder, FolderPath};
use crate::collapse::CollapseSet;

/// One visible line of the catalog sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub depth: usize,
    pub name: String,
    pub kind: RowKind,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RowKind {
    Folder {
        path: FolderPath,
        collapsible: bool,
        collapsed: bool,
    },
    Leaf {
        path: String,
    },
}

/// Flatten a (usually filtered) catalog into display rows.
///
/// Collapsibility is judged on the folder as shown, so a folder whose leaves
/// were all filtered away renders expanded.
pub fn project(root: &Folder, collapse: &CollapseSet, selection: Option<&str>) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    project_recursive(root, &FolderPath::root(), collapse, selection, 0, &mut rows);
    rows
}

fn project_recursive(
    folder: &Folder,
    here: &FolderPath,
    collapse: &CollapseSet,
    selection: Option<&str>,
    depth: usize,
    output: &mut Vec<TreeRow>,
) {
    for (name, node) in folder.entries() {
        match node {
            CatalogNode::Leaf(path) => output.push(TreeRow {
                depth,
                name: name.clone(),
                kind: RowKind::Leaf { path: path.clone() },
                is_selected: selection == Some(path.as_str()),
            }),
            CatalogNode::Folder(child) => {
                let path = here.child(name);
                let collapsible = child.has_direct_leaf_children();
                let expanded = collapse.is_expanded(child, &path);
                output.push(TreeRow {
                    depth,
                    name: name.clone(),
                    kind: RowKind::Folder {
                        path: path.clone(),
                        collapsible,
                        collapsed: !expanded,
                    },
                    is_selected: false,
                });
                if expanded {
                    project_recursive(child, &path, collapse, selection, depth + 1, output);
                }
            }
        }
    }
}

/// Plain-text sidebar for the terminal.
pub fn render_rows(rows: &[TreeRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let indent = "  ".repeat(row.depth);
        let _ = match &row.kind {
            RowKind::Folder {
                collapsible,
                collapsed,
                ..
            } => {
                let marker = match (collapsible, collapsed) {
                    (false, _) => ' ',
                    (true, false) => '▾',
                    (true, true) => '▸',
                };
                writeln!(out, "{indent}{marker} {}/", row.name)
            }
            RowKind::Leaf { .. } => {
                let marker = if row.is_selected { '•' } else { ' ' };
                writeln!(out, "{indent}{marker} {}", row.name)
            }
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample;
    use crate::filter::filter_catalog;

    fn names(rows: &[TreeRow]) -> Vec<(usize, &str)> {
        rows.iter().map(|r| (r.depth, r.name.as_str())).collect()
    }

    #[test]
    fn test_project_expands_everything_by_default() {
        let root = sample();
        let rows = project(&root, &CollapseSet::new(), None);
        assert_eq!(
            names(&rows),
            vec![
                (0, "basics"),
                (1, "useState"),
                (1, "useEffect"),
                (2, "effect"),
                (2, "effect-reducer"),
                (0, "advanced"),
                (1, "hooks"),
                (2, "a"),
                (0, "custom"),
                (1, "useToggle"),
                (1, "useFetch"),
            ]
        );
    }

    #[test]
    fn test_collapsed_folder_hides_children() {
        let root = sample();
        let mut collapse = CollapseSet::new();
        collapse.toggle(&FolderPath::from("basics"));

        let rows = project(&root, &collapse, None);
        assert_eq!(rows[0].name, "basics");
        assert_eq!(
            rows[0].kind,
            RowKind::Folder {
                path: FolderPath::from("basics"),
                collapsible: true,
                collapsed: true,
            }
        );
        assert_eq!(rows[1].name, "advanced");
    }

    #[test]
    fn test_folder_of_folders_ignores_collapse() {
        let root = sample();
        let mut collapse = CollapseSet::new();
        collapse.toggle(&FolderPath::from("advanced"));

        let rows = project(&root, &collapse, None);
        let advanced = rows.iter().position(|r| r.name == "advanced").unwrap();
        assert!(matches!(
            rows[advanced].kind,
            RowKind::Folder {
                collapsible: false,
                collapsed: false,
                ..
            }
        ));
        assert_eq!(rows[advanced + 1].name, "hooks");
    }

    #[test]
    fn test_collapse_survives_filtering() {
        let root = sample();
        let mut collapse = CollapseSet::new();
        collapse.toggle(&FolderPath::from("custom"));

        let filtered = filter_catalog(&root, "use").unwrap();
        let rows = project(&filtered, &collapse, None);
        let custom = rows.iter().position(|r| r.name == "custom").unwrap();
        assert!(rows.get(custom + 1).map_or(true, |r| r.depth == 0));

        // Under "effect" basics keeps only a sub-folder, so it cannot collapse.
        collapse.toggle(&FolderPath::from("basics"));
        let filtered = filter_catalog(&root, "effect").unwrap();
        let rows = project(&filtered, &collapse, None);
        assert_eq!(
            names(&rows),
            vec![(0, "basics"), (1, "useEffect"), (2, "effect"), (2, "effect-reducer")]
        );
    }

    #[test]
    fn test_selection_is_marked() {
        let root = sample();
        let rows = project(&root, &CollapseSet::new(), Some("data/custom/useFetch.js"));
        let selected: Vec<&str> = rows
            .iter()
            .filter(|r| r.is_selected)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(selected, vec!["useFetch"]);
    }

    #[test]
    fn test_render_rows_markers() {
        let root = sample();
        let mut collapse = CollapseSet::new();
        collapse.toggle(&FolderPath::from("custom"));
        let rows = project(&root, &collapse, Some("basics/useState.js"));
        let text = render_rows(&rows);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "▾ basics/");
        assert_eq!(lines[1], "  • useState");
        assert_eq!(lines[5], "  advanced/");
        assert_eq!(lines.last(), Some(&"▸ custom/"));
    }
}
