//! Catalog model.
//!
//! The index document is a JSON object whose string values are leaf fetch
//! paths and whose object values are sub-folders. It is parsed once into an
//! immutable, order-preserving tree of `Arc<Folder>` so filter results can
//! share untouched subtrees with the loaded catalog.

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use crate::error::CatalogParseError;

/// A single catalog entry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogNode {
    /// Fetch path of one snippet, unique across the catalog.
    Leaf(String),
    Folder(Arc<Folder>),
}

impl CatalogNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, CatalogNode::Leaf(_))
    }

    pub fn as_folder(&self) -> Option<&Arc<Folder>> {
        match self {
            CatalogNode::Folder(folder) => Some(folder),
            CatalogNode::Leaf(_) => None,
        }
    }
}

/// Named entries in display order. Names are unique within one folder only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Folder {
    entries: Vec<(String, CatalogNode)>,
}

impl Folder {
    pub fn new(entries: Vec<(String, CatalogNode)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, CatalogNode)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CatalogNode> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, node)| node)
    }

    /// Only folders that directly hold a leaf can be collapsed.
    pub fn has_direct_leaf_children(&self) -> bool {
        self.entries.iter().any(|(_, node)| node.is_leaf())
    }

    pub fn leaf_count(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, node)| match node {
                CatalogNode::Leaf(_) => 1,
                CatalogNode::Folder(child) => child.leaf_count(),
            })
            .sum()
    }

    pub fn contains_leaf(&self, path: &str) -> bool {
        self.entries.iter().any(|(_, node)| match node {
            CatalogNode::Leaf(leaf_path) => leaf_path == path,
            CatalogNode::Folder(child) => child.contains_leaf(path),
        })
    }

    /// Depth-first list of every leaf with the folder that holds it.
    pub fn leaves(&self) -> Vec<LeafEntry<'_>> {
        let mut out = Vec::new();
        self.collect_leaves(&FolderPath::root(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, here: &FolderPath, out: &mut Vec<LeafEntry<'a>>) {
        for (name, node) in &self.entries {
            match node {
                CatalogNode::Leaf(path) => out.push(LeafEntry {
                    folder: here.clone(),
                    name,
                    path,
                }),
                CatalogNode::Folder(child) => child.collect_leaves(&here.child(name), out),
            }
        }
    }

    /// Every folder path below this folder, parents before children.
    pub fn folder_paths(&self) -> Vec<FolderPath> {
        let mut out = Vec::new();
        self.collect_folder_paths(&FolderPath::root(), &mut out);
        out
    }

    fn collect_folder_paths(&self, here: &FolderPath, out: &mut Vec<FolderPath>) {
        for (name, node) in &self.entries {
            if let CatalogNode::Folder(child) = node {
                let path = here.child(name);
                out.push(path.clone());
                child.collect_folder_paths(&path, out);
            }
        }
    }

    /// Resolve a folder by its root-relative path.
    pub fn folder_at(&self, path: &FolderPath) -> Option<&Folder> {
        let mut current = self;
        for segment in path.segments() {
            current = current.get(segment)?.as_folder()?;
        }
        Some(current)
    }

    /// Path of the first folder, in display order, whose path reads as `text`.
    pub fn find_folder(&self, text: &str) -> Option<FolderPath> {
        let wanted = text.trim_matches(FolderPath::SEPARATOR);
        self.folder_paths()
            .into_iter()
            .find(|path| path.to_string() == wanted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEntry<'a> {
    pub folder: FolderPath,
    pub name: &'a str,
    pub path: &'a str,
}

/// Entry names from the root down to a folder, shown as `basics/useState`.
///
/// Used as the identity for collapse and render state; never for fetching.
/// Segments are kept as given, so names containing `/` or empty names stay
/// distinct from nested folders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderPath(Vec<String>);

impl FolderPath {
    pub const SEPARATOR: char = '/';

    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(Self::SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// Splits typed text on `/`. Folders whose names contain `/` are found by
/// display text instead, see [`Folder::find_folder`].
impl From<&str> for FolderPath {
    fn from(value: &str) -> Self {
        let trimmed = value.trim_matches(Self::SEPARATOR);
        if trimmed.is_empty() {
            return Self::root();
        }
        Self(trimmed.split(Self::SEPARATOR).map(str::to_string).collect())
    }
}

impl From<String> for FolderPath {
    fn from(value: String) -> Self {
        FolderPath::from(value.as_str())
    }
}

impl Serialize for FolderPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse an index document into a validated catalog root.
pub fn parse_index(bytes: &[u8]) -> Result<Arc<Folder>, CatalogParseError> {
    let raw: RawNode =
        serde_json::from_slice(bytes).map_err(|e| CatalogParseError::Json(e.to_string()))?;
    let RawNode::Folder(entries) = raw else {
        return Err(CatalogParseError::RootNotObject);
    };

    let mut seen: HashMap<String, String> = HashMap::new();
    build_folder(entries, &FolderPath::root(), &mut seen)
}

fn build_folder(
    entries: Vec<(String, RawNode)>,
    here: &FolderPath,
    seen: &mut HashMap<String, String>,
) -> Result<Arc<Folder>, CatalogParseError> {
    let mut built = Vec::with_capacity(entries.len());
    for (name, raw) in entries {
        let at = here.child(&name);
        let node = match raw {
            RawNode::Leaf(path) => {
                if path.trim().is_empty() {
                    return Err(CatalogParseError::EmptyLeafPath {
                        at: at.to_string(),
                    });
                }
                if let Some(first) = seen.insert(path.clone(), at.to_string()) {
                    return Err(CatalogParseError::DuplicateLeafPath {
                        path,
                        first,
                        second: at.to_string(),
                    });
                }
                CatalogNode::Leaf(path)
            }
            RawNode::Folder(children) => CatalogNode::Folder(build_folder(children, &at, seen)?),
            RawNode::Other(found) => {
                return Err(CatalogParseError::MalformedNode {
                    at: at.to_string(),
                    found,
                })
            }
        };
        built.push((name, node));
    }
    Ok(Arc::new(Folder::new(built)))
}

/// Untyped index node, kept in document order.
enum RawNode {
    Leaf(String),
    Folder(Vec<(String, RawNode)>),
    Other(&'static str),
}

impl<'de> Deserialize<'de> for RawNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawNodeVisitor)
    }
}

struct RawNodeVisitor;

impl<'de> Visitor<'de> for RawNodeVisitor {
    type Value = RawNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a leaf path string or a folder object")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawNode, E> {
        Ok(RawNode::Leaf(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<RawNode, E> {
        Ok(RawNode::Leaf(v))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<RawNode, E> {
        Ok(RawNode::Other("a boolean"))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<RawNode, E> {
        Ok(RawNode::Other("a number"))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<RawNode, E> {
        Ok(RawNode::Other("a number"))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<RawNode, E> {
        Ok(RawNode::Other("a number"))
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawNode, E> {
        Ok(RawNode::Other("null"))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawNode, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(RawNode::Other("an array"))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawNode, A::Error> {
        let mut entries: Vec<(String, RawNode)> = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, RawNode>()? {
            // Repeated keys: last value wins, first position is kept.
            match entries.iter_mut().find(|(name, _)| *name == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
        Ok(RawNode::Folder(entries))
    }
}

impl Serialize for Folder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, node) in &self.entries {
            map.serialize_entry(name, node)?;
        }
        map.end()
    }
}

impl Serialize for CatalogNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CatalogNode::Leaf(path) => serializer.serialize_str(path),
            CatalogNode::Folder(folder) => folder.serialize(serializer),
        }
    }
}
