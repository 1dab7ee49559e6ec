//! Directory/file view of the canonical tree
//!
//! The canonical [`Mapping`] only knows mappings and scalars. Before anything
//! touches the disk it is classified once into [`Node`]s, so the materializer
//! matches on an explicit variant instead of inspecting key names.

use indexmap::map::Iter;
use indexmap::IndexMap;

use crate::value::{Mapping, Value};

/// A filesystem entry to create
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Directory(Directory),
    File(File),
}

impl Node {
    /// Classify a canonical value.
    ///
    /// Mappings become directories unless they carry an `@`-prefixed key, in
    /// which case the whole mapping is rendered into a single file. Scalars
    /// become files holding their text.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Mapping(m) if !m.is_attribute_marked() => {
                Self::Directory(Directory::from_mapping(m))
            }
            other => Self::File(File::new(other.to_text())),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Self::Directory(d) => Some(d),
            Self::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Self::File(f) => Some(f),
            Self::Directory(_) => None,
        }
    }
}

/// Ordered directory listing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directory {
    entries: IndexMap<String, Node>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify every entry of a mapping. The mapping itself is always
    /// treated as a directory.
    pub fn from_mapping(mapping: &Mapping) -> Self {
        let entries = mapping
            .iter()
            .map(|(name, value)| (name.clone(), Node::from_value(value)))
            .collect();
        Self { entries }
    }

    pub fn insert(&mut self, name: impl Into<String>, node: Node) -> Option<Node> {
        self.entries.insert(name.into(), node)
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, Node> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Directory {
    type Item = (&'a String, &'a Node);
    type IntoIter = Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// File content to write
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct File {
    content: String,
}

impl File {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(entries: &[(&str, Value)]) -> Mapping {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_plain_mapping_is_directory() {
        let src = mapping(&[("main.rs", Value::from("fn main() {}"))]);
        let node = Node::from_value(&Value::Mapping(src));

        let dir = node.as_directory();
        assert!(dir.is_some());
        let file = dir.and_then(|d| d.get("main.rs")).and_then(Node::as_file);
        assert_eq!(file.map(File::content), Some("fn main() {}"));
    }

    #[test]
    fn test_scalar_is_file() {
        assert_eq!(
            Node::from_value(&Value::from(8u64)),
            Node::File(File::new("8"))
        );
        assert_eq!(Node::from_value(&Value::Null), Node::File(File::new("")));
    }

    #[test]
    fn test_attribute_marked_mapping_is_file() {
        let marked = mapping(&[("@mode", Value::from("755")), ("#text", Value::from("x"))]);
        let node = Node::from_value(&Value::Mapping(marked));
        assert!(node.is_file());
        assert_eq!(
            node.as_file().map(File::content),
            Some(r##"{"@mode":"755","#text":"x"}"##)
        );
    }

    #[test]
    fn test_attribute_marker_applies_at_depth() {
        let marked = mapping(&[("@kind", Value::from("blob"))]);
        let level2 = mapping(&[("leaf", Value::Mapping(marked))]);
        let level1 = mapping(&[("level2", Value::Mapping(level2))]);

        let dir = Directory::from_mapping(&level1);
        let leaf = dir
            .get("level2")
            .and_then(Node::as_directory)
            .and_then(|d| d.get("leaf"));
        assert!(leaf.is_some_and(Node::is_file));
    }

    #[test]
    fn test_from_mapping_ignores_marker_on_itself() {
        let marked = mapping(&[("@kind", Value::from("blob"))]);
        let dir = Directory::from_mapping(&marked);
        assert_eq!(dir.len(), 1);
        assert!(dir.get("@kind").is_some_and(Node::is_file));
    }
}
