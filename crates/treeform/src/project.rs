//! Top-level project selection

use crate::error::{Error, Result};
use crate::node::Directory;
use crate::value::{Mapping, Value};

/// Which top-level entries of a decoded tree are built
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    /// Only the first entry in decode order; later entries are ignored
    #[default]
    First,
    /// Every top-level entry
    All,
}

/// A named project ready to be materialized
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub root: Directory,
}

/// Pick the projects to build from a decoded tree.
///
/// Each selected project value must be a mapping. It is always treated as a
/// directory, even if it carries `@` keys. All selected projects are
/// validated before any is returned, so a shape error leaves the disk alone.
pub fn select_projects(tree: &Mapping, selection: Selection) -> Result<Vec<Project>> {
    let entries: Vec<(&String, &Value)> = match selection {
        Selection::First => tree.first().into_iter().collect(),
        Selection::All => tree.iter().collect(),
    };
    if entries.is_empty() {
        return Err(Error::NoProject);
    }

    entries
        .into_iter()
        .map(|(name, value)| match value {
            Value::Mapping(m) => Ok(Project {
                name: name.clone(),
                root: Directory::from_mapping(m),
            }),
            _ => Err(Error::ProjectNotMapping { name: name.clone() }),
        })
        .collect()
}
