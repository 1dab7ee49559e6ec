//! Read a directory back into the canonical tree

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::value::{Mapping, Value};

/// Snapshot `path` as a mapping: directories become mappings and regular
/// files become their content. Entries are sorted by name; symlinks and
/// other special files are skipped.
pub fn scan(path: impl AsRef<Path>) -> Result<Mapping> {
    scan_dir(path.as_ref())
}

fn scan_dir(dir: &Path) -> Result<Mapping> {
    let wrap = |source| Error::Scan {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir)
        .map_err(wrap)?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(wrap)?;
    entries.sort_by_key(fs::DirEntry::file_name);

    let mut mapping = Mapping::with_capacity(entries.len());
    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type().map_err(wrap)?;
        if file_type.is_dir() {
            mapping.insert(name, scan_dir(&path)?);
        } else if file_type.is_file() {
            let content = fs::read_to_string(&path).map_err(|source| Error::Scan {
                path: path.clone(),
                source,
            })?;
            mapping.insert(name, Value::String(content));
        }
    }
    Ok(mapping)
}
