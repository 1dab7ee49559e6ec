//! treeform - build directory trees from JSON, YAML or XML descriptions
//!
//! A structure description is a mapping whose first key names a project.
//! Nested mappings become directories and everything else becomes a file
//! whose content is the value's text.
//!
//! # Quick Start
//!
//! ```
//! use treeform::{build_projects, decode_str, Selection};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = decode_str(r#"{"demo": {"src": {"main.rs": "fn main() {}"}}}"#)?;
//! let dir = tempfile::tempdir()?;
//! let reports = build_projects(&tree, dir.path(), Selection::First)?;
//! assert_eq!(reports.len(), 1);
//! assert!(dir.path().join("demo/src/main.rs").is_file());
//! # Ok(())
//! # }
//! ```
//!
//! A mapping with any key starting with `@` is written as a single file
//! holding the mapping as compact JSON:
//!
//! ```
//! use treeform::{decode_str, Node};
//! # fn main() -> Result<(), treeform::Error> {
//! let tree = decode_str(r#"{"demo": {"conf.json": {"@v": 1, "k": "x"}}}"#)?;
//! let demo = tree.get("demo").and_then(|v| v.as_mapping()).cloned().unwrap_or_default();
//! let node = treeform::Directory::from_mapping(&demo);
//! let conf = node.get("conf.json").and_then(Node::as_file).map(|f| f.content().to_string());
//! assert_eq!(conf.as_deref(), Some(r#"{"@v":1,"k":"x"}"#));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorCategory, Pos, Result, XmlError, XmlErrorKind};

pub mod value;
pub use value::{Mapping, Number, Value, ATTRIBUTE_MARKER};

pub mod node;
pub use node::{Directory, File, Node};

pub mod detect;
pub use detect::{detect_format_from_path, sniff, Format, Strategy};

pub mod decode;
pub use decode::{decode_path, decode_str, DecodeConfig, Decoded, Decoder};

pub mod xml;

pub mod project;
pub use project::{select_projects, Project, Selection};

pub mod materialize;
pub use materialize::{build_projects, MaterializeOptions, Materializer, ProjectReport, Summary};

pub mod scan;
pub use scan::scan;
