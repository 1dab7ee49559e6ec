//! Error types for treeform

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Position in XML source
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

/// What went wrong while reading an XML document
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlErrorKind {
    EmptyDocument,
    UnexpectedEof { open: Option<String> },
    UnexpectedToken { expected: &'static str },
    MismatchedTag { expected: String, found: String },
    UnexpectedClosingTag { name: String },
    InvalidName,
    InvalidEntity { entity: String },
    InvalidUtf8,
    DuplicateAttribute { name: String },
    MultipleRoots { name: String },
    MaxDepthExceeded { max: u16 },
}

impl fmt::Display for XmlErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDocument => write!(f, "empty XML document"),
            Self::UnexpectedEof { open: Some(name) } => {
                write!(f, "unexpected end of input inside <{name}>")
            }
            Self::UnexpectedEof { open: None } => write!(f, "unexpected end of input"),
            Self::UnexpectedToken { expected } => write!(f, "expected {expected}"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "expected </{expected}>, found </{found}>")
            }
            Self::UnexpectedClosingTag { name } => write!(f, "unexpected closing tag </{name}>"),
            Self::InvalidName => write!(f, "invalid name"),
            Self::InvalidEntity { entity } => write!(f, "invalid entity &{entity};"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute `{name}`"),
            Self::MultipleRoots { name } => {
                write!(f, "second top-level element <{name}>; only one root is allowed")
            }
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
        }
    }
}

/// Syntax error reported by the XML reader
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{kind} at {pos}")]
pub struct XmlError {
    kind: XmlErrorKind,
    pos: Pos,
}

impl XmlError {
    pub const fn new(kind: XmlErrorKind, pos: Pos) -> Self {
        Self { kind, pos }
    }

    pub fn kind(&self) -> &XmlErrorKind {
        &self.kind
    }

    pub const fn pos(&self) -> Pos {
        self.pos
    }
}

/// Coarse grouping of [`Error`] variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or unreadable input
    Input,
    /// No recognizable format signature
    Format,
    /// Malformed JSON, YAML or XML
    Syntax,
    /// Well-formed input with the wrong structure
    Shape,
    /// Directory creation or file write failure
    Filesystem,
}

/// Main error type for treeform
#[derive(Error, Debug)]
pub enum Error {
    #[error("input file '{}' does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read input")]
    Io(#[from] io::Error),

    #[error("unable to detect structure format{}", describe_attempts(.attempts))]
    UnrecognizedFormat { attempts: Vec<String> },

    #[error("invalid JSON")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid XML")]
    Xml(#[from] XmlError),

    #[error("structure is not a mapping (found {found})")]
    NotAMapping { found: &'static str },

    #[error("project '{name}' is not a mapping")]
    ProjectNotMapping { name: String },

    #[error("structure does not contain a project")]
    NoProject,

    #[error("failed to create directory '{}'", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write file '{}'", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to scan '{}'", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } | Self::Read { .. } | Self::Io(_) => ErrorCategory::Input,
            Self::UnrecognizedFormat { .. } => ErrorCategory::Format,
            Self::Json(_) | Self::Yaml(_) | Self::Xml(_) => ErrorCategory::Syntax,
            Self::NotAMapping { .. } | Self::ProjectNotMapping { .. } | Self::NoProject => {
                ErrorCategory::Shape
            }
            Self::CreateDir { .. } | Self::WriteFile { .. } | Self::Scan { .. } => {
                ErrorCategory::Filesystem
            }
        }
    }

    /// Render the error together with its source chain on one line
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

fn describe_attempts(attempts: &[String]) -> String {
    if attempts.is_empty() {
        String::new()
    } else {
        format!(" ({})", attempts.join("; "))
    }
}

/// Result type alias for treeform
pub type Result<T> = std::result::Result<T, Error>;
