//! Format detection and decoding into the canonical tree

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, instrument};

use crate::detect::{sniff, Format, Strategy, DEFAULT_SNIFF_LEN, PROBE_ORDER};
use crate::error::{Error, Result};
use crate::value::{Mapping, Value};
use crate::xml;

/// Configuration for [`Decoder`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Leading bytes inspected when sniffing
    pub sniff_len: usize,
    /// Maximum XML element nesting (0 means unlimited). JSON and YAML rely on
    /// the recursion limits of their parsers.
    pub max_depth: u16,
    pub strategy: Strategy,
    /// Skip detection and parse as this format
    pub format: Option<Format>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            sniff_len: DEFAULT_SNIFF_LEN,
            max_depth: 128,
            strategy: Strategy::Sniff,
            format: None,
        }
    }
}

impl DecodeConfig {
    pub const fn with_sniff_len(mut self, sniff_len: usize) -> Self {
        self.sniff_len = sniff_len;
        self
    }

    pub const fn with_max_depth(mut self, max_depth: u16) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub const fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}

/// Result of a successful decode
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    /// Format the input was parsed as
    pub format: Format,
    pub tree: Mapping,
}

impl Decoded {
    pub fn into_tree(self) -> Mapping {
        self.tree
    }
}

/// Structure decoder
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    config: DecodeConfig,
}

impl Decoder {
    pub const fn new(config: DecodeConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Decode the file at `path`
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn decode_path(&self, path: impl AsRef<Path>) -> Result<Decoded> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let (prefix, bytes) =
            read_source(file, self.config.sniff_len).map_err(|source| Error::Read {
                path: path.to_path_buf(),
                source,
            })?;
        self.decode_parts(&prefix, &bytes)
    }

    /// Decode from a seekable reader.
    ///
    /// The sniffed prefix is read first, then the reader is rewound and read
    /// in full, so detection never eats bytes the parser needs.
    pub fn decode_reader<R: Read + Seek>(&self, reader: R) -> Result<Decoded> {
        let (prefix, bytes) = read_source(reader, self.config.sniff_len)?;
        self.decode_parts(&prefix, &bytes)
    }

    /// Decode an in-memory document
    pub fn decode_slice(&self, bytes: &[u8]) -> Result<Decoded> {
        let prefix = bytes.get(..self.config.sniff_len).unwrap_or(bytes);
        self.decode_parts(prefix, bytes)
    }

    pub fn decode_str(&self, input: &str) -> Result<Decoded> {
        self.decode_slice(input.as_bytes())
    }

    fn decode_parts(&self, prefix: &[u8], bytes: &[u8]) -> Result<Decoded> {
        let format = match (self.config.format, self.config.strategy) {
            (Some(format), _) => format,
            (None, Strategy::Sniff) => sniff(prefix).ok_or(Error::UnrecognizedFormat {
                attempts: Vec::new(),
            })?,
            (None, Strategy::Probe) => return self.probe(bytes),
        };
        debug!(%format, "decoding structure");

        let value = self.parse(format, bytes)?;
        let tree = into_mapping(value)?;
        Ok(Decoded { format, tree })
    }

    fn probe(&self, bytes: &[u8]) -> Result<Decoded> {
        let mut attempts = Vec::with_capacity(PROBE_ORDER.len());
        for format in PROBE_ORDER {
            match self.parse(format, bytes).and_then(into_mapping) {
                Ok(tree) => {
                    debug!(%format, "probe accepted format");
                    return Ok(Decoded { format, tree });
                }
                Err(err) => {
                    debug!(%format, error = %err.describe(), "probe rejected format");
                    attempts.push(format!("{format}: {}", err.describe()));
                }
            }
        }
        Err(Error::UnrecognizedFormat { attempts })
    }

    fn parse(&self, format: Format, bytes: &[u8]) -> Result<Value> {
        let value: Value = match format {
            Format::Json => serde_json::from_slice(bytes)?,
            Format::Yaml => serde_yaml::from_slice(bytes)?,
            Format::Xml => xml::decode(bytes, self.config.max_depth)?,
        };
        Ok(value)
    }
}

fn into_mapping(value: Value) -> Result<Mapping> {
    match value {
        Value::Mapping(tree) => Ok(tree),
        other => Err(Error::NotAMapping {
            found: other.kind_name(),
        }),
    }
}

fn read_source<R: Read + Seek>(mut reader: R, sniff_len: usize) -> io::Result<(Vec<u8>, Vec<u8>)> {
    let limit = u64::try_from(sniff_len).unwrap_or(u64::MAX);
    let mut prefix = Vec::new();
    reader.by_ref().take(limit).read_to_end(&mut prefix)?;

    reader.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok((prefix, bytes))
}

/// Decode the file at `path` with the default configuration
pub fn decode_path(path: impl AsRef<Path>) -> Result<Mapping> {
    Decoder::default().decode_path(path).map(Decoded::into_tree)
}

/// Decode a document with the default configuration
pub fn decode_str(input: &str) -> Result<Mapping> {
    Decoder::default().decode_str(input).map(Decoded::into_tree)
}
