//! Input format detection

use std::fmt;
use std::path::Path;

/// Number of leading bytes inspected by [`sniff`] by default
pub const DEFAULT_SNIFF_LEN: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Yaml,
    Xml,
}

impl Format {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Xml => "XML",
        }
    }

    /// Map a file extension (without the dot) to a format
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the decoder picks a parser when no format is given explicitly
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Look at the leading bytes only, see [`sniff`]
    #[default]
    Sniff,
    /// Parse the whole document as JSON, then XML, then YAML and keep the
    /// first result that is a mapping
    Probe,
}

/// Order tried by [`Strategy::Probe`]. YAML accepts almost any text, so it
/// goes last.
pub const PROBE_ORDER: [Format; 3] = [Format::Json, Format::Xml, Format::Yaml];

/// Guess the format from the leading bytes of a document.
///
/// First match wins:
/// 1. starts with `{` after leading whitespace: JSON
/// 2. contains `---` or `:` anywhere: YAML
/// 3. starts with `<` after leading whitespace: XML
///
/// Rule 2 is deliberately loose. YAML is permissive enough that nearly any
/// text that is neither JSON nor XML parses as YAML, and XML whose prefix
/// happens to contain a colon (a namespace, a URL) is routed to YAML too.
/// Use [`Strategy::Probe`] or an explicit format when that matters.
pub fn sniff(prefix: &[u8]) -> Option<Format> {
    let trimmed = prefix.trim_ascii_start();
    if trimmed.starts_with(b"{") {
        Some(Format::Json)
    } else if contains(prefix, b"---") || prefix.contains(&b':') {
        Some(Format::Yaml)
    } else if trimmed.starts_with(b"<") {
        Some(Format::Xml)
    } else {
        None
    }
}

/// Format implied by a file extension, if any
pub fn detect_format_from_path(path: impl AsRef<Path>) -> Option<Format> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(Format::from_extension)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_json() {
        assert_eq!(sniff(br#"{"a": "b"}"#), Some(Format::Json));
        assert_eq!(sniff(b"  \n\t{"), Some(Format::Json));
    }

    #[test]
    fn test_sniff_json_wins_over_yaml_markers() {
        assert_eq!(sniff(b"{ not: json ---"), Some(Format::Json));
    }

    #[test]
    fn test_sniff_yaml() {
        assert_eq!(sniff(b"app:\n  a: b\n"), Some(Format::Yaml));
        assert_eq!(sniff(b"---\n"), Some(Format::Yaml));
    }

    #[test]
    fn test_sniff_xml() {
        assert_eq!(sniff(b"<app><a>b</a></app>"), Some(Format::Xml));
        assert_eq!(sniff(b"\n  <?xml version=\"1.0\"?><app/>"), Some(Format::Xml));
    }

    #[test]
    fn test_sniff_xml_with_colon_goes_to_yaml() {
        assert_eq!(sniff(b"<app><url>http://x</url></app>"), Some(Format::Yaml));
    }

    #[test]
    fn test_sniff_unrecognized() {
        assert_eq!(sniff(b"just some words"), None);
        assert_eq!(sniff(b""), None);
        assert_eq!(sniff(b"   "), None);
    }

    #[test]
    fn test_format_display() {
        assert_eq!(Format::Json.to_string(), "JSON");
        assert_eq!(Format::Yaml.to_string(), "YAML");
        assert_eq!(Format::Xml.to_string(), "XML");
    }
}
