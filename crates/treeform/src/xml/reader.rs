//! Pull-style XML event reader

use indexmap::IndexMap;

use crate::error::{XmlError, XmlErrorKind};
use crate::xml::cursor::Cursor;

/// Event produced by [`Reader::next_event`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Opening tag. Names are local names with any namespace prefix removed.
    Start {
        name: String,
        attributes: IndexMap<String, String>,
    },
    /// Character data, entities decoded. CDATA sections arrive here too.
    Text(String),
    /// Closing tag; self-closing elements produce one right after `Start`
    End { name: String },
}

/// XML reader over a byte slice
#[derive(Debug)]
pub struct Reader<'a> {
    cursor: Cursor<'a>,
    open: Vec<String>,
    pending_end: Option<String>,
}

impl<'a> Reader<'a> {
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(input),
            open: Vec::new(),
            pending_end: None,
        }
    }

    /// Next event, or `None` at the end of a balanced document.
    ///
    /// Declarations, processing instructions, comments and doctypes are
    /// skipped. Reaching the end of input with an element still open is an
    /// error, as is a closing tag that does not match the innermost open one.
    pub fn next_event(&mut self) -> Result<Option<Event>, XmlError> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Some(Event::End { name }));
        }

        loop {
            match self.cursor.current() {
                None => {
                    return match self.open.last() {
                        Some(name) => Err(self.error(XmlErrorKind::UnexpectedEof {
                            open: Some(name.clone()),
                        })),
                        None => Ok(None),
                    };
                }
                Some(b'<') => {
                    if self.cursor.starts_with(b"<?") {
                        self.cursor.advance_by(2);
                        self.skip_until(b"?>")?;
                    } else if self.cursor.starts_with(b"<!--") {
                        self.cursor.advance_by(4);
                        self.skip_until(b"-->")?;
                    } else if self.cursor.starts_with(b"<![CDATA[") {
                        self.cursor.advance_by(9);
                        return self.parse_cdata().map(Some);
                    } else if self.cursor.starts_with(b"<!") {
                        self.cursor.advance_by(2);
                        self.skip_declaration()?;
                    } else if self.cursor.starts_with(b"</") {
                        return self.parse_end_tag().map(Some);
                    } else {
                        return self.parse_start_tag().map(Some);
                    }
                }
                Some(_) => return self.parse_text().map(Some),
            }
        }
    }

    /// Build an error at the current position
    pub fn error(&self, kind: XmlErrorKind) -> XmlError {
        XmlError::new(kind, self.cursor.position())
    }

    fn parse_start_tag(&mut self) -> Result<Event, XmlError> {
        self.cursor.advance();
        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.current() == Some(b'/') {
            self.cursor.advance();
            self.expect_byte(b'>', "`>` after `/`")?;
            self.pending_end = Some(local_name(&name).to_string());
        } else {
            self.expect_byte(b'>', "`>`")?;
            self.open.push(name.clone());
        }

        Ok(Event::Start {
            name: local_name(&name).to_string(),
            attributes,
        })
    }

    fn parse_end_tag(&mut self) -> Result<Event, XmlError> {
        self.cursor.advance_by(2);
        let name = self.parse_name()?;
        self.cursor.skip_whitespace();
        self.expect_byte(b'>', "`>`")?;

        match self.open.pop() {
            Some(open) if open == name => Ok(Event::End {
                name: local_name(&name).to_string(),
            }),
            Some(open) => Err(self.error(XmlErrorKind::MismatchedTag {
                expected: open,
                found: name,
            })),
            None => Err(self.error(XmlErrorKind::UnexpectedClosingTag { name })),
        }
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>, XmlError> {
        let mut attrs = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) => {}
                None => {
                    return Err(self.error(XmlErrorKind::UnexpectedEof { open: None }));
                }
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=', "`=` after attribute name")?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            // Namespace declarations are not data.
            if name == "xmlns" || name.starts_with("xmlns:") {
                continue;
            }
            let local = local_name(&name).to_string();
            if attrs.contains_key(&local) {
                return Err(self.error(XmlErrorKind::DuplicateAttribute { name: local }));
            }
            attrs.insert(local, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String, XmlError> {
        let quote = match self.cursor.current() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(self.error(XmlErrorKind::UnexpectedToken {
                    expected: "quoted attribute value",
                }))
            }
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = self.utf8(raw)?;
                return self.decode_entities(&text);
            }
            self.cursor.advance();
        }

        Err(self.error(XmlErrorKind::UnexpectedEof { open: None }))
    }

    fn parse_text(&mut self) -> Result<Event, XmlError> {
        let raw = self.cursor.take_while(|b| b != b'<');
        let text = self.utf8(raw)?;
        Ok(Event::Text(self.decode_entities(&text)?))
    }

    fn parse_cdata(&mut self) -> Result<Event, XmlError> {
        let raw = self
            .cursor
            .take_until(b"]]>")
            .ok_or_else(|| self.error(XmlErrorKind::UnexpectedEof { open: None }))?;
        Ok(Event::Text(self.utf8(raw)?))
    }

    fn parse_name(&mut self) -> Result<String, XmlError> {
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(b) if is_name_start(b) => self.cursor.advance(),
            Some(_) => return Err(self.error(XmlErrorKind::InvalidName)),
            None => return Err(self.error(XmlErrorKind::UnexpectedEof { open: None })),
        }
        self.cursor.take_while(is_name_char);

        let raw = self.cursor.slice_from(start);
        self.utf8(raw)
    }

    /// Skip a `<!DOCTYPE ...>` style declaration, including an internal
    /// subset in brackets.
    fn skip_declaration(&mut self) -> Result<(), XmlError> {
        let mut depth = 0usize;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match b {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(self.error(XmlErrorKind::UnexpectedEof { open: None }))
    }

    fn skip_until(&mut self, terminator: &[u8]) -> Result<(), XmlError> {
        match self.cursor.take_until(terminator) {
            Some(_) => Ok(()),
            None => Err(self.error(XmlErrorKind::UnexpectedEof { open: None })),
        }
    }

    fn expect_byte(&mut self, expected: u8, what: &'static str) -> Result<(), XmlError> {
        if self.cursor.current() == Some(expected) {
            self.cursor.advance();
            Ok(())
        } else if self.cursor.is_eof() {
            Err(self.error(XmlErrorKind::UnexpectedEof { open: None }))
        } else {
            Err(self.error(XmlErrorKind::UnexpectedToken { expected: what }))
        }
    }

    fn utf8(&self, bytes: &[u8]) -> Result<String, XmlError> {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| self.error(XmlErrorKind::InvalidUtf8))
    }

    fn decode_entities(&self, input: &str) -> Result<String, XmlError> {
        if !input.contains('&') {
            return Ok(input.to_string());
        }

        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars();
        while let Some(ch) = chars.next() {
            if ch != '&' {
                result.push(ch);
                continue;
            }

            let mut entity = String::new();
            let mut terminated = false;
            for next in chars.by_ref() {
                if next == ';' {
                    terminated = true;
                    break;
                }
                entity.push(next);
            }

            let decoded = match entity.as_str() {
                _ if !terminated => None,
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => decode_numeric_entity(&entity),
            };

            match decoded {
                Some(ch) => result.push(ch),
                None => return Err(self.error(XmlErrorKind::InvalidEntity { entity })),
            }
        }

        Ok(result)
    }
}

/// Strip a namespace prefix: `svg:rect` becomes `rect`
fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &str) -> Result<Vec<Event>, XmlError> {
        let mut reader = Reader::new(input.as_bytes());
        let mut out = Vec::new();
        while let Some(event) = reader.next_event()? {
            out.push(event);
        }
        Ok(out)
    }

    fn start(name: &str) -> Event {
        Event::Start {
            name: name.to_string(),
            attributes: IndexMap::new(),
        }
    }

    fn end(name: &str) -> Event {
        Event::End {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_simple_element() -> Result<(), XmlError> {
        let got = events("<root>text</root>")?;
        assert_eq!(
            got,
            vec![start("root"), Event::Text("text".to_string()), end("root")]
        );
        Ok(())
    }

    #[test]
    fn test_self_closing_yields_start_and_end() -> Result<(), XmlError> {
        let got = events("<root><child /></root>")?;
        assert_eq!(got, vec![start("root"), start("child"), end("child"), end("root")]);
        Ok(())
    }

    #[test]
    fn test_attributes_and_namespaces() -> Result<(), XmlError> {
        let got = events(r#"<a:root xmlns:a="urn:x" id="1" b:mode='exec'></a:root>"#)?;
        let mut attributes = IndexMap::new();
        attributes.insert("id".to_string(), "1".to_string());
        attributes.insert("mode".to_string(), "exec".to_string());
        assert_eq!(
            got,
            vec![
                Event::Start {
                    name: "root".to_string(),
                    attributes,
                },
                end("root"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_prolog_comments_and_doctype_skipped() -> Result<(), XmlError> {
        let input = "<?xml version=\"1.0\"?>\n<!DOCTYPE root [<!ELEMENT root ANY>]>\n<!-- hi --><root/>";
        let got = events(input)?;
        let non_text: Vec<_> = got
            .into_iter()
            .filter(|e| !matches!(e, Event::Text(_)))
            .collect();
        assert_eq!(non_text, vec![start("root"), end("root")]);
        Ok(())
    }

    #[test]
    fn test_cdata_and_entities() -> Result<(), XmlError> {
        let got = events("<a>x &amp; y<![CDATA[<raw>]]>&#65;&#x42;</a>")?;
        assert_eq!(
            got,
            vec![
                start("a"),
                Event::Text("x & y".to_string()),
                Event::Text("<raw>".to_string()),
                Event::Text("AB".to_string()),
                end("a"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_mismatched_tag() {
        let err = events("<a><b></a></b>").err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(XmlErrorKind::MismatchedTag {
                expected: "b".to_string(),
                found: "a".to_string(),
            })
        );
    }

    #[test]
    fn test_unexpected_eof_inside_element() {
        let err = events("<a><b>text</b>").err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(XmlErrorKind::UnexpectedEof {
                open: Some("a".to_string())
            })
        );
    }

    #[test]
    fn test_stray_closing_tag() {
        let err = events("</a>").err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(XmlErrorKind::UnexpectedClosingTag {
                name: "a".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_entity() {
        let err = events("<a>&bogus;</a>").err();
        assert!(matches!(
            err.as_ref().map(XmlError::kind),
            Some(XmlErrorKind::InvalidEntity { entity }) if entity == "bogus"
        ));
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = events(r#"<a x="1" x="2"/>"#).err();
        assert!(matches!(
            err.as_ref().map(XmlError::kind),
            Some(XmlErrorKind::DuplicateAttribute { .. })
        ));
    }

    #[test]
    fn test_error_position() {
        let err = events("<a>\n  <b></c>\n</a>").err();
        let pos = err.map(|e| e.pos());
        assert_eq!(pos.map(|p| p.line), Some(2));
    }
}
