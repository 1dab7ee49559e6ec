//! Fold XML events into the canonical tree

use indexmap::IndexMap;

use crate::error::{XmlError, XmlErrorKind};
use crate::value::{Mapping, Value, ATTRIBUTE_MARKER};
use crate::xml::reader::{Event, Reader};

/// Key holding the text of an element that also carries attributes
pub const TEXT_KEY: &str = "#text";

/// Decode an XML document into `{rootName: rootValue}`.
///
/// An element without child elements becomes its trimmed text. An element
/// with children becomes a mapping keyed by child tag name and its own text
/// is dropped. Attributes become `@name` keys, which marks the element for
/// materialization as a single file.
///
/// `max_depth` bounds element nesting; 0 means unlimited.
pub fn decode(input: &[u8], max_depth: u16) -> Result<Value, XmlError> {
    let mut reader = Reader::new(input);

    let (name, attributes) = loop {
        match reader.next_event()? {
            Some(Event::Start { name, attributes }) => break (name, attributes),
            Some(_) => continue,
            None => return Err(reader.error(XmlErrorKind::EmptyDocument)),
        }
    };

    let value = parse_element(&mut reader, attributes, 1, max_depth)?;

    while let Some(event) = reader.next_event()? {
        if let Event::Start { name, .. } = event {
            return Err(reader.error(XmlErrorKind::MultipleRoots { name }));
        }
    }

    let mut root = Mapping::with_capacity(1);
    root.insert(name, value);
    Ok(Value::Mapping(root))
}

fn parse_element(
    reader: &mut Reader<'_>,
    attributes: IndexMap<String, String>,
    depth: u16,
    max_depth: u16,
) -> Result<Value, XmlError> {
    if max_depth != 0 && depth > max_depth {
        return Err(reader.error(XmlErrorKind::MaxDepthExceeded { max: max_depth }));
    }

    let mut children = Mapping::new();
    let mut has_children = false;
    let mut text = String::new();

    loop {
        match reader.next_event()? {
            Some(Event::Start {
                name,
                attributes: child_attributes,
            }) => {
                has_children = true;
                let child =
                    parse_element(reader, child_attributes, depth.saturating_add(1), max_depth)?;
                // A repeated sibling replaces the earlier one.
                children.insert(name, child);
            }
            Some(Event::Text(run)) => text.push_str(run.trim()),
            Some(Event::End { .. }) => break,
            None => return Err(reader.error(XmlErrorKind::UnexpectedEof { open: None })),
        }
    }

    if attributes.is_empty() {
        return Ok(if has_children {
            Value::Mapping(children)
        } else {
            Value::String(text)
        });
    }

    let mut mapping = Mapping::with_capacity(attributes.len() + children.len() + 1);
    for (key, value) in attributes {
        mapping.insert(format!("{ATTRIBUTE_MARKER}{key}"), value);
    }
    if has_children {
        for (key, value) in children {
            mapping.insert(key, value);
        }
    } else if !text.is_empty() {
        mapping.insert(TEXT_KEY, text);
    }
    Ok(Value::Mapping(mapping))
}
