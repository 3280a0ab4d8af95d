//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT
//!
//! Light XML element tree for XDB files

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};

/// One XML element with its attributes, text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XdbElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XdbElement>,
}

impl XdbElement {
    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let mut element = Self {
            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            ..Self::default()
        };
        for attr in e.attributes() {
            let attr = attr?;
            element.attributes.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                attr.unescape_value()?.into_owned(),
            ));
        }
        Ok(element)
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given tag.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XdbElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First element matching a slash-separated path of child tags.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&XdbElement> {
        path.split('/')
            .filter(|step| !step.is_empty())
            .try_fold(self, |element, step| element.child(step))
    }

    /// Every element matching a slash-separated path, in document order.
    #[must_use]
    pub fn find_all(&self, path: &str) -> Vec<&XdbElement> {
        path.split('/')
            .filter(|step| !step.is_empty())
            .fold(vec![self], |level, step| {
                level
                    .into_iter()
                    .flat_map(|element| element.children.iter().filter(move |c| c.name == step))
                    .collect()
            })
    }

    /// Trimmed text of the element at `path`; `None` if absent or empty.
    #[must_use]
    pub fn find_text(&self, path: &str) -> Option<&str> {
        self.find(path)
            .map(|element| element.text.trim())
            .filter(|text| !text.is_empty())
    }
}

/// Read and parse an XDB file from disk.
///
/// # Errors
/// Returns an error if the file cannot be read or has invalid XML.
pub fn read_xdb_tree<P: AsRef<Path>>(path: P) -> Result<XdbElement> {
    let content = fs::read_to_string(path)?;
    parse_xdb_tree(&content)
}

/// Parse XML into an element tree and return the root element.
///
/// # Errors
/// Returns an error if the XML is malformed or has no root element.
pub fn parse_xdb_tree(content: &str) -> Result<XdbElement> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XdbElement> = Vec::new();
    let mut root: Option<XdbElement> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(XdbElement::from_start(&e)?),
            Ok(Event::Empty(e)) => {
                let element = XdbElement::from_start(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = root.or(Some(element)),
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&e.unescape()?);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(_)) => {
                if let Some(completed) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(completed),
                        None => root = root.or(Some(completed)),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(e)),
            _ => {}
        }
        buf.clear();
    }

    root.ok_or_else(|| Error::MissingXdbField {
        path: "/".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Geometry>
  <binaryFile href="/Mechanics/Model.bin"/>
  <lods>
    <Item><size>1</size></Item>
    <Item><size> 2 </size></Item>
  </lods>
  <name>a &amp; b</name>
</Geometry>"#;

    #[test]
    fn test_parse_tree_and_queries() {
        let root = parse_xdb_tree(SAMPLE).unwrap();
        assert_eq!(root.name, "Geometry");
        assert_eq!(
            root.find("binaryFile").and_then(|e| e.attribute("href")),
            Some("/Mechanics/Model.bin")
        );
        assert_eq!(root.find_text("name"), Some("a & b"));
        assert_eq!(root.find_text("lods/Item/size"), Some("1"));

        let sizes: Vec<&str> = root
            .find_all("lods/Item")
            .into_iter()
            .filter_map(|item| item.find_text("size"))
            .collect();
        assert_eq!(sizes, vec!["1", "2"]);
        assert!(root.find("lods/Missing").is_none());
        assert!(root.find_all("nothing/here").is_empty());
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            parse_xdb_tree("<a><b></a>"),
            Err(Error::XmlError(_))
        ));
        assert!(matches!(parse_xdb_tree(""), Err(Error::MissingXdbField { .. })));
    }
}
