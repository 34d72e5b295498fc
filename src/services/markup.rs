// src/services/markup.rs

//! Generic XML tree.
//!
//! Converts markup text into a nested tree of [`XmlNode`]s that mirrors the
//! element structure. Knows nothing about the sign feed schema; that is the
//! job of [`crate::pipeline::extract`].

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{AppError, Result};

/// One element of a parsed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    /// Trimmed text content; whitespace-only text is dropped
    pub text: Option<String>,

    pub attributes: BTreeMap<String, String>,

    /// Child elements grouped by qualified name, in document order
    pub children: BTreeMap<String, Vec<XmlNode>>,
}

impl XmlNode {
    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.get(name).and_then(|nodes| nodes.first())
    }

    /// All children with the given name; a single element is a one-item slice.
    pub fn children_named(&self, name: &str) -> &[XmlNode] {
        self.children.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Follow a path of first-children.
    pub fn descend(&self, path: &[&str]) -> Option<&XmlNode> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    /// Text of the named child, if both exist.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|n| n.text.as_deref())
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }

    fn push_child(&mut self, name: String, node: XmlNode) {
        self.children.entry(name).or_default().push(node);
    }
}

/// Parse markup into a tree.
///
/// The returned node is a synthetic document root whose only child is the
/// document element.
pub fn parse_document(markup: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<(String, XmlNode)> = vec![(String::new(), XmlNode::default())];

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let (name, node) = open_element(&start)?;
                stack.push((name, node));
            }
            Event::Empty(start) => {
                let (name, node) = open_element(&start)?;
                current(&mut stack).push_child(name, node);
            }
            Event::End(_) => {
                // quick-xml already rejects mismatched end tags
                if stack.len() < 2 {
                    return Err(AppError::structure("unbalanced end tag"));
                }
                if let Some((name, node)) = stack.pop() {
                    current(&mut stack).push_child(name, node);
                }
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                current(&mut stack).push_text(&text);
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                current(&mut stack).push_text(text.trim());
            }
            Event::Eof => break,
            // Declarations, comments and processing instructions
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(AppError::structure(format!(
            "document ended inside <{}>",
            stack.last().map(|(name, _)| name.as_str()).unwrap_or_default()
        )));
    }

    let (_, root) = stack.remove(0);
    if root.children.is_empty() {
        return Err(AppError::structure("document has no root element"));
    }
    Ok(root)
}

fn current(stack: &mut [(String, XmlNode)]) -> &mut XmlNode {
    // The synthetic root is never popped while elements are open
    &mut stack[stack.len() - 1].1
}

fn open_element(start: &BytesStart<'_>) -> Result<(String, XmlNode)> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut node = XmlNode::default();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        node.attributes.insert(key, value);
    }
    Ok((name, node))
}
