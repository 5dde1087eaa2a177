//! Submission information package parsing.
//!
//! A package is a small XML document whose root's immediate children are the
//! EMMA metadata fields. Element names may carry a namespace prefix, which is
//! stripped; leaf text reading exactly `true` or `false` (case-insensitive)
//! becomes a flag; an element with child elements becomes the sequence of its
//! children's present values. Blank fields are omitted from the result.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

use crate::metadata::{MetadataMap, MetadataValue};

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("malformed package XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Parsed element tree node. Only the pieces the field extraction needs.
#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

/// Parse raw package XML bytes into EMMA metadata values.
///
/// Tolerates an empty document and elements without text; only malformed XML
/// is an error.
pub fn parse_package(xml: &[u8]) -> Result<MetadataMap, PackageError> {
    let root = read_tree(xml)?;
    let mut result = MetadataMap::new();
    for field in &root.children {
        if let Some(value) = node_value(field) {
            if value.is_present() {
                result.insert(field.name.clone(), value);
            }
        }
    }
    Ok(result)
}

/// Fold the event stream into a node tree. The returned node is a synthetic
/// document node whose children are the document's top-level elements.
fn read_tree(xml: &[u8]) -> Result<Node, PackageError> {
    let mut reader = Reader::from_reader(xml);
    let mut stack = vec![Node::default()];
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                stack.push(Node {
                    name: local_name(start.local_name().as_ref()),
                    ..Node::default()
                });
            }
            Event::Empty(empty) => {
                let node = Node {
                    name: local_name(empty.local_name().as_ref()),
                    ..Node::default()
                };
                push_child(&mut stack, node);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    let node = stack.pop().expect("element stack underflow");
                    push_child(&mut stack, node);
                }
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Event::CData(cdata) => {
                if let Some(node) = stack.last_mut() {
                    node.text
                        .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut document = stack.remove(0);
    // Unbalanced trailing elements are treated as closed at end of input;
    // quick-xml reports genuinely ill-formed nesting itself.
    for leftover in stack {
        document.children.push(leftover);
    }
    // Document node children are the root element(s); descend one level so
    // callers see the root's fields directly.
    Ok(match document.children.len() {
        1 => document.children.remove(0),
        _ => document,
    })
}

fn push_child(stack: &mut [Node], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// The tag name with any namespace prefix removed. `local_name()` already
/// drops a `prefix:`; this also covers expanded `{uri}name` forms.
fn local_name(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    match name.rfind('}') {
        Some(end) => name[end + 1..].to_string(),
        None => name.into_owned(),
    }
}

/// The value contained by one element node.
///
/// An element with children yields the sequence of its children's present
/// values (nested sequences flatten, flags contribute their textual form).
/// A leaf yields its text, with exact `true`/`false` mapped to a flag, or
/// nothing when there is no text at all.
fn node_value(node: &Node) -> Option<MetadataValue> {
    if !node.children.is_empty() {
        let mut items = Vec::new();
        for child in &node.children {
            match node_value(child) {
                Some(value) if value.is_present() => items.extend(value.to_list()),
                _ => {}
            }
        }
        return Some(MetadataValue::List(items));
    }
    let text = node.text.trim();
    if text.is_empty() {
        return None;
    }
    match text.to_lowercase().as_str() {
        "true" => Some(MetadataValue::Flag(true)),
        "false" => Some(MetadataValue::Flag(false)),
        _ => Some(MetadataValue::Text(text.to_string())),
    }
}
