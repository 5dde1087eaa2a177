//! Metadata value model shared by the EMMA (source) and Internet Archive
//! (target) schemas.
//!
//! Both schemas are flat string-keyed maps whose values are a scalar string,
//! a boolean flag, or a sequence of strings. A field is only ever carried
//! when its value is present: empty text and empty sequences are blank, while
//! a flag is a value either way (`Flag(false)` is data, not absence).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single metadata field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

/// Flat field-name to value map, in either schema.
pub type MetadataMap = BTreeMap<String, MetadataValue>;

impl MetadataValue {
    /// Whether this value counts as "no data".
    pub fn is_blank(&self) -> bool {
        match self {
            MetadataValue::Text(text) => text.is_empty(),
            MetadataValue::List(items) => items.is_empty(),
            MetadataValue::Flag(_) => false,
        }
    }

    pub fn is_present(&self) -> bool {
        !self.is_blank()
    }

    /// Coerce to a sequence of strings: scalars become one-element lists,
    /// blank values become empty lists.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            MetadataValue::Text(text) if text.is_empty() => Vec::new(),
            MetadataValue::Text(text) => vec![text.clone()],
            MetadataValue::Flag(flag) => vec![flag.to_string()],
            MetadataValue::List(items) => items.clone(),
        }
    }

    /// The scalar text of this value, if it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(text: &str) -> Self {
        MetadataValue::Text(text.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(text: String) -> Self {
        MetadataValue::Text(text)
    }
}

impl From<bool> for MetadataValue {
    fn from(flag: bool) -> Self {
        MetadataValue::Flag(flag)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(items: Vec<String>) -> Self {
        MetadataValue::List(items)
    }
}
