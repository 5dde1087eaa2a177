//! The submission data model: one staged submission and the table of all
//! submissions discovered in a bucket.
//!
//! A submission is a pair of object keys sharing one identifier: the
//! metadata package (an `.xml` object) and the content data file (anything
//! else). The table groups keys by identifier as discovery walks the bucket
//! listing; entries come into existence on first reference and are mutated in
//! place by the later pipeline stages.

use tracing::error;

use crate::metadata::MetadataMap;

/// The role an object key plays within its submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Package,
    DataFile,
}

impl Role {
    /// Classify an object key. Package objects end in `.xml` exactly
    /// (case-sensitive); everything else is submission content.
    pub fn of(key: &str) -> Role {
        if key.ends_with(".xml") {
            Role::Package
        } else {
            Role::DataFile
        }
    }

    fn label(self) -> &'static str {
        match self {
            Role::Package => "package",
            Role::DataFile => "data_file",
        }
    }
}

/// Derive the submission identifier from an object key by removing the
/// trailing `.<extension>`. A key without an extension is used whole.
pub fn submission_id(key: &str) -> &str {
    match key.rfind('.') {
        Some(dot) if dot + 1 < key.len() => &key[..dot],
        _ => key,
    }
}

/// One staged submission: its constituent object keys plus the dynamic state
/// accumulated while processing it.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Object key of the metadata package, once discovered.
    pub package_key: Option<String>,
    /// Object key of the content data file, once discovered.
    pub data_key: Option<String>,
    /// Extracted EMMA metadata, once parsed.
    pub metadata: Option<MetadataMap>,
    /// Whether the submission has been transmitted to the archive.
    pub completed: bool,
}

impl Submission {
    /// Assign an object key to a role slot. The first key wins: assigning a
    /// role that is already filled returns false and leaves the slot alone.
    pub fn assign(&mut self, role: Role, key: &str) -> bool {
        let slot = match role {
            Role::Package => &mut self.package_key,
            Role::DataFile => &mut self.data_key,
        };
        if slot.is_some() {
            false
        } else {
            *slot = Some(key.to_string());
            true
        }
    }

    /// Both object keys, for deletion accounting.
    pub fn keys(&self) -> Vec<String> {
        self.package_key
            .iter()
            .chain(self.data_key.iter())
            .cloned()
            .collect()
    }
}

/// Table of submissions keyed by submission identifier.
#[derive(Debug, Default)]
pub struct SubmissionTable {
    entries: std::collections::BTreeMap<String, Submission>,
}

impl SubmissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-insert access: referencing an unknown identifier creates an
    /// empty submission for it.
    pub fn entry(&mut self, sid: &str) -> &mut Submission {
        self.entries.entry(sid.to_string()).or_default()
    }

    pub fn get(&self, sid: &str) -> Option<&Submission> {
        self.entries.get(sid)
    }

    /// File a discovered object key under its submission and role. A second
    /// key for an already-filled role is an integrity error: it is logged and
    /// the first key is retained.
    pub fn insert_key(&mut self, key: &str) {
        let sid = submission_id(key).to_string();
        let role = Role::of(key);
        if !self.entry(&sid).assign(role, key) {
            error!(
                submission = %sid,
                key = %key,
                role = role.label(),
                "{} already found for \"{}\"", role.label(), sid
            );
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Submission)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Submission)> {
        self.entries.iter_mut()
    }

    pub fn submission_ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
