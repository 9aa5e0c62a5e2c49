//! Namespace scope - a named partition of reference records
//!
//! Each scope tracks three ordered collections:
//! - Unique records (checked for duplicate identities)
//! - Producers (candidates for consumers to link to)
//! - Consumers (candidates for producers to link to)

use crate::record::RecordId;
use std::fmt;

/// Handle to a namespace, in creation order.
///
/// Only meaningful in the registry that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(pub usize);

impl NamespaceId {
    /// The namespace a registry starts in
    pub fn root() -> Self {
        Self(0)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns{}", self.0)
    }
}

/// Records registered under one namespace name
#[derive(Debug, Clone, Default)]
pub struct NamespaceScope {
    name: String,
    unique: Vec<RecordId>,
    producers: Vec<RecordId>,
    consumers: Vec<RecordId>,
}

impl NamespaceScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique(&self) -> &[RecordId] {
        &self.unique
    }

    pub fn producers(&self) -> &[RecordId] {
        &self.producers
    }

    pub fn consumers(&self) -> &[RecordId] {
        &self.consumers
    }

    pub fn is_empty(&self) -> bool {
        self.unique.is_empty() && self.producers.is_empty() && self.consumers.is_empty()
    }

    pub(crate) fn add_unique(&mut self, id: RecordId) {
        self.unique.push(id);
    }

    pub(crate) fn add_producer(&mut self, id: RecordId) {
        self.producers.push(id);
    }

    pub(crate) fn add_consumer(&mut self, id: RecordId) {
        self.consumers.push(id);
    }
}

/// Run-wide indices mirroring records that opted into global visibility.
///
/// These hold the same handles as the namespace scopes, never copies.
#[derive(Debug, Clone, Default)]
pub struct GlobalIndex {
    pub(crate) unique: Vec<RecordId>,
    pub(crate) producers: Vec<RecordId>,
    pub(crate) consumers: Vec<RecordId>,
}

impl GlobalIndex {
    pub fn unique(&self) -> &[RecordId] {
        &self.unique
    }

    pub fn producers(&self) -> &[RecordId] {
        &self.producers
    }

    pub fn consumers(&self) -> &[RecordId] {
        &self.consumers
    }
}
