//! Issue report - end-of-pass findings for links that never happened
//!
//! Findings are advisory. The caller merges them into the rest of the
//! document's validation results.

pub mod table;

use crate::record::RecordId;
use serde_json::Value;
use std::fmt;

pub use table::IssueTable;

/// Kind of unresolved reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Consumer with no linked producer
    NoProvider,
    /// Producer with no linked consumer and no orphan allowance
    NoConsumer,
}

impl IssueKind {
    pub fn message(&self) -> &'static str {
        match self {
            IssueKind::NoProvider => "no provider found",
            IssueKind::NoConsumer => "producer has no consumer",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// A single finding about an unlinked record
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceIssue {
    pub kind: IssueKind,
    /// `"{namespace} > {record path}"`
    pub path: String,
    pub namespace: String,
    pub record: RecordId,
    pub reference_name: String,
    pub value: Value,
}

impl ReferenceIssue {
    pub fn message(&self) -> &'static str {
        self.kind.message()
    }
}

impl fmt::Display for ReferenceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message())
    }
}

/// Ordered findings from one sweep, grouped by namespace creation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueReport {
    issues: Vec<ReferenceIssue>,
}

impl IssueReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, issue: ReferenceIssue) {
        self.issues.push(issue);
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReferenceIssue> {
        self.issues.iter()
    }

    pub fn issues(&self) -> &[ReferenceIssue] {
        &self.issues
    }

    /// Consumers that never found a producer
    pub fn unresolved_consumers(&self) -> impl Iterator<Item = &ReferenceIssue> {
        self.of_kind(IssueKind::NoProvider)
    }

    /// Producers that nothing consumed
    pub fn orphan_producers(&self) -> impl Iterator<Item = &ReferenceIssue> {
        self.of_kind(IssueKind::NoConsumer)
    }

    fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &ReferenceIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    /// Render as a rounded table
    pub fn to_table(&self) -> String {
        let mut table = IssueTable::new();
        for issue in &self.issues {
            table.add_issue(issue);
        }
        table.build()
    }
}

impl IntoIterator for IssueReport {
    type Item = ReferenceIssue;
    type IntoIter = std::vec::IntoIter<ReferenceIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

impl<'a> IntoIterator for &'a IssueReport {
    type Item = &'a ReferenceIssue;
    type IntoIter = std::slice::Iter<'a, ReferenceIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

impl fmt::Display for IssueReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.issues {
            writeln!(f, "{}", issue)?;
        }
        Ok(())
    }
}
