//! Reference Registry - owns every record of a validation run
//!
//! The registry is an arena of [`ReferenceRecord`]s plus:
//! - Namespace scopes, kept in creation order
//! - A namespace cursor with an enter/exit stack for nested subtrees
//! - Global indices for records that opted into run-wide visibility
//!
//! Registration is incremental: every [`add_record`](ReferenceRegistry::add_record)
//! checks uniqueness and links the new record immediately. Only the final
//! [`get_unresolved_issues`](ReferenceRegistry::get_unresolved_issues) sweep
//! decides what never got linked.

use crate::config::RegistryConfig;
use crate::linker::{LinkOutcome, link};
use crate::record::{RecordId, ReferenceRecord};
use crate::report::{IssueKind, IssueReport, ReferenceIssue};
use crate::scope::{GlobalIndex, NamespaceId, NamespaceScope};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

#[derive(Debug)]
pub struct ReferenceRegistry {
    records: Vec<ReferenceRecord>,
    namespaces: IndexMap<String, NamespaceScope>,
    /// Namespace new records are registered in
    current: NamespaceId,
    /// Namespaces to return to on `exit_namespace`
    stack: Vec<NamespaceId>,
    global: GlobalIndex,
    config: RegistryConfig,
}

impl Default for ReferenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceRegistry {
    /// Create a registry with the default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let mut registry = Self {
            records: Vec::new(),
            namespaces: IndexMap::new(),
            current: NamespaceId::root(),
            stack: Vec::new(),
            global: GlobalIndex::default(),
            config,
        };
        let root = registry.config.root_namespace.clone();
        registry.current = registry.ensure_namespace(&root);
        registry
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // --- Namespaces ---

    /// Get or create the namespace called `name`
    pub fn ensure_namespace(&mut self, name: &str) -> NamespaceId {
        if let Some(index) = self.namespaces.get_index_of(name) {
            return NamespaceId(index);
        }

        let (index, _) = self
            .namespaces
            .insert_full(name.to_string(), NamespaceScope::new(name));
        tracing::debug!("Created namespace '{}'", name);
        NamespaceId(index)
    }

    /// Point the cursor at `name`, creating the namespace on first use.
    ///
    /// A no-op when `name` is already current.
    pub fn change_namespace(&mut self, name: &str) {
        if self.current_namespace() == name {
            return;
        }
        self.current = self.ensure_namespace(name);
    }

    /// Enter a nested namespace, remembering the current one
    pub fn enter_namespace(&mut self, name: &str) -> NamespaceId {
        let id = self.ensure_namespace(name);
        self.stack.push(self.current);
        self.current = id;
        id
    }

    /// Return to the namespace that was current before the last `enter_namespace`
    pub fn exit_namespace(&mut self) -> Result<NamespaceId> {
        let previous = self.stack.pop().ok_or(Error::NamespaceUnderflow)?;
        self.current = previous;
        Ok(previous)
    }

    pub fn current_namespace(&self) -> &str {
        self.namespaces[self.current.index()].name()
    }

    pub fn current_namespace_id(&self) -> NamespaceId {
        self.current
    }

    /// Nesting depth of `enter_namespace` calls still open
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn namespace(&self, name: &str) -> Option<&NamespaceScope> {
        self.namespaces.get(name)
    }

    pub fn namespace_id(&self, name: &str) -> Option<NamespaceId> {
        self.namespaces
            .get_index_of(name)
            .map(NamespaceId)
    }

    pub fn scope(&self, id: NamespaceId) -> Option<&NamespaceScope> {
        self.namespaces.get_index(id.index()).map(|(_, scope)| scope)
    }

    /// All namespaces in creation order
    pub fn namespaces(&self) -> impl Iterator<Item = &NamespaceScope> {
        self.namespaces.values()
    }

    pub fn global(&self) -> &GlobalIndex {
        &self.global
    }

    // --- Registration ---

    /// Register a record in the current namespace and link it
    pub fn add_record(&mut self, record: ReferenceRecord) -> Result<LinkOutcome> {
        self.add_record_in(self.current, record)
    }

    /// Validate a loosely-typed record and register it in the current namespace.
    ///
    /// Records without `options` get the configured default options.
    pub fn add_json_record(&mut self, raw: &Value) -> Result<LinkOutcome> {
        let defaults = self.config.default_options()?;
        let record = ReferenceRecord::from_json(raw, defaults)?;
        self.add_record(record)
    }

    /// Register a record in an explicit namespace, leaving the cursor alone.
    ///
    /// `namespace` must come from this registry. Handles are plain indices, so
    /// one from another registry is only rejected when it is out of range.
    pub fn add_record_in(&mut self, namespace: NamespaceId, mut record: ReferenceRecord) -> Result<LinkOutcome> {
        let ns_index = namespace.index();
        if ns_index >= self.namespaces.len() {
            return Err(Error::UnknownNamespace(namespace));
        }

        let ns_name = self.namespaces[ns_index].name().to_string();
        record.stamp_namespace(&ns_name);
        let opts = record.options;

        if opts.is_unique() {
            if let Some(existing) = self.find_duplicate_in(namespace, &record) {
                let first_path = self.location(existing);
                tracing::warn!(
                    "Duplicate {} at {}{}{} (first defined at {})",
                    record.short_description(),
                    ns_name,
                    self.config.path_separator,
                    record.path,
                    first_path
                );
                return Err(Error::DuplicateReference {
                    reference_name: record.reference_name,
                    value: record.value,
                    namespace: ns_name,
                    path: record.path,
                    first_path,
                });
            }
        }

        let id = RecordId(self.records.len());
        tracing::debug!(
            "Registering {} {} in '{}' [{}]",
            id,
            record.short_description(),
            ns_name,
            opts
        );
        self.records.push(record);

        let mut outcome = LinkOutcome::new(id);
        let scope = &mut self.namespaces[ns_index];

        if opts.is_unique() {
            scope.add_unique(id);
            if opts.is_unique_global() {
                self.global.unique.push(id);
            }
        }

        if opts.is_producer() {
            scope.add_producer(id);
            if opts.is_producer_global() {
                self.global.producers.push(id);
            }
            let global: &[RecordId] = if opts.is_producer_global() {
                &self.global.consumers
            } else {
                &[]
            };
            outcome.consumers_linked = link::link_producer(&mut self.records, id, scope.consumers(), global);
        }

        if opts.is_consumer() {
            scope.add_consumer(id);
            if opts.is_consumer_global() {
                self.global.consumers.push(id);
            }
            let global: &[RecordId] = if opts.is_consumer_global() {
                &self.global.producers
            } else {
                &[]
            };
            outcome.producers_linked = link::link_consumer(&mut self.records, id, scope.producers(), global);
        }

        Ok(outcome)
    }

    /// First unique record sharing `record`'s identity.
    ///
    /// The current namespace is searched first. Uniqueness crosses namespaces
    /// when either side is globally unique: a globally unique `record` is
    /// checked against every namespace, any other unique `record` against the
    /// globally unique records.
    pub fn find_duplicate(&self, record: &ReferenceRecord) -> Option<RecordId> {
        self.find_duplicate_in(self.current, record)
    }

    fn find_duplicate_in(&self, namespace: NamespaceId, record: &ReferenceRecord) -> Option<RecordId> {
        let matching = |id: &&RecordId| self.records[id.index()].matches(record);

        let local = self
            .scope(namespace)
            .and_then(|scope| scope.unique().iter().find(matching));
        if let Some(&id) = local {
            return Some(id);
        }

        if record.options.is_unique_global() {
            self.namespaces
                .values()
                .find_map(|scope| scope.unique().iter().find(matching))
                .copied()
        } else {
            self.global.unique.iter().find(matching).copied()
        }
    }

    // --- Inspection ---

    pub fn record(&self, id: RecordId) -> Option<&ReferenceRecord> {
        self.records.get(id.index())
    }

    /// All records with their handles, in registration order
    pub fn records(&self) -> impl Iterator<Item = (RecordId, &ReferenceRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| (RecordId(index), record))
    }

    pub fn consumed_from(&self, id: RecordId) -> Result<&[RecordId]> {
        self.record(id)
            .map(ReferenceRecord::consumed_from)
            .ok_or(Error::UnknownRecord(id))
    }

    pub fn provided_to(&self, id: RecordId) -> Result<&[RecordId]> {
        self.record(id)
            .map(ReferenceRecord::provided_to)
            .ok_or(Error::UnknownRecord(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `"{namespace} > {path}"` for a registered record
    fn location(&self, id: RecordId) -> String {
        let record = &self.records[id.index()];
        format!(
            "{}{}{}",
            record.namespace().unwrap_or_default(),
            self.config.path_separator,
            record.path
        )
    }

    // --- Reporting ---

    /// Sweep every namespace for consumers without a producer and, unless
    /// disabled, producers without a consumer.
    ///
    /// Meant to run once, after the whole document has been walked.
    pub fn get_unresolved_issues(&self) -> IssueReport {
        let mut report = IssueReport::new();

        for scope in self.namespaces.values() {
            for &id in scope.consumers() {
                if self.records[id.index()].consumed_from().is_empty() {
                    report.push(self.issue(IssueKind::NoProvider, id));
                }
            }

            if !self.config.report_orphan_producers {
                continue;
            }

            for &id in scope.producers() {
                let record = &self.records[id.index()];
                if record.provided_to().is_empty() && !record.options.allows_orphan_producer() {
                    report.push(self.issue(IssueKind::NoConsumer, id));
                }
            }
        }

        tracing::debug!(
            "Reference sweep over {} namespace(s): {} issue(s)",
            self.namespaces.len(),
            report.len()
        );
        report
    }

    fn issue(&self, kind: IssueKind, id: RecordId) -> ReferenceIssue {
        let record = &self.records[id.index()];
        ReferenceIssue {
            kind,
            path: self.location(id),
            namespace: record.namespace().unwrap_or_default().to_string(),
            record: id,
            reference_name: record.reference_name.clone(),
            value: record.value.clone(),
        }
    }

    pub fn stats(&self) -> RegistryStats {
        let scopes = self.namespaces.values();
        RegistryStats {
            namespaces: self.namespaces.len(),
            records: self.records.len(),
            unique: scopes.clone().map(|s| s.unique().len()).sum(),
            producers: scopes.clone().map(|s| s.producers().len()).sum(),
            consumers: scopes.map(|s| s.consumers().len()).sum(),
            links: self.records.iter().map(|r| r.provided_to().len()).sum(),
        }
    }
}

/// Counts over a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub namespaces: usize,
    pub records: usize,
    pub unique: usize,
    pub producers: usize,
    pub consumers: usize,
    pub links: usize,
}

impl fmt::Display for RegistryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reference Registry Statistics:")?;
        writeln!(f, "  Namespaces: {}", self.namespaces)?;
        writeln!(f, "  Records: {} (unique: {})", self.records, self.unique)?;
        writeln!(f, "  Producers: {}", self.producers)?;
        writeln!(f, "  Consumers: {}", self.consumers)?;
        writeln!(f, "  Links: {}", self.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RefOptions;
    use serde_json::json;

    fn producer(name: &str, value: &str) -> ReferenceRecord {
        ReferenceRecord::new(name, value).with_options(RefOptions::PRODUCER)
    }

    fn consumer(name: &str, value: &str) -> ReferenceRecord {
        ReferenceRecord::new(name, value).with_options(RefOptions::CONSUMER)
    }

    #[test]
    fn test_starts_in_root_namespace() {
        let registry = ReferenceRegistry::new();
        assert_eq!(registry.current_namespace(), "default");
        assert_eq!(registry.namespaces().count(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_change_namespace_is_idempotent() {
        let mut registry = ReferenceRegistry::new();
        registry.change_namespace("a");
        registry.add_record(producer("host", "h1")).unwrap();

        registry.change_namespace("a");
        registry.change_namespace("a");

        assert_eq!(registry.namespaces().count(), 2);
        assert_eq!(registry.namespace("a").unwrap().producers().len(), 1);
    }

    #[test]
    fn test_revisited_namespace_keeps_records() {
        let mut registry = ReferenceRegistry::new();
        registry.change_namespace("a");
        registry.add_record(producer("host", "h1")).unwrap();
        registry.change_namespace("b");
        registry.change_namespace("a");

        let names: Vec<_> = registry.namespaces().map(NamespaceScope::name).collect();
        assert_eq!(names, vec!["default", "a", "b"]);
        assert_eq!(registry.namespace("a").unwrap().producers().len(), 1);
    }

    #[test]
    fn test_enter_exit_stack() {
        let mut registry = ReferenceRegistry::new();
        let outer = registry.enter_namespace("outer");
        registry.enter_namespace("inner");
        assert_eq!(registry.current_namespace(), "inner");
        assert_eq!(registry.depth(), 2);

        assert_eq!(registry.exit_namespace().unwrap(), outer);
        assert_eq!(registry.current_namespace(), "outer");
        registry.exit_namespace().unwrap();
        assert_eq!(registry.current_namespace(), "default");

        assert!(matches!(registry.exit_namespace(), Err(Error::NamespaceUnderflow)));
    }

    #[test]
    fn test_namespace_is_stamped() {
        let mut registry = ReferenceRegistry::new();
        registry.change_namespace("svc");
        let outcome = registry.add_record(consumer("host", "h1")).unwrap();
        assert_eq!(registry.record(outcome.record).unwrap().namespace(), Some("svc"));
    }

    #[test]
    fn test_duplicate_unique_in_namespace() {
        let mut registry = ReferenceRegistry::new();
        let opts = RefOptions::UNIQUE;
        registry
            .add_record(ReferenceRecord::new("id", "x").with_path("a").with_options(opts))
            .unwrap();

        let err = registry
            .add_record(ReferenceRecord::new("id", "x").with_path("b").with_options(opts))
            .unwrap_err();

        assert!(err.is_configuration());
        match err {
            Error::DuplicateReference { path, first_path, .. } => {
                assert_eq!(path, "b");
                assert_eq!(first_path, "default > a");
            }
            other => panic!("unexpected error: {other}"),
        }
        // The rejected record is not registered
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unique_without_global_is_per_namespace() {
        let mut registry = ReferenceRegistry::new();
        let opts = RefOptions::UNIQUE;
        registry.change_namespace("a");
        registry.add_record(ReferenceRecord::new("id", "x").with_options(opts)).unwrap();
        registry.change_namespace("b");
        assert!(registry.add_record(ReferenceRecord::new("id", "x").with_options(opts)).is_ok());
    }

    #[test]
    fn test_unique_global_across_namespaces() {
        let mut registry = ReferenceRegistry::new();
        let opts = RefOptions::UNIQUE | RefOptions::UNIQUE_GLOBAL;
        registry.change_namespace("a");
        registry.add_record(ReferenceRecord::new("id", "x").with_options(opts)).unwrap();
        registry.change_namespace("b");

        let candidate = ReferenceRecord::new("id", "x").with_options(opts);
        assert_eq!(registry.find_duplicate(&candidate), Some(RecordId(0)));
        assert!(matches!(
            registry.add_record(candidate),
            Err(Error::DuplicateReference { .. })
        ));
    }

    #[test]
    fn test_different_identity_is_not_duplicate() {
        let mut registry = ReferenceRegistry::new();
        registry.add_record(ReferenceRecord::new("id", "x")).unwrap();
        registry.add_record(ReferenceRecord::new("id", "y")).unwrap();
        registry.add_record(ReferenceRecord::new("other", "x")).unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_link_consumer_after_producer() {
        let mut registry = ReferenceRegistry::new();
        let p = registry.add_record(producer("host", "h1")).unwrap().record;
        let outcome = registry.add_record(consumer("host", "h1")).unwrap();

        assert_eq!(outcome.producers_linked, vec![p]);
        assert!(outcome.consumers_linked.is_empty());
        assert_eq!(registry.provided_to(p).unwrap(), &[outcome.record]);
        assert_eq!(registry.consumed_from(outcome.record).unwrap(), &[p]);
    }

    #[test]
    fn test_link_producer_after_consumer() {
        let mut registry = ReferenceRegistry::new();
        let c = registry.add_record(consumer("host", "h1")).unwrap().record;
        let outcome = registry.add_record(producer("host", "h1")).unwrap();

        assert_eq!(outcome.consumers_linked, vec![c]);
        assert!(outcome.producers_linked.is_empty());
        assert_eq!(registry.consumed_from(c).unwrap(), &[outcome.record]);
    }

    #[test]
    fn test_global_flags_do_not_duplicate_edges() {
        for producer_first in [true, false] {
            let mut registry = ReferenceRegistry::new();
            let p = ReferenceRecord::new("host", "h1")
                .with_options(RefOptions::PRODUCER | RefOptions::PRODUCER_GLOBAL);
            let c = ReferenceRecord::new("host", "h1")
                .with_options(RefOptions::CONSUMER | RefOptions::CONSUMER_GLOBAL);

            let (p, c) = if producer_first {
                let p = registry.add_record(p).unwrap().record;
                (p, registry.add_record(c).unwrap().record)
            } else {
                let c = registry.add_record(c).unwrap().record;
                (registry.add_record(p).unwrap().record, c)
            };

            assert_eq!(registry.provided_to(p).unwrap(), &[c]);
            assert_eq!(registry.consumed_from(c).unwrap(), &[p]);
        }
    }

    #[test]
    fn test_local_records_do_not_cross_namespaces() {
        let mut registry = ReferenceRegistry::new();
        registry.change_namespace("a");
        let p = registry.add_record(producer("host", "h1")).unwrap().record;
        registry.change_namespace("b");
        let c = registry.add_record(consumer("host", "h1")).unwrap().record;

        assert!(registry.provided_to(p).unwrap().is_empty());
        assert!(registry.consumed_from(c).unwrap().is_empty());
    }

    #[test]
    fn test_producer_and_consumer_in_one_record() {
        let mut registry = ReferenceRegistry::new();
        let both = RefOptions::PRODUCER | RefOptions::CONSUMER;
        let first = registry
            .add_record(ReferenceRecord::new("node", "n1").with_options(both))
            .unwrap();
        assert!(!first.is_linked());

        let second = registry
            .add_record(ReferenceRecord::new("node", "n1").with_options(both))
            .unwrap();
        assert_eq!(second.consumers_linked, vec![first.record]);
        assert_eq!(second.producers_linked, vec![first.record]);
        assert_eq!(second.link_count(), 2);
    }

    #[test]
    fn test_composite_value_links() {
        let mut registry = ReferenceRegistry::new();
        let p = registry
            .add_record(ReferenceRecord::new("endpoint", json!(["api", 443])).with_options(RefOptions::PRODUCER))
            .unwrap()
            .record;
        let c = registry
            .add_record(ReferenceRecord::new("endpoint", json!(["api", 443])).with_options(RefOptions::CONSUMER))
            .unwrap();
        assert_eq!(c.producers_linked, vec![p]);
    }

    #[test]
    fn test_add_record_in_explicit_namespace() {
        let mut registry = ReferenceRegistry::new();
        let other = registry.ensure_namespace("other");
        let outcome = registry.add_record_in(other, consumer("host", "h1")).unwrap();

        assert_eq!(registry.current_namespace(), "default");
        assert_eq!(registry.record(outcome.record).unwrap().namespace(), Some("other"));
        assert!(matches!(
            registry.add_record_in(NamespaceId(42), consumer("host", "h1")),
            Err(Error::UnknownNamespace(_))
        ));
    }

    #[test]
    fn test_foreign_handle_out_of_range_is_rejected() {
        let mut big = ReferenceRegistry::new();
        big.ensure_namespace("a");
        let foreign = big.ensure_namespace("b");

        let mut small = ReferenceRegistry::new();
        let err = small.add_record_in(foreign, consumer("host", "h1")).unwrap_err();
        assert!(matches!(err, Error::UnknownNamespace(id) if id == foreign));
        assert!(small.is_empty());
    }

    #[test]
    fn test_global_unique_checks_every_namespace() {
        let mut registry = ReferenceRegistry::new();
        registry.change_namespace("a");
        registry
            .add_record(ReferenceRecord::new("id", "x").with_options(RefOptions::UNIQUE))
            .unwrap();
        registry.change_namespace("b");

        let candidate =
            ReferenceRecord::new("id", "x").with_options(RefOptions::UNIQUE | RefOptions::UNIQUE_GLOBAL);
        assert_eq!(registry.find_duplicate(&candidate), Some(RecordId(0)));
    }

    #[test]
    fn test_add_json_record_uses_config_defaults() {
        let config = RegistryConfig {
            default_options: Some(vec!["consumer".to_string()]),
            ..RegistryConfig::default()
        };
        let mut registry = ReferenceRegistry::with_config(config);
        let outcome = registry
            .add_json_record(&json!({"reference_name": "host", "value": "h1"}))
            .unwrap();

        assert!(registry.record(outcome.record).unwrap().options.is_consumer());
        assert!(registry.add_json_record(&json!({"path": 7})).is_err());
    }

    #[test]
    fn test_unknown_record_lookup() {
        let registry = ReferenceRegistry::new();
        assert!(matches!(registry.consumed_from(RecordId(9)), Err(Error::UnknownRecord(_))));
        assert!(registry.record(RecordId(9)).is_none());
    }

    #[test]
    fn test_issue_sweep() {
        let mut registry = ReferenceRegistry::new();
        registry.change_namespace("a");
        registry
            .add_record(consumer("host", "missing").with_path("svc/host"))
            .unwrap();
        registry
            .add_record(producer("host", "lonely").with_path("hosts/0"))
            .unwrap();
        registry
            .add_record(
                ReferenceRecord::new("host", "spare")
                    .with_options(RefOptions::PRODUCER | RefOptions::ALLOW_ORPHAN_PRODUCER),
            )
            .unwrap();

        let report = registry.get_unresolved_issues();
        let lines: Vec<String> = report.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "a > svc/host: no provider found".to_string(),
                "a > hosts/0: producer has no consumer".to_string(),
            ]
        );
    }

    #[test]
    fn test_orphan_producer_reporting_can_be_disabled() {
        let config = RegistryConfig {
            report_orphan_producers: false,
            ..RegistryConfig::default()
        };
        let mut registry = ReferenceRegistry::with_config(config);
        registry.add_record(producer("host", "h1")).unwrap();
        registry.add_record(consumer("host", "h2")).unwrap();

        let report = registry.get_unresolved_issues();
        assert_eq!(report.len(), 1);
        assert_eq!(report.issues()[0].kind, IssueKind::NoProvider);
    }

    #[test]
    fn test_stats() {
        let mut registry = ReferenceRegistry::new();
        registry.add_record(ReferenceRecord::new("host", "h1")).unwrap();
        registry.add_record(consumer("host", "h1")).unwrap();
        registry.change_namespace("b");
        registry.add_record(consumer("host", "h1")).unwrap();

        let stats = registry.stats();
        assert_eq!(stats.namespaces, 2);
        assert_eq!(stats.records, 3);
        assert_eq!(stats.unique, 1);
        assert_eq!(stats.producers, 1);
        assert_eq!(stats.consumers, 2);
        assert_eq!(stats.links, 1);
        assert!(stats.to_string().contains("Links: 1"));
    }
}
