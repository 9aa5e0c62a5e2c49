//! Reference records - one typed, located value taking part in cross-referencing
//!
//! Records are created by the schema type system, one per validated value,
//! and handed to the [`ReferenceRegistry`](crate::ReferenceRegistry), which
//! owns them for the rest of the run. Links between records are stored as
//! [`RecordId`] handles into that arena.

use crate::options::RefOptions;
use crate::{Error, Result};
use serde_json::Value;
use std::fmt;

/// Stable handle to a record owned by a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub usize);

impl RecordId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One candidate end of a cross-reference.
///
/// Two records match when both `reference_name` and `value` are equal.
/// `value` is compared structurally, so a JSON array can carry a composite
/// identity built from several attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    /// Kind of cross-reference (e.g. `"host"`)
    pub reference_name: String,
    /// Comparison key
    pub value: Value,
    /// Location of the value in the document, for reporting only
    pub path: String,
    pub options: RefOptions,
    namespace: Option<String>,
    consumed_from: Vec<RecordId>,
    provided_to: Vec<RecordId>,
}

impl ReferenceRecord {
    /// Create a record with default options and an empty path
    pub fn new(reference_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            reference_name: reference_name.into(),
            value: value.into(),
            path: String::new(),
            options: RefOptions::default(),
            namespace: None,
            consumed_from: Vec::new(),
            provided_to: Vec::new(),
        }
    }

    /// Set the document path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Replace the options
    pub fn with_options(mut self, options: RefOptions) -> Self {
        self.options = options;
        self
    }

    /// Build a record from a loosely-typed JSON object.
    ///
    /// Recognised keys are `reference_name`, `path`, `namespace`, `value` and
    /// `options`. String fields must be strings. `options` may be a flag
    /// string (`"producer,consumer"`), an array of flag names, or raw bits.
    /// When `options` is absent, `default_options` applies.
    pub fn from_json(raw: &Value, default_options: RefOptions) -> Result<Self> {
        let obj = raw
            .as_object()
            .ok_or_else(|| Error::InvalidRecord(format!("expected an object, got {}", type_name(raw))))?;

        let reference_name = string_field(obj, "reference_name")?.unwrap_or_default();
        let path = string_field(obj, "path")?.unwrap_or_default();
        let namespace = string_field(obj, "namespace")?;
        let value = obj.get("value").cloned().unwrap_or(Value::Null);
        let options = match obj.get("options") {
            None | Some(Value::Null) => default_options,
            Some(opts) => options_from_json(opts)?,
        };

        Ok(Self {
            reference_name,
            value,
            path,
            options,
            namespace,
            consumed_from: Vec::new(),
            provided_to: Vec::new(),
        })
    }

    /// Whether `other` refers to the same identity
    pub fn matches(&self, other: &ReferenceRecord) -> bool {
        self.reference_name == other.reference_name && self.value == other.value
    }

    /// Namespace the record was registered in
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Producers this consumer is linked to, in link order
    pub fn consumed_from(&self) -> &[RecordId] {
        &self.consumed_from
    }

    /// Consumers this producer is linked to, in link order
    pub fn provided_to(&self) -> &[RecordId] {
        &self.provided_to
    }

    pub(crate) fn stamp_namespace(&mut self, namespace: &str) {
        self.namespace = Some(namespace.to_string());
    }

    pub(crate) fn push_consumed_from(&mut self, producer: RecordId) {
        self.consumed_from.push(producer);
    }

    pub(crate) fn push_provided_to(&mut self, consumer: RecordId) {
        self.provided_to.push(consumer);
    }

    /// Short description for logs and error messages
    pub fn short_description(&self) -> String {
        format!("{}={}", self.reference_name, self.value)
    }
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::InvalidRecord(format!(
            "`{}` must be a string, got {}",
            key,
            type_name(other)
        ))),
    }
}

fn options_from_json(raw: &Value) -> Result<RefOptions> {
    match raw {
        Value::String(s) => s.parse(),
        Value::Array(items) => {
            let names = items
                .iter()
                .map(|item| {
                    item.as_str().ok_or_else(|| {
                        Error::InvalidOptions(format!("option names must be strings, got {}", type_name(item)))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            RefOptions::from_names(names)
        }
        Value::Number(n) => {
            let bits = n
                .as_u64()
                .and_then(|b| u8::try_from(b).ok())
                .ok_or_else(|| Error::InvalidOptions(format!("option bits out of range: {}", n)))?;
            RefOptions::from_bits_checked(bits)
        }
        other => Err(Error::InvalidOptions(format!(
            "expected a string, array or integer, got {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
