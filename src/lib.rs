//! # Reflink - scoped reference linker
//!
//! Resolves typed cross-references between values found at different places
//! in a validated document. Some values define an identity (producers), others
//! refer to one (consumers).
//!
//! Reflink provides:
//! - Typed, located reference records with combinable options
//! - Namespaces with optional run-wide (global) visibility
//! - Uniqueness enforcement per namespace or across the run
//! - Incremental linking that does not depend on registration order
//! - An end-of-pass report of consumers and producers that never linked
//!
//! ```
//! use reflink::{RefOptions, ReferenceRecord, ReferenceRegistry};
//!
//! let mut registry = ReferenceRegistry::new();
//! registry.change_namespace("hosts");
//! let host = ReferenceRecord::new("host", "h1")
//!     .with_path("hosts/0/name")
//!     .with_options(RefOptions::PRODUCER | RefOptions::PRODUCER_GLOBAL);
//! let host = registry.add_record(host)?.record;
//!
//! registry.change_namespace("services");
//! let use_site = ReferenceRecord::new("host", "h1")
//!     .with_path("services/api/host")
//!     .with_options(RefOptions::CONSUMER | RefOptions::CONSUMER_GLOBAL);
//! let outcome = registry.add_record(use_site)?;
//!
//! assert_eq!(outcome.producers_linked, vec![host]);
//! assert!(registry.get_unresolved_issues().is_empty());
//! # Ok::<(), reflink::Error>(())
//! ```

pub mod config;
pub mod linker;
pub mod options;
pub mod record;
pub mod registry;
pub mod report;
pub mod scope;

// Re-exports for convenient access
pub use config::RegistryConfig;
pub use linker::LinkOutcome;
pub use options::RefOptions;
pub use record::{RecordId, ReferenceRecord};
pub use registry::{ReferenceRegistry, RegistryStats};
pub use report::{IssueKind, IssueReport, ReferenceIssue};
pub use scope::{NamespaceId, NamespaceScope};

/// Result type alias for Reflink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Reflink operations.
///
/// Every variant is a configuration error: the caller misused the API or the
/// schema contradicts itself. Unlinked references are not errors; they are
/// reported by [`ReferenceRegistry::get_unresolved_issues`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Reference already defined: {reference_name}={value} in namespace '{namespace}' at {path} (first defined at {first_path})")]
    DuplicateReference {
        reference_name: String,
        value: serde_json::Value,
        namespace: String,
        path: String,
        first_path: String,
    },

    #[error("Invalid reference record: {0}")]
    InvalidRecord(String),

    #[error("Invalid reference options: {0}")]
    InvalidOptions(String),

    #[error("Cannot exit the root namespace")]
    NamespaceUnderflow,

    #[error("Unknown namespace: {0}")]
    UnknownNamespace(NamespaceId),

    #[error("Unknown record: {0}")]
    UnknownRecord(RecordId),
}

impl Error {
    /// Whether the error signals a schema or API misuse that must abort the run.
    ///
    /// Every current variant does. The match is exhaustive so a new variant
    /// has to state its class here instead of inheriting one.
    pub fn is_configuration(&self) -> bool {
        match self {
            Error::DuplicateReference { .. }
            | Error::InvalidRecord(_)
            | Error::InvalidOptions(_)
            | Error::NamespaceUnderflow
            | Error::UnknownNamespace(_)
            | Error::UnknownRecord(_) => true,
        }
    }

    /// Whether the error is a duplicate unique registration
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::DuplicateReference { .. })
    }
}
