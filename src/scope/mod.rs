//! Namespace scopes - partitions for uniqueness checks and linking
//!
//! Records are matched against their own namespace first. Records that opt
//! into global visibility are also mirrored in a run-wide [`GlobalIndex`].

pub mod namespace;

pub use namespace::{GlobalIndex, NamespaceId, NamespaceScope};
