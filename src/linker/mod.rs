//! Incremental producer/consumer linking
//!
//! Linking runs on every registration. A new consumer scans the producers
//! already seen and a new producer scans the consumers already seen, so the
//! resulting graph does not depend on registration order.

pub(crate) mod link;

use crate::record::RecordId;
use std::fmt;

/// What a single registration linked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    /// Handle of the registered record
    pub record: RecordId,
    /// Producers linked to this record as a consumer
    pub producers_linked: Vec<RecordId>,
    /// Consumers linked to this record as a producer
    pub consumers_linked: Vec<RecordId>,
}

impl LinkOutcome {
    pub(crate) fn new(record: RecordId) -> Self {
        Self {
            record,
            producers_linked: Vec::new(),
            consumers_linked: Vec::new(),
        }
    }

    /// Number of edges created by the registration
    pub fn link_count(&self) -> usize {
        self.producers_linked.len() + self.consumers_linked.len()
    }

    pub fn is_linked(&self) -> bool {
        self.link_count() > 0
    }
}

impl fmt::Display for LinkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} producer(s), {} consumer(s) linked",
            self.record,
            self.producers_linked.len(),
            self.consumers_linked.len()
        )
    }
}
