use crate::record::{RecordId, ReferenceRecord};

/// Add the edge `producer -> consumer`.
///
/// Returns false when the edge already exists or both ends are the same
/// record, so each pair is linked at most once however it is discovered.
pub(crate) fn link(records: &mut [ReferenceRecord], producer: RecordId, consumer: RecordId) -> bool {
    if producer == consumer || records[producer.index()].provided_to().contains(&consumer) {
        return false;
    }

    records[producer.index()].push_provided_to(consumer);
    records[consumer.index()].push_consumed_from(producer);

    tracing::trace!(
        "Linked {} {} -> {}",
        records[producer.index()].short_description(),
        producer,
        consumer
    );
    true
}

/// Link a newly registered consumer to every matching producer.
///
/// `local` is the consumer's own namespace. `global` is the run-wide producer
/// index when the consumer is globally visible, otherwise empty. Returns the
/// producers linked by this call.
pub(crate) fn link_consumer(
    records: &mut [ReferenceRecord],
    consumer: RecordId,
    local: &[RecordId],
    global: &[RecordId],
) -> Vec<RecordId> {
    let mut linked = Vec::new();

    for &producer in local.iter().chain(global) {
        if records[producer.index()].matches(&records[consumer.index()])
            && link(records, producer, consumer)
        {
            linked.push(producer);
        }
    }

    linked
}

/// Link a newly registered producer to every matching consumer.
///
/// Mirror of [`link_consumer`]. Returns the consumers linked by this call.
pub(crate) fn link_producer(
    records: &mut [ReferenceRecord],
    producer: RecordId,
    local: &[RecordId],
    global: &[RecordId],
) -> Vec<RecordId> {
    let mut linked = Vec::new();

    for &consumer in local.iter().chain(global) {
        if records[consumer.index()].matches(&records[producer.index()])
            && link(records, producer, consumer)
        {
            linked.push(consumer);
        }
    }

    linked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RefOptions;

    fn arena(values: &[&str]) -> Vec<ReferenceRecord> {
        values
            .iter()
            .map(|v| ReferenceRecord::new("host", *v).with_options(RefOptions::PRODUCER))
            .collect()
    }

    #[test]
    fn test_link_once() {
        let mut records = arena(&["h1", "h1"]);

        assert!(link(&mut records, RecordId(0), RecordId(1)));
        assert!(!link(&mut records, RecordId(0), RecordId(1)));

        assert_eq!(records[0].provided_to(), &[RecordId(1)]);
        assert_eq!(records[1].consumed_from(), &[RecordId(0)]);
    }

    #[test]
    fn test_no_self_link() {
        let mut records = arena(&["h1"]);
        assert!(!link(&mut records, RecordId(0), RecordId(0)));
        assert!(records[0].provided_to().is_empty());
    }

    #[test]
    fn test_local_and_global_overlap_links_once() {
        // Producers 0 and 1, consumer 2; producer 0 is visible both locally and globally
        let mut records = arena(&["h1", "h2", "h1"]);
        let local = [RecordId(0), RecordId(1)];
        let global = [RecordId(0)];

        let linked = link_consumer(&mut records, RecordId(2), &local, &global);

        assert_eq!(linked, vec![RecordId(0)]);
        assert_eq!(records[2].consumed_from(), &[RecordId(0)]);
        assert_eq!(records[0].provided_to(), &[RecordId(2)]);
        assert!(records[1].provided_to().is_empty());
    }

    #[test]
    fn test_producer_links_all_matching_consumers() {
        let mut records = arena(&["h1", "h1", "h1", "h9"]);
        let local = [RecordId(1), RecordId(3)];
        let global = [RecordId(2)];

        let linked = link_producer(&mut records, RecordId(0), &local, &global);

        assert_eq!(linked, vec![RecordId(1), RecordId(2)]);
        assert_eq!(records[0].provided_to(), &[RecordId(1), RecordId(2)]);
        assert!(records[3].consumed_from().is_empty());
    }
}
