use regex::Regex;
use tracing::debug;

use crate::probe::{ClusterSnapshot, Queue};

/// Picks the next queue to move off the overloaded node.
///
/// Returns the first queue, in probe order, whose leader is `max_node`
/// and whose name matches the operator's filter. Probe order is whatever
/// the broker reported (typically lexicographic, but not guaranteed) —
/// callers must only rely on "some match", not which one.
pub fn select_candidate<'a>(
    snapshot: &'a ClusterSnapshot,
    max_node: &str,
    filter: &Regex,
) -> Option<&'a Queue> {
    let candidate = snapshot
        .queues
        .iter()
        .find(|q| q.leader == max_node && filter.is_match(&q.name));

    match candidate {
        Some(queue) => debug!(queue = %queue.name, node = %max_node, "selected migration candidate"),
        None => debug!(node = %max_node, filter = %filter, "no eligible queue on overloaded node"),
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(queues: &[(&str, &str)]) -> ClusterSnapshot {
        ClusterSnapshot {
            counts: Vec::new(),
            queues: queues
                .iter()
                .map(|(name, leader)| Queue {
                    name: name.to_string(),
                    leader: leader.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn candidate_matches_filter_and_leader() {
        let snap = snapshot(&[
            ("audit", "rabbit@b"),
            ("orders-eu", "rabbit@a"),
            ("orders-us", "rabbit@a"),
        ]);
        let filter = Regex::new("^orders-").unwrap();

        let queue = select_candidate(&snap, "rabbit@a", &filter).unwrap();
        assert_eq!(queue.name, "orders-eu");
        assert_eq!(queue.leader, "rabbit@a");
        assert!(filter.is_match(&queue.name));
    }

    #[test]
    fn match_all_filter_takes_first_in_probe_order() {
        let snap = snapshot(&[("zeta", "rabbit@a"), ("alpha", "rabbit@a")]);
        let filter = Regex::new(".*").unwrap();
        assert_eq!(select_candidate(&snap, "rabbit@a", &filter).unwrap().name, "zeta");
    }

    #[test]
    fn none_when_no_queue_on_node_matches() {
        let snap = snapshot(&[("audit", "rabbit@b"), ("metrics", "rabbit@a")]);
        let filter = Regex::new("^orders-").unwrap();
        assert!(select_candidate(&snap, "rabbit@a", &filter).is_none());
    }
}
