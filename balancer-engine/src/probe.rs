use std::collections::HashMap;

use balancer_core::{normalize, BalancerError, ClusterAdminClient, Result};
use tracing::debug;

/// A queue and the canonical id of the node currently leading it.
#[derive(Debug, Clone)]
pub struct Queue {
    pub name: String,
    pub leader: String,
}

/// Immutable point-in-time view of the cluster's leadership distribution.
///
/// `counts` is ordered by node discovery (the order of the running-node
/// list); each entry carries the node's tally across the union of the
/// running-node list and the per-queue leader list. Every node contributes
/// one baseline occurrence from the node list, so absolute counts sit one
/// above the true queue-leadership counts — uniformly, which leaves the
/// max-min difference exact.
#[derive(Debug, Clone)]
pub struct ClusterSnapshot {
    pub counts: Vec<(String, usize)>,
    pub queues: Vec<Queue>,
}

impl ClusterSnapshot {
    pub fn node_count(&self) -> usize {
        self.counts.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.counts.iter().map(|(node, _)| node.as_str())
    }
}

/// Samples cluster state through the admin interface.
pub struct StateProbe<'a, C> {
    client: &'a C,
}

impl<'a, C: ClusterAdminClient> StateProbe<'a, C> {
    pub fn new(client: &'a C) -> Self {
        StateProbe { client }
    }

    /// Issues the two read-only state queries and builds a snapshot.
    ///
    /// A queue whose normalized leader does not resolve to a running node
    /// means the two queries disagree; the snapshot cannot be trusted and
    /// the probe fails rather than reporting partial state.
    pub async fn sample(&self, vhost: &str) -> Result<ClusterSnapshot> {
        let nodes = self.client.list_running_nodes().await?;
        let leaders = self.client.list_queue_leaders(vhost).await?;

        let nodes: Vec<String> = nodes.iter().map(|n| normalize(n)).collect();
        if nodes.is_empty() {
            return Err(BalancerError::Probe(
                "running-node list is empty".to_string(),
            ));
        }

        // Baseline occurrence per node, then one per queue led.
        let mut tally: HashMap<&str, usize> = nodes.iter().map(|n| (n.as_str(), 1)).collect();

        let mut queues = Vec::with_capacity(leaders.len());
        for entry in &leaders {
            let leader = normalize(&entry.raw_leader);
            match tally.get_mut(leader.as_str()) {
                Some(count) => *count += 1,
                None => {
                    return Err(BalancerError::Probe(format!(
                        "queue {} reports leader {} which is not a running node",
                        entry.name, leader
                    )))
                }
            }
            queues.push(Queue {
                name: entry.name.clone(),
                leader,
            });
        }

        let counts: Vec<(String, usize)> = nodes
            .iter()
            .map(|n| (n.clone(), tally[n.as_str()]))
            .collect();

        debug!(
            nodes = counts.len(),
            queues = queues.len(),
            "sampled cluster state"
        );

        Ok(ClusterSnapshot { counts, queues })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::MockAdmin;

    #[tokio::test]
    async fn counts_carry_uniform_baseline_offset() {
        let admin = MockAdmin::new(
            &["rabbit@a", "rabbit@b", "rabbit@c"],
            &[("q1", "rabbit@a"), ("q2", "rabbit@a"), ("q3", "rabbit@b")],
        );
        let snapshot = StateProbe::new(&admin).sample("/").await.unwrap();

        // 2, 1, 0 queues led, each shifted by the +1 baseline.
        assert_eq!(
            snapshot.counts,
            vec![
                ("rabbit@a".to_string(), 3),
                ("rabbit@b".to_string(), 2),
                ("rabbit@c".to_string(), 1),
            ]
        );
        assert_eq!(snapshot.queues.len(), 3);
    }

    #[tokio::test]
    async fn leader_ids_are_normalized() {
        let admin = MockAdmin::new(&["rabbit@a"], &[("q1", "<rabbit@a.3.123.0>")]);
        let snapshot = StateProbe::new(&admin).sample("/").await.unwrap();
        assert_eq!(snapshot.queues[0].leader, "rabbit@a");
        assert_eq!(snapshot.counts[0].1, 2);
    }

    #[tokio::test]
    async fn unknown_leader_fails_the_probe() {
        let admin = MockAdmin::new(&["rabbit@a"], &[("q1", "rabbit@gone")]);
        let err = StateProbe::new(&admin).sample("/").await.unwrap_err();
        assert!(matches!(err, BalancerError::Probe(_)));
    }
}
