use balancer_core::{ClusterAdminClient, Result};
use tracing::{debug, info};

/// Fail-fast liveness gate over every node in a snapshot.
///
/// Rebalancing must never proceed against a degraded cluster: the first
/// failing node aborts the run with the diagnostics the probe collected.
/// There is no retry and no partial continuation.
pub struct HealthGate<'a, C> {
    client: &'a C,
}

impl<'a, C: ClusterAdminClient> HealthGate<'a, C> {
    pub fn new(client: &'a C) -> Self {
        HealthGate { client }
    }

    pub async fn check<I>(&self, nodes: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for node in nodes {
            let node = node.as_ref();
            debug!(node = %node, "running node health check");
            self.client.health_check(node).await?;
        }
        info!("all nodes passed the health check");
        Ok(())
    }
}
