use async_trait::async_trait;

use crate::errors::Result;

/// A queue name paired with the raw identifier of the node currently
/// holding its leadership, as reported by the broker.
#[derive(Debug, Clone)]
pub struct QueueLeader {
    pub name: String,
    /// Raw leader id; must go through `nodename::normalize` before it is
    /// compared against entries of the running-node list.
    pub raw_leader: String,
}

/// Typed interface over the broker's administrative surface.
///
/// All calls are synchronous from the loop's point of view: each one is
/// awaited to completion before the next step runs. `sync_queue` in
/// particular blocks until the broker reports that every replica of the
/// queue has caught up with its leader.
#[async_trait]
pub trait ClusterAdminClient: Send + Sync {
    /// Node identifiers of the currently running cluster members.
    async fn list_running_nodes(&self) -> Result<Vec<String>>;

    /// Every queue in the vhost with its raw leader identifier.
    async fn list_queue_leaders(&self, vhost: &str) -> Result<Vec<QueueLeader>>;

    /// Raw leader identifier of a single queue.
    async fn get_queue_leader(&self, vhost: &str, queue: &str) -> Result<String>;

    /// Installs or redefines a policy. Setting an existing name replaces
    /// its definition; definitions never stack.
    async fn set_policy(
        &self,
        vhost: &str,
        name: &str,
        priority: i64,
        pattern: &str,
        definition: &serde_json::Value,
    ) -> Result<()>;

    /// Removes a policy by name.
    async fn clear_policy(&self, vhost: &str, name: &str) -> Result<()>;

    /// Names of all policies currently installed on the vhost.
    async fn list_policies(&self, vhost: &str) -> Result<Vec<String>>;

    /// Blocks until the queue's replicas are in sync with its leader.
    async fn sync_queue(&self, vhost: &str, queue: &str) -> Result<()>;

    /// Liveness probe against a single node. The error carries whatever
    /// diagnostics the broker returned.
    async fn health_check(&self, node: &str) -> Result<()>;
}
