use std::time::{SystemTime, UNIX_EPOCH};

use balancer_core::{normalize, ClusterAdminClient, Result};
use serde_json::json;
use tracing::{info, warn};

use crate::retry::{PollOutcome, RetryPolicy};

/// Priority of the temporary migration policy. High enough to override
/// any permanent policy that also matches the queue.
const TEMP_POLICY_PRIORITY: i64 = 990;

/// One selected leadership move: `source` is informational, `target` is
/// where the queue's leadership must end up.
#[derive(Debug, Clone)]
pub struct MigrationTarget {
    pub queue: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The queue's leader was observed on the target node.
    Converged,
    /// The retry budget ran out before the leader moved. Non-fatal: the
    /// queue is abandoned for this pass, cleanup has still run.
    TimedOut,
}

/// Executes the four-phase leadership migration protocol.
///
/// 1. **Widen** — temporary policy forcing one replica more than the
///    cluster has nodes, then a blocking sync; every node, the handoff
///    target included, now holds a caught-up copy.
/// 2. **Pin** — the same policy name redefined to pin the eligible-leader
///    set to exactly the target node, then another sync. Reusing the name
///    replaces the widen definition instead of stacking with it.
/// 3. **Confirm** — poll the queue's leader under the retry budget.
/// 4. **Cleanup** — clear the policy and issue a final sync, returning
///    the queue to whatever permanent policy governs it. Runs after both
///    Converged and TimedOut outcomes, never after an RPC failure (a
///    failed admin call aborts the run with the migration state as-is).
pub struct MasterMigrator<'a, C> {
    client: &'a C,
    vhost: &'a str,
    /// Per-run nonce folded into temporary policy names, so two runs can
    /// never collide on a name by accident.
    nonce: u64,
}

impl<'a, C: ClusterAdminClient> MasterMigrator<'a, C> {
    pub fn new(client: &'a C, vhost: &'a str) -> Self {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        MasterMigrator {
            client,
            vhost,
            nonce,
        }
    }

    fn policy_name(&self, queue: &str) -> String {
        format!("qmb-move-{}-{}", self.nonce, queue)
    }

    pub async fn migrate(
        &self,
        target: &MigrationTarget,
        cluster_nodes: usize,
        retry: &RetryPolicy,
    ) -> Result<MigrationOutcome> {
        let queue = target.queue.as_str();
        let dest = target.target.as_str();
        let policy = self.policy_name(queue);
        let pattern = format!("^{}$", regex::escape(queue));

        info!(
            queue = %queue,
            from = %target.source,
            to = %dest,
            policy = %policy,
            "migrating queue leadership"
        );

        // Phase 1: widen replication so the target gets a synced copy.
        // Asking for one replica beyond the node count pins a mirror on
        // every node; the target cannot be skipped by placement.
        info!(queue = %queue, "phase 1/4: widening replication");
        let widen = json!({
            "ha-mode": "exactly",
            "ha-params": cluster_nodes + 1,
            "ha-sync-mode": "automatic",
        });
        self.client
            .set_policy(self.vhost, &policy, TEMP_POLICY_PRIORITY, &pattern, &widen)
            .await?;
        self.client.sync_queue(self.vhost, queue).await?;

        // Phase 2: pin the eligible-leader set to the target node.
        info!(queue = %queue, node = %dest, "phase 2/4: pinning leadership");
        let pin = json!({
            "ha-mode": "nodes",
            "ha-params": [dest],
            "ha-sync-mode": "automatic",
        });
        self.client
            .set_policy(self.vhost, &policy, TEMP_POLICY_PRIORITY, &pattern, &pin)
            .await?;
        self.client.sync_queue(self.vhost, queue).await?;

        // Phase 3: poll until the broker reports the new leader.
        info!(queue = %queue, "phase 3/4: confirming leadership transfer");
        let client = self.client;
        let vhost = self.vhost;
        let outcome = retry
            .poll(|_| async move {
                let raw = client.get_queue_leader(vhost, queue).await?;
                Ok(normalize(&raw) == dest)
            })
            .await?;

        let outcome = match outcome {
            PollOutcome::Satisfied => {
                info!(queue = %queue, node = %dest, "leadership converged on target");
                MigrationOutcome::Converged
            }
            PollOutcome::Exhausted => {
                warn!(
                    queue = %queue,
                    node = %dest,
                    attempts = retry.max_attempts,
                    "leadership did not converge within the retry budget"
                );
                MigrationOutcome::TimedOut
            }
        };

        // Phase 4: unconditional cleanup, whatever the confirm outcome.
        info!(queue = %queue, policy = %policy, "phase 4/4: clearing temporary policy");
        self.client.clear_policy(self.vhost, &policy).await?;
        self.client.sync_queue(self.vhost, queue).await?;

        Ok(outcome)
    }
}
