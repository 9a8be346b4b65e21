use balancer_core::{BalancerError, ClusterAdminClient, Result};
use serde_json::json;
use tracing::{info, warn};

/// Name of the marker policy that serializes balancer runs per vhost.
pub const LOCK_POLICY_NAME: &str = "queue-master-balancer-lock";

/// Mutual exclusion for a balancer run.
///
/// The broker's policy registry is the shared medium every run already
/// writes to, so the lock is an inert policy installed under a well-known
/// name: pattern `^$` matches no queue, the definition does nothing. A
/// second run observes the name via `list_policies` and refuses to start.
pub struct RunGuard<'a, C: ClusterAdminClient> {
    client: &'a C,
    vhost: String,
}

impl<'a, C: ClusterAdminClient> RunGuard<'a, C> {
    /// Fails fast with a precondition error when another run already
    /// holds the lock on this vhost.
    ///
    /// The acquisition is check-then-set: the policy registry has no
    /// compare-and-set, so two runs starting inside the same window can
    /// both pass the list check and both install the marker. The lock
    /// keeps accidental concurrent runs out; it cannot rule out a
    /// deliberate simultaneous start.
    pub async fn acquire(client: &'a C, vhost: &str) -> Result<RunGuard<'a, C>> {
        let policies = client.list_policies(vhost).await?;
        if policies.iter().any(|name| name == LOCK_POLICY_NAME) {
            return Err(BalancerError::Precondition(format!(
                "policy {} already present on vhost {}: another balancer run appears to be active (clear it by hand if that run is dead)",
                LOCK_POLICY_NAME, vhost
            )));
        }

        let marker = json!({ "ha-mode": "exactly", "ha-params": 1 });
        client
            .set_policy(vhost, LOCK_POLICY_NAME, 0, "^$", &marker)
            .await?;
        info!(vhost = %vhost, policy = LOCK_POLICY_NAME, "acquired run lock");

        Ok(RunGuard {
            client,
            vhost: vhost.to_string(),
        })
    }

    /// Removes the marker policy. Best effort: a failed release is logged
    /// so the operator can clear the policy by hand, and never masks the
    /// outcome of the run itself.
    pub async fn release(self) {
        match self.client.clear_policy(&self.vhost, LOCK_POLICY_NAME).await {
            Ok(()) => info!(vhost = %self.vhost, "released run lock"),
            Err(e) => warn!(
                vhost = %self.vhost,
                policy = LOCK_POLICY_NAME,
                error = %e,
                "failed to release run lock, clear the policy manually"
            ),
        }
    }
}
