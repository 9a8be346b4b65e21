use regex::Regex;

use balancer_core::{BalancerError, ClusterAdminClient, Result};
use tracing::{info, warn};

use crate::analyzer::analyze;
use crate::health::HealthGate;
use crate::migrator::{MasterMigrator, MigrationOutcome, MigrationTarget};
use crate::probe::StateProbe;
use crate::retry::RetryPolicy;
use crate::selector::select_candidate;

/// Immutable configuration for one balancer run, built once by the caller
/// and passed explicitly; no component reads ambient process state.
#[derive(Debug, Clone)]
pub struct BalancerConfig {
    pub vhost: String,
    pub queue_filter: Regex,
    /// Skips the per-iteration health gate. The gate before the first
    /// iteration always runs.
    pub skip_health_check: bool,
    pub retry: RetryPolicy,
}

/// What one run did, reported on success.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub iterations: u64,
    pub migrations: u64,
    pub converged: u64,
}

/// The sequential rebalancing loop.
///
/// Each iteration starts from a fresh snapshot and moves at most one
/// queue. The loop never assumes a migration achieved its post-state: a
/// timed-out migration simply leaves the counts unchanged for the next
/// sample. Termination is the balance predicate, a terminal
/// no-eligible-queue condition, or a fatal error.
pub struct Rebalancer<'a, C> {
    client: &'a C,
    config: &'a BalancerConfig,
}

impl<'a, C: ClusterAdminClient> Rebalancer<'a, C> {
    pub fn new(client: &'a C, config: &'a BalancerConfig) -> Self {
        Rebalancer { client, config }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let probe = StateProbe::new(self.client);
        let gate = HealthGate::new(self.client);
        let migrator = MasterMigrator::new(self.client, &self.config.vhost);

        let mut summary = RunSummary::default();

        loop {
            summary.iterations += 1;

            let snapshot = probe.sample(&self.config.vhost).await?;
            let verdict = analyze(&snapshot)?;
            info!(
                iteration = summary.iterations,
                max_node = %verdict.max_node,
                max_count = verdict.max_count,
                min_node = %verdict.min_node,
                min_count = verdict.min_count,
                diff = verdict.diff,
                nodes = verdict.node_count,
                "sampled leadership distribution"
            );

            if verdict.balanced {
                info!(
                    iterations = summary.iterations,
                    migrations = summary.migrations,
                    converged = summary.converged,
                    "leadership distribution is balanced"
                );
                return Ok(summary);
            }

            if summary.iterations == 1 || !self.config.skip_health_check {
                gate.check(snapshot.node_ids()).await?;
            }

            let Some(queue) =
                select_candidate(&snapshot, &verdict.max_node, &self.config.queue_filter)
            else {
                // Terminal: re-selecting the same unsatisfiable set would
                // spin forever, so surface it as a hard stop instead.
                return Err(BalancerError::NoEligibleQueue {
                    node: verdict.max_node,
                    filter: self.config.queue_filter.to_string(),
                });
            };

            if queue.leader == verdict.min_node {
                warn!(
                    queue = %queue.name,
                    node = %queue.leader,
                    "candidate already led by the target node, skipping this pass"
                );
                continue;
            }

            let target = MigrationTarget {
                queue: queue.name.clone(),
                source: queue.leader.clone(),
                target: verdict.min_node.clone(),
            };

            summary.migrations += 1;
            match migrator
                .migrate(&target, snapshot.node_count(), &self.config.retry)
                .await?
            {
                MigrationOutcome::Converged => summary.converged += 1,
                MigrationOutcome::TimedOut => {
                    warn!(queue = %target.queue, "migration timed out, moving on to the next candidate");
                }
            }
        }
    }
}
