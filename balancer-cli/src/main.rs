use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use regex::Regex;
use tracing::info;

use balancer_core::{BalancerError, ClusterAdminClient, RabbitmqCtl};
use balancer_engine::{BalancerConfig, Rebalancer, RetryPolicy, RunGuard};

/// Interval between leadership convergence polls. Deliberately fixed:
/// the retry budget is the operator-tunable knob.
const RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Rebalancing a single node is meaningless.
const MIN_CLUSTER_SIZE: usize = 2;

#[derive(Debug, Parser)]
#[command(name = "queue-master-balancer")]
#[command(about = "Rebalance queue-master assignments across the nodes of a broker cluster", long_about = None)]
struct Cli {
    #[arg(long, default_value = "/", help = "Vhost whose queues are rebalanced")]
    vhost: String,

    #[arg(
        long,
        default_value = ".*",
        help = "Regex over queue names; only matching queues are migrated"
    )]
    queue_filter: String,

    #[arg(
        long,
        default_value_t = false,
        help = "Skip the per-iteration node health checks (the initial check always runs)"
    )]
    skip_health_check: bool,

    #[arg(
        long,
        default_value_t = 60,
        help = "Max attempts of the per-migration leadership convergence poll"
    )]
    max_retries: u32,

    #[arg(long, default_value = "rabbitmqctl", help = "Broker control program")]
    ctl: String,

    #[arg(long, help = "Cluster node the control program should talk to (its -n flag)")]
    node: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let queue_filter = Regex::new(&cli.queue_filter)
        .with_context(|| format!("invalid queue filter pattern: {}", cli.queue_filter))?;

    let config = BalancerConfig {
        vhost: cli.vhost,
        queue_filter,
        skip_health_check: cli.skip_health_check,
        retry: RetryPolicy::new(cli.max_retries, RETRY_INTERVAL),
    };

    let client = RabbitmqCtl::new(cli.ctl, cli.node);
    client.preflight().await?;

    // The loop needs somewhere to move leadership to.
    let nodes = client.list_running_nodes().await?;
    if nodes.len() < MIN_CLUSTER_SIZE {
        return Err(BalancerError::Precondition(format!(
            "cluster reports {} running node(s), need at least {}",
            nodes.len(),
            MIN_CLUSTER_SIZE
        ))
        .into());
    }
    info!(nodes = nodes.len(), vhost = %config.vhost, "starting rebalance run");

    let guard = RunGuard::acquire(&client, &config.vhost).await?;
    let result = Rebalancer::new(&client, &config).run().await;
    guard.release().await;

    let summary = result?;
    info!(
        iterations = summary.iterations,
        migrations = summary.migrations,
        converged = summary.converged,
        "rebalance run finished"
    );

    Ok(())
}
