use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::admin::{ClusterAdminClient, QueueLeader};
use crate::errors::{BalancerError, Result};

/// Admin client backed by the broker's control tool (`rabbitmqctl`).
///
/// Every operation is one subprocess invocation, awaited to completion.
/// State queries use `--formatter json`; mutations are plain invocations
/// whose exit status decides success.
#[derive(Debug, Clone)]
pub struct RabbitmqCtl {
    program: String,
    /// Optional `-n` target node passed through on every invocation.
    node: Option<String>,
}

#[derive(Deserialize)]
struct ClusterStatus {
    running_nodes: Vec<String>,
}

#[derive(Deserialize)]
struct QueueRow {
    name: String,
    pid: String,
}

#[derive(Deserialize)]
struct PolicyRow {
    name: String,
}

impl RabbitmqCtl {
    pub fn new(program: impl Into<String>, node: Option<String>) -> Self {
        RabbitmqCtl {
            program: program.into(),
            node,
        }
    }

    /// Verifies the control tool can be spawned at all. A missing or
    /// non-executable program is a precondition failure, reported before
    /// any cluster state is touched.
    pub async fn preflight(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("version")
            .output()
            .await
            .map_err(|e| {
                BalancerError::Precondition(format!(
                    "control tool {} not runnable: {}",
                    self.program, e
                ))
            })?;
        if !output.status.success() {
            return Err(BalancerError::Precondition(format!(
                "control tool {} failed version probe: {}",
                self.program,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    /// Runs the control tool with the given arguments, returning stdout.
    async fn run(&self, op: &'static str, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        if let Some(node) = &self.node {
            cmd.args(["-n", node]);
        }
        cmd.args(args);

        debug!(program = %self.program, op = %op, "invoking control tool");

        let output = cmd
            .output()
            .await
            .map_err(|e| BalancerError::rpc(op, format!("failed to spawn {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(BalancerError::rpc(
                op,
                format!(
                    "exit status {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn parse_running_nodes(raw: &str) -> Result<Vec<String>> {
    let status: ClusterStatus = serde_json::from_str(raw)
        .map_err(|e| BalancerError::Probe(format!("unparseable cluster status: {}", e)))?;
    Ok(status.running_nodes)
}

fn parse_queue_rows(raw: &str) -> Result<Vec<QueueLeader>> {
    let rows: Vec<QueueRow> = serde_json::from_str(raw)
        .map_err(|e| BalancerError::Probe(format!("unparseable queue listing: {}", e)))?;
    Ok(rows
        .into_iter()
        .map(|row| QueueLeader {
            name: row.name,
            raw_leader: row.pid,
        })
        .collect())
}

fn parse_policy_names(raw: &str) -> Result<Vec<String>> {
    let rows: Vec<PolicyRow> = serde_json::from_str(raw)
        .map_err(|e| BalancerError::Probe(format!("unparseable policy listing: {}", e)))?;
    Ok(rows.into_iter().map(|row| row.name).collect())
}

#[async_trait::async_trait]
impl ClusterAdminClient for RabbitmqCtl {
    async fn list_running_nodes(&self) -> Result<Vec<String>> {
        let out = self
            .run("cluster_status", &["cluster_status", "--formatter", "json"])
            .await?;
        parse_running_nodes(&out)
    }

    async fn list_queue_leaders(&self, vhost: &str) -> Result<Vec<QueueLeader>> {
        let out = self
            .run(
                "list_queues",
                &[
                    "list_queues",
                    "-p",
                    vhost,
                    "name",
                    "pid",
                    "--formatter",
                    "json",
                ],
            )
            .await?;
        parse_queue_rows(&out)
    }

    async fn get_queue_leader(&self, vhost: &str, queue: &str) -> Result<String> {
        let leaders = self.list_queue_leaders(vhost).await?;
        leaders
            .into_iter()
            .find(|q| q.name == queue)
            .map(|q| q.raw_leader)
            .ok_or_else(|| {
                BalancerError::Probe(format!("queue {} not found in vhost {}", queue, vhost))
            })
    }

    async fn set_policy(
        &self,
        vhost: &str,
        name: &str,
        priority: i64,
        pattern: &str,
        definition: &serde_json::Value,
    ) -> Result<()> {
        let definition = definition.to_string();
        let priority = priority.to_string();
        self.run(
            "set_policy",
            &[
                "set_policy",
                "-p",
                vhost,
                "--priority",
                &priority,
                "--apply-to",
                "queues",
                name,
                pattern,
                &definition,
            ],
        )
        .await?;
        Ok(())
    }

    async fn clear_policy(&self, vhost: &str, name: &str) -> Result<()> {
        self.run("clear_policy", &["clear_policy", "-p", vhost, name])
            .await?;
        Ok(())
    }

    async fn list_policies(&self, vhost: &str) -> Result<Vec<String>> {
        let out = self
            .run(
                "list_policies",
                &["list_policies", "-p", vhost, "--formatter", "json"],
            )
            .await?;
        parse_policy_names(&out)
    }

    async fn sync_queue(&self, vhost: &str, queue: &str) -> Result<()> {
        self.run("sync_queue", &["sync_queue", "-p", vhost, queue])
            .await?;
        Ok(())
    }

    async fn health_check(&self, node: &str) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-n", node, "node_health_check"]);

        let output = cmd.output().await.map_err(|e| {
            BalancerError::rpc("node_health_check", format!("failed to spawn {}: {}", self.program, e))
        })?;

        if !output.status.success() {
            let mut details = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                if !details.is_empty() {
                    details.push('\n');
                }
                details.push_str(stderr.trim());
            }
            return Err(BalancerError::HealthCheck {
                node: node.to_string(),
                details,
            });
        }
        Ok(())
    }
}
