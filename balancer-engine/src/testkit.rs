//! In-memory admin client for engine tests.
//!
//! Records every call, serves cluster state from plain vectors, and can
//! simulate leader movement (a pin policy takes effect), unhealthy nodes
//! and failing admin operations.

use std::sync::Mutex;

use async_trait::async_trait;
use balancer_core::{BalancerError, ClusterAdminClient, QueueLeader, Result};

#[derive(Default)]
struct MockState {
    nodes: Vec<String>,
    /// (queue name, raw leader id)
    queues: Vec<(String, String)>,
    /// Installed policy names, insertion order.
    policies: Vec<String>,
    calls: Vec<String>,
    /// Node that fails its health probe, with diagnostics.
    unhealthy: Option<(String, String)>,
    /// Fail health probes once more than N of them have run.
    health_fail_after: Option<(usize, String, String)>,
    /// Admin operation that fails unconditionally.
    failing_op: Option<&'static str>,
    /// When set, a "nodes" pin policy actually moves the queue leader.
    converge_on_pin: bool,
}

pub struct MockAdmin {
    state: Mutex<MockState>,
}

impl MockAdmin {
    pub fn new(nodes: &[&str], queues: &[(&str, &str)]) -> Self {
        MockAdmin {
            state: Mutex::new(MockState {
                nodes: nodes.iter().map(|n| n.to_string()).collect(),
                queues: queues
                    .iter()
                    .map(|(q, l)| (q.to_string(), l.to_string()))
                    .collect(),
                ..MockState::default()
            }),
        }
    }

    pub fn set_unhealthy(&self, node: &str, details: &str) {
        self.state.lock().unwrap().unhealthy = Some((node.to_string(), details.to_string()));
    }

    pub fn fail_health_after(&self, probes: usize, node: &str, details: &str) {
        self.state.lock().unwrap().health_fail_after =
            Some((probes, node.to_string(), details.to_string()));
    }

    pub fn fail_op(&self, op: &'static str) {
        self.state.lock().unwrap().failing_op = Some(op);
    }

    pub fn converge_on_pin(&self, yes: bool) {
        self.state.lock().unwrap().converge_on_pin = yes;
    }

    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn policy_names(&self) -> Vec<String> {
        self.state.lock().unwrap().policies.clone()
    }
}

fn check_failing(state: &MockState, op: &'static str) -> Result<()> {
    if state.failing_op == Some(op) {
        return Err(BalancerError::rpc(op, "injected failure"));
    }
    Ok(())
}

#[async_trait]
impl ClusterAdminClient for MockAdmin {
    async fn list_running_nodes(&self) -> Result<Vec<String>> {
        let mut st = self.state.lock().unwrap();
        st.calls.push("list_running_nodes".to_string());
        check_failing(&st, "list_running_nodes")?;
        Ok(st.nodes.clone())
    }

    async fn list_queue_leaders(&self, vhost: &str) -> Result<Vec<QueueLeader>> {
        let mut st = self.state.lock().unwrap();
        st.calls.push(format!("list_queue_leaders {vhost}"));
        check_failing(&st, "list_queue_leaders")?;
        Ok(st
            .queues
            .iter()
            .map(|(name, raw)| QueueLeader {
                name: name.clone(),
                raw_leader: raw.clone(),
            })
            .collect())
    }

    async fn get_queue_leader(&self, vhost: &str, queue: &str) -> Result<String> {
        let mut st = self.state.lock().unwrap();
        st.calls.push(format!("get_queue_leader {vhost} {queue}"));
        check_failing(&st, "get_queue_leader")?;
        st.queues
            .iter()
            .find(|(name, _)| name == queue)
            .map(|(_, raw)| raw.clone())
            .ok_or_else(|| BalancerError::Probe(format!("queue {queue} not found")))
    }

    async fn set_policy(
        &self,
        _vhost: &str,
        name: &str,
        _priority: i64,
        pattern: &str,
        definition: &serde_json::Value,
    ) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        st.calls
            .push(format!("set_policy {name} {pattern} {definition}"));
        check_failing(&st, "set_policy")?;

        if !st.policies.iter().any(|p| p == name) {
            st.policies.push(name.to_string());
        }

        // A pin definition moves the matched queue's leader when the mock
        // is told migrations converge.
        if st.converge_on_pin && definition["ha-mode"] == "nodes" {
            if let Some(target) = definition["ha-params"][0].as_str() {
                let target = target.to_string();
                for (qname, raw) in st.queues.iter_mut() {
                    if pattern == format!("^{}$", regex::escape(qname)) {
                        *raw = target.clone();
                    }
                }
            }
        }
        Ok(())
    }

    async fn clear_policy(&self, _vhost: &str, name: &str) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        st.calls.push(format!("clear_policy {name}"));
        check_failing(&st, "clear_policy")?;
        st.policies.retain(|p| p != name);
        Ok(())
    }

    async fn list_policies(&self, vhost: &str) -> Result<Vec<String>> {
        let mut st = self.state.lock().unwrap();
        st.calls.push(format!("list_policies {vhost}"));
        check_failing(&st, "list_policies")?;
        Ok(st.policies.clone())
    }

    async fn sync_queue(&self, vhost: &str, queue: &str) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        st.calls.push(format!("sync_queue {vhost} {queue}"));
        check_failing(&st, "sync_queue")?;
        Ok(())
    }

    async fn health_check(&self, node: &str) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        st.calls.push(format!("health_check {node}"));
        check_failing(&st, "health_check")?;

        let probes = st.calls.iter().filter(|c| c.starts_with("health_check")).count();
        if let Some((threshold, fail_node, details)) = &st.health_fail_after {
            if probes > *threshold {
                return Err(BalancerError::HealthCheck {
                    node: fail_node.clone(),
                    details: details.clone(),
                });
            }
        }
        if let Some((unode, details)) = &st.unhealthy {
            if unode == node {
                return Err(BalancerError::HealthCheck {
                    node: unode.clone(),
                    details: details.clone(),
                });
            }
        }
        Ok(())
    }
}
