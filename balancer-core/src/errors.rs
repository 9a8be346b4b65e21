use thiserror::Error;

pub type Result<T> = std::result::Result<T, BalancerError>;

/// Error taxonomy for one balancer run.
///
/// Every variant is fatal to the run; a migration that merely fails to
/// converge within its retry budget is reported as
/// `MigrationOutcome::TimedOut` by the migrator, not as an error.
#[derive(Error, Debug)]
pub enum BalancerError {
    #[error("precondition not met: {0}")]
    Precondition(String),

    #[error("health check failed on node {node}: {details}")]
    HealthCheck { node: String, details: String },

    #[error("cluster state probe failed: {0}")]
    Probe(String),

    #[error("admin operation {op} failed: {detail}")]
    Rpc { op: &'static str, detail: String },

    #[error("no queue on overloaded node {node} matches filter {filter}; cannot make progress")]
    NoEligibleQueue { node: String, filter: String },
}

impl BalancerError {
    pub fn rpc(op: &'static str, detail: impl Into<String>) -> Self {
        BalancerError::Rpc {
            op,
            detail: detail.into(),
        }
    }
}
