//! # Balancer Engine
//!
//! The rebalancing control loop for queue-master leadership.
//!
//! ## Core Responsibilities
//!
//! - **State Sampling**: Takes a point-in-time snapshot of running nodes
//!   and per-queue leadership from the broker admin interface
//! - **Imbalance Analysis**: Finds the most- and least-loaded nodes and
//!   decides when the distribution is close enough to stop
//! - **Leadership Migration**: Moves one queue's leadership at a time via
//!   a four-phase policy protocol with bounded convergence polling
//! - **Run Exclusion**: Holds a marker-policy lock so two concurrent runs
//!   cannot race on the same temporary policies
//!
//! ## Architecture
//!
//! One iteration of the loop: sample → analyze → (stop if balanced) →
//! health gate → select a candidate queue on the overloaded node →
//! migrate it to the underloaded node → re-sample. The loop never assumes
//! a migration achieved its post-state; every decision starts from a
//! fresh snapshot.

pub mod analyzer;
pub mod balancer;
pub mod health;
pub mod lock;
pub mod migrator;
pub mod probe;
pub mod retry;
pub mod selector;

#[cfg(test)]
pub(crate) mod testkit;

// Re-export main types
pub use analyzer::{analyze, ImbalanceVerdict};
pub use balancer::{BalancerConfig, Rebalancer, RunSummary};
pub use health::HealthGate;
pub use lock::RunGuard;
pub use migrator::{MasterMigrator, MigrationOutcome, MigrationTarget};
pub use probe::{ClusterSnapshot, Queue, StateProbe};
pub use retry::{PollOutcome, RetryPolicy};
pub use selector::select_candidate;
