//! # Balancer Core
//!
//! Core types for the queue-master balancer: the typed admin client
//! interface consumed by the control loop, the `rabbitmqctl` subprocess
//! implementation of it, node-identifier normalization, and the error
//! taxonomy shared across the workspace.

pub mod admin;
pub mod ctl;
pub mod errors;
pub mod nodename;

// Re-export main types
pub use admin::{ClusterAdminClient, QueueLeader};
pub use ctl::RabbitmqCtl;
pub use errors::{BalancerError, Result};
pub use nodename::normalize;
