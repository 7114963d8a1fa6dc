//! Network subnet reconciliation for the Composable Information Machine
//!
//! Subnets of a cloud network have no identifier of their own and every
//! mutation of them is an asynchronous action that collides optimistically
//! with concurrent changes. This crate provides:
//!
//! - a composite `<network id>-<ip range>` identity ([`SubnetId`])
//! - lookup of a subnet from that identity ([`SubnetLookup`])
//! - a bounded retry executor for contention ([`RetryPolicy`])
//! - a poller that blocks until an action finishes ([`ActionWaiter`])
//! - create/read/delete convergence composing the above ([`SubnetReconciler`])

pub mod action;
pub mod api;
pub mod config;
pub mod domain;
pub mod errors;
pub mod lookup;
pub mod reconciler;
pub mod retry;

// Re-export commonly used types
pub use action::{ActionWaiter, WaitConfig};
pub use api::{Action, ActionStatus, NetworkApi};
pub use config::{ConfigError, ReconcilerConfig};
pub use domain::{IpRange, SubnetId, SubnetKind, SubnetSpec, SubnetState};
pub use errors::{ApiError, ApiErrorCode, SubnetError, SubnetResult};
pub use lookup::{ResolvedSubnet, SubnetLookup};
pub use reconciler::{GoneReason, ReadOutcome, SubnetReconciler};
pub use retry::{RetryConfig, RetryDecision, RetryPolicy};
