// Copyright (c) 2025 - Cowboy AI, Inc.
//! Remote Network API Contract
//!
//! The remote models every mutation as an asynchronous [`Action`] that must be
//! polled until it reaches a terminal status. Mutations collide with each other
//! optimistically and report [`ApiErrorCode::Conflict`](crate::errors::ApiErrorCode).
//!
//! ```text
//! get_network(id)            → Network | None
//! add_subnet(spec)           → Action  | Conflict
//! delete_subnet(id, range)   → Action  | Conflict, Locked, SubnetsAttached, NotFound
//! get_action(id)             → Action  | None
//! ```
//!
//! Implementations:
//! - [`HcloudClient`] - Hetzner Cloud v1 REST binding (feature `http`)
//! - [`InMemoryNetworkApi`] - In-process network store with scriptable failures

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::domain::{IpRange, Network, SubnetSpec};
use crate::errors::{ApiResult, SubnetError, SubnetResult};

#[cfg(feature = "http")]
pub mod http;
pub mod memory;

#[cfg(feature = "http")]
pub use http::HcloudClient;
pub use memory::{ActionOutcome, ActionPlan, InMemoryNetworkApi, Operation};

/// Status of a remote action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Running,
    Success,
    Error,
}

impl ActionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ActionStatus::Running)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionStatus::Running => "running",
            ActionStatus::Success => "success",
            ActionStatus::Error => "error",
        })
    }
}

/// Resource an action operates on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResource {
    pub id: u64,
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// Error attached to a failed action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionError {
    pub code: String,
    pub message: String,
}

/// Asynchronous, pollable mutation handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: u64,
    #[serde(default)]
    pub command: String,
    pub status: ActionStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resources: Vec<ActionResource>,
    #[serde(default)]
    pub error: Option<ActionError>,
}

/// Remote network API consumed by the reconciler
///
/// Implementations must be safe to share across tasks; the reconciler holds
/// no other state.
#[async_trait]
pub trait NetworkApi: Send + Sync {
    /// Fetch a network with its subnets; `None` when it does not exist
    async fn get_network(&self, id: u64) -> ApiResult<Option<Network>>;

    /// Add a subnet to `spec.network_id`
    async fn add_subnet(&self, spec: &SubnetSpec) -> ApiResult<Action>;

    /// Delete the subnet with the given range from a network
    async fn delete_subnet(&self, network_id: u64, ip_range: &IpRange) -> ApiResult<Action>;

    /// Fetch the current state of an action; `None` when it does not exist
    async fn get_action(&self, id: u64) -> ApiResult<Option<Action>>;
}

/// Race a remote call against cancellation
///
/// The call's [`ApiError`](crate::errors::ApiError) is mapped into the
/// reconciler taxonomy.
pub async fn cancellable<T, F>(cancel: &CancellationToken, what: &str, call: F) -> SubnetResult<T>
where
    F: Future<Output = ApiResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SubnetError::Cancelled(format!("{} cancelled", what))),
        result = call => result.map_err(SubnetError::from),
    }
}
