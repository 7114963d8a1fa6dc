// Copyright (c) 2025 - Cowboy AI, Inc.
//! Subnet Reconciler
//!
//! Converges a single subnet of a network towards the requested state.
//! Subnets are immutable, so the only operations are create, read and delete.
//!
//! # Operation Pattern
//!
//! ```text
//! mutate (RetryPolicy) → Action → ActionWaiter → identity (SubnetId/SubnetLookup)
//! ```
//!
//! # Convergence Semantics
//!
//! - Create fails as a whole when its action fails; no partial state is assumed.
//! - Read reports a subnet that is gone or whose id is undecodable as
//!   [`ReadOutcome::Gone`], with the reason kept for diagnostics.
//! - Delete of something already absent succeeds.
//!
//! The reconciler holds no mutable state; concurrent calls against the same
//! network are arbitrated by the remote through conflicts and the bounded
//! retry.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::{ActionWaiter, WaitConfig};
use crate::api::{cancellable, NetworkApi};
use crate::config::ReconcilerConfig;
use crate::domain::{FieldMap, SubnetId, SubnetSpec, SubnetState};
use crate::errors::{SubnetError, SubnetResult};
use crate::lookup::SubnetLookup;
use crate::retry::{retry_on_conflict, retry_on_contention, RetryConfig, RetryPolicy};

/// Why a read found nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoneReason {
    /// The persisted id could not be decoded; the cached record may be corrupt
    InvalidIdentifier(String),
    /// The network or the subnet no longer exists
    NotFound,
}

/// Result of a read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Found(SubnetState),
    Gone(GoneReason),
}

impl ReadOutcome {
    pub fn into_state(self) -> Option<SubnetState> {
        match self {
            ReadOutcome::Found(state) => Some(state),
            ReadOutcome::Gone(_) => None,
        }
    }
}

/// Create/read/delete convergence for network subnets
#[derive(Clone)]
pub struct SubnetReconciler {
    api: Arc<dyn NetworkApi>,
    retry: RetryPolicy,
    wait: WaitConfig,
}

impl SubnetReconciler {
    /// Create a reconciler with default retry and wait settings
    pub fn new(api: Arc<dyn NetworkApi>) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
            wait: WaitConfig::default(),
        }
    }

    /// Create a reconciler from loaded configuration
    pub fn from_config(api: Arc<dyn NetworkApi>, config: &ReconcilerConfig) -> Self {
        Self::new(api)
            .with_retry(config.retry_config())
            .with_wait_config(config.wait_config())
    }

    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry = RetryPolicy::new(config);
        self
    }

    pub fn with_wait_config(mut self, config: WaitConfig) -> Self {
        self.wait = config;
        self
    }

    fn waiter(&self) -> ActionWaiter<'_> {
        ActionWaiter::new(self.api.as_ref(), self.wait.clone())
    }

    /// Create a subnet and return its composite id
    pub async fn create(
        &self,
        spec: &SubnetSpec,
        cancel: &CancellationToken,
    ) -> SubnetResult<SubnetId> {
        let api = self.api.as_ref();
        let subject = format!("network {}", spec.network_id);

        info!(
            "Adding {} subnet {} to network {}",
            spec.kind.subnet_type(),
            spec.ip_range,
            spec.network_id
        );

        let action = self
            .retry
            .execute(cancel, retry_on_conflict, move |attempt| async move {
                debug!("add_subnet attempt {}", attempt);
                cancellable(cancel, "add subnet", api.add_subnet(spec)).await
            })
            .await?;

        self.waiter()
            .wait_for_completion(&action, &subject, cancel)
            .await?;

        let id = SubnetId::new(spec.network_id, spec.ip_range);
        info!("Created network subnet {}", id);
        Ok(id)
    }

    /// Create a subnet, then read it back from the remote
    ///
    /// The action result alone is not trusted; the returned state is what the
    /// remote reports after the action finished.
    pub async fn create_and_read(
        &self,
        spec: &SubnetSpec,
        cancel: &CancellationToken,
    ) -> SubnetResult<SubnetState> {
        let id = self.create(spec, cancel).await?;

        match self.read(&id.to_string(), cancel).await? {
            ReadOutcome::Found(state) => Ok(state),
            ReadOutcome::Gone(_) => Err(SubnetError::NotFound(format!(
                "network subnet {} not present after creation",
                id
            ))),
        }
    }

    /// Create a subnet from a declarative field map and read it back
    ///
    /// Malformed fields fail with [`SubnetError::InvalidInput`] before any
    /// remote call is made.
    pub async fn create_from_fields(
        &self,
        fields: &FieldMap,
        cancel: &CancellationToken,
    ) -> SubnetResult<SubnetState> {
        let spec = SubnetSpec::from_fields(fields)?;
        self.create_and_read(&spec, cancel).await
    }

    /// Read the current state of a subnet
    ///
    /// Also serves imports: the id is the only handle an existing subnet has.
    pub async fn read(&self, id: &str, cancel: &CancellationToken) -> SubnetResult<ReadOutcome> {
        match SubnetLookup::new(self.api.as_ref()).resolve(id, cancel).await {
            Ok(Some(resolved)) => {
                let state = SubnetState::from_remote(&resolved.network, &resolved.subnet);
                debug!("Read network subnet {}", state.id);
                Ok(ReadOutcome::Found(state))
            }
            Ok(None) => {
                warn!("Network subnet ({}) not found, removing from state", id);
                Ok(ReadOutcome::Gone(GoneReason::NotFound))
            }
            Err(SubnetError::InvalidIdentifier(reason)) => {
                warn!("Invalid id ({}), removing from state: {}", id, reason);
                Ok(ReadOutcome::Gone(GoneReason::InvalidIdentifier(reason)))
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a subnet; deleting an absent subnet succeeds
    pub async fn delete(&self, id: &str, cancel: &CancellationToken) -> SubnetResult<()> {
        let resolved = match SubnetLookup::new(self.api.as_ref()).resolve(id, cancel).await {
            Ok(Some(resolved)) => resolved,
            Ok(None) => {
                info!("Network subnet ({}) already absent", id);
                return Ok(());
            }
            Err(SubnetError::InvalidIdentifier(reason)) => {
                warn!("Invalid id ({}), nothing to delete: {}", id, reason);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let api = self.api.as_ref();
        let network_id = resolved.network.id;
        let ip_range = &resolved.subnet.ip_range;

        info!("Deleting subnet {} from network {}", ip_range, network_id);

        let result = self
            .retry
            .execute(cancel, retry_on_contention, move |attempt| async move {
                debug!("delete_subnet attempt {}", attempt);
                cancellable(cancel, "delete subnet", api.delete_subnet(network_id, ip_range)).await
            })
            .await;

        let action = match result {
            Ok(action) => action,
            Err(SubnetError::NotFound(_)) => {
                info!("Network subnet ({}) was deleted concurrently", id);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.waiter()
            .wait_for_completion(&action, &format!("network {}", network_id), cancel)
            .await?;

        info!("Deleted network subnet {}", SubnetId::new(network_id, *ip_range));
        Ok(())
    }
}
