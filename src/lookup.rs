// Copyright (c) 2025 - Cowboy AI, Inc.
//! Subnet Lookup
//!
//! Resolves a composite subnet id to the owning network and the subnet record
//! by fetching the network and scanning its subnets. Matching compares the
//! canonical text of the IP ranges, never their structural equality.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{cancellable, NetworkApi};
use crate::domain::{Network, Subnet, SubnetId};
use crate::errors::{SubnetError, SubnetResult};

/// A subnet together with the network that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSubnet {
    pub network: Network,
    pub subnet: Subnet,
}

pub struct SubnetLookup<'a> {
    api: &'a dyn NetworkApi,
}

impl<'a> SubnetLookup<'a> {
    pub fn new(api: &'a dyn NetworkApi) -> Self {
        Self { api }
    }

    /// Resolve a persisted id string
    ///
    /// Fails with [`SubnetError::InvalidIdentifier`] when the id cannot be
    /// decoded. A missing network or subnet is `Ok(None)`.
    pub async fn resolve(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> SubnetResult<Option<ResolvedSubnet>> {
        let subnet_id =
            SubnetId::decode(id).map_err(|e| SubnetError::InvalidIdentifier(e.to_string()))?;
        self.resolve_id(&subnet_id, cancel).await
    }

    /// Resolve an already decoded id
    pub async fn resolve_id(
        &self,
        id: &SubnetId,
        cancel: &CancellationToken,
    ) -> SubnetResult<Option<ResolvedSubnet>> {
        let network =
            match cancellable(cancel, "get network", self.api.get_network(id.network_id())).await {
                Ok(network) => network,
                Err(SubnetError::NotFound(_)) => None,
                Err(e) => return Err(e),
            };

        let Some(network) = network else {
            debug!("Network {} of subnet {} not found", id.network_id(), id);
            return Ok(None);
        };

        match network.find_subnet(id.ip_range()).cloned() {
            Some(subnet) => Ok(Some(ResolvedSubnet { network, subnet })),
            None => {
                debug!(
                    "Network {} has no subnet with range {}",
                    network.id,
                    id.ip_range()
                );
                Ok(None)
            }
        }
    }
}
