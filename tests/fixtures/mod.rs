// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-network-subnet
//!
//! Provides deterministic networks, specs and a reconciler wired to the
//! in-memory API with fast retry and polling settings.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cim_network_subnet::api::InMemoryNetworkApi;
use cim_network_subnet::domain::{
    IpRange, Network, NetworkZone, Subnet, SubnetKind, SubnetSpec, SubnetType,
};
use cim_network_subnet::{RetryConfig, SubnetReconciler, WaitConfig};

pub const NETWORK_ID: u64 = 42;
pub const OTHER_NETWORK_ID: u64 = 43;
pub const EXISTING_RANGE: &str = "10.0.0.0/24";
pub const ZONE: &str = "eu-central";
pub const MAX_ATTEMPTS: u32 = 4;

pub fn ip_range(cidr: &str) -> IpRange {
    IpRange::parse(cidr).expect("Invalid CIDR in test fixture")
}

pub fn cloud_subnet(cidr: &str, gateway: &str) -> Subnet {
    Subnet {
        subnet_type: SubnetType::Cloud,
        ip_range: ip_range(cidr),
        network_zone: NetworkZone::new(ZONE).expect("Invalid zone in test fixture"),
        gateway: Some(gateway.parse().expect("Invalid gateway in test fixture")),
        vswitch_id: None,
    }
}

/// Network 42 (10.0.0.0/16) with one cloud subnet 10.0.0.0/24
pub fn network_fixture() -> Network {
    Network {
        id: NETWORK_ID,
        name: "fixture-net".to_string(),
        ip_range: Some(ip_range("10.0.0.0/16")),
        subnets: vec![cloud_subnet(EXISTING_RANGE, "10.0.0.1")],
    }
}

pub fn empty_network_fixture(id: u64) -> Network {
    Network {
        id,
        name: format!("fixture-net-{}", id),
        ip_range: Some(ip_range("10.0.0.0/8")),
        subnets: vec![],
    }
}

pub fn cloud_spec(network_id: u64, cidr: &str) -> SubnetSpec {
    SubnetSpec::new(network_id, cidr, ZONE, SubnetKind::Cloud).expect("Invalid spec in test fixture")
}

pub fn api_fixture() -> Arc<InMemoryNetworkApi> {
    Arc::new(
        InMemoryNetworkApi::new()
            .with_network(network_fixture())
            .with_network(empty_network_fixture(OTHER_NETWORK_ID)),
    )
}

/// Reconciler with bounded attempts and fast polling
pub fn reconciler_fixture(api: Arc<InMemoryNetworkApi>) -> SubnetReconciler {
    SubnetReconciler::new(api)
        .with_retry(
            RetryConfig::default()
                .with_max_attempts(MAX_ATTEMPTS)
                .with_base_delay(Duration::from_millis(10))
                .with_max_delay(Duration::from_millis(50)),
        )
        .with_wait_config(WaitConfig {
            poll_interval: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
        })
}
