// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Subnet Domain Models
//!
//! Value objects and records for networks and their subnets.
//!
//! # Value Objects with Invariants
//!
//! - [`IpRange`] - CIDR block in canonical (host-bits-masked) form
//! - [`NetworkZone`] - Non-empty opaque zone name
//! - [`SubnetType`] / [`SubnetKind`] - cloud, server or vswitch
//! - [`SubnetId`] - Composite `<network id>-<ip range>` identifier
//!
//! # Records
//!
//! - [`Network`] - Aggregate owning its subnets
//! - [`Subnet`] - Remote subnet record (no own id)
//! - [`SubnetSpec`] - Strict create input
//! - [`SubnetState`] - Observed state returned by reads

pub mod network;
pub mod subnet;
pub mod subnet_id;

pub use network::{IpRange, Network, NetworkError, NetworkZone, Subnet, SubnetType};
pub use subnet::{FieldMap, SubnetKind, SubnetSpec, SubnetState};
pub use subnet_id::{InvalidSubnetId, SubnetId, SUBNET_ID_SEPARATOR};
