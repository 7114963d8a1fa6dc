// Copyright (c) 2025 - Cowboy AI, Inc.
//! Composite Subnet Identifier
//!
//! The remote API assigns no standalone id to a subnet. The only stable
//! identifying attributes are the owning network and the subnet's immutable
//! IP range, so the persisted id is their concatenation:
//!
//! ```text
//! <network id>-<canonical ip range>
//! 123-192.168.100.0/24
//! ```
//!
//! Network ids are purely numeric, so splitting on the first `-` is
//! unambiguous.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::network::IpRange;

/// Separator between network id and IP range
pub const SUBNET_ID_SEPARATOR: char = '-';

/// Error decoding a composite subnet id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid network subnet id {id:?}: {reason}")]
pub struct InvalidSubnetId {
    pub id: String,
    pub reason: &'static str,
}

impl InvalidSubnetId {
    fn new(id: &str, reason: &'static str) -> Self {
        Self {
            id: id.to_string(),
            reason,
        }
    }
}

/// Composite identifier of a subnet: owning network plus canonical IP range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubnetId {
    network_id: u64,
    ip_range: IpRange,
}

impl SubnetId {
    pub fn new(network_id: u64, ip_range: IpRange) -> Self {
        Self {
            network_id,
            ip_range,
        }
    }

    /// Encode the persisted id string
    pub fn encode(network_id: u64, ip_range: &IpRange) -> String {
        format!("{}{}{}", network_id, SUBNET_ID_SEPARATOR, ip_range.canonical())
    }

    /// Decode a persisted id string
    pub fn decode(s: &str) -> Result<Self, InvalidSubnetId> {
        if s.is_empty() {
            return Err(InvalidSubnetId::new(s, "empty id"));
        }

        let (network_part, range_part) = s
            .split_once(SUBNET_ID_SEPARATOR)
            .ok_or_else(|| InvalidSubnetId::new(s, "missing separator"))?;

        if network_part.is_empty() || !network_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidSubnetId::new(s, "network id is not an integer"));
        }
        let network_id = network_part
            .parse::<u64>()
            .map_err(|_| InvalidSubnetId::new(s, "network id is not an integer"))?;
        if network_id == 0 {
            return Err(InvalidSubnetId::new(s, "network id must be positive"));
        }

        let ip_range = IpRange::parse(range_part)
            .map_err(|_| InvalidSubnetId::new(s, "ip range is not a valid CIDR"))?;

        Ok(Self {
            network_id,
            ip_range,
        })
    }

    pub fn network_id(&self) -> u64 {
        self.network_id
    }

    pub fn ip_range(&self) -> &IpRange {
        &self.ip_range
    }
}

impl fmt::Display for SubnetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::encode(self.network_id, &self.ip_range))
    }
}

impl FromStr for SubnetId {
    type Err = InvalidSubnetId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<String> for SubnetId {
    type Error = InvalidSubnetId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::decode(&value)
    }
}

impl From<SubnetId> for String {
    fn from(id: SubnetId) -> Self {
        id.to_string()
    }
}
