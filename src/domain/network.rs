// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid subnet type: {0} (must be cloud, server or vswitch)")]
    InvalidSubnetType(String),

    #[error("Network zone must not be empty")]
    EmptyNetworkZone,

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("vswitch_id is only valid for vswitch subnets, got type {0}")]
    UnexpectedVswitchId(SubnetType),

    #[error("vswitch subnets require a vswitch_id")]
    MissingVswitchId,
}

/// Canonical IP range (CIDR block) value object
///
/// Invariants:
/// - Parsed from explicit `address/prefix` notation
/// - Host bits are masked off, so `10.0.1.5/24` becomes `10.0.1.0/24`
///
/// The canonical text is the identity of a subnet. Two ranges are the same
/// subnet iff their [`IpRange::canonical`] strings are equal.
///
/// # Examples
///
/// ```rust
/// use cim_network_subnet::domain::IpRange;
///
/// let range = IpRange::parse("10.0.1.5/24").unwrap();
/// assert_eq!(range.canonical(), "10.0.1.0/24");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpRange(IpNetwork);

impl IpRange {
    /// Parse and canonicalize a CIDR block
    pub fn parse(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();

        // A bare address would parse as a host route; require the prefix.
        if !cidr.contains('/') {
            return Err(NetworkError::InvalidCidr(cidr.to_string()));
        }

        let parsed = IpNetwork::from_str(cidr)
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;
        let masked = IpNetwork::new(parsed.network(), parsed.prefix())
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Ok(Self(masked))
    }

    /// Canonical textual form, used for identity and comparison
    pub fn canonical(&self) -> String {
        self.0.to_string()
    }

    /// Whether two ranges denote the same subnet
    pub fn same_range(&self, other: &IpRange) -> bool {
        self.canonical() == other.canonical()
    }

    /// Network address
    pub fn network_address(&self) -> IpAddr {
        self.0.network()
    }

    /// Prefix length
    pub fn prefix(&self) -> u8 {
        self.0.prefix()
    }

    /// Check if this is an IPv4 range
    pub fn is_ipv4(&self) -> bool {
        self.0.is_ipv4()
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IpRange {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for IpRange {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<IpRange> for String {
    fn from(range: IpRange) -> Self {
        range.canonical()
    }
}

/// Network zone value object (opaque, e.g. `eu-central`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkZone(String);

impl NetworkZone {
    /// Create a network zone; only emptiness is rejected
    pub fn new(zone: impl Into<String>) -> Result<Self, NetworkError> {
        let zone = zone.into();
        if zone.trim().is_empty() {
            return Err(NetworkError::EmptyNetworkZone);
        }
        Ok(Self(zone))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Subnet type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetType {
    /// Subnet for cloud servers
    Cloud,
    /// Legacy server subnet
    Server,
    /// Subnet coupled to a dedicated-server vSwitch
    Vswitch,
}

impl SubnetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubnetType::Cloud => "cloud",
            SubnetType::Server => "server",
            SubnetType::Vswitch => "vswitch",
        }
    }
}

impl fmt::Display for SubnetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubnetType {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cloud" => Ok(SubnetType::Cloud),
            "server" => Ok(SubnetType::Server),
            "vswitch" => Ok(SubnetType::Vswitch),
            other => Err(NetworkError::InvalidSubnetType(other.to_string())),
        }
    }
}

/// Subnet record as held by the remote network
///
/// Subnets have no identifier of their own; the IP range is unique within
/// the owning network and is the only natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    #[serde(rename = "type")]
    pub subnet_type: SubnetType,
    pub ip_range: IpRange,
    pub network_zone: NetworkZone,
    /// Computed by the remote, never client-supplied
    #[serde(default)]
    pub gateway: Option<IpAddr>,
    #[serde(default)]
    pub vswitch_id: Option<u64>,
}

/// Network aggregate owning an ordered set of subnets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip_range: Option<IpRange>,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
}

impl Network {
    /// Find the subnet with the given range by canonical-string comparison
    pub fn find_subnet(&self, ip_range: &IpRange) -> Option<&Subnet> {
        self.subnets
            .iter()
            .find(|subnet| subnet.ip_range.same_range(ip_range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_range_canonical() {
        let range = IpRange::parse("10.0.0.0/24").unwrap();
        assert_eq!(range.canonical(), "10.0.0.0/24");
        assert_eq!(range.prefix(), 24);
        assert!(range.is_ipv4());
    }

    #[test]
    fn test_ip_range_rejects_surrounding_whitespace() {
        assert!(IpRange::parse(" 10.0.0.0/24").is_err());
        assert!(IpRange::parse("10.0.0.0/24 ").is_err());
        assert!(IpRange::parse("10.0.0.0/24\n").is_err());
    }

    #[test]
    fn test_ip_range_masks_host_bits() {
        let range = IpRange::parse("192.168.100.17/24").unwrap();
        assert_eq!(range.canonical(), "192.168.100.0/24");
        assert!(range.same_range(&IpRange::parse("192.168.100.0/24").unwrap()));
    }

    #[test]
    fn test_ipv6_range() {
        let range = IpRange::parse("2001:db8::1/64").unwrap();
        assert_eq!(range.canonical(), "2001:db8::/64");
        assert!(!range.is_ipv4());
    }

    #[test]
    fn test_invalid_ip_range() {
        assert!(IpRange::parse("10.0.0.0").is_err()); // Missing prefix
        assert!(IpRange::parse("10.0.0.0/33").is_err()); // Invalid IPv4 prefix
        assert!(IpRange::parse("999.0.0.0/8").is_err());
        assert!(IpRange::parse("notacidr").is_err());
        assert!(IpRange::parse("").is_err());
    }

    #[test]
    fn test_ip_range_serde_is_canonical() {
        let range: IpRange = serde_json::from_str("\"10.0.1.9/24\"").unwrap();
        assert_eq!(serde_json::to_string(&range).unwrap(), "\"10.0.1.0/24\"");
        assert!(serde_json::from_str::<IpRange>("\"bogus\"").is_err());
    }

    #[test]
    fn test_subnet_type() {
        assert_eq!("vswitch".parse::<SubnetType>().unwrap(), SubnetType::Vswitch);
        assert!("VSWITCH".parse::<SubnetType>().is_err());
        assert_eq!(SubnetType::Cloud.to_string(), "cloud");
    }

    #[test]
    fn test_network_zone() {
        assert!(NetworkZone::new("eu-central").is_ok());
        assert_eq!(NetworkZone::new("  "), Err(NetworkError::EmptyNetworkZone));
    }

    #[test]
    fn test_network_deserialize_and_find() {
        let network: Network = serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "mynet",
            "ip_range": "10.0.0.0/16",
            "subnets": [
                {
                    "type": "cloud",
                    "ip_range": "10.0.0.0/24",
                    "network_zone": "eu-central",
                    "gateway": "10.0.0.1",
                    "vswitch_id": null
                }
            ],
            "servers": [],
            "labels": {}
        }))
        .unwrap();

        let found = network.find_subnet(&IpRange::parse("10.0.0.0/24").unwrap());
        assert_eq!(found.map(|s| s.subnet_type), Some(SubnetType::Cloud));
        assert_eq!(
            found.and_then(|s| s.gateway),
            Some("10.0.0.1".parse().unwrap())
        );
        assert!(network
            .find_subnet(&IpRange::parse("10.0.1.0/24").unwrap())
            .is_none());
    }
}
