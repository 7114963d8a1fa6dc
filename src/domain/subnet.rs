// Copyright (c) 2025 - Cowboy AI, Inc.
//! Subnet Input and State Records
//!
//! [`SubnetSpec`] is the strict record a create consumes. [`SubnetState`] is
//! what a read produces. Both convert to and from the loosely typed field maps
//! used by declarative configuration layers; the conversion into
//! [`SubnetSpec`] is the single place those values are validated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::IpAddr;

use super::network::{IpRange, Network, NetworkError, NetworkZone, Subnet, SubnetType};
use super::subnet_id::SubnetId;

/// Loosely typed field map from a declarative layer
pub type FieldMap = Map<String, Value>;

/// Subnet kind; the vSwitch id lives inside the variant that needs it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SubnetKind {
    Cloud,
    Server,
    Vswitch { vswitch_id: u64 },
}

impl SubnetKind {
    /// Build a kind from a type and an optional vSwitch id
    pub fn new(subnet_type: SubnetType, vswitch_id: Option<u64>) -> Result<Self, NetworkError> {
        match (subnet_type, vswitch_id) {
            (SubnetType::Vswitch, Some(vswitch_id)) => Ok(SubnetKind::Vswitch { vswitch_id }),
            (SubnetType::Vswitch, None) => Err(NetworkError::MissingVswitchId),
            (other, Some(_)) => Err(NetworkError::UnexpectedVswitchId(other)),
            (SubnetType::Cloud, None) => Ok(SubnetKind::Cloud),
            (SubnetType::Server, None) => Ok(SubnetKind::Server),
        }
    }

    pub fn subnet_type(&self) -> SubnetType {
        match self {
            SubnetKind::Cloud => SubnetType::Cloud,
            SubnetKind::Server => SubnetType::Server,
            SubnetKind::Vswitch { .. } => SubnetType::Vswitch,
        }
    }

    pub fn vswitch_id(&self) -> Option<u64> {
        match self {
            SubnetKind::Vswitch { vswitch_id } => Some(*vswitch_id),
            _ => None,
        }
    }
}

/// Strict input record for creating a subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub network_id: u64,
    pub ip_range: IpRange,
    pub network_zone: NetworkZone,
    pub kind: SubnetKind,
}

impl SubnetSpec {
    /// Create a spec, validating the IP range
    pub fn new(
        network_id: u64,
        ip_range: &str,
        network_zone: &str,
        kind: SubnetKind,
    ) -> Result<Self, NetworkError> {
        Ok(Self {
            network_id,
            ip_range: IpRange::parse(ip_range)?,
            network_zone: NetworkZone::new(network_zone)?,
            kind,
        })
    }

    /// Convert a declarative field map into a spec
    ///
    /// Expected keys: `network_id` (integer), `type` (`cloud` | `server` |
    /// `vswitch`), `network_zone` (string), `ip_range` (CIDR string) and
    /// `vswitch_id` (integer, only with `type = vswitch`). Unknown keys such as
    /// `id` or `gateway` are ignored so a previously read state can be fed back.
    pub fn from_fields(fields: &FieldMap) -> Result<Self, NetworkError> {
        let network_id = required_u64(fields, "network_id")?;
        let subnet_type: SubnetType = required_str(fields, "type")?.parse()?;
        let network_zone = NetworkZone::new(required_str(fields, "network_zone")?)?;
        let ip_range = IpRange::parse(required_str(fields, "ip_range")?)?;
        let vswitch_id = optional_u64(fields, "vswitch_id")?;

        Ok(Self {
            network_id,
            ip_range,
            network_zone,
            kind: SubnetKind::new(subnet_type, vswitch_id)?,
        })
    }

    /// Id the subnet will have once created
    pub fn subnet_id(&self) -> SubnetId {
        SubnetId::new(self.network_id, self.ip_range)
    }
}

fn required_str<'a>(fields: &'a FieldMap, field: &'static str) -> Result<&'a str, NetworkError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(NetworkError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(NetworkError::InvalidField {
            field,
            expected: "string",
        }),
    }
}

fn optional_u64(fields: &FieldMap, field: &'static str) -> Result<Option<u64>, NetworkError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .filter(|id| *id > 0)
            .map(Some)
            .ok_or(NetworkError::InvalidField {
                field,
                expected: "positive integer",
            }),
    }
}

fn required_u64(fields: &FieldMap, field: &'static str) -> Result<u64, NetworkError> {
    optional_u64(fields, field)?.ok_or(NetworkError::MissingField(field))
}

/// Observed state of an existing subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetState {
    pub id: SubnetId,
    pub network_id: u64,
    #[serde(rename = "type")]
    pub subnet_type: SubnetType,
    pub network_zone: NetworkZone,
    pub ip_range: IpRange,
    pub gateway: Option<IpAddr>,
    pub vswitch_id: Option<u64>,
}

impl SubnetState {
    /// Build the state from a resolved network/subnet pair
    ///
    /// The id is re-encoded from the remote range so a non-canonical id
    /// converges to the canonical one.
    pub fn from_remote(network: &Network, subnet: &Subnet) -> Self {
        Self {
            id: SubnetId::new(network.id, subnet.ip_range),
            network_id: network.id,
            subnet_type: subnet.subnet_type,
            network_zone: subnet.network_zone.clone(),
            ip_range: subnet.ip_range,
            gateway: subnet.gateway,
            vswitch_id: match subnet.subnet_type {
                SubnetType::Vswitch => subnet.vswitch_id,
                _ => None,
            },
        }
    }

    /// Project the state into a declarative field map
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("id".into(), Value::from(self.id.to_string()));
        fields.insert("network_id".into(), Value::from(self.network_id));
        fields.insert("type".into(), Value::from(self.subnet_type.as_str()));
        fields.insert("network_zone".into(), Value::from(self.network_zone.as_str()));
        fields.insert("ip_range".into(), Value::from(self.ip_range.canonical()));
        fields.insert(
            "gateway".into(),
            Value::from(self.gateway.map(|g| g.to_string()).unwrap_or_default()),
        );
        if let Some(vswitch_id) = self.vswitch_id {
            fields.insert("vswitch_id".into(), Value::from(vswitch_id));
        }
        fields
    }
}
