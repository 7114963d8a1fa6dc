// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Composite Subnet Identity
//!
//! Encoding and decoding must agree for every network id and CIDR block,
//! and lookups must match on the canonical text regardless of the host bits
//! present in the persisted id.

use std::net::{Ipv4Addr, Ipv6Addr};

use cim_network_subnet::api::InMemoryNetworkApi;
use cim_network_subnet::domain::{IpRange, Network, NetworkZone, Subnet, SubnetId, SubnetType};
use cim_network_subnet::SubnetLookup;
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Strategies
// ============================================================================

fn ipv4_cidr() -> impl Strategy<Value = String> {
    (any::<u32>(), 0u8..=32).prop_map(|(addr, prefix)| format!("{}/{}", Ipv4Addr::from(addr), prefix))
}

fn ipv6_cidr() -> impl Strategy<Value = String> {
    (any::<u128>(), 0u8..=128)
        .prop_map(|(addr, prefix)| format!("{}/{}", Ipv6Addr::from(addr), prefix))
}

fn cidr() -> impl Strategy<Value = String> {
    prop_oneof![ipv4_cidr(), ipv6_cidr()]
}

fn network_id() -> impl Strategy<Value = u64> {
    1u64..=u64::MAX
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Decode(Encode(p, canonical(c))) == (p, canonical(c))
    #[test]
    fn prop_encode_decode_round_trip(p in network_id(), c in cidr()) {
        let range = IpRange::parse(&c).expect("strategy yields valid CIDR");
        let encoded = SubnetId::encode(p, &range);

        let decoded = SubnetId::decode(&encoded).expect("encoded id must decode");

        prop_assert_eq!(decoded.network_id(), p);
        prop_assert_eq!(decoded.ip_range().canonical(), range.canonical());
        prop_assert_eq!(decoded.to_string(), encoded);
    }

    /// Property: Canonicalization is idempotent
    #[test]
    fn prop_canonical_is_fixed_point(c in cidr()) {
        let once = IpRange::parse(&c).expect("strategy yields valid CIDR").canonical();
        let twice = IpRange::parse(&once).expect("canonical form must parse").canonical();

        prop_assert_eq!(once, twice);
    }

    /// Property: Non-numeric prefixes never decode
    #[test]
    fn prop_non_numeric_prefix_rejected(prefix in "[a-zA-Z]{1,8}", c in ipv4_cidr()) {
        let id = format!("{}-{}", prefix, c);
        prop_assert!(SubnetId::decode(&id).is_err());
    }

    /// Property: A subnet is found under any host-bit variant of its id
    #[test]
    fn prop_lookup_matches_canonical_text(p in network_id(), addr in any::<u32>(), prefix in 8u8..=30) {
        let stored = IpRange::parse(format!("{}/{}", Ipv4Addr::from(addr), prefix)).unwrap();
        let api = InMemoryNetworkApi::new().with_network(Network {
            id: p,
            name: "prop".to_string(),
            ip_range: None,
            subnets: vec![Subnet {
                subnet_type: SubnetType::Cloud,
                ip_range: stored,
                network_zone: NetworkZone::new("eu-central").unwrap(),
                gateway: None,
                vswitch_id: None,
            }],
        });

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let id = format!("{}-{}/{}", p, Ipv4Addr::from(addr), prefix);
        let resolved = runtime
            .block_on(SubnetLookup::new(&api).resolve(&id, &CancellationToken::new()))
            .unwrap();

        prop_assert!(resolved.is_some());
        prop_assert_eq!(resolved.unwrap().subnet.ip_range.canonical(), stored.canonical());
    }
}
