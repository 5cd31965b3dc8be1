// ABOUTME: Property tests for free address selection.
// ABOUTME: Checks selection never returns a held address and reports exhaustion.

mod support;

use lanattach::attach::{
    AllocationPolicy, AttachErrorKind, PoolAllocator, select_free_address, select_with_policy,
};
use lanattach::provider::{AddressPool, IpConsumer};
use lanattach::types::PoolId;
use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr};
use support::{ip, pool};

/// Pools of up to 16 distinct addresses with an arbitrary subset held.
fn arb_pool() -> impl Strategy<Value = (AddressPool, Vec<bool>)> {
    prop::collection::btree_set(any::<u32>(), 0..16)
        .prop_flat_map(|set| {
            let addresses: Vec<IpAddr> = set
                .into_iter()
                .map(|n| IpAddr::V4(Ipv4Addr::from(n)))
                .collect();
            let len = addresses.len();
            (Just(addresses), prop::collection::vec(any::<bool>(), len))
        })
        .prop_map(|(addresses, held)| {
            let mut pool = AddressPool::new(PoolId::new("prop"), addresses.clone());
            pool.consumers = addresses
                .iter()
                .zip(&held)
                .filter(|(_, h)| **h)
                .map(|(a, _)| IpConsumer::new(*a))
                .collect();
            (pool, held)
        })
}

proptest! {
    #[test]
    fn selection_is_free_when_any_free((pool, held) in arb_pool()) {
        prop_assume!(held.iter().any(|h| !h));

        let selected = select_free_address(&pool);
        prop_assert!(selected.is_some());
        let selected = selected.unwrap();
        prop_assert!(pool.addresses.contains(&selected));
        prop_assert!(pool.consumers.iter().all(|c| c.ip != selected));
    }

    #[test]
    fn selection_is_last_free((pool, held) in arb_pool()) {
        let expected = pool
            .addresses
            .iter()
            .zip(&held)
            .filter(|(_, h)| !**h)
            .map(|(a, _)| *a)
            .last();
        prop_assert_eq!(select_free_address(&pool), expected);
    }

    #[test]
    fn fully_held_pool_has_no_selection((mut pool, _held) in arb_pool()) {
        pool.consumers = pool.addresses.iter().map(|a| IpConsumer::new(*a)).collect();

        prop_assert_eq!(select_free_address(&pool), None);
        for policy in [AllocationPolicy::LastFree, AllocationPolicy::FirstFree, AllocationPolicy::Random] {
            prop_assert_eq!(select_with_policy(&pool, policy), None);
        }
    }

    #[test]
    fn every_policy_returns_free_address((pool, held) in arb_pool()) {
        prop_assume!(held.iter().any(|h| !h));

        for policy in [AllocationPolicy::LastFree, AllocationPolicy::FirstFree, AllocationPolicy::Random] {
            let selected = select_with_policy(&pool, policy).unwrap();
            prop_assert!(!pool.is_held(&selected));
        }
    }
}

#[test]
fn tie_break_picks_last_free() {
    // A and C free, B held.
    let p = pool("block", &["10.0.0.1", "10.0.0.2", "10.0.0.3"], &["10.0.0.2"]);
    assert_eq!(select_free_address(&p), Some(ip("10.0.0.3")));
}

#[test]
fn duplicate_consumers_still_count_once() {
    let p = pool(
        "block",
        &["10.0.0.1", "10.0.0.2"],
        &["10.0.0.2", "10.0.0.2"],
    );
    assert_eq!(select_free_address(&p), Some(ip("10.0.0.1")));
}

#[test]
fn empty_pool_is_exhausted() {
    let p = pool("empty-block", &[], &[]);
    let err = PoolAllocator::default().allocate(&p).unwrap_err();

    assert_eq!(err.kind(), AttachErrorKind::PoolExhausted);
    assert_eq!(err.pool().unwrap().as_str(), "empty-block");
    assert_eq!(
        err.to_string(),
        "floating pool ip block 'empty-block' is exhausted"
    );
}

#[test]
fn fully_consumed_pool_is_exhausted() {
    let p = pool("block", &["10.0.0.1", "10.0.0.2"], &["10.0.0.1", "10.0.0.2"]);
    let err = PoolAllocator::new(AllocationPolicy::FirstFree)
        .allocate(&p)
        .unwrap_err();
    assert_eq!(err.kind(), AttachErrorKind::PoolExhausted);
}

#[test]
fn ipv6_addresses_are_supported() {
    let p = pool("v6", &["2001:db8::1", "2001:db8::2"], &["2001:db8::2"]);
    assert_eq!(select_free_address(&p), Some(ip("2001:db8::1")));
}
