// ABOUTME: Free address selection over a floating pool snapshot.
// ABOUTME: Pure functions; the provider arbitrates races at submission time.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use rand::seq::IndexedRandom;
use serde::Deserialize;
use tracing::debug;

use super::error::{AttachError, PoolExhaustedSnafu};
use crate::provider::AddressPool;
use crate::types::PoolId;

/// How to choose among several free addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationPolicy {
    /// Last free address in pool order. Existing deployments depend on the
    /// exact address picked, so this stays the default.
    #[default]
    LastFree,
    /// First free address in pool order.
    FirstFree,
    /// Uniformly random free address. Spreads contending callers apart.
    Random,
}

impl FromStr for AllocationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "last-free" => Ok(AllocationPolicy::LastFree),
            "first-free" => Ok(AllocationPolicy::FirstFree),
            "random" => Ok(AllocationPolicy::Random),
            other => Err(format!(
                "unknown allocation policy '{other}' (expected last-free, first-free or random)"
            )),
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationPolicy::LastFree => write!(f, "last-free"),
            AllocationPolicy::FirstFree => write!(f, "first-free"),
            AllocationPolicy::Random => write!(f, "random"),
        }
    }
}

/// Pick the last address in pool order that no consumer holds.
///
/// Returns `None` when the pool is empty or every address is held.
pub fn select_free_address(pool: &AddressPool) -> Option<IpAddr> {
    pool.addresses
        .iter()
        .rev()
        .find(|ip| !pool.is_held(ip))
        .copied()
}

/// Pick a free address according to `policy`.
pub fn select_with_policy(pool: &AddressPool, policy: AllocationPolicy) -> Option<IpAddr> {
    match policy {
        AllocationPolicy::LastFree => select_free_address(pool),
        AllocationPolicy::FirstFree => pool.addresses.iter().find(|ip| !pool.is_held(ip)).copied(),
        AllocationPolicy::Random => pool.free_addresses().choose(&mut rand::rng()).copied(),
    }
}

/// Selects addresses from pool snapshots, reporting exhaustion as its own error.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolAllocator {
    policy: AllocationPolicy,
}

impl PoolAllocator {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// Select a free address from `pool`.
    ///
    /// # Errors
    ///
    /// Returns `AttachError::PoolExhausted` naming the pool if nothing is free.
    pub fn allocate(&self, pool: &AddressPool) -> Result<IpAddr, AttachError> {
        self.allocate_from(&pool.id, pool)
    }

    /// Like [`allocate`](Self::allocate), but exhaustion names `requested`,
    /// the pool the caller asked for, rather than the id echoed in the snapshot.
    pub fn allocate_from(
        &self,
        requested: &PoolId,
        pool: &AddressPool,
    ) -> Result<IpAddr, AttachError> {
        let selected = select_with_policy(pool, self.policy);
        debug!(
            pool = %requested,
            reserved = pool.addresses.len(),
            consumers = pool.consumers.len(),
            policy = %self.policy,
            selected = ?selected,
            "selected floating address"
        );
        selected.ok_or_else(|| {
            PoolExhaustedSnafu {
                pool: requested.clone(),
            }
            .build()
        })
    }
}
