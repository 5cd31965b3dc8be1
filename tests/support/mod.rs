// ABOUTME: Test support utilities.
// ABOUTME: Tracing setup, pool builders and provider wrappers for integration tests.

use std::net::IpAddr;
use std::sync::Once;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lanattach::provider::{
    AddressPool, ComputeResourceRef, InMemoryProvider, IpConsumer, NicOps, NicSpec, OperationOps,
    OperationRef, OperationState, PoolOps, ProviderError,
};
use lanattach::types::{DatacenterId, PoolId, RequestId, ServerId};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("lanattach=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[allow(dead_code)]
pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

/// Build a pool from address literals, marking `held` as consumed.
#[allow(dead_code)]
pub fn pool(id: &str, addresses: &[&str], held: &[&str]) -> AddressPool {
    let mut pool = AddressPool::new(PoolId::new(id), addresses.iter().map(|a| ip(a)).collect());
    pool.consumers = held.iter().map(|a| IpConsumer::new(ip(a))).collect();
    pool
}

#[allow(dead_code)]
pub fn datacenter() -> DatacenterId {
    DatacenterId::new("dc-1")
}

#[allow(dead_code)]
pub fn server(name: &str) -> ServerId {
    ServerId::new(name)
}

/// Provider whose pool reads take `delay` after the snapshot is taken, so
/// concurrent callers observe the same stale snapshot.
#[allow(dead_code)]
pub struct SlowPools {
    pub inner: Arc<InMemoryProvider>,
    pub delay: Duration,
}

#[async_trait]
impl PoolOps for SlowPools {
    async fn get_address_pool(&self, pool: &PoolId) -> Result<AddressPool, ProviderError> {
        let snapshot = self.inner.get_address_pool(pool).await;
        tokio::time::sleep(self.delay).await;
        snapshot
    }
}

#[async_trait]
impl NicOps for SlowPools {
    async fn create_nic(
        &self,
        target: &ComputeResourceRef,
        spec: &NicSpec,
    ) -> Result<OperationRef, ProviderError> {
        self.inner.create_nic(target, spec).await
    }
}

#[async_trait]
impl OperationOps for SlowPools {
    async fn operation_state(&self, request: &RequestId) -> Result<OperationState, ProviderError> {
        self.inner.operation_state(request).await
    }
}

/// Provider whose pool snapshots come back under a different id than the one
/// requested, as some APIs return a canonical id for an alias.
#[allow(dead_code)]
pub struct EchoingPools {
    pub inner: Arc<InMemoryProvider>,
    pub echoed: PoolId,
}

#[async_trait]
impl PoolOps for EchoingPools {
    async fn get_address_pool(&self, pool: &PoolId) -> Result<AddressPool, ProviderError> {
        let mut snapshot = self.inner.get_address_pool(pool).await?;
        snapshot.id = self.echoed.clone();
        Ok(snapshot)
    }
}

#[async_trait]
impl NicOps for EchoingPools {
    async fn create_nic(
        &self,
        target: &ComputeResourceRef,
        spec: &NicSpec,
    ) -> Result<OperationRef, ProviderError> {
        self.inner.create_nic(target, spec).await
    }
}

#[async_trait]
impl OperationOps for EchoingPools {
    async fn operation_state(&self, request: &RequestId) -> Result<OperationState, ProviderError> {
        self.inner.operation_state(request).await
    }
}
