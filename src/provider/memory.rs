// ABOUTME: In-process provider holding pools, NICs and scripted operation states.
// ABOUTME: Backs the simulate command and tests; can be seeded from a YAML fixture.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;

use super::error::ProviderError;
use super::nic::NicOps;
use super::operation::OperationOps;
use super::pool::PoolOps;
use super::types::{
    AddressPool, ComputeResourceRef, IpConsumer, NicSpec, OperationRef, OperationState,
};
use crate::error::{Error, Result};
use crate::types::{NicId, PoolId, RequestId};

/// Seed data for an [`InMemoryProvider`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub pools: Vec<AddressPool>,

    /// States every new operation goes through, one per poll. The last state
    /// repeats forever. Defaults to `[running, done]`.
    #[serde(default)]
    pub operation: Vec<OperationState>,
}

impl Fixture {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// A NIC created through [`NicOps::create_nic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedNic {
    pub id: NicId,
    pub request_id: RequestId,
    pub target: ComputeResourceRef,
    pub spec: NicSpec,
}

/// Number of calls made per provider operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_address_pool: usize,
    pub create_nic: usize,
    pub operation_state: usize,
}

#[derive(Default)]
struct Counters {
    get_address_pool: AtomicUsize,
    create_nic: AtomicUsize,
    operation_state: AtomicUsize,
}

#[derive(Default)]
struct State {
    pools: HashMap<PoolId, AddressPool>,
    nics: Vec<CreatedNic>,
    operations: HashMap<RequestId, VecDeque<OperationState>>,
    script: Vec<OperationState>,
    next_id: u64,
    submit_failure: Option<ProviderError>,
    poll_failure: Option<ProviderError>,
}

/// Provider that keeps all state in memory.
///
/// Creating a NIC with a bound address registers a consumer on the pool that
/// reserves the address, and rejects addresses already held with
/// `ProviderError::Conflict`, the way the real API arbitrates races.
pub struct InMemoryProvider {
    state: Mutex<State>,
    counters: Counters,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                script: default_script(),
                ..State::default()
            }),
            counters: Counters::default(),
        }
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let provider = Self::new();
        {
            let mut state = provider.state.lock();
            for pool in fixture.pools {
                state.pools.insert(pool.id.clone(), pool);
            }
            if !fixture.operation.is_empty() {
                state.script = fixture.operation;
            }
        }
        provider
    }

    /// Add or replace a pool.
    pub fn with_pool(self, pool: AddressPool) -> Self {
        self.state.lock().pools.insert(pool.id.clone(), pool);
        self
    }

    /// Set the state sequence new operations go through.
    pub fn with_operation_script(self, script: Vec<OperationState>) -> Self {
        if !script.is_empty() {
            self.state.lock().script = script;
        }
        self
    }

    /// Make the next `create_nic` call fail with `err`.
    pub fn fail_next_submission(&self, err: ProviderError) {
        self.state.lock().submit_failure = Some(err);
    }

    /// Make every `operation_state` call fail with `err`.
    pub fn fail_polls(&self, err: ProviderError) {
        self.state.lock().poll_failure = Some(err);
    }

    /// Current snapshot of a pool, without counting it as a provider call.
    pub fn pool(&self, id: &PoolId) -> Option<AddressPool> {
        self.state.lock().pools.get(id).cloned()
    }

    pub fn created_nics(&self) -> Vec<CreatedNic> {
        self.state.lock().nics.clone()
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            get_address_pool: self.counters.get_address_pool.load(Ordering::SeqCst),
            create_nic: self.counters.create_nic.load(Ordering::SeqCst),
            operation_state: self.counters.operation_state.load(Ordering::SeqCst),
        }
    }
}

fn default_script() -> Vec<OperationState> {
    vec![OperationState::Running, OperationState::Done]
}

#[async_trait]
impl PoolOps for InMemoryProvider {
    async fn get_address_pool(
        &self,
        pool: &PoolId,
    ) -> std::result::Result<AddressPool, ProviderError> {
        self.counters.get_address_pool.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .pools
            .get(pool)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(pool.labelled()))
    }
}

#[async_trait]
impl NicOps for InMemoryProvider {
    async fn create_nic(
        &self,
        target: &ComputeResourceRef,
        spec: &NicSpec,
    ) -> std::result::Result<OperationRef, ProviderError> {
        self.counters.create_nic.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();

        if let Some(err) = state.submit_failure.take() {
            return Err(err);
        }

        // Validate every address before mutating anything.
        let mut owners: Vec<(PoolId, IpAddr)> = Vec::with_capacity(spec.ips.len());
        for ip in &spec.ips {
            let pool = state
                .pools
                .values()
                .find(|p| p.contains(ip))
                .ok_or_else(|| ProviderError::Api {
                    status: 422,
                    message: format!("ip {ip} is not reserved in any ip block"),
                })?;
            if pool.is_held(ip) {
                return Err(ProviderError::Conflict(format!(
                    "ip {ip} of {} is already in use",
                    pool.id.labelled()
                )));
            }
            owners.push((pool.id.clone(), *ip));
        }

        state.next_id += 1;
        let nic_id = NicId::numbered(state.next_id);
        let request_id = RequestId::numbered(state.next_id);

        for (pool_id, ip) in owners {
            if let Some(pool) = state.pools.get_mut(&pool_id) {
                pool.consumers.push(IpConsumer {
                    ip,
                    nic: Some(nic_id.clone()),
                    server: Some(target.server.clone()),
                    datacenter: Some(target.datacenter.clone()),
                });
            }
        }

        let script: VecDeque<OperationState> = state.script.iter().cloned().collect();
        state.operations.insert(request_id.clone(), script);
        state.nics.push(CreatedNic {
            id: nic_id.clone(),
            request_id: request_id.clone(),
            target: target.clone(),
            spec: spec.clone(),
        });

        Ok(OperationRef {
            request_id,
            nic_id,
            target: target.clone(),
        })
    }
}

#[async_trait]
impl OperationOps for InMemoryProvider {
    async fn operation_state(
        &self,
        request: &RequestId,
    ) -> std::result::Result<OperationState, ProviderError> {
        self.counters.operation_state.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();

        if let Some(err) = &state.poll_failure {
            return Err(err.clone());
        }

        let queue = state
            .operations
            .get_mut(request)
            .ok_or_else(|| ProviderError::NotFound(request.labelled()))?;

        // The last scripted state sticks.
        let current = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        current.ok_or_else(|| ProviderError::NotFound(request.labelled()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DatacenterId, NetworkId, ServerId};

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn target() -> ComputeResourceRef {
        ComputeResourceRef::new(DatacenterId::new("dc"), ServerId::new("srv"))
    }

    fn lan() -> NetworkId {
        NetworkId::new(1).unwrap()
    }

    #[tokio::test]
    async fn bound_address_becomes_consumer() {
        let provider = InMemoryProvider::new().with_pool(AddressPool::new(
            PoolId::new("pool"),
            vec![ip("10.0.0.1")],
        ));

        let op = provider
            .create_nic(&target(), &NicSpec::for_lan(lan()).with_address(ip("10.0.0.1")))
            .await
            .unwrap();

        let pool = provider.pool(&PoolId::new("pool")).unwrap();
        assert_eq!(pool.consumers.len(), 1);
        assert_eq!(pool.consumers[0].nic.as_ref(), Some(&op.nic_id));
    }

    #[tokio::test]
    async fn held_address_conflicts() {
        let mut pool = AddressPool::new(PoolId::new("pool"), vec![ip("10.0.0.1")]);
        pool.consumers.push(IpConsumer::new(ip("10.0.0.1")));
        let provider = InMemoryProvider::new().with_pool(pool);

        let err = provider
            .create_nic(&target(), &NicSpec::for_lan(lan()).with_address(ip("10.0.0.1")))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Conflict(_)));
        assert!(provider.created_nics().is_empty());
    }

    #[tokio::test]
    async fn unreserved_address_is_rejected() {
        let provider = InMemoryProvider::new();
        let err = provider
            .create_nic(&target(), &NicSpec::for_lan(lan()).with_address(ip("10.9.9.9")))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 422, .. }));
    }

    #[tokio::test]
    async fn script_plays_back_and_last_state_sticks() {
        let provider = InMemoryProvider::new()
            .with_operation_script(vec![OperationState::Queued, OperationState::Done]);
        let op = provider
            .create_nic(&target(), &NicSpec::for_lan(lan()))
            .await
            .unwrap();

        let first = provider.operation_state(&op.request_id).await.unwrap();
        let second = provider.operation_state(&op.request_id).await.unwrap();
        let third = provider.operation_state(&op.request_id).await.unwrap();

        assert_eq!(first, OperationState::Queued);
        assert_eq!(second, OperationState::Done);
        assert_eq!(third, OperationState::Done);
        assert_eq!(provider.calls().operation_state, 3);
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let provider = InMemoryProvider::new();
        let err = provider
            .operation_state(&RequestId::new("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn submission_failure_is_one_shot() {
        let provider = InMemoryProvider::new();
        provider.fail_next_submission(ProviderError::Transport("reset".into()));

        assert!(provider.create_nic(&target(), &NicSpec::for_lan(lan())).await.is_err());
        assert!(provider.create_nic(&target(), &NicSpec::for_lan(lan())).await.is_ok());
        assert_eq!(provider.calls().create_nic, 2);
    }

    #[test]
    fn fixture_parses_pools_and_script() {
        let yaml = r#"
pools:
  - id: block-1
    addresses: ["192.0.2.1", "192.0.2.2"]
operation:
  - status: queued
  - status: done
"#;
        let fixture = Fixture::from_yaml(yaml).unwrap();
        assert_eq!(fixture.pools.len(), 1);
        assert_eq!(fixture.operation.len(), 2);

        let provider = InMemoryProvider::from_fixture(fixture);
        assert!(provider.pool(&PoolId::new("block-1")).is_some());
    }
}
