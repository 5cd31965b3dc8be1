// ABOUTME: Orchestrates allocation, submission and convergence for one attachment.
// ABOUTME: Entry points ensure a plain or floating-address LAN attachment exists.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use snafu::ResultExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::allocator::PoolAllocator;
use super::error::{AttachError, CancelledSnafu, InvalidNetworkSnafu, PoolLookupSnafu};
use super::issuer::AttachmentIssuer;
use super::lock::{PoolLockGuard, PoolLocks};
use super::waiter::ConvergenceWaiter;
use crate::config::AttachConfig;
use crate::provider::{ComputeResourceRef, OperationRef, Provider};
use crate::types::{DatacenterId, NetworkId, PoolId, ServerId};

/// A converged attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// The operation that created the NIC, now done.
    pub operation: OperationRef,
    /// Floating address bound to the NIC, if one was requested.
    pub address: Option<IpAddr>,
}

/// Ensures servers are attached to LANs.
///
/// Holds no state between calls apart from the optional pool lock table; every
/// pool snapshot is read fresh from the provider. There is no detach path: if
/// the wait fails the NIC stays for the caller to reconcile.
pub struct Attacher<P> {
    provider: Arc<P>,
    allocator: PoolAllocator,
    issuer: AttachmentIssuer<P>,
    waiter: ConvergenceWaiter<P>,
    timeout: Duration,
    locks: Option<Arc<PoolLocks>>,
}

impl<P: Provider> Attacher<P> {
    pub fn new(provider: Arc<P>, config: &AttachConfig) -> Self {
        let locks = config
            .serialize_pool_allocations
            .then(|| Arc::new(PoolLocks::new()));

        Self {
            allocator: PoolAllocator::new(config.allocation_policy),
            issuer: AttachmentIssuer::new(Arc::clone(&provider)),
            waiter: ConvergenceWaiter::new(Arc::clone(&provider), config.poll_interval),
            timeout: config.timeout,
            locks,
            provider,
        }
    }

    /// Share a lock table with other attachers working on the same pools.
    pub fn with_pool_locks(mut self, locks: Arc<PoolLocks>) -> Self {
        self.locks = Some(locks);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Attach `server` to LAN `network` without a floating address.
    ///
    /// # Errors
    ///
    /// Input, submission, convergence failure, timeout or cancellation.
    pub async fn ensure_plain_attachment(
        &self,
        datacenter: &DatacenterId,
        server: &ServerId,
        network: &str,
        cancel: &CancellationToken,
    ) -> Result<Attachment, AttachError> {
        let target = ComputeResourceRef::new(datacenter.clone(), server.clone());
        info!(resource = %target, network, "ensuring lan attachment");

        let operation = self.issuer.attach(&target, network, None).await?;
        self.waiter
            .wait_until_done(&operation, self.timeout, cancel)
            .await?;

        Ok(Attachment {
            operation,
            address: None,
        })
    }

    /// Attach `server` to LAN `network` with a free address from `pool`.
    ///
    /// # Errors
    ///
    /// Everything `ensure_plain_attachment` can return, plus
    /// `AttachError::PoolExhausted` (nothing is submitted then) and
    /// `AttachError::PoolLookup`.
    pub async fn ensure_floating_attachment(
        &self,
        datacenter: &DatacenterId,
        server: &ServerId,
        network: &str,
        pool: &PoolId,
        cancel: &CancellationToken,
    ) -> Result<Attachment, AttachError> {
        let lan = NetworkId::parse(network).context(InvalidNetworkSnafu { input: network })?;
        let target = ComputeResourceRef::new(datacenter.clone(), server.clone());
        info!(resource = %target, lan = %lan, pool = %pool, "ensuring lan attachment with floating ip");

        let guard = self.lock_pool(pool, &target, cancel).await?;

        let snapshot = self
            .provider
            .get_address_pool(pool)
            .await
            .context(PoolLookupSnafu { pool: pool.clone() })?;

        let address = match self.allocator.allocate_from(pool, &snapshot) {
            Ok(address) => address,
            Err(err) => {
                warn!(pool = %pool, reserved = snapshot.addresses.len(), "floating pool exhausted");
                return Err(err);
            }
        };

        let operation = self.issuer.submit(&target, lan, Some(address)).await?;
        drop(guard);

        self.waiter
            .wait_until_done(&operation, self.timeout, cancel)
            .await?;

        Ok(Attachment {
            operation,
            address: Some(address),
        })
    }

    async fn lock_pool(
        &self,
        pool: &PoolId,
        target: &ComputeResourceRef,
        cancel: &CancellationToken,
    ) -> Result<Option<PoolLockGuard>, AttachError> {
        let Some(locks) = &self.locks else {
            return Ok(None);
        };

        let holder = target.to_string();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => CancelledSnafu { resource: format!("lock on {}", pool.labelled()) }.fail(),
            guard = locks.acquire(pool, &holder) => Ok(Some(guard)),
        }
    }
}
