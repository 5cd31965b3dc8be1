// ABOUTME: Address pool operations trait for infrastructure providers.
// ABOUTME: Reads the reserved-address list and active consumers of a floating pool.

use super::error::ProviderError;
use super::types::AddressPool;
use crate::types::PoolId;
use async_trait::async_trait;

/// Floating pool reads.
#[async_trait]
pub trait PoolOps: Send + Sync {
    /// Fetch the current snapshot of a pool: every reserved address and every
    /// consumer binding.
    async fn get_address_pool(&self, pool: &PoolId) -> Result<AddressPool, ProviderError>;
}
