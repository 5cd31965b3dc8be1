// ABOUTME: Network interface operations trait for infrastructure providers.
// ABOUTME: Submits NIC creation requests against a server's NIC collection.

use super::error::ProviderError;
use super::types::{ComputeResourceRef, NicSpec, OperationRef};
use async_trait::async_trait;

/// Network interface creation.
#[async_trait]
pub trait NicOps: Send + Sync {
    /// Submit a NIC creation request.
    ///
    /// Returns as soon as the provider has accepted the request. The NIC is not
    /// live until the returned operation reaches `Done`.
    async fn create_nic(
        &self,
        target: &ComputeResourceRef,
        spec: &NicSpec,
    ) -> Result<OperationRef, ProviderError>;
}
