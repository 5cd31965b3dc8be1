// ABOUTME: Long-running operation polling trait for infrastructure providers.
// ABOUTME: Also defines TrackedOperation, the handle any async submission returns.

use super::error::ProviderError;
use super::types::{OperationRef, OperationState};
use crate::types::RequestId;
use async_trait::async_trait;

/// Operation state queries.
#[async_trait]
pub trait OperationOps: Send + Sync {
    /// Get the current state of the operation tracked by `request`.
    async fn operation_state(&self, request: &RequestId) -> Result<OperationState, ProviderError>;
}

/// Anything that produced a provider-side long-running operation.
///
/// NIC creation is one such call; servers, volumes and LANs behave the same
/// way, so the waiter only depends on this.
pub trait TrackedOperation: Send + Sync {
    /// Request id to poll.
    fn request_id(&self) -> &RequestId;

    /// Human-readable description of the resource being changed.
    fn resource(&self) -> String;
}

impl TrackedOperation for OperationRef {
    fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    fn resource(&self) -> String {
        format!("{} on {}", self.nic_id.labelled(), self.target)
    }
}
