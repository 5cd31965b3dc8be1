// ABOUTME: Builds and submits NIC creation requests for a LAN attachment.
// ABOUTME: Optionally binds the NIC to a single floating address; never retries.

use std::net::IpAddr;
use std::sync::Arc;

use snafu::ResultExt;
use tracing::info;

use super::error::{AttachError, InvalidNetworkSnafu, SubmissionSnafu};
use crate::provider::{ComputeResourceRef, NicOps, NicSpec, OperationRef};
use crate::types::NetworkId;

/// Submits NIC creation requests against a compute resource.
pub struct AttachmentIssuer<P> {
    provider: Arc<P>,
}

impl<P> Clone for AttachmentIssuer<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: NicOps> AttachmentIssuer<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Parse `network` and submit a NIC bound to it.
    ///
    /// A malformed network id fails before any provider call.
    ///
    /// # Errors
    ///
    /// Returns `AttachError::InvalidNetwork` for bad input and
    /// `AttachError::Submission` if the provider rejects the request.
    pub async fn attach(
        &self,
        target: &ComputeResourceRef,
        network: &str,
        address: Option<IpAddr>,
    ) -> Result<OperationRef, AttachError> {
        let lan = NetworkId::parse(network).context(InvalidNetworkSnafu { input: network })?;
        self.submit(target, lan, address).await
    }

    /// Submit a NIC bound to an already validated LAN.
    ///
    /// The provider is the authoritative check that `address` is still free.
    pub async fn submit(
        &self,
        target: &ComputeResourceRef,
        lan: NetworkId,
        address: Option<IpAddr>,
    ) -> Result<OperationRef, AttachError> {
        let spec = match address {
            Some(ip) => NicSpec::for_lan(lan).with_address(ip),
            None => NicSpec::for_lan(lan),
        };

        let operation = self
            .provider
            .create_nic(target, &spec)
            .await
            .context(SubmissionSnafu {
                target: target.clone(),
            })?;

        info!(
            resource = %target,
            lan = %lan,
            address = ?address,
            nic = %operation.nic_id,
            request = %operation.request_id,
            "submitted nic creation"
        );

        Ok(operation)
    }
}
