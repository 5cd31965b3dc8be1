// ABOUTME: Error types for LAN attachment with SNAFU context selectors.
// ABOUTME: A closed set of kinds: input, exhausted, provider, submission, failed, timeout, cancelled.

use std::time::Duration;

use snafu::Snafu;

use crate::provider::{ComputeResourceRef, ProviderError};
use crate::types::{NetworkIdError, PoolId, RequestId};

/// Errors from ensuring a LAN attachment.
///
/// Provider errors are carried as `source` untranslated; each variant adds the
/// resource or pool needed to act on it.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AttachError {
    #[snafu(display("invalid network id '{input}': {source}"))]
    InvalidNetwork {
        input: String,
        source: NetworkIdError,
    },

    #[snafu(display("floating pool ip block '{pool}' is exhausted"))]
    PoolExhausted { pool: PoolId },

    #[snafu(display("failed to read floating pool ip block '{pool}': {source}"))]
    PoolLookup { pool: PoolId, source: ProviderError },

    #[snafu(display("failed to submit nic creation for {target}: {source}"))]
    Submission {
        target: ComputeResourceRef,
        source: ProviderError,
    },

    #[snafu(display("failed to poll request {request} for {resource}: {source}"))]
    Poll {
        request: RequestId,
        resource: String,
        source: ProviderError,
    },

    #[snafu(display("request {request} for {resource} failed: {message}"))]
    ConvergenceFailed {
        request: RequestId,
        resource: String,
        message: String,
    },

    #[snafu(display("request {request} for {resource} did not complete within {timeout:?}"))]
    ConvergenceTimeout {
        request: RequestId,
        resource: String,
        timeout: Duration,
    },

    #[snafu(display("cancelled while waiting for {resource}"))]
    Cancelled { resource: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachErrorKind {
    /// Malformed caller input, rejected before any provider call.
    Input,
    /// No free address in the requested pool.
    PoolExhausted,
    /// Reading provider state failed.
    Provider,
    /// The provider rejected or failed to accept the attachment request.
    Submission,
    /// The operation reached a terminal failure state.
    ConvergenceFailed,
    /// The operation did not reach a terminal state in time.
    Timeout,
    /// The caller aborted the wait.
    Cancelled,
}

impl AttachError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> AttachErrorKind {
        match self {
            AttachError::InvalidNetwork { .. } => AttachErrorKind::Input,
            AttachError::PoolExhausted { .. } => AttachErrorKind::PoolExhausted,
            AttachError::PoolLookup { .. } | AttachError::Poll { .. } => {
                AttachErrorKind::Provider
            }
            AttachError::Submission { .. } => AttachErrorKind::Submission,
            AttachError::ConvergenceFailed { .. } => AttachErrorKind::ConvergenceFailed,
            AttachError::ConvergenceTimeout { .. } => AttachErrorKind::Timeout,
            AttachError::Cancelled { .. } => AttachErrorKind::Cancelled,
        }
    }

    /// Returns the pool involved, if this error concerns one.
    pub fn pool(&self) -> Option<&PoolId> {
        match self {
            AttachError::PoolExhausted { pool } | AttachError::PoolLookup { pool, .. } => {
                Some(pool)
            }
            _ => None,
        }
    }

    /// Returns the underlying provider error, if any.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            AttachError::PoolLookup { source, .. }
            | AttachError::Submission { source, .. }
            | AttachError::Poll { source, .. } => Some(source),
            _ => None,
        }
    }
}
