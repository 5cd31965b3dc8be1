// ABOUTME: Polls provider operations until they reach a terminal state.
// ABOUTME: Bounded by a timeout and abortable through a cancellation token.

use std::sync::Arc;
use std::time::Duration;

use snafu::ResultExt;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{
    AttachError, CancelledSnafu, ConvergenceFailedSnafu, ConvergenceTimeoutSnafu, PollSnafu,
};
use crate::provider::{OperationOps, OperationState, TrackedOperation};

/// Waits for provider operations to converge.
pub struct ConvergenceWaiter<P> {
    provider: Arc<P>,
    poll_interval: Duration,
}

impl<P> Clone for ConvergenceWaiter<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            poll_interval: self.poll_interval,
        }
    }
}

impl<P: OperationOps> ConvergenceWaiter<P> {
    pub fn new(provider: Arc<P>, poll_interval: Duration) -> Self {
        Self {
            provider,
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll `operation` until it is done, failed, `timeout` elapses or
    /// `cancel` fires.
    ///
    /// Returns on the first `Done` without polling again. The deadline is
    /// absolute, so a stuck operation returns at the bound even mid-sleep. A
    /// zero timeout expires before the first poll; a timeout too large to be
    /// represented as an instant (such as `Duration::MAX`) means no bound.
    ///
    /// # Errors
    ///
    /// - `AttachError::ConvergenceFailed` with the provider's message
    /// - `AttachError::ConvergenceTimeout` when the bound elapses
    /// - `AttachError::Cancelled` when `cancel` fires
    /// - `AttachError::Poll` when reading the state fails
    pub async fn wait_until_done<O>(
        &self,
        operation: &O,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), AttachError>
    where
        O: TrackedOperation + ?Sized,
    {
        let request = operation.request_id();
        let resource = operation.resource();
        let deadline = Instant::now().checked_add(timeout);
        let started = Instant::now();
        let mut polls: u32 = 0;

        loop {
            let state = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(request = %request, "convergence wait cancelled");
                    return CancelledSnafu { resource }.fail();
                }
                _ = expiry(deadline) => {
                    warn!(request = %request, ?timeout, polls, "convergence wait timed out");
                    return ConvergenceTimeoutSnafu { request: request.clone(), resource, timeout }.fail();
                }
                state = self.provider.operation_state(request) => {
                    state.context(PollSnafu { request: request.clone(), resource: resource.clone() })?
                }
            };
            polls += 1;

            match state {
                OperationState::Done => {
                    info!(
                        request = %request,
                        elapsed = ?started.elapsed(),
                        polls,
                        "{resource} converged"
                    );
                    return Ok(());
                }
                OperationState::Failed { message } => {
                    warn!(request = %request, %message, "{resource} failed");
                    return ConvergenceFailedSnafu {
                        request: request.clone(),
                        resource,
                        message,
                    }
                    .fail();
                }
                pending => {
                    debug!(request = %request, state = %pending, polls, "operation pending");
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(request = %request, "convergence wait cancelled");
                    return CancelledSnafu { resource }.fail();
                }
                _ = expiry(deadline) => {
                    warn!(request = %request, ?timeout, polls, "convergence wait timed out");
                    return ConvergenceTimeoutSnafu { request: request.clone(), resource, timeout }.fail();
                }
                _ = sleep(self.poll_interval) => {}
            }
        }
    }
}

/// Completes at `deadline`, or never when there is none.
async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
