// ABOUTME: Composable capability traits for the infrastructure provider.
// ABOUTME: Defines PoolOps, NicOps, OperationOps and an in-memory implementation.

mod error;
pub mod memory;
mod nic;
mod operation;
mod pool;
mod types;

pub use error::ProviderError;
pub use memory::{CallCounts, CreatedNic, Fixture, InMemoryProvider};
pub use nic::NicOps;
pub use operation::{OperationOps, TrackedOperation};
pub use pool::PoolOps;
pub use types::{
    AddressPool, ComputeResourceRef, IpConsumer, NicSpec, OperationRef, OperationState,
};

/// Everything the attachment flow needs from a provider.
///
/// Blanket-implemented for any type that implements all capability traits.
pub trait Provider: PoolOps + NicOps + OperationOps {}

impl<T: PoolOps + NicOps + OperationOps> Provider for T {}
