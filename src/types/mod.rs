// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod id;
mod network_id;

pub use id::{DatacenterId, Id, IdError, NicId, PoolId, RequestId, ResourceKind, ServerId};
pub use network_id::{NetworkId, NetworkIdError};
