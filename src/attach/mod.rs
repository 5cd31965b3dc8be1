// ABOUTME: LAN attachment: address allocation, NIC submission and convergence.
// ABOUTME: Exports the components and the Attacher that ties them together.

mod allocator;
mod attacher;
mod error;
mod issuer;
mod lock;
mod waiter;

pub use allocator::{AllocationPolicy, PoolAllocator, select_free_address, select_with_policy};
pub use attacher::{Attacher, Attachment};
pub use error::{AttachError, AttachErrorKind};
pub use issuer::AttachmentIssuer;
pub use lock::{LockInfo, PoolLockGuard, PoolLocks};
pub use waiter::ConvergenceWaiter;
