// ABOUTME: Per-pool mutual exclusion for address selection and submission.
// ABOUTME: Serializes snapshot-then-submit per pool within one process.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

use crate::types::PoolId;

/// Information about who holds a pool lock.
#[derive(Debug, Clone, Serialize)]
pub struct LockInfo {
    /// Pool the lock guards.
    pub pool: String,
    /// Resource the holder is attaching.
    pub holder: String,
    /// Hostname of the machine that holds the lock.
    pub host: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub acquired_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(pool: &PoolId, holder: &str) -> Self {
        Self {
            pool: pool.to_string(),
            holder: holder.to_string(),
            host: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        }
    }

    /// How long the lock has been held.
    pub fn held_for(&self) -> chrono::Duration {
        Utc::now() - self.acquired_at
    }
}

#[derive(Default)]
struct Slot {
    gate: Arc<tokio::sync::Mutex<()>>,
    holder: Mutex<Option<LockInfo>>,
}

/// Lock table keyed by pool.
///
/// Two callers attaching from the same pool otherwise read the same snapshot
/// and pick the same address; the second submission then fails at the
/// provider. Holding the pool lock from snapshot until the submission returns
/// closes that window for callers sharing this table.
///
/// A pool's entry is dropped again when its last guard is released with
/// nobody waiting, so the table only tracks pools currently in use.
#[derive(Default)]
pub struct PoolLocks {
    slots: Arc<Mutex<HashMap<PoolId, Arc<Slot>>>>,
}

impl std::fmt::Debug for PoolLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolLocks")
            .field("pools", &self.slots.lock().len())
            .finish()
    }
}

impl PoolLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, pool: &PoolId) -> Arc<Slot> {
        Arc::clone(self.slots.lock().entry(pool.clone()).or_default())
    }

    /// Acquire the lock for `pool`, waiting for the current holder if any.
    pub async fn acquire(&self, pool: &PoolId, holder: &str) -> PoolLockGuard {
        let slot = self.slot(pool);

        let permit = match Arc::clone(&slot.gate).try_lock_owned() {
            Ok(permit) => permit,
            Err(_) => {
                if let Some(current) = slot.holder.lock().clone() {
                    warn!(
                        pool = %pool,
                        holder = %current.holder,
                        host = %current.host,
                        pid = current.pid,
                        held_ms = current.held_for().num_milliseconds(),
                        "waiting for pool lock"
                    );
                }
                Arc::clone(&slot.gate).lock_owned().await
            }
        };

        debug!(pool = %pool, holder, "acquired pool lock");
        *slot.holder.lock() = Some(LockInfo::new(pool, holder));

        PoolLockGuard {
            pool: pool.clone(),
            slots: Arc::clone(&self.slots),
            slot,
            _permit: permit,
        }
    }

    /// Current holder of the lock for `pool`, if held.
    pub fn holder(&self, pool: &PoolId) -> Option<LockInfo> {
        self.slots
            .lock()
            .get(pool)
            .and_then(|slot| slot.holder.lock().clone())
    }
}

/// A held pool lock that releases on drop.
pub struct PoolLockGuard {
    pool: PoolId,
    slots: Arc<Mutex<HashMap<PoolId, Arc<Slot>>>>,
    slot: Arc<Slot>,
    _permit: OwnedMutexGuard<()>,
}

impl std::fmt::Debug for PoolLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolLockGuard")
            .field("holder", &*self.slot.holder.lock())
            .finish()
    }
}

impl Drop for PoolLockGuard {
    fn drop(&mut self) {
        // Runs before `_permit` is released, so the next holder never sees stale info.
        let mut slots = self.slots.lock();
        self.slot.holder.lock().take();

        // Waiters clone the slot under the table lock, so with the table
        // locked a count of two (table + this guard) means nobody is queued.
        let idle = slots
            .get(&self.pool)
            .is_some_and(|slot| Arc::ptr_eq(slot, &self.slot))
            && Arc::strong_count(&self.slot) == 2;
        if idle {
            slots.remove(&self.pool);
        }
    }
}
