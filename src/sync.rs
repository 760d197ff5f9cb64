//! Write synchronization for the geohash index.
//!
//! Every `update`/`extend` runs inside a [`SyncGuard`], so writers sharing one
//! synchronization domain are serialized. Reads never take the synchronizer.
//!
//! # Reentry
//!
//! Synchronizers are not reentrant. Acquiring a [`ThreadSynchronizer`] from
//! the thread that already holds it fails immediately with
//! [`GeohashError::LockFailure`] instead of deadlocking.
//!
//! # Examples
//!
//! ```rust
//! use spatio_geohash::sync::{SyncGuard, ThreadSynchronizer};
//!
//! let synchronizer = ThreadSynchronizer::new();
//! let guard = SyncGuard::acquire(&synchronizer)?;
//! assert!(synchronizer.is_locked());
//! guard.release()?;
//! assert!(!synchronizer.is_locked());
//! # Ok::<(), spatio_geohash::GeohashError>(())
//! ```

use crate::error::{GeohashError, Result};
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

/// Mutual exclusion guarding store mutation.
///
/// At most one holder may exist across the whole synchronization domain,
/// which may span processes when the store is shared. Acquisition failure and
/// release failure are reported separately; neither is retried by the index.
pub trait Synchronizer: Send + Sync {
    fn acquire(&self) -> Result<()>;

    fn release(&self) -> Result<()>;
}

/// Scoped acquisition of a [`Synchronizer`].
///
/// Releases on drop, including on early return and unwinding. Use
/// [`SyncGuard::release`] to observe a release failure.
#[must_use = "the synchronizer is released as soon as the guard is dropped"]
pub struct SyncGuard<'a> {
    synchronizer: &'a dyn Synchronizer,
    held: bool,
}

impl<'a> SyncGuard<'a> {
    pub fn acquire(synchronizer: &'a dyn Synchronizer) -> Result<Self> {
        synchronizer.acquire()?;
        Ok(Self {
            synchronizer,
            held: true,
        })
    }

    pub fn release(mut self) -> Result<()> {
        self.held = false;
        self.synchronizer.release()
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        if self.held
            && let Err(e) = self.synchronizer.release()
        {
            log::warn!("Failed to release write synchronizer: {}", e);
        }
    }
}

/// Synchronizer that never blocks.
///
/// Only correct when the store has a single writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PuppetSynchronizer;

impl Synchronizer for PuppetSynchronizer {
    fn acquire(&self) -> Result<()> {
        Ok(())
    }

    fn release(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct LockState {
    owner: Mutex<Option<ThreadId>>,
    released: Condvar,
}

/// Lock states handed out by [`ThreadSynchronizer::for_store`], keyed by the
/// address of the store they guard.
static STORE_LOCKS: Lazy<Mutex<FxHashMap<usize, Weak<LockState>>>> =
    Lazy::new(|| Mutex::new(FxHashMap::default()));

/// Synchronizer shared between the threads of one process.
///
/// Clones share the same lock. With a timeout, a waiting writer gives up with
/// [`GeohashError::LockTimeout`]; without one it waits indefinitely.
#[derive(Clone, Default)]
pub struct ThreadSynchronizer {
    state: Arc<LockState>,
    timeout: Option<Duration>,
}

impl ThreadSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            state: Arc::default(),
            timeout: Some(timeout),
        }
    }

    /// Returns the synchronizer of `store`'s lock domain.
    ///
    /// Every call for the same store allocation shares one lock while any of
    /// the returned synchronizers is alive; only the timeout differs.
    pub fn for_store<S: ?Sized>(store: &Arc<S>, timeout: Option<Duration>) -> Self {
        let key = Arc::as_ptr(store) as *const () as usize;
        let mut locks = STORE_LOCKS.lock();
        locks.retain(|_, state| state.strong_count() > 0);

        let state = match locks.get(&key).and_then(Weak::upgrade) {
            Some(state) => state,
            None => {
                let state = Arc::new(LockState::default());
                locks.insert(key, Arc::downgrade(&state));
                state
            }
        };
        Self { state, timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_locked(&self) -> bool {
        self.state.owner.lock().is_some()
    }
}

impl Synchronizer for ThreadSynchronizer {
    fn acquire(&self) -> Result<()> {
        let me = thread::current().id();
        let mut owner = self.state.owner.lock();

        if *owner == Some(me) {
            return Err(GeohashError::LockFailure(
                "synchronizer is already held by the current thread".into(),
            ));
        }

        // A deadline past what `Instant` can represent waits forever.
        let deadline = self
            .timeout
            .and_then(|timeout| Some((timeout, Instant::now().checked_add(timeout)?)));

        match deadline {
            None => {
                while owner.is_some() {
                    self.state.released.wait(&mut owner);
                }
            }
            Some((timeout, deadline)) => {
                while owner.is_some() {
                    if self.state.released.wait_until(&mut owner, deadline).timed_out()
                        && owner.is_some()
                    {
                        return Err(GeohashError::LockTimeout(timeout));
                    }
                }
            }
        }

        *owner = Some(me);
        Ok(())
    }

    fn release(&self) -> Result<()> {
        let mut owner = self.state.owner.lock();
        if *owner != Some(thread::current().id()) {
            return Err(GeohashError::LockFailure(
                "synchronizer released by a thread that does not hold it".into(),
            ));
        }
        *owner = None;
        self.state.released.notify_one();
        Ok(())
    }
}
