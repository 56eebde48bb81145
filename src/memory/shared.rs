/*!
 * Shared Region Manager
 * A region manager handed across threads behind one lock
 */

use super::region::RegionManager;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Cloneable handle to one [`RegionManager`]
///
/// Every operation takes the lock for its whole duration, so operations on
/// the same manager never interleave. Independent managers need no handle.
#[derive(Debug, Clone, Default)]
pub struct SharedRegionManager {
    inner: Arc<Mutex<RegionManager>>,
}

impl SharedRegionManager {
    pub fn new(manager: RegionManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, RegionManager> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the manager
    pub fn with<R>(&self, f: impl FnOnce(&mut RegionManager) -> R) -> R {
        f(&mut *self.inner.lock())
    }
}

impl From<RegionManager> for SharedRegionManager {
    fn from(manager: RegionManager) -> Self {
        Self::new(manager)
    }
}
