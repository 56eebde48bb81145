/*!
 * Region Introspection
 * Read-only region state and lifecycle observer hooks
 */

use super::{RegionHandle, RegionManager};
use crate::core::errors::RegionResult;
use crate::core::types::SequenceNumber;
use crate::memory::frames::{FrameId, FrameStack};
use log::{debug, log_enabled, Level};
use serde::{Deserialize, Serialize};

/// Snapshot of one live region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub handle: RegionHandle,
    pub sequence_number: SequenceNumber,
    pub pages: usize,
    pub allocated_words: usize,
    pub available_words: usize,
    pub logically_removed: bool,
    pub destroy_at_commit: bool,
    pub ite_protected: Option<FrameId>,
    pub disj_protected: Option<FrameId>,
    pub commit_frame: Option<FrameId>,
}

impl RegionInfo {
    pub fn is_protected(&self) -> bool {
        self.ite_protected.is_some() || self.disj_protected.is_some()
    }
}

/// Lifecycle hooks, all no-ops by default
///
/// Observers see the region state just before the event takes effect on
/// destruction and just after it on the other events.
pub trait RegionObserver: Send {
    fn on_create(&mut self, _info: &RegionInfo) {}

    /// A removal entry point was called for the region
    fn on_try_remove(&mut self, _info: &RegionInfo) {}

    fn on_logical_removal(&mut self, _info: &RegionInfo) {}

    fn on_destroy(&mut self, _info: &RegionInfo) {}
}

impl RegionManager {
    pub fn region_info(&self, handle: RegionHandle) -> RegionResult<RegionInfo> {
        let region = self.region(handle)?;
        Ok(RegionInfo {
            handle,
            sequence_number: region.sequence_number,
            pages: region.page_count,
            allocated_words: region.allocated_words,
            available_words: region.available_words,
            logically_removed: region.logically_removed,
            destroy_at_commit: region.destroy_at_commit,
            ite_protected: region.ite_protected,
            disj_protected: region.disj_protected,
            commit_frame: region.commit_frame,
        })
    }

    pub(super) fn notify<E>(&mut self, handle: RegionHandle, event: E)
    where
        E: FnOnce(&mut dyn RegionObserver, &RegionInfo),
    {
        if self.observer.is_none() {
            return;
        }
        let Ok(info) = self.region_info(handle) else {
            return;
        };
        if let Some(observer) = self.observer.as_mut() {
            event(observer.as_mut(), &info);
        }
    }

    /// Debug dump of a region's removal state, with frame numbers
    pub(super) fn log_removal_state<F: FrameStack + ?Sized>(
        &self,
        action: &str,
        handle: RegionHandle,
        frames: &F,
    ) {
        if !log_enabled!(Level::Debug) {
            return;
        }
        let Ok(info) = self.region_info(handle) else {
            return;
        };
        debug!(
            "{} region #{} (handle {}): logically removed {}, ite frame #{}, disj frame #{}, commit frame #{}, destroy at commit {}",
            action,
            info.sequence_number,
            handle,
            info.logically_removed,
            frames.depth(info.ite_protected),
            frames.depth(info.disj_protected),
            frames.depth(info.commit_frame),
            info.destroy_at_commit
        );
    }
}
