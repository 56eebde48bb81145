/*!
 * Removal Policy
 * Immediate destruction or logical removal depending on protection
 *
 * A region protected by an open ite or disj frame may still be needed when
 * execution backtracks, so a removal request only flags it. The flag is
 * acted upon later by a commit sweep or when the last protection goes.
 */

use super::{frame_ref, Removal, RegionHandle, RegionManager};
use crate::core::errors::RegionResult;
use crate::memory::frames::{FrameKind, FrameStack};
use log::debug;

impl RegionManager {
    /// Remove a region at the end of its scope
    ///
    /// Unprotected regions are destroyed. Protected ones are logically
    /// removed, and additionally flagged `destroy_at_commit` when a commit
    /// frame saves them.
    pub fn remove_region<F: FrameStack + ?Sized>(
        &mut self,
        handle: RegionHandle,
        frames: &mut F,
    ) -> RegionResult<Removal> {
        self.begin_removal(handle, frames)?;

        if !self.region(handle)?.is_protected() {
            self.destroy_region(handle, frames)?;
            return Ok(Removal::Destroyed);
        }

        let region = self.region_mut(handle)?;
        region.logically_removed = true;
        if region.commit_frame.is_some() {
            region.destroy_at_commit = true;
        }
        let destroy_at_commit = region.destroy_at_commit;

        self.finish_logical_removal(handle, frames);
        Ok(Removal::LogicallyRemoved { destroy_at_commit })
    }

    /// Removal at the start of the then-branch of an ite whose condition is
    /// semidet: only disj protection keeps the region alive
    pub fn remove_ite_then_semidet<F: FrameStack + ?Sized>(
        &mut self,
        handle: RegionHandle,
        frames: &mut F,
    ) -> RegionResult<Removal> {
        self.begin_removal(handle, frames)?;

        if self.region(handle)?.disj_protected.is_none() {
            self.destroy_region(handle, frames)?;
            return Ok(Removal::Destroyed);
        }
        self.mark_logically_removed(handle, frames)
    }

    /// Removal at the start of the then-branch of an ite whose condition is
    /// nondet: as the semidet case, but the region's entry in its ite frame
    /// is cleared before destruction
    pub fn remove_ite_then_nondet<F: FrameStack + ?Sized>(
        &mut self,
        handle: RegionHandle,
        frames: &mut F,
    ) -> RegionResult<Removal> {
        self.begin_removal(handle, frames)?;

        let (disj_protected, ite_protected) = {
            let region = self.region(handle)?;
            (region.disj_protected, region.ite_protected)
        };
        if disj_protected.is_some() {
            return self.mark_logically_removed(handle, frames);
        }

        self.check_commit_chain(handle, frames)?;
        if let Some(ite_frame) = ite_protected {
            self.check_frame(frames, ite_frame)?;
            if let Some(index) = frames.clear_first(ite_frame, handle) {
                debug!(
                    "Cleared region {} from ite frame {} slot {}",
                    handle, ite_frame, index
                );
            }
        }
        self.destroy_region(handle, frames)?;
        Ok(Removal::Destroyed)
    }

    /// Drop one frame reference from the region
    ///
    /// A logically removed region left without ite and disj protection is
    /// destroyed, completing the deferred removal.
    pub fn release_protection<F: FrameStack + ?Sized>(
        &mut self,
        handle: RegionHandle,
        kind: FrameKind,
        frames: &mut F,
    ) -> RegionResult<Removal> {
        let region = self.region_mut(handle)?;
        *frame_ref(region, kind) = None;

        if region.logically_removed && !region.is_protected() {
            debug!(
                "Region {} lost its last protection ({}), completing removal",
                handle, kind
            );
            self.destroy_region(handle, frames)?;
            return Ok(Removal::Destroyed);
        }
        Ok(Removal::Kept)
    }

    fn mark_logically_removed<F: FrameStack + ?Sized>(
        &mut self,
        handle: RegionHandle,
        frames: &F,
    ) -> RegionResult<Removal> {
        let region = self.region_mut(handle)?;
        region.logically_removed = true;
        let destroy_at_commit = region.destroy_at_commit;

        self.finish_logical_removal(handle, frames);
        Ok(Removal::LogicallyRemoved { destroy_at_commit })
    }

    fn begin_removal<F: FrameStack + ?Sized>(
        &mut self,
        handle: RegionHandle,
        frames: &F,
    ) -> RegionResult<()> {
        self.region(handle)?;
        self.log_removal_state("Try removing", handle, frames);
        self.notify(handle, |observer, info| observer.on_try_remove(info));
        Ok(())
    }

    fn finish_logical_removal<F: FrameStack + ?Sized>(
        &mut self,
        handle: RegionHandle,
        frames: &F,
    ) {
        self.log_removal_state("Logically remove", handle, frames);
        self.notify(handle, |observer, info| observer.on_logical_removal(info));
    }
}
