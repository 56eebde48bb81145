/*!
 * Commit Sweeps
 *
 * When a commit or exception barrier resolves, two disjoint sets of regions
 * may hold removals deferred to the commit:
 * - regions older than the scope, saved in the commit frame
 * - regions created inside the scope, found at the front of the
 *   newest-first live-region registry
 */

use super::{CommitOutcome, RegionHandle, RegionManager};
use crate::core::errors::{RegionError, RegionResult};
use crate::core::types::SequenceNumber;
use crate::memory::config::CommitSavePolicy;
use crate::memory::frames::{FrameId, FrameStack};
use log::{debug, error, warn};

impl RegionManager {
    /// Destroy the saved regions flagged `destroy_at_commit`
    ///
    /// Empty slots and stale handles are skipped. A saved region without
    /// the flag is handled according to the configured
    /// [`CommitSavePolicy`]. Returns the number of regions destroyed.
    pub fn sweep_old_regions_saved_at_commit<F: FrameStack + ?Sized>(
        &mut self,
        saved: &[Option<RegionHandle>],
        frames: &mut F,
    ) -> RegionResult<usize> {
        let mut destroyed = 0;

        for &handle in saved.iter().flatten() {
            let (sequence, destroy_at_commit) = match self.region(handle) {
                Ok(region) => (region.sequence_number, region.destroy_at_commit),
                Err(_) => {
                    warn!("Skipping stale saved region {} at commit", handle);
                    continue;
                }
            };

            if destroy_at_commit {
                self.destroy_region(handle, frames)?;
                destroyed += 1;
                continue;
            }

            match self.config.commit_policy {
                CommitSavePolicy::Migrate => self.migrate_saved_region(handle, frames)?,
                CommitSavePolicy::Reject => {
                    error!(
                        "Region #{} was saved at commit but never removed in the commit scope",
                        sequence
                    );
                    return Err(RegionError::UnsupportedCommitMigration { sequence });
                }
            }
        }

        Ok(destroyed)
    }

    /// Destroy the flagged regions created after `boundary`
    ///
    /// Walks the registry from the newest region and stops at the first
    /// region at or below the boundary. Returns the number destroyed.
    pub fn sweep_new_regions_at_commit<F: FrameStack + ?Sized>(
        &mut self,
        boundary: SequenceNumber,
        frames: &mut F,
    ) -> RegionResult<usize> {
        let mut destroyed = 0;
        let mut cursor = self.live_head;

        while let Some(handle) = cursor {
            let region = self.region(handle)?;
            if region.sequence_number <= boundary {
                break;
            }
            cursor = region.older;

            if region.destroy_at_commit {
                self.destroy_region(handle, frames)?;
                destroyed += 1;
            }
        }

        Ok(destroyed)
    }

    /// Run both sweeps for a resolving commit frame
    ///
    /// Saved entries and the sequence boundary are read from the frame.
    /// Surviving regions of the scope that still name this frame as their
    /// commit frame are handed to an older frame, or stop being tracked.
    pub fn commit<F: FrameStack + ?Sized>(
        &mut self,
        frame: FrameId,
        frames: &mut F,
    ) -> RegionResult<CommitOutcome> {
        self.check_frame(frames, frame)?;
        let saved = frames.entries(frame);

        let mut outcome = CommitOutcome {
            old_destroyed: self.sweep_old_regions_saved_at_commit(&saved, frames)?,
            new_destroyed: 0,
        };

        if let Some(boundary) = frames.saved_sequence(frame) {
            outcome.new_destroyed = self.sweep_new_regions_at_commit(boundary, frames)?;

            let survivors: Vec<RegionHandle> = self
                .live_regions()
                .take_while(|&h| self.region(h).map_or(false, |r| r.sequence_number > boundary))
                .filter(|&h| self.region(h).map_or(false, |r| r.commit_frame == Some(frame)))
                .collect();
            for handle in survivors {
                self.migrate_saved_region(handle, frames)?;
            }
        }

        debug!(
            "Commit at frame {}: {} saved and {} new regions destroyed",
            frame, outcome.old_destroyed, outcome.new_destroyed
        );
        Ok(outcome)
    }

    /// Re-point the region's commit frame to the nearest older commit frame
    /// that still saves it, or clear it
    fn migrate_saved_region<F: FrameStack + ?Sized>(
        &mut self,
        handle: RegionHandle,
        frames: &F,
    ) -> RegionResult<()> {
        let current = self.region(handle)?.commit_frame;
        let mut cursor = current.and_then(|frame| frames.previous(frame));
        let mut target = None;

        while let Some(frame) = cursor {
            self.check_frame(frames, frame)?;
            if frames.position_of(frame, handle).is_some() {
                target = Some(frame);
                break;
            }
            cursor = frames.previous(frame);
        }

        let region = self.region_mut(handle)?;
        region.commit_frame = target;
        debug!(
            "Region #{} survives commit, commit frame {:?} -> {:?}",
            region.sequence_number, current, target
        );
        Ok(())
    }
}
