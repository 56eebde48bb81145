/*!
 * Region Lifecycle
 * Creation, extension, destruction and the live-region registry
 */

use super::{Region, RegionHandle, RegionManager};
use crate::core::errors::RegionResult;
use crate::core::limits::REGION_HEADER_WORDS;
use crate::core::types::{PageId, Word};
use crate::memory::frames::{FrameId, FrameStack};
use log::debug;

impl RegionManager {
    /// Create a region on a fresh page and make it the registry head
    pub fn create_region(&mut self) -> RegionHandle {
        let page = self.acquire_page();
        let sequence_number = self.next_sequence;
        self.next_sequence += 1;

        let region = Region {
            sequence_number,
            first_page: page,
            last_page: page,
            next_word: self.config.control_block_words,
            available_words: self.config.first_page_words(),
            newer: None,
            older: self.live_head,
            page_count: 1,
            allocated_words: 0,
            ite_protected: None,
            disj_protected: None,
            commit_frame: None,
            logically_removed: false,
            destroy_at_commit: false,
        };
        let handle = self.occupy_slot(region);

        if let Some(old_head) = self.live_head {
            if let Ok(previous_head) = self.region_mut(old_head) {
                previous_head.newer = Some(handle);
            }
        }
        self.live_head = Some(handle);
        self.live_count += 1;

        // Header at the start of the control block
        let header: [Word; REGION_HEADER_WORDS] = [handle.to_word(), sequence_number];
        self.pool.words_mut(page)[..REGION_HEADER_WORDS].copy_from_slice(&header);

        self.profiler.region_created();
        debug!(
            "Create region #{} (handle {}, page {})",
            sequence_number, handle, page
        );
        self.notify(handle, |observer, info| observer.on_create(info));

        handle
    }

    /// Append one page to the region and move the bump cursor onto it
    pub(super) fn extend_region(&mut self, handle: RegionHandle) -> RegionResult<()> {
        self.region(handle)?;
        let page = self.acquire_page();
        let page_words = self.config.page_words;

        let region = self.region_mut(handle)?;
        let tail = region.last_page;
        region.last_page = page;
        region.next_word = 0;
        region.available_words = page_words;
        region.page_count += 1;
        let (sequence, pages) = (region.sequence_number, region.page_count);

        self.pool.link(tail, Some(page));
        debug!(
            "Extend region #{} with page {} ({} pages)",
            sequence, page, pages
        );
        Ok(())
    }

    /// Physically reclaim a region
    ///
    /// Clears every commit-frame entry naming the region, unlinks it from
    /// the registry and returns its page chain to the pool. Ite and disj
    /// frames are left alone: callers destroying an ite-protected region
    /// clear that frame's entry themselves.
    ///
    /// Every commit frame is checked before anything changes, so a failed
    /// call leaves the region, its frames and the observer untouched.
    pub fn destroy_region<F: FrameStack + ?Sized>(
        &mut self,
        handle: RegionHandle,
        frames: &mut F,
    ) -> RegionResult<()> {
        self.check_commit_chain(handle, frames)?;
        let commit_frame = self.region(handle)?.commit_frame;
        self.notify(handle, |observer, info| observer.on_destroy(info));

        if let Some(frame) = commit_frame {
            nullify_in_commit_stack(handle, frame, frames);
        }

        self.unlink(handle)?;
        let region = self.vacate_slot(handle)?;
        self.pool
            .return_chain(region.first_page, region.last_page, region.page_count);
        self.profiler
            .region_destroyed(region.page_count, region.allocated_words);

        debug!(
            "Destroy region #{} (handle {}, {} pages, {} words)",
            region.sequence_number, handle, region.page_count, region.allocated_words
        );
        Ok(())
    }

    /// Run the frame sanity check on every commit frame `destroy_region`
    /// would scan for the region
    pub(super) fn check_commit_chain<F: FrameStack + ?Sized>(
        &self,
        handle: RegionHandle,
        frames: &F,
    ) -> RegionResult<()> {
        let mut cursor = self.region(handle)?.commit_frame;
        while let Some(frame) = cursor {
            self.check_frame(frames, frame)?;
            cursor = frames.previous(frame);
        }
        Ok(())
    }

    /// Detach a region from the live-region registry
    fn unlink(&mut self, handle: RegionHandle) -> RegionResult<()> {
        let (newer, older) = {
            let region = self.region(handle)?;
            (region.newer, region.older)
        };

        match newer {
            // Head of the registry
            None => self.live_head = older,
            Some(newer) => self.region_mut(newer)?.older = older,
        }
        if let Some(older) = older {
            self.region_mut(older)?.newer = newer;
        }

        self.live_count -= 1;
        Ok(())
    }

    fn acquire_page(&mut self) -> PageId {
        let before = self.pool.total_pages();
        let page = self.pool.acquire_page();
        let requested = self.pool.total_pages() - before;
        if requested > 0 {
            self.profiler.pages_requested(requested);
        }
        self.profiler.page_acquired();
        page
    }
}

/// Clear the region's entry in every commit frame from `frame` down
fn nullify_in_commit_stack<F: FrameStack + ?Sized>(
    handle: RegionHandle,
    frame: FrameId,
    frames: &mut F,
) {
    let mut cursor = Some(frame);
    while let Some(current) = cursor {
        if let Some(index) = frames.clear_first(current, handle) {
            debug!(
                "Cleared region {} from commit frame {} slot {}",
                handle, current, index
            );
        }
        cursor = frames.previous(current);
    }
}
