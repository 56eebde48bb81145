/*!
 * Bump Allocation
 * Carving cells out of a region's tail page
 */

use super::{CellPtr, RegionHandle, RegionManager};
use crate::core::errors::{RegionError, RegionResult};
use crate::core::types::{Word, WordCount};
use log::error;

impl RegionManager {
    /// Allocate `words` contiguous words in the region
    ///
    /// Extends the region by one page when the tail page cannot hold the
    /// request. Requests larger than a whole page are rejected.
    pub fn alloc(&mut self, handle: RegionHandle, words: WordCount) -> RegionResult<CellPtr> {
        let capacity = self.config.page_words;
        if words > capacity {
            error!(
                "Region {} requested {} words, a page holds only {}",
                handle, words, capacity
            );
            return Err(RegionError::ObjectTooLarge {
                requested: words,
                capacity,
            });
        }

        if self.region(handle)?.available_words < words {
            self.extend_region(handle)?;
        }

        let region = self.region_mut(handle)?;
        let cell = CellPtr {
            page: region.last_page,
            offset: region.next_word,
        };
        region.next_word += words;
        region.available_words -= words;
        region.allocated_words += words;

        self.profiler.words_allocated(words);
        Ok(cell)
    }

    /// Words still free in the region's tail page
    pub fn available_words(&self, handle: RegionHandle) -> RegionResult<WordCount> {
        Ok(self.region(handle)?.available_words)
    }

    /// The `words` words starting at `cell`, `None` when out of bounds
    pub fn cells(&self, cell: CellPtr, words: WordCount) -> Option<&[Word]> {
        if cell.page >= self.pool.total_pages() {
            return None;
        }
        self.pool
            .words(cell.page)
            .get(cell.offset..cell.offset.checked_add(words)?)
    }

    pub fn cells_mut(&mut self, cell: CellPtr, words: WordCount) -> Option<&mut [Word]> {
        if cell.page >= self.pool.total_pages() {
            return None;
        }
        self.pool
            .words_mut(cell.page)
            .get_mut(cell.offset..cell.offset.checked_add(words)?)
    }
}
