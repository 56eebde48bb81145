/*!
 * Region Manager
 *
 * Bump-pointer regions whose lifetime follows the control-flow scopes of a
 * backtracking engine.
 *
 * ## State
 *
 * All allocator state lives in one [`RegionManager`] context:
 * - **Page pool**: free-page list refilled in batches
 * - **Slot table**: region records addressed by generation-tagged handles
 * - **Live-region registry**: intrusive doubly-linked list, newest first
 * - **Sequence counter**: creation ordinal, strictly increasing
 *
 * Independent managers share nothing, so several execution contexts can
 * run side by side, each with its own manager.
 *
 * ## Lifecycle
 *
 * `Live` -> `LogicallyRemoved` -> `Destroyed`. A logically removed region
 * keeps its pages until a commit sweep or the release of its last
 * protection destroys it. Destroyed regions are never resurrected: their
 * slot generation moves on and old handles stop resolving.
 */

mod allocator;
mod commit;
mod handle;
mod info;
mod lifecycle;
mod removal;

pub use handle::RegionHandle;
pub use info::{RegionInfo, RegionObserver};

use super::config::RegionConfig;
use super::frames::{FrameId, FrameKind, FrameStack};
use super::pool::PagePool;
use crate::core::errors::{RegionError, RegionResult};
use crate::core::limits;
use crate::core::types::{PageId, SequenceNumber, Word, WordCount};
use crate::monitoring::{ProfileSnapshot, RegionProfiler};
use log::{error, info};
use serde::{Deserialize, Serialize};

/// Default size of the control block: the region record in whole words
pub const CONTROL_BLOCK_WORDS: usize =
    std::mem::size_of::<Region>().div_ceil(std::mem::size_of::<Word>());

/// Region record
#[derive(Debug, Clone)]
struct Region {
    sequence_number: SequenceNumber,
    first_page: PageId,
    last_page: PageId,
    /// Bump cursor, word offset in `last_page`
    next_word: usize,
    available_words: WordCount,
    /// Registry neighbours
    newer: Option<RegionHandle>,
    older: Option<RegionHandle>,
    page_count: usize,
    /// Words handed out over the region's lifetime
    allocated_words: WordCount,
    ite_protected: Option<FrameId>,
    disj_protected: Option<FrameId>,
    commit_frame: Option<FrameId>,
    logically_removed: bool,
    destroy_at_commit: bool,
}

impl Region {
    #[inline]
    fn is_protected(&self) -> bool {
        self.ite_protected.is_some() || self.disj_protected.is_some()
    }
}

#[derive(Debug)]
struct RegionSlot {
    generation: u32,
    region: Option<Region>,
}

/// Address of an allocated cell: page plus word offset within the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPtr {
    pub page: PageId,
    pub offset: usize,
}

/// Outcome of a removal request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Removal {
    /// Pages returned, handle no longer valid
    Destroyed,
    /// Still protected; flagged for later destruction
    LogicallyRemoved { destroy_at_commit: bool },
    /// Nothing to reclaim yet
    Kept,
}

/// Regions destroyed by [`RegionManager::commit`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOutcome {
    /// Regions saved in the commit frame
    pub old_destroyed: usize,
    /// Regions created inside the committed scope
    pub new_destroyed: usize,
}

/// Region allocator context
pub struct RegionManager {
    config: RegionConfig,
    pool: PagePool,
    slots: Vec<RegionSlot>,
    free_slots: Vec<u32>,
    live_head: Option<RegionHandle>,
    live_count: usize,
    next_sequence: SequenceNumber,
    profiler: RegionProfiler,
    observer: Option<Box<dyn RegionObserver>>,
}

impl RegionManager {
    pub fn new() -> Self {
        Self::build(RegionConfig::default())
    }

    /// Create a manager with a validated custom configuration
    pub fn with_config(config: RegionConfig) -> RegionResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RegionConfig) -> Self {
        info!(
            "Region manager initialized: {} words per page, {} pages per batch, {} word control block, profiling {}",
            config.page_words,
            config.batch_pages,
            config.control_block_words,
            if config.profiling { "on" } else { "off" }
        );
        Self {
            pool: PagePool::new(config.page_words, config.batch_pages),
            slots: Vec::new(),
            free_slots: Vec::new(),
            live_head: None,
            live_count: 0,
            next_sequence: limits::FIRST_SEQUENCE_NUMBER,
            profiler: RegionProfiler::new(config.profiling),
            observer: None,
            config,
        }
    }

    /// Install a lifecycle observer
    pub fn with_observer(mut self, observer: Box<dyn RegionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Record that `frame` protects (ite/disj) or saves (commit) the region
    pub fn attach_frame(
        &mut self,
        handle: RegionHandle,
        kind: FrameKind,
        frame: FrameId,
    ) -> RegionResult<()> {
        let region = self.region_mut(handle)?;
        *frame_ref(region, kind) = Some(frame);
        Ok(())
    }

    pub fn is_live(&self, handle: RegionHandle) -> bool {
        self.region(handle).is_ok()
    }

    /// Number of regions in the live-region registry
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Live regions, newest first
    pub fn live_regions(&self) -> LiveRegions<'_> {
        LiveRegions {
            manager: self,
            cursor: self.live_head,
        }
    }

    /// Sequence number of the most recently created region; the boundary
    /// the engine records when entering a protected scope
    pub fn sequence_boundary(&self) -> SequenceNumber {
        self.next_sequence - 1
    }

    pub fn sequence_number(&self, handle: RegionHandle) -> RegionResult<SequenceNumber> {
        Ok(self.region(handle)?.sequence_number)
    }

    /// Pages currently on the free list
    pub fn free_pages(&self) -> usize {
        self.pool.free_pages()
    }

    /// Profiling dump, `None` when profiling is disabled
    pub fn profile(&self) -> Option<ProfileSnapshot> {
        self.profiler.snapshot()
    }

    fn region(&self, handle: RegionHandle) -> RegionResult<&Region> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.region.as_ref())
            .ok_or(RegionError::StaleHandle {
                index: handle.index(),
                generation: handle.generation(),
            })
    }

    fn region_mut(&mut self, handle: RegionHandle) -> RegionResult<&mut Region> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.region.as_mut())
            .ok_or(RegionError::StaleHandle {
                index: handle.index(),
                generation: handle.generation(),
            })
    }

    /// Place a region record in a free slot
    ///
    /// # Panics
    ///
    /// When more than `u32::MAX - 1` slots would be needed.
    fn occupy_slot(&mut self, region: Region) -> RegionHandle {
        if let Some(index) = self.free_slots.pop() {
            let slot = &mut self.slots[index as usize];
            slot.region = Some(region);
            return RegionHandle::new(index, slot.generation);
        }

        let index = match u32::try_from(self.slots.len()) {
            Ok(index) if index < u32::MAX => index,
            _ => panic!("region slot table exhausted"),
        };
        self.slots.push(RegionSlot {
            generation: 0,
            region: Some(region),
        });
        RegionHandle::new(index, 0)
    }

    /// Take the record out of its slot and retire the handle
    fn vacate_slot(&mut self, handle: RegionHandle) -> RegionResult<Region> {
        self.region(handle)?;
        let slot = &mut self.slots[handle.index() as usize];
        let region = slot.region.take().ok_or(RegionError::StaleHandle {
            index: handle.index(),
            generation: handle.generation(),
        })?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(handle.index());
        Ok(region)
    }

    /// Enforce the configured frame sanity limit
    fn check_frame<F: FrameStack + ?Sized>(&self, frames: &F, frame: FrameId) -> RegionResult<()> {
        if let Some(limit) = self.config.frame_entry_limit {
            let count = frames.entry_count(frame);
            if count > limit {
                error!(
                    "Frame {} reports {} entries, sanity limit is {}",
                    frame,
                    count,
                    limit
                );
                return Err(RegionError::FrameSanityLimit {
                    frame: frame.0,
                    count,
                    limit,
                });
            }
        }
        Ok(())
    }
}

impl Default for RegionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RegionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionManager")
            .field("live_count", &self.live_count)
            .field("next_sequence", &self.next_sequence)
            .field("free_pages", &self.pool.free_pages())
            .field("total_pages", &self.pool.total_pages())
            .finish()
    }
}

#[inline]
fn frame_ref(region: &mut Region, kind: FrameKind) -> &mut Option<FrameId> {
    match kind {
        FrameKind::Ite => &mut region.ite_protected,
        FrameKind::Disj => &mut region.disj_protected,
        FrameKind::Commit => &mut region.commit_frame,
    }
}

/// Iterator over the live-region registry, newest first
pub struct LiveRegions<'a> {
    manager: &'a RegionManager,
    cursor: Option<RegionHandle>,
}

impl Iterator for LiveRegions<'_> {
    type Item = RegionHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        self.cursor = self.manager.region(handle).ok().and_then(|r| r.older);
        Some(handle)
    }
}
