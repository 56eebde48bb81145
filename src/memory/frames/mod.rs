/*!
 * Protection and Commit Frames
 *
 * Frames are pushed by the backtracking engine when it enters an
 * if-then-else condition (ite), a disjunction (disj) or a commit scope.
 * Each frame links to the previous frame of the same kind and carries an
 * array of entry slots, each empty or naming a region.
 *
 * The allocator never assumes a memory layout for frames. It only reads
 * and clears entries through [`FrameStack`], which the engine implements.
 * [`LayoutFrameStack`] is a ready-made implementation over a word buffer
 * driven by [`FrameLayout`](super::config::FrameLayout) offsets.
 */

mod layout;

pub use layout::LayoutFrameStack;

use crate::core::types::SequenceNumber;
use crate::memory::region::RegionHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Control-flow construct that pushed a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Ite,
    Disj,
    Commit,
}

impl FrameKind {
    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            FrameKind::Ite => 0,
            FrameKind::Disj => 1,
            FrameKind::Commit => 2,
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Ite => write!(f, "ite"),
            FrameKind::Disj => write!(f, "disj"),
            FrameKind::Commit => write!(f, "commit"),
        }
    }
}

/// Engine-assigned frame identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameId(pub usize);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Capability interface over the engine's frames
pub trait FrameStack {
    /// Most recently pushed frame of `kind`
    fn top(&self, kind: FrameKind) -> Option<FrameId>;

    /// Previous frame of the same kind
    fn previous(&self, frame: FrameId) -> Option<FrameId>;

    fn entry_count(&self, frame: FrameId) -> usize;

    fn set_entry_count(&mut self, frame: FrameId, count: usize);

    fn entry(&self, frame: FrameId, index: usize) -> Option<RegionHandle>;

    fn clear_entry(&mut self, frame: FrameId, index: usize);

    /// Sequence boundary recorded when a commit frame was pushed
    fn saved_sequence(&self, _frame: FrameId) -> Option<SequenceNumber> {
        None
    }

    fn entries(&self, frame: FrameId) -> Vec<Option<RegionHandle>> {
        (0..self.entry_count(frame))
            .map(|index| self.entry(frame, index))
            .collect()
    }

    /// Index of the first entry naming `region`
    fn position_of(&self, frame: FrameId, region: RegionHandle) -> Option<usize> {
        (0..self.entry_count(frame)).find(|&index| self.entry(frame, index) == Some(region))
    }

    /// Clear the first entry naming `region`; the scan stops there
    fn clear_first(&mut self, frame: FrameId, region: RegionHandle) -> Option<usize> {
        let index = self.position_of(frame, region)?;
        self.clear_entry(frame, index);
        Some(index)
    }

    /// Number of frames reachable from `frame` through previous links,
    /// `frame` included. Zero for no frame.
    fn depth(&self, frame: Option<FrameId>) -> usize {
        let mut depth = 0;
        let mut cursor = frame;
        while let Some(current) = cursor {
            depth += 1;
            cursor = self.previous(current);
        }
        depth
    }
}
