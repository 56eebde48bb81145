/*!
 * Region Runtime Library
 * Region-based memory management for backtracking execution
 */

pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::{RegionError, RegionResult};
pub use crate::core::types::{PageId, SequenceNumber, Word, WordCount};
pub use memory::{
    CellPtr, CommitOutcome, CommitSavePolicy, FrameId, FrameKind, FrameLayout, FrameLayouts,
    FrameStack, LayoutFrameStack, RegionConfig, RegionHandle, RegionInfo, RegionManager,
    RegionObserver, Removal, SharedRegionManager,
};
pub use monitoring::{ProfileSnapshot, RegionProfiler};
