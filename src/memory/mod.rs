/*!
 * Memory Module
 * Region-based memory management for a backtracking engine
 */

pub mod config;
pub mod frames;
pub mod pool;
pub mod region;
pub mod shared;

// Re-export for convenience
pub use config::{CommitSavePolicy, FrameLayout, FrameLayouts, RegionConfig};
pub use frames::{FrameId, FrameKind, FrameStack, LayoutFrameStack};
pub use pool::PagePool;
pub use region::{
    CellPtr, CommitOutcome, LiveRegions, RegionHandle, RegionInfo, RegionManager, RegionObserver,
    Removal, CONTROL_BLOCK_WORDS,
};
pub use shared::SharedRegionManager;
