/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Region operation result
pub type RegionResult<T> = Result<T, RegionError>;

/// Region allocator errors
///
/// Everything except [`RegionError::StaleHandle`] and
/// [`RegionError::InvalidConfig`] is an invariant violation of the engine
/// contract. The allocator never swallows those; the engine is expected to
/// stop execution when one surfaces.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum RegionError {
    #[error("Stale region handle {index}:{generation}")]
    #[diagnostic(
        code(region::stale_handle),
        help("The region has already been destroyed. Its slot may have been reused.")
    )]
    StaleHandle { index: u32, generation: u32 },

    #[error("Allocation of {requested} words exceeds page capacity of {capacity} words")]
    #[diagnostic(
        code(region::object_too_large),
        help("A single object must fit in one page. Raise page_words in the region config.")
    )]
    ObjectTooLarge { requested: usize, capacity: usize },

    #[error("Region #{sequence} saved at commit was never removed in the commit scope")]
    #[diagnostic(
        code(region::unsupported_commit_migration),
        help("Use CommitSavePolicy::Migrate to hand the region over to an older commit frame.")
    )]
    UnsupportedCommitMigration { sequence: u64 },

    #[error("Frame {frame} holds {count} entries, sanity limit is {limit}")]
    #[diagnostic(
        code(region::frame_sanity_limit),
        help("The frame is most likely corrupted. Check the frame layout handed to the allocator.")
    )]
    FrameSanityLimit {
        frame: usize,
        count: usize,
        limit: usize,
    },

    #[error("Invalid region configuration: {0}")]
    #[diagnostic(code(region::invalid_config))]
    InvalidConfig(String),
}

impl RegionError {
    /// Whether the error belongs to the unrecoverable tier
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RegionError::StaleHandle { .. } | RegionError::InvalidConfig(_)
        )
    }
}
