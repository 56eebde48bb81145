/*!
 * Region Runtime Limits and Constants
 *
 * Centralized location for the tunable defaults of the region allocator.
 * Organized by domain for maintainability and discoverability.
 *
 * - Performance-critical constants are marked with [PERF]
 * - Values mirroring the frame layout emitted by the backtracking engine
 *   are marked with [ENGINE]
 */

// =============================================================================
// PAGE POOL
// =============================================================================

/// Default page payload capacity (4096 words, 32KB with 8-byte words)
/// [PERF] Large enough that most regions never extend
pub const DEFAULT_PAGE_WORDS: usize = 4096;

/// Pages requested from the system allocator per batch
/// [PERF] Amortizes allocator calls across many region creations
pub const DEFAULT_BATCH_PAGES: usize = 100;

/// Bytes per word used for byte-size reporting
pub const DEFAULT_WORD_BYTES: usize = 8;

// =============================================================================
// REGIONS
// =============================================================================

/// Sequence number handed to the first region of a manager
pub const FIRST_SEQUENCE_NUMBER: u64 = 1;

/// Words of the control block that hold the region header
/// (encoded handle, sequence number)
pub const REGION_HEADER_WORDS: usize = 2;

/// Sanity limit on entries per frame used by `RegionConfig::debug()`
/// Anything larger points at a corrupted frame rather than a real workload
pub const DEBUG_FRAME_ENTRY_LIMIT: usize = 10;

// =============================================================================
// FRAME LAYOUT
// =============================================================================

/// Offset of the link to the previous frame of the same kind [ENGINE]
pub const FRAME_LINK_OFFSET: usize = 0;

/// Offset of the protected/saved entry count [ENGINE]
pub const FRAME_COUNT_OFFSET: usize = 1;

/// Offset of the first ite/disj protection entry [ENGINE]
pub const PROTECT_FRAME_ENTRIES_OFFSET: usize = 2;

/// Offset of the saved sequence number in a commit frame [ENGINE]
pub const COMMIT_FRAME_SEQUENCE_OFFSET: usize = 2;

/// Offset of the first saved-region entry in a commit frame [ENGINE]
pub const COMMIT_FRAME_ENTRIES_OFFSET: usize = 3;

/// Words per frame entry [ENGINE]
pub const FRAME_ENTRY_STRIDE: usize = 1;
