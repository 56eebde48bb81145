/*!
 * Core Types
 * Common types used across the region runtime
 */

/// Storage unit of a page. Capacities and offsets are counted in words.
pub type Word = u64;

/// Number of words (capacities, allocation sizes)
pub type WordCount = usize;

/// Creation ordinal of a region, strictly increasing per manager
pub type SequenceNumber = u64;

/// Index of a page inside the page pool
pub type PageId = usize;
