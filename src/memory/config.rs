/*!
 * Region Configuration
 * Page geometry, frame layout contract and sweep policy
 */

use super::frames::FrameKind;
use super::region::CONTROL_BLOCK_WORDS;
use crate::core::errors::{RegionError, RegionResult};
use crate::core::limits;
use log::warn;
use serde::{Deserialize, Serialize};

/// What a commit sweep does with a saved region that was never flagged
/// `destroy_at_commit` inside the committed scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitSavePolicy {
    /// Hand the region over to the nearest older commit frame that still
    /// saves it, or stop tracking it when none does
    #[default]
    Migrate,
    /// Refuse with `RegionError::UnsupportedCommitMigration`
    Reject,
}

/// Word offsets of one frame kind, as laid out by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLayout {
    pub link_offset: usize,
    pub count_offset: usize,
    pub entries_offset: usize,
    pub entry_stride: usize,
    /// Commit frames record the sequence boundary at scope entry
    pub sequence_offset: Option<usize>,
}

impl FrameLayout {
    /// Layout of ite and disj protection frames
    pub const fn protection() -> Self {
        Self {
            link_offset: limits::FRAME_LINK_OFFSET,
            count_offset: limits::FRAME_COUNT_OFFSET,
            entries_offset: limits::PROTECT_FRAME_ENTRIES_OFFSET,
            entry_stride: limits::FRAME_ENTRY_STRIDE,
            sequence_offset: None,
        }
    }

    /// Layout of commit frames
    pub const fn commit() -> Self {
        Self {
            link_offset: limits::FRAME_LINK_OFFSET,
            count_offset: limits::FRAME_COUNT_OFFSET,
            entries_offset: limits::COMMIT_FRAME_ENTRIES_OFFSET,
            entry_stride: limits::FRAME_ENTRY_STRIDE,
            sequence_offset: Some(limits::COMMIT_FRAME_SEQUENCE_OFFSET),
        }
    }

    /// Word offset of entry `index` relative to the frame start
    #[inline]
    pub fn entry_offset(&self, index: usize) -> usize {
        self.entries_offset + index * self.entry_stride
    }

    /// Total words occupied by a frame with `entries` entries
    pub fn frame_words(&self, entries: usize) -> usize {
        let fixed = self
            .link_offset
            .max(self.count_offset)
            .max(self.sequence_offset.unwrap_or(0))
            + 1;
        fixed.max(self.entry_offset(entries))
    }

    fn validate(&self, kind: &str) -> RegionResult<()> {
        if self.entry_stride == 0 {
            return Err(RegionError::InvalidConfig(format!(
                "{} frame entry stride must be non-zero",
                kind
            )));
        }
        if self.link_offset == self.count_offset {
            return Err(RegionError::InvalidConfig(format!(
                "{} frame link and count share offset {}",
                kind, self.link_offset
            )));
        }
        let mut fixed = vec![self.link_offset, self.count_offset];
        if let Some(seq) = self.sequence_offset {
            if seq == self.link_offset || seq == self.count_offset {
                return Err(RegionError::InvalidConfig(format!(
                    "{} frame sequence number overlaps a fixed field at {}",
                    kind, seq
                )));
            }
            fixed.push(seq);
        }
        if fixed.iter().any(|&offset| offset >= self.entries_offset) {
            return Err(RegionError::InvalidConfig(format!(
                "{} frame entries at {} overlap the fixed fields",
                kind, self.entries_offset
            )));
        }
        Ok(())
    }
}

/// Layouts for the three frame kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLayouts {
    pub ite: FrameLayout,
    pub disj: FrameLayout,
    pub commit: FrameLayout,
}

impl FrameLayouts {
    pub fn for_kind(&self, kind: FrameKind) -> &FrameLayout {
        match kind {
            FrameKind::Ite => &self.ite,
            FrameKind::Disj => &self.disj,
            FrameKind::Commit => &self.commit,
        }
    }
}

impl Default for FrameLayouts {
    fn default() -> Self {
        Self {
            ite: FrameLayout::protection(),
            disj: FrameLayout::protection(),
            commit: FrameLayout::commit(),
        }
    }
}

/// Region allocator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Payload capacity of one page in words
    pub page_words: usize,
    /// Pages obtained from the system allocator per request
    pub batch_pages: usize,
    /// Bytes per word, used for reporting only
    pub word_bytes: usize,
    /// Words reserved for the region control block in the first page
    pub control_block_words: usize,
    /// Maintain profiling counters
    pub profiling: bool,
    /// Reject frames reporting more entries than this
    pub frame_entry_limit: Option<usize>,
    pub commit_policy: CommitSavePolicy,
    pub frame_layouts: FrameLayouts,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            page_words: limits::DEFAULT_PAGE_WORDS,
            batch_pages: limits::DEFAULT_BATCH_PAGES,
            word_bytes: limits::DEFAULT_WORD_BYTES,
            control_block_words: CONTROL_BLOCK_WORDS,
            profiling: false,
            frame_entry_limit: None,
            commit_policy: CommitSavePolicy::default(),
            frame_layouts: FrameLayouts::default(),
        }
    }
}

impl RegionConfig {
    /// Defaults plus profiling and the frame sanity limit
    pub fn debug() -> Self {
        Self {
            profiling: true,
            frame_entry_limit: Some(limits::DEBUG_FRAME_ENTRY_LIMIT),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `RBMM_PAGE_WORDS`, `RBMM_BATCH_PAGES` and
    /// `RBMM_PROFILING`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(words) = env_parse::<usize>("RBMM_PAGE_WORDS") {
            config.page_words = words;
        }
        if let Some(pages) = env_parse::<usize>("RBMM_BATCH_PAGES") {
            config.batch_pages = pages;
        }
        if let Ok(value) = std::env::var("RBMM_PROFILING") {
            config.profiling = value == "1" || value.eq_ignore_ascii_case("true");
        }

        config
    }

    pub fn with_page_words(mut self, page_words: usize) -> Self {
        self.page_words = page_words;
        self
    }

    pub fn with_batch_pages(mut self, batch_pages: usize) -> Self {
        self.batch_pages = batch_pages;
        self
    }

    pub fn with_control_block_words(mut self, words: usize) -> Self {
        self.control_block_words = words;
        self
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn with_frame_entry_limit(mut self, limit: Option<usize>) -> Self {
        self.frame_entry_limit = limit;
        self
    }

    pub fn with_commit_policy(mut self, policy: CommitSavePolicy) -> Self {
        self.commit_policy = policy;
        self
    }

    pub fn with_frame_layouts(mut self, layouts: FrameLayouts) -> Self {
        self.frame_layouts = layouts;
        self
    }

    /// Words available to allocations in a region's first page
    #[inline]
    pub fn first_page_words(&self) -> usize {
        self.page_words - self.control_block_words
    }

    pub fn validate(&self) -> RegionResult<()> {
        if self.control_block_words < limits::REGION_HEADER_WORDS {
            return Err(RegionError::InvalidConfig(format!(
                "control block needs at least {} words, got {}",
                limits::REGION_HEADER_WORDS,
                self.control_block_words
            )));
        }
        if self.page_words <= self.control_block_words {
            return Err(RegionError::InvalidConfig(format!(
                "page of {} words cannot hold a {} word control block",
                self.page_words, self.control_block_words
            )));
        }
        if self.batch_pages == 0 {
            return Err(RegionError::InvalidConfig(
                "batch_pages must be at least 1".into(),
            ));
        }
        if self.page_words.checked_mul(self.batch_pages).is_none() {
            return Err(RegionError::InvalidConfig(format!(
                "batch of {} pages of {} words overflows the address space",
                self.batch_pages, self.page_words
            )));
        }
        if self.word_bytes == 0 {
            return Err(RegionError::InvalidConfig(
                "word_bytes must be at least 1".into(),
            ));
        }
        self.frame_layouts.ite.validate("ite")?;
        self.frame_layouts.disj.validate("disj")?;
        self.frame_layouts.commit.validate("commit")?;
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid number", name, raw);
            None
        }
    }
}
