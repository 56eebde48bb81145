/*!
 * Region Handles
 * Generation-tagged indices into the region slot table
 */

use crate::core::types::Word;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a region owned by a [`RegionManager`](super::RegionManager).
///
/// The generation is bumped every time the slot is vacated, so a handle
/// kept past `destroy_region` no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionHandle {
    index: u32,
    generation: u32,
}

impl RegionHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Encode as a non-zero word for engine frame slots, where `0` is empty
    #[inline]
    pub fn to_word(self) -> Word {
        (u64::from(self.generation) << 32) | (u64::from(self.index) + 1)
    }

    /// Decode a frame slot word; `0` decodes to `None`
    #[inline]
    pub fn from_word(word: Word) -> Option<Self> {
        let low = (word & 0xFFFF_FFFF) as u32;
        if low == 0 {
            return None;
        }
        Some(Self {
            index: low - 1,
            generation: (word >> 32) as u32,
        })
    }
}

impl fmt::Display for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.generation)
    }
}
