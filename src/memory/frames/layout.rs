/*!
 * Layout Frame Stack
 * Word-buffer frames addressed through configured offsets
 */

use super::{FrameId, FrameKind, FrameStack};
use crate::core::types::{SequenceNumber, Word};
use crate::memory::config::{FrameLayout, FrameLayouts, RegionConfig};
use crate::memory::region::RegionHandle;

/// Frames of all three kinds interleaved on one word stack, the way the
/// engine keeps them on its execution stack. A [`FrameId`] is the word
/// offset of the frame start. Links and entries use `0` for "none".
#[derive(Debug, Clone)]
pub struct LayoutFrameStack {
    layouts: FrameLayouts,
    words: Vec<Word>,
    kinds: Vec<(FrameId, FrameKind)>,
    tops: [Option<FrameId>; 3],
}

impl LayoutFrameStack {
    pub fn new(layouts: FrameLayouts) -> Self {
        Self {
            layouts,
            words: Vec::new(),
            kinds: Vec::new(),
            tops: [None; 3],
        }
    }

    pub fn from_config(config: &RegionConfig) -> Self {
        Self::new(config.frame_layouts)
    }

    /// Push an ite or disj protection frame
    pub fn push_frame(&mut self, kind: FrameKind, entries: &[Option<RegionHandle>]) -> FrameId {
        self.push(kind, None, entries)
    }

    /// Push a commit frame recording the sequence boundary at scope entry
    pub fn push_commit_frame(
        &mut self,
        boundary: SequenceNumber,
        saved: &[Option<RegionHandle>],
    ) -> FrameId {
        self.push(FrameKind::Commit, Some(boundary), saved)
    }

    fn push(
        &mut self,
        kind: FrameKind,
        boundary: Option<SequenceNumber>,
        entries: &[Option<RegionHandle>],
    ) -> FrameId {
        let layout = *self.layouts.for_kind(kind);
        let frame = FrameId(self.words.len());
        self.words
            .resize(frame.0 + layout.frame_words(entries.len()), 0);

        self.write(frame.0 + layout.link_offset, encode_frame(self.tops[kind.slot()]));
        if let (Some(offset), Some(boundary)) = (layout.sequence_offset, boundary) {
            self.write(frame.0 + offset, boundary);
        }

        self.kinds.push((frame, kind));
        self.set_entry_count(frame, entries.len());
        for (index, entry) in entries.iter().enumerate() {
            self.set_entry(frame, index, *entry);
        }

        self.tops[kind.slot()] = Some(frame);
        frame
    }

    /// Pop the top frame of `kind`. Its words are released only when it is
    /// also the topmost frame of the whole stack.
    pub fn pop_frame(&mut self, kind: FrameKind) -> Option<FrameId> {
        let frame = self.tops[kind.slot()]?;
        self.tops[kind.slot()] = self.previous(frame);
        let end = frame.0 + self.layout(frame).frame_words(self.entry_count(frame));

        if let Some(pos) = self.kinds.iter().rposition(|(id, _)| *id == frame) {
            self.kinds.remove(pos);
        }
        if end == self.words.len() {
            self.words.truncate(frame.0);
        }
        Some(frame)
    }

    /// Write one entry slot; writes outside the buffer are ignored
    pub fn set_entry(&mut self, frame: FrameId, index: usize, region: Option<RegionHandle>) {
        let offset = frame.0 + self.layout(frame).entry_offset(index);
        self.write(offset, region.map_or(0, RegionHandle::to_word));
    }

    pub fn kind_of(&self, frame: FrameId) -> Option<FrameKind> {
        self.kinds
            .iter()
            .rev()
            .find(|(id, _)| *id == frame)
            .map(|(_, kind)| *kind)
    }

    /// Raw view of the frame words
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    #[inline]
    fn read(&self, offset: usize) -> Word {
        self.words.get(offset).copied().unwrap_or(0)
    }

    #[inline]
    fn write(&mut self, offset: usize, value: Word) {
        if let Some(word) = self.words.get_mut(offset) {
            *word = value;
        }
    }

    fn layout(&self, frame: FrameId) -> &FrameLayout {
        let kind = self.kind_of(frame).unwrap_or(FrameKind::Ite);
        self.layouts.for_kind(kind)
    }
}

impl FrameStack for LayoutFrameStack {
    fn top(&self, kind: FrameKind) -> Option<FrameId> {
        self.tops[kind.slot()]
    }

    fn previous(&self, frame: FrameId) -> Option<FrameId> {
        decode_frame(self.read(frame.0 + self.layout(frame).link_offset))
    }

    fn entry_count(&self, frame: FrameId) -> usize {
        self.read(frame.0 + self.layout(frame).count_offset) as usize
    }

    fn set_entry_count(&mut self, frame: FrameId, count: usize) {
        let offset = frame.0 + self.layout(frame).count_offset;
        self.write(offset, count as Word);
    }

    fn entry(&self, frame: FrameId, index: usize) -> Option<RegionHandle> {
        let offset = frame.0 + self.layout(frame).entry_offset(index);
        RegionHandle::from_word(self.read(offset))
    }

    fn clear_entry(&mut self, frame: FrameId, index: usize) {
        self.set_entry(frame, index, None);
    }

    fn saved_sequence(&self, frame: FrameId) -> Option<SequenceNumber> {
        let offset = self.layout(frame).sequence_offset?;
        Some(self.read(frame.0 + offset))
    }
}

#[inline]
fn encode_frame(frame: Option<FrameId>) -> Word {
    frame.map_or(0, |f| f.0 as Word + 1)
}

#[inline]
fn decode_frame(word: Word) -> Option<FrameId> {
    (word != 0).then(|| FrameId(word as usize - 1))
}
