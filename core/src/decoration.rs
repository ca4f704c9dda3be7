//! Preedit decoration: which part of the composing text is "background"
//! (already offered for conversion) and which part is "underline" (not yet
//! offered).
//!
//! All indices in this module are char (Unicode scalar) indices into the
//! composing text, never byte offsets. Every function here is total: cursors
//! and ranges outside the text are clamped, never rejected.

use serde::{Deserialize, Serialize};

/// Half-open char range `[start, end_exclusive)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: usize,
    pub end_exclusive: usize,
}

impl Range {
    pub const EMPTY: Range = Range {
        start: 0,
        end_exclusive: 0,
    };

    pub fn new(start: usize, end_exclusive: usize) -> Self {
        Self {
            start,
            end_exclusive,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end_exclusive <= self.start
    }

    pub fn len(&self) -> usize {
        self.end_exclusive.saturating_sub(self.start)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end_exclusive
    }

    /// Clamp both ends into `[0, len]`.
    ///
    /// An inverted or empty result collapses to `Range::EMPTY` so callers
    /// never see a range anchored past the end of the text.
    pub fn clamp(&self, len: usize) -> Range {
        let start = self.start.min(len);
        let end = self.end_exclusive.min(len);
        if end <= start {
            Range::EMPTY
        } else {
            Range::new(start, end)
        }
    }
}

/// How the bg/ul split is derived from `(length, cursor)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecorationPolicy {
    /// bg = `[0, cursor)`, ul = `[cursor, len)`
    #[default]
    SplitAtCursor,
    /// bg = the single char under the cursor, ul = the whole text
    CursorChar,
    /// Externally supplied ranges, clamped to the text length
    Custom { bg: Range, ul: Range },
}

/// Result of [`compute_ranges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputedRanges {
    pub bg: Range,
    pub ul: Range,
}

/// Compute the bg/ul ranges of a composing text of `len` chars.
pub fn compute_ranges(len: usize, cursor: usize, policy: &DecorationPolicy) -> ComputedRanges {
    let c = cursor.min(len);
    match policy {
        DecorationPolicy::SplitAtCursor => ComputedRanges {
            bg: Range::new(0, c),
            ul: Range::new(c, len),
        },
        DecorationPolicy::CursorChar => ComputedRanges {
            bg: Range::new(c, (c + 1).min(len)),
            ul: Range::new(0, len),
        },
        DecorationPolicy::Custom { bg, ul } => ComputedRanges {
            bg: bg.clamp(len),
            ul: ul.clamp(len),
        },
    }
}

/// Visual style of one char of the preedit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreeditStyle {
    pub background: bool,
    pub underline: bool,
}

/// Preedit text ready for an editor: text, clamped bg/ul ranges and the caret
/// position the editor should show inside the composing region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledPreedit {
    pub text: String,
    pub bg: Range,
    pub ul: Range,
    /// Caret offset within the preedit (char index, `<= len`)
    pub caret: usize,
}

impl StyledPreedit {
    pub fn new(text: impl Into<String>, cursor: usize, policy: &DecorationPolicy) -> Self {
        let text = text.into();
        let len = char_len(&text);
        let ranges = compute_ranges(len, cursor, policy);
        Self {
            text,
            bg: ranges.bg.clamp(len),
            ul: ranges.ul.clamp(len),
            caret: cursor.min(len),
        }
    }

    pub fn len(&self) -> usize {
        char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn bg_text(&self) -> &str {
        slice_chars(&self.text, self.bg)
    }

    pub fn ul_text(&self) -> &str {
        slice_chars(&self.text, self.ul)
    }

    pub fn style_at(&self, index: usize) -> PreeditStyle {
        PreeditStyle {
            background: self.bg.contains(index),
            underline: self.ul.contains(index),
        }
    }
}

/// Number of chars in `text`.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of char index `index`, clamped to the end of the text.
pub(crate) fn byte_offset(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

/// Substring covered by a char range; out-of-bounds parts are dropped.
pub(crate) fn slice_chars(text: &str, range: Range) -> &str {
    let range = range.clamp(char_len(text));
    if range.is_empty() {
        return "";
    }
    let start = byte_offset(text, range.start);
    let end = byte_offset(text, range.end_exclusive);
    &text[start..end]
}
