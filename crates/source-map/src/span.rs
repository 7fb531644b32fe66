//! Span and byte offset types for source positions.

use text_size::{TextRange, TextSize};

/// A byte offset into a source string.
pub type ByteOffset = TextSize;

/// A span representing a range in source code.
///
/// Spans are half-open intervals `[start, end)` represented as byte offsets
/// into an immutable text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// The start byte offset (inclusive).
    pub start: ByteOffset,
    /// The end byte offset (exclusive).
    pub end: ByteOffset,
}

impl Span {
    /// Creates a new span from start and end byte offsets.
    #[inline]
    pub fn new(start: impl Into<ByteOffset>, end: impl Into<ByteOffset>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Creates an empty span at the given offset.
    #[inline]
    pub fn empty(offset: impl Into<ByteOffset>) -> Self {
        let offset = offset.into();
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Returns the length of this span in bytes.
    #[inline]
    pub fn len(&self) -> TextSize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if this span contains the given offset.
    #[inline]
    pub fn contains(&self, offset: ByteOffset) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns true if this span contains the given offset, treating the end
    /// offset as inclusive. Cursor positions sit *between* bytes, so a caret
    /// at the very end of an identifier still belongs to it.
    #[inline]
    pub fn touches(&self, offset: ByteOffset) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Returns true if this span contains the given span entirely.
    #[inline]
    pub fn contains_span(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns a span covering both this span and another.
    #[inline]
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: std::cmp::min(self.start, other.start),
            end: std::cmp::max(self.end, other.end),
        }
    }

    /// Shifts both endpoints forward by `base`.
    ///
    /// Rebasing is applied exactly once, at the outermost parse that received
    /// the base span; descendants inherit already-rebased offsets.
    #[inline]
    pub fn rebase(self, base: ByteOffset) -> Span {
        Span {
            start: self.start + base,
            end: self.end + base,
        }
    }

    /// Returns the slice of `text` covered by this span.
    ///
    /// Callers are responsible for only using spans produced against `text`.
    #[inline]
    pub fn slice(self, text: &str) -> &str {
        &text[usize::from(self.start)..usize::from(self.end)]
    }

    /// Converts this span to a `TextRange`.
    #[inline]
    pub fn to_range(self) -> TextRange {
        TextRange::new(self.start, self.end)
    }
}

impl From<TextRange> for Span {
    fn from(range: TextRange) -> Self {
        Self {
            start: range.start(),
            end: range.end(),
        }
    }
}

impl From<Span> for TextRange {
    fn from(span: Span) -> Self {
        TextRange::new(span.start, span.end)
    }
}

impl From<std::ops::Range<u32>> for Span {
    fn from(range: std::ops::Range<u32>) -> Self {
        Span::new(range.start, range.end)
    }
}
