//! Immutable source location primitives.

/// Identifier for a logical input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SourceId(u32);

impl SourceId {
    /// Creates a source identifier.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw identifier value.
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Byte offset within a single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ByteOffset(u32);

impl ByteOffset {
    /// Creates a byte offset value.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Creates an offset from `usize`, saturating at `u32::MAX`.
    pub fn from_usize(value: usize) -> Self {
        Self(u32::try_from(value).unwrap_or(u32::MAX))
    }

    /// Returns the raw offset value.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Converts the offset to `usize`.
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Source span: a byte range plus the 1-based line it starts on.
///
/// PIR diagnostics are reported per line, so the line travels with the span
/// instead of being recomputed from offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Source identity for this span.
    pub source_id: SourceId,
    /// Inclusive start byte offset.
    pub start: ByteOffset,
    /// Exclusive end byte offset.
    pub end: ByteOffset,
    /// Line of `start`, counting from 1.
    pub line: u32,
}

impl Span {
    /// Creates a span and normalizes offset ordering.
    pub fn new(source_id: SourceId, start: ByteOffset, end: ByteOffset, line: u32) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            source_id,
            start,
            end,
            line,
        }
    }

    /// Returns the span length in bytes.
    pub fn len(self) -> u32 {
        self.end.value() - self.start.value()
    }

    /// Returns `true` when the span contains no bytes.
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}
