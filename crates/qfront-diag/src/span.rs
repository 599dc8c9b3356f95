//! Source identifiers and byte spans.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Identifier of a source file registered in a [`SourceMap`](crate::SourceMap).
///
/// Ids are handed out in registration order, so the entry file of a
/// compilation is always `SourceId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceId(pub u32);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src{}", self.0)
    }
}

/// Saturates at `u32::MAX`.
impl From<usize> for SourceId {
    fn from(id: usize) -> Self {
        SourceId(u32::try_from(id).unwrap_or(u32::MAX))
    }
}

/// A half-open byte range inside one source file.
///
/// Offsets are stored as `u32`; the driver refuses sources larger than
/// `u32::MAX` bytes before they reach the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub source: SourceId,
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a span from raw offsets.
    pub const fn new(source: SourceId, start: u32, end: u32) -> Self {
        Self { source, start, end }
    }

    /// Create a span from a byte range, saturating offsets at `u32::MAX`.
    pub fn from_range(source: SourceId, range: Range<usize>) -> Self {
        let start = u32::try_from(range.start).unwrap_or(u32::MAX);
        let end = u32::try_from(range.end).unwrap_or(u32::MAX);
        Self { source, start, end }
    }

    /// An empty span at `offset`.
    pub const fn point(source: SourceId, offset: u32) -> Self {
        Self {
            source,
            start: offset,
            end: offset,
        }
    }

    /// Length in bytes.
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The span as a `usize` range, for slicing source text.
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Whether `other` lies entirely inside this span (same source only).
    pub fn contains(&self, other: Span) -> bool {
        self.source == other.source && self.start <= other.start && other.end <= self.end
    }

    /// Whether the two spans share at least one byte.
    pub fn overlaps(&self, other: Span) -> bool {
        self.source == other.source && self.start < other.end && other.start < self.end
    }

    /// Smallest span covering both `self` and `other`.
    ///
    /// Spans from different sources cannot be joined; `self` is returned.
    #[must_use]
    pub fn to(self, other: Span) -> Span {
        if self.source != other.source {
            return self;
        }
        Span {
            source: self.source,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}..{}", self.source, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: SourceId = SourceId(0);

    #[test]
    fn test_join_and_contains() {
        let a = Span::new(SRC, 2, 5);
        let b = Span::new(SRC, 7, 9);
        let joined = a.to(b);
        assert_eq!(joined, Span::new(SRC, 2, 9));
        assert!(joined.contains(a));
        assert!(joined.contains(b));
        assert!(!a.contains(joined));
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = Span::new(SRC, 0, 4);
        let b = Span::new(SRC, 4, 6);
        assert!(!a.overlaps(b));
        assert!(a.overlaps(Span::new(SRC, 3, 5)));
    }

    #[test]
    fn test_different_sources_never_nest() {
        let a = Span::new(SourceId(0), 0, 10);
        let b = Span::new(SourceId(1), 2, 3);
        assert!(!a.contains(b));
        assert!(!a.overlaps(b));
        assert_eq!(a.to(b), a);
    }

    #[test]
    fn test_source_id_from_usize_saturates() {
        assert_eq!(SourceId::from(7usize), SourceId(7));
        assert_eq!(SourceId::from(u32::MAX as usize), SourceId(u32::MAX));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(SourceId::from(usize::MAX), SourceId(u32::MAX));
    }
}
