//! Half-open interval arithmetic.

use std::fmt;

/// A half-open interval `[start, end)` over absolute indices.
///
/// Spans with `start >= end` are empty. All empty spans compare equal
/// after normalization through [`Span::new`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    start: u64,
    end: u64,
}

impl Span {
    /// The canonical empty span.
    pub const EMPTY: Span = Span { start: 0, end: 0 };

    /// Create `[start, end)`. An inverted pair yields [`Span::EMPTY`].
    pub fn new(start: u64, end: u64) -> Self {
        if start >= end {
            Self::EMPTY
        } else {
            Self { start, end }
        }
    }

    /// The span covering only `index`.
    pub fn unit(index: u64) -> Self {
        Self::new(index, index + 1)
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of indices covered.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Whether the span covers nothing.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `index` lies inside the span.
    pub fn contains(&self, index: u64) -> bool {
        self.start <= index && index < self.end
    }

    /// Smallest span covering both. Gaps between the two are included.
    pub fn union(&self, other: &Span) -> Span {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Indices covered by both.
    pub fn intersection(&self, other: &Span) -> Span {
        Span::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// Indices in `self` but not in `other`, as up to two contiguous pieces.
    ///
    /// The first piece lies below `other`, the second above it.
    pub fn difference(&self, other: &Span) -> (Option<Span>, Option<Span>) {
        if self.is_empty() {
            return (None, None);
        }
        let overlap = self.intersection(other);
        if overlap.is_empty() {
            return (Some(*self), None);
        }
        let below = Span::new(self.start, overlap.start);
        let above = Span::new(overlap.end, self.end);
        let piece = |s: Span| (!s.is_empty()).then_some(s);
        (piece(below), piece(above))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
