//! Position and span types for source locations.

use serde::{Deserialize, Serialize};

/// A position in a template source file.
///
/// Both `line` and `column` are 1-indexed. A zero line means the position is
/// unknown, which only happens for findings that cannot be tied to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed)
    pub column: u32,
}

impl Location {
    /// The unknown location (`0:0`).
    pub const UNKNOWN: Self = Self { line: 0, column: 0 };

    /// Create a new location.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Returns `true` if this location points at a real source position.
    #[must_use]
    pub const fn is_known(self) -> bool {
        self.line > 0
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.line.cmp(&other.line) {
            std::cmp::Ordering::Equal => self.column.cmp(&other.column),
            ord => ord,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source span of a node, from `start` (inclusive) to `end` (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start location (inclusive)
    pub start: Location,
    /// End location (exclusive)
    pub end: Location,
}

impl Span {
    /// Create a new span.
    #[must_use]
    pub const fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// Create a zero-width span at a location.
    #[must_use]
    pub const fn at(location: Location) -> Self {
        Self {
            start: location,
            end: location,
        }
    }

    /// Check if this span contains a location.
    ///
    /// A zero-width span contains only its own start.
    #[must_use]
    pub fn contains(&self, location: Location) -> bool {
        if self.start == self.end {
            return location == self.start;
        }
        location >= self.start && location < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_ordering() {
        let l1 = Location::new(1, 5);
        let l2 = Location::new(1, 10);
        let l3 = Location::new(2, 1);

        assert!(l1 < l2);
        assert!(l2 < l3);
        assert_eq!(l1.cmp(&l1), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_location_unknown() {
        assert!(!Location::UNKNOWN.is_known());
        assert!(Location::new(3, 1).is_known());
        assert_eq!(Location::default(), Location::UNKNOWN);
    }

    #[test]
    fn test_location_display() {
        assert_eq!(format!("{}", Location::new(4, 7)), "4:7");
    }

    #[test]
    fn test_span_contains() {
        let span = Span::new(Location::new(2, 3), Location::new(4, 1));
        assert!(span.contains(Location::new(2, 3)));
        assert!(span.contains(Location::new(3, 80)));
        assert!(!span.contains(Location::new(4, 1)));
        assert!(!span.contains(Location::new(1, 9)));
    }

    #[test]
    fn test_zero_width_span() {
        let span = Span::at(Location::new(5, 2));
        assert!(span.contains(Location::new(5, 2)));
        assert!(!span.contains(Location::new(5, 3)));
    }
}
