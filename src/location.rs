use std::fmt;
use std::sync::Arc;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Location {
    // Shared by every token of a file
    pub filename: Arc<String>,
    pub line: usize,
    pub col: usize,
}

// Debug prints the same short form as Display
impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.col)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.col)
    }
}

impl Default for Location {
    fn default() -> Self {
        Location {
            filename: Arc::new("?".to_string()),
            line: 1,
            col: 1,
        }
    }
}

// Span represents a range in the source text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub fn from_locations(start: Location, end: Location) -> Self {
        Span { start, end }
    }

    // Span covering a single location (e.g. a one-char token)
    pub fn single(loc: Location) -> Self {
        let mut end_loc = loc.clone();
        end_loc.col += 1;
        Span {
            start: loc,
            end: end_loc,
        }
    }
}

// Only the start location is shown in diagnostics
impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.start.filename, self.start.line, self.start.col
        )
    }
}
