use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A point in a source file. Lines and columns are 1-based, the byte
/// offset is 0-based.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: u32) -> Self {
        Self { line, column, offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open source range carried by every AST node, symbol, diagnostic and
/// IL instruction. Immutable once assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: Option<String>,
    pub start: Position,
    pub end: Position,
}

impl SourceLocation {
    pub fn new(file: Option<String>, start: Position, end: Position) -> Self {
        Self { file, start, end }
    }

    /// Location spanning two existing locations.
    pub fn merge(&self, other: &SourceLocation) -> SourceLocation {
        SourceLocation {
            file: self.file.clone().or_else(|| other.file.clone()),
            start: if self.start.offset <= other.start.offset { self.start } else { other.start },
            end: if self.end.offset >= other.end.offset { self.end } else { other.end },
        }
    }

    /// Ordering key used when sorting diagnostics: file, then line, then column.
    pub fn sort_key(&self) -> (&str, u32, u32) {
        (self.file.as_deref().unwrap_or(""), self.start.line, self.start.column)
    }
}

impl PartialOrd for SourceLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourceLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(name) => write!(f, "{}:{}", name, self.start),
            None => write!(f, "{}", self.start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_takes_outermost_bounds() {
        let a = SourceLocation::new(None, Position::new(1, 1, 0), Position::new(1, 4, 3));
        let b = SourceLocation::new(None, Position::new(1, 6, 5), Position::new(1, 9, 8));
        let m = a.merge(&b);
        assert_eq!(m.start.offset, 0);
        assert_eq!(m.end.offset, 8);
    }

    #[test]
    fn ordering_is_file_then_line_then_column() {
        let a = SourceLocation::new(Some("a.b65".into()), Position::new(2, 1, 10), Position::new(2, 2, 11));
        let b = SourceLocation::new(Some("a.b65".into()), Position::new(2, 5, 14), Position::new(2, 6, 15));
        let c = SourceLocation::new(Some("b.b65".into()), Position::new(1, 1, 0), Position::new(1, 2, 1));
        assert!(a < b);
        assert!(b < c);
    }
}
