use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into a source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Offset of the first byte.
    pub start: u32,
    /// Offset one past the last byte.
    pub end: u32,
}

impl Span {
    /// Create a span from two byte offsets.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// The smallest span covering both `self` and `other`.
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A `file:line` position used in diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File name as given to the front-end.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A named source text with a precomputed line index.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    text: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// Create a source file and index its line starts.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i as u32 + 1),
        );
        Self {
            name: name.into(),
            text,
            line_starts,
        }
    }

    /// The file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-based line containing the byte at `offset`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn line_of(&self, offset: u32) -> u32 {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx as u32 + 1,
            Err(idx) => idx as u32,
        }
    }

    /// Location of the start of `span`.
    pub fn location(&self, span: Span) -> Location {
        Location::new(self.name.clone(), self.line_of(span.start))
    }

    /// The source text covered by `span`.
    pub fn snippet(&self, span: Span) -> &str {
        self.text
            .get(span.start as usize..span.end as usize)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_lookup() {
        let file = SourceFile::new("a.go", "one\ntwo\n\nfour");
        assert_eq!(file.line_of(0), 1);
        assert_eq!(file.line_of(3), 1);
        assert_eq!(file.line_of(4), 2);
        assert_eq!(file.line_of(8), 3);
        assert_eq!(file.line_of(9), 4);
    }

    #[test]
    fn location_display() {
        let file = SourceFile::new("input.go", "x\ny := 1");
        let loc = file.location(Span::new(2, 8));
        assert_eq!(loc.to_string(), "input.go:2");
        assert_eq!(file.snippet(Span::new(2, 8)), "y := 1");
    }

    #[test]
    fn span_union() {
        let s = Span::new(4, 6).to(Span::new(1, 5));
        assert_eq!(s, Span::new(1, 6));
    }
}
