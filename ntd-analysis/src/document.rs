//! Cursor positions over host-owned document text
//!
//! The engine never stores a document. Each request hands it the full text and a position; a
//! [`Cursor`] resolves that position to byte offsets once so the classifier can read the prefix
//! up to the cursor and the remainder of the cursor's line.

use crate::normalize::COMMENT_MARKER;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based line and character column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Convert from the 1-based convention most editors display.
    pub fn from_one_based(line: usize, column: usize) -> Self {
        Self::new(line.saturating_sub(1), column.saturating_sub(1))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Character span on a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

/// A position resolved against a text. Out-of-range positions clamp to the nearest offset.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    text: &'a str,
    line: usize,
    column: usize,
    line_start: usize,
    offset: usize,
    line_end: usize,
}

impl<'a> Cursor<'a> {
    pub fn locate(text: &'a str, position: Position) -> Self {
        let mut line = 0;
        let mut line_start = 0;
        while line < position.line {
            match text[line_start..].find('\n') {
                Some(idx) => {
                    line_start += idx + 1;
                    line += 1;
                }
                None => break,
            }
        }

        let mut line_end = text[line_start..]
            .find('\n')
            .map(|idx| line_start + idx)
            .unwrap_or(text.len());
        if text[line_start..line_end].ends_with('\r') {
            line_end -= 1;
        }

        // A position past the last line lands at the end of the document.
        let column = if line < position.line {
            usize::MAX
        } else {
            position.column
        };
        let (offset, column) = match text[line_start..line_end].char_indices().nth(column) {
            Some((idx, _)) => (line_start + idx, column),
            None => (
                line_end,
                text[line_start..line_end].chars().count(),
            ),
        };

        Self {
            text,
            line,
            column,
            line_start,
            offset,
            line_end,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Document text from the start up to the cursor.
    pub fn prefix(&self) -> &'a str {
        &self.text[..self.offset]
    }

    /// The cursor's line, without its line break.
    pub fn line(&self) -> &'a str {
        &self.text[self.line_start..self.line_end]
    }

    pub fn line_before(&self) -> &'a str {
        &self.text[self.line_start..self.offset]
    }

    pub fn line_after(&self) -> &'a str {
        &self.text[self.offset..self.line_end]
    }

    /// The cursor sits inside a line comment.
    pub fn in_comment(&self) -> bool {
        self.line_before().contains(COMMENT_MARKER)
    }

    /// Span of `before` characters left of the cursor and `after` characters right of it.
    pub fn span(&self, before: usize, after: usize) -> LineSpan {
        LineSpan {
            line: self.line,
            start: self.column.saturating_sub(before),
            end: self.column + after,
        }
    }
}
