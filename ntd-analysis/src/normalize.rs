//! Text normalization
//!
//! Every pattern in the classifier and hover engine runs against normalized text: the source
//! with line comments and all whitespace removed. `thr = 1.0mV` and `thr=1.0mV` therefore
//! look the same to the matchers, and a field split across lines reads as one token.
//!
//! A comment runs from `//` through the end of its line, line break included. A comment on the
//! last line with no line break after it is left in place; hosts rely on that behaviour when
//! the cursor sits inside a trailing comment, so it is kept as is.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::ops::Deref;

/// Marker that opens a line comment.
pub const COMMENT_MARKER: &str = "//";

static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//[^\n]*\n").unwrap());

/// Text with comments and whitespace stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for NormalizedText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip line comments, then every whitespace character.
pub fn normalize(text: &str) -> NormalizedText {
    let without_comments = LINE_COMMENT.replace_all(text, "");
    NormalizedText(
        without_comments
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_line_normalizes_to_empty() {
        assert_eq!(normalize("// comment\n").as_str(), "");
        assert_eq!(normalize("  // indented comment\r\n").as_str(), "");
    }

    #[test]
    fn trailing_comment_without_line_break_is_kept() {
        assert_eq!(normalize("// still typing").as_str(), "//stilltyping");
        assert_eq!(
            normalize("NRN=[(nid=a, // note").as_str(),
            "NRN=[(nid=a,//note"
        );
    }

    #[test]
    fn whitespace_is_removed_everywhere() {
        assert_eq!(normalize("thr = 1.0 mV").as_str(), "thr=1.0mV");
        assert_eq!(
            normalize("GRP=[\n\t(gid=g1,\n  typ=lcl)\n]").as_str(),
            "GRP=[(gid=g1,typ=lcl)]"
        );
    }

    #[test]
    fn comments_inside_elements_are_stripped() {
        let source = "NRN=[(nid=in-1, // first neuron\n grp=g1)]";
        assert_eq!(normalize(source).as_str(), "NRN=[(nid=in-1,grp=g1)]");
    }

    #[test]
    fn normalization_is_idempotent_on_quirky_input() {
        for source in ["a / /b\nc", "x// y", "//\n//\n", "p = q // r\n s"] {
            let once = normalize(source);
            assert_eq!(normalize(&once), once, "input: {source:?}");
        }
    }
}
