//! Hover documentation for keys and values
//!
//! The token under the cursor is read from the normalized line: a value (`key=val|ue`) is
//! documented through its key, a key (`ty|p`) through its own name. Section and family codes
//! describe their container. Every other key goes through the classifier, so a name shared by
//! several kinds only resolves when the line carries discriminator evidence.

use crate::classifier::Classifier;
use crate::document::{Cursor, LineSpan, Position};
use crate::grammar::{FamilyCode, SectionCode};
use crate::normalize::normalize;
use crate::EngineOptions;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

static VALUE_AT_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<key>[A-Za-z0-9_]+)=(?P<value>[^,()\[\]=]*)$").unwrap());
static KEY_AT_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\[(,])(?P<head>[A-Za-z0-9_]*)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoverResult {
    pub key: String,
    /// Field detail label, or the container name for section and family codes.
    pub title: String,
    /// Unit values are written in, or the configured dimensionless label.
    pub unit: String,
    pub description: String,
    pub range: LineSpan,
}

impl HoverResult {
    /// Markdown rendering for editor popups.
    pub fn contents(&self) -> String {
        format!(
            "**{}** ({})\n\nUnit: {}\n\n{}",
            self.key, self.title, self.unit, self.description
        )
    }
}

/// The token the cursor is on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    key: String,
    /// Normalized text from the start of the token to the cursor.
    typed: String,
    range: LineSpan,
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn is_value_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, ',' | '(' | ')' | '[' | ']' | '=')
}

fn token_at(cursor: &Cursor<'_>) -> Option<Token> {
    let before = normalize(cursor.line_before());
    let after = cursor.line_after();

    if let Some(caps) = VALUE_AT_END.captures(&before) {
        let value = &caps["value"];
        let trailing = after.chars().take_while(|ch| is_value_char(*ch)).count();
        if !value.is_empty() || trailing > 0 {
            let whole = caps.get(0)?.as_str();
            return Some(Token {
                key: caps["key"].to_string(),
                typed: whole.to_string(),
                range: cursor.span(value.chars().count(), trailing),
            });
        }
    }

    let caps = KEY_AT_END.captures(&before)?;
    let head = &caps["head"];
    let tail: String = after.chars().take_while(|ch| is_key_char(*ch)).collect();
    if head.is_empty() && tail.is_empty() {
        return None;
    }
    Some(Token {
        key: format!("{head}{tail}"),
        typed: head.to_string(),
        range: cursor.span(head.chars().count(), tail.chars().count()),
    })
}

pub(crate) fn hover_at(
    classifier: &Classifier,
    options: &EngineOptions,
    text: &str,
    position: Position,
) -> Option<HoverResult> {
    let cursor = Cursor::locate(text, position);
    if cursor.in_comment() {
        return None;
    }
    let token = token_at(&cursor)?;
    let registry = classifier.registry();

    let container = SectionCode::parse(&token.key)
        .and_then(|code| registry.section(code))
        .map(|section| (section.name, section.description))
        .or_else(|| {
            FamilyCode::parse(&token.key)
                .and_then(|code| registry.family(code))
                .map(|family| (family.name, family.description))
        });
    if let Some((name, description)) = container {
        return Some(HoverResult {
            key: token.key,
            title: name.to_string(),
            unit: options.dimensionless_label.clone(),
            description: description.to_string(),
            range: token.range,
        });
    }

    // Classify at the start of the token so its own text counts as lookahead evidence.
    let prefix = normalize(cursor.prefix());
    let before_token = prefix.strip_suffix(token.typed.as_str()).unwrap_or(&prefix);
    let lookahead = format!("{}{}", token.typed, normalize(cursor.line_after()));
    let Some(context) = classifier.classify(before_token, &lookahead) else {
        debug!(key = %token.key, "hover position has no grammar context");
        return None;
    };
    let (kind, field) = classifier.resolve_field(&context, &token.key)?;
    debug!(key = %token.key, %kind, "hover resolved");

    Some(HoverResult {
        key: token.key,
        title: field.detail.to_string(),
        unit: field
            .unit
            .map(str::to_string)
            .unwrap_or_else(|| options.dimensionless_label.clone()),
        description: field.description.to_string(),
        range: token.range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Registry;
    use std::sync::Arc;

    fn hover(text: &str, line: usize, column: usize) -> Option<HoverResult> {
        let classifier = Classifier::new(Arc::new(Registry::standard())).unwrap();
        hover_at(
            &classifier,
            &EngineOptions::default(),
            text,
            Position::new(line, column),
        )
    }

    #[test]
    fn coordinate_system_uses_the_value_on_the_line() {
        let text = "NRN=[(nid=a,\n  LOC=(cst=cl, rad=5um))]";
        let result = hover(text, 1, 8).unwrap();
        assert_eq!(result.key, "cst");
        assert!(result.description.contains("cylindrical"));
        assert_eq!(
            result.range,
            LineSpan {
                line: 1,
                start: 7,
                end: 10
            }
        );
    }

    #[test]
    fn value_hover_documents_its_key() {
        let text = "NRN=[(nid=a,WDF=(fnc=exp,hlf=12ms))]";
        let result = hover(text, 0, 31).unwrap();
        assert_eq!(result.key, "hlf");
        assert_eq!(result.unit, "ms");
        assert_eq!(result.title, "half-life");
        assert_eq!(result.range.start, 29);
        assert_eq!(result.range.end, 33);

        let selector = hover(text, 0, 22).unwrap();
        assert_eq!(selector.key, "fnc");
        assert!(selector.description.starts_with("Exponential"));
    }

    #[test]
    fn selector_in_scope_picks_the_variant() {
        let text = "NRN=[(nid=a,LOC=(cst=sp,rad=4um))]";
        let result = hover(text, 0, 25).unwrap();
        assert_eq!(result.key, "rad");
        assert_eq!(result.description, "Distance from the origin.");
    }

    #[test]
    fn ambiguous_name_without_evidence_has_no_hover() {
        let text = "NRN=[(nid=a,LOC=(rad=4um))]";
        assert_eq!(hover(text, 0, 18), None);
    }

    #[test]
    fn dimensionless_fields_use_the_label() {
        let text = "CON=[(pre=a,pst=b,wgt=0.2)]";
        let result = hover(text, 0, 19).unwrap();
        assert_eq!(result.key, "wgt");
        assert_eq!(result.unit, "dimensionless");
    }

    #[test]
    fn container_codes_describe_their_container() {
        let result = hover("GRP=[(gid=g1,typ=lcl)]", 0, 1).unwrap();
        assert_eq!(result.title, "groups");
        let result = hover("NRN=[(nid=a,SRP=(fnc=fix))]", 0, 13).unwrap();
        assert_eq!(result.key, "SRP");
        assert_eq!(result.title, "signal release probability");
    }

    #[test]
    fn nothing_under_the_cursor() {
        assert_eq!(hover("GRP=[(gid=g1)]", 0, 5), None);
        assert_eq!(hover("", 0, 0), None);
        assert_eq!(hover("CON=[(zzz=1)]", 0, 7), None);
        assert_eq!(hover("CON=[(pre=a, // wgt", 0, 17), None);
    }

    #[test]
    fn contents_render_as_markdown() {
        let result = hover("CON=[(pre=a,dly=2ms)]", 0, 13).unwrap();
        assert_eq!(
            result.contents(),
            "**dly** (delay)\n\nUnit: ms\n\nTransmission delay between the spike and its arrival."
        );
    }
}
