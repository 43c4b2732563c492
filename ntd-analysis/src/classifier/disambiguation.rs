//! Discriminator-based kind resolution
//!
//! When a container offers several kinds, the value of its selector key decides which one the
//! element under the cursor is. Evidence is consulted in this order:
//!
//! 1. the last `key=` in the current block. A complete value selects by exact match; a value
//!    still being typed is matched exactly, then by unique prefix;
//! 2. `key=` with nothing after it (or `key=,`) falls back to the most recent declaration of
//!    the same container earlier in the section;
//! 3. no `key=` in the block: the first `key=value` on the rest of the cursor's line, clipped
//!    to the current block.
//!
//! Without evidence the candidate set stays ambiguous. Evidence naming no known variant
//! rejects the context outright.

use crate::grammar::{Container, KindId};
use crate::schema::{Observed, Registry};
use regex::Regex;
use tracing::trace;

/// Text around the cursor that may prove which kind an element is.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Evidence<'a> {
    /// Body of the current block, from its opening parenthesis to the cursor.
    pub scope: &'a str,
    /// Normalized remainder of the cursor's line.
    pub lookahead: &'a str,
    /// Section text before the current block.
    pub history: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    Resolved(KindId),
    Ambiguous(Vec<KindId>),
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Assignment<'a> {
    value: &'a str,
    terminated: bool,
}

pub(crate) fn resolve(
    registry: &Registry,
    container: Container,
    evidence: &Evidence<'_>,
    history: Option<&Regex>,
) -> Resolution {
    let kinds = registry.kinds_in(container);
    if let [only] = kinds {
        return Resolution::Resolved(*only);
    }
    let Some(key) = registry.selector_for(container) else {
        return Resolution::Ambiguous(kinds.to_vec());
    };

    let scope = strip_nested(evidence.scope);
    let observed = match last_assignment(&scope, key) {
        Some(assignment) if assignment.value.is_empty() => {
            let declared = history.and_then(|pattern| most_recent(pattern, evidence.history));
            trace!(%container, key, ?declared, "selector left empty, using earlier declaration");
            return match declared.and_then(|value| exact(registry, kinds, value)) {
                Some(id) => Resolution::Resolved(id),
                None => Resolution::Ambiguous(kinds.to_vec()),
            };
        }
        Some(assignment) if assignment.terminated => Observed::Complete(assignment.value),
        Some(assignment) => Observed::Typing(assignment.value),
        None => match first_assignment(clip_block(evidence.lookahead), key) {
            Some(assignment) if !assignment.value.is_empty() => {
                Observed::Complete(assignment.value)
            }
            _ => return Resolution::Ambiguous(kinds.to_vec()),
        },
    };

    trace!(%container, key, ?observed, "selector evidence");
    select(registry, kinds, observed)
}

fn select(registry: &Registry, kinds: &[KindId], observed: Observed<'_>) -> Resolution {
    let value = match observed {
        Observed::Complete(value) | Observed::Typing(value) => value,
    };
    if let Some(id) = exact(registry, kinds, value) {
        return Resolution::Resolved(id);
    }
    let survivors: Vec<KindId> = kinds
        .iter()
        .copied()
        .filter(|id| {
            registry
                .discriminator_for(*id)
                .is_some_and(|discriminator| discriminator.matches(observed))
        })
        .collect();
    match survivors.as_slice() {
        [] => Resolution::Rejected,
        [only] => Resolution::Resolved(*only),
        _ => Resolution::Ambiguous(survivors),
    }
}

fn exact(registry: &Registry, kinds: &[KindId], value: &str) -> Option<KindId> {
    kinds.iter().copied().find(|id| {
        registry
            .discriminator_for(*id)
            .is_some_and(|discriminator| discriminator.matches(Observed::Complete(value)))
    })
}

fn most_recent<'h>(pattern: &Regex, history: &'h str) -> Option<&'h str> {
    pattern
        .captures_iter(history)
        .last()
        .and_then(|caps| caps.name("value"))
        .map(|value| value.as_str())
}

/// Drop complete nested blocks so their keys do not count as the block's own.
fn strip_nested(scope: &str) -> String {
    let mut depth = 0usize;
    let mut flat = String::with_capacity(scope.len());
    for ch in scope.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => flat.push(ch),
            _ => {}
        }
    }
    flat
}

/// Cut the lookahead where the current block ends or a nested one begins.
fn clip_block(lookahead: &str) -> &str {
    match lookahead.find(['(', ')', '[', ']']) {
        Some(end) => &lookahead[..end],
        None => lookahead,
    }
}

fn assignments<'a>(text: &'a str, key: &str) -> impl Iterator<Item = Assignment<'a>> + 'a {
    let needle = format!("{key}=");
    let starts: Vec<usize> = text
        .match_indices(needle.as_str())
        .filter(|(idx, _)| {
            text[..*idx]
                .chars()
                .next_back()
                .map_or(true, |ch| ch == ',' || ch == '(')
        })
        .map(|(idx, _)| idx + needle.len())
        .collect();
    starts.into_iter().map(move |start| {
        let rest = &text[start..];
        match rest.find([',', '(', ')', '[', ']']) {
            Some(end) => Assignment {
                value: &rest[..end],
                terminated: true,
            },
            None => Assignment {
                value: rest,
                terminated: false,
            },
        }
    })
}

fn last_assignment<'a>(text: &'a str, key: &str) -> Option<Assignment<'a>> {
    assignments(text, key).last()
}

fn first_assignment<'a>(text: &'a str, key: &str) -> Option<Assignment<'a>> {
    assignments(text, key).next()
}
