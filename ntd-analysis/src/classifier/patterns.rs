//! Suffix pattern battery
//!
//! Patterns are anchored at the end of the normalized prefix, so they match input that stops
//! mid-element, mid-key or mid-value. For every section the battery holds, in this order:
//!
//! 1. function value  - `SEC=[...(...,FAM=(...,key=val`   (sections with function slots only)
//! 2. function field  - `SEC=[...(...,FAM=(...`           (sections with function slots only)
//! 3. function open   - `SEC=[...(...,FAM=`               (sections with function slots only)
//! 4. field value     - `SEC=[...(...,key=val`
//! 5. field           - `SEC=[...(...`
//! 6. new element     - `SEC=[(...),(...),`
//!
//! The first match wins. "Inside an element" and "after an element" exclude each other by
//! construction: the inside patterns need an unclosed `(` whose body holds no parenthesis
//! other than complete nested function blocks, and the new-element pattern needs every
//! element of the list closed.
//!
//! A separate document pattern recognises the boundary after a closed section, or an empty
//! document.

use crate::error::EngineError;
use crate::grammar::{Container, SectionCode};
use crate::schema::Registry;
use regex::Regex;
use std::collections::HashMap;

/// Element body without nested blocks.
const BODY: &str = r"[^()\[\]]*";
const ELEMENT: &str = r"\([^()\[\]]*\)";
/// Element body that may contain complete nested function blocks.
const NESTED_BODY: &str = r"(?:[^()\[\]]|\([^()\[\]]*\))*";
const NESTED_ELEMENT: &str = r"\((?:[^()\[\]]|\([^()\[\]]*\))*\)";
const KEY: &str = r"[A-Za-z0-9_]+";
const VALUE: &str = r"[^,()\[\]=]*";
const COMPLETE_VALUE: &str = r"[^,()\[\]=]+";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PatternRole {
    FunctionValue,
    FunctionField,
    FunctionOpen,
    FieldValue,
    Field,
    NewElement,
}

#[derive(Debug)]
pub(crate) struct SuffixPattern {
    pub name: String,
    pub section: SectionCode,
    pub role: PatternRole,
    pub regex: Regex,
}

#[derive(Debug)]
pub(crate) struct SuffixPatterns {
    sections: Vec<SuffixPattern>,
    document: Regex,
    history: HashMap<Container, Regex>,
    longest_code: usize,
}

impl SuffixPatterns {
    pub fn compile(registry: &Registry) -> Result<Self, EngineError> {
        let mut sections = Vec::new();
        let mut history = HashMap::new();

        for section in registry.sections() {
            let code = regex::escape(section.code.as_str());
            let mut families: Vec<&str> = Vec::new();
            for kind in section.kinds {
                for slot in kind.function_slots {
                    if !families.contains(&slot.as_str()) {
                        families.push(slot.as_str());
                    }
                }
            }
            let nested = !families.is_empty();
            let (body, element) = if nested {
                (NESTED_BODY, NESTED_ELEMENT)
            } else {
                (BODY, ELEMENT)
            };
            let list = format!(r"{code}=\[(?:{element},?)*");

            let mut table: Vec<(PatternRole, String)> = Vec::new();
            if nested {
                let slots = families
                    .iter()
                    .map(|family| regex::escape(family))
                    .collect::<Vec<_>>()
                    .join("|");
                table.push((
                    PatternRole::FunctionValue,
                    format!(
                        r"{list}\((?:{body},)?(?P<function>{slots})=\((?P<scope>(?:{BODY},)?(?P<key>{KEY})=(?P<value>{VALUE}))$"
                    ),
                ));
                table.push((
                    PatternRole::FunctionField,
                    format!(
                        r"{list}\((?:{body},)?(?P<function>{slots})=\((?P<scope>{BODY})$"
                    ),
                ));
                table.push((
                    PatternRole::FunctionOpen,
                    format!(r"{list}\((?:{body},)?(?P<function>{slots})=$"),
                ));
            }
            table.push((
                PatternRole::FieldValue,
                format!(r"{list}\((?P<scope>(?:{body},)?(?P<key>{KEY})=(?P<value>{VALUE}))$"),
            ));
            table.push((PatternRole::Field, format!(r"{list}\((?P<scope>{body})$")));
            table.push((PatternRole::NewElement, format!(r"{list}$")));

            for (role, source) in table {
                let name = format!("{}.{}", section.code.as_str(), role_name(role));
                sections.push(SuffixPattern {
                    regex: compile(&name, &source)?,
                    name,
                    section: section.code,
                    role,
                });
            }

            let container = Container::Section(section.code);
            if let Some(key) = registry.selector_for(container) {
                let key = regex::escape(key);
                let name = format!("{}.history", section.code.as_str());
                let source = format!(r"(?:\[|,|\))\((?:{body},)?{key}=(?P<value>{COMPLETE_VALUE})");
                history.insert(container, compile(&name, &source)?);
            }
        }

        for family in registry.families() {
            let container = Container::Function(family.code);
            if let Some(key) = registry.selector_for(container) {
                let code = regex::escape(family.code.as_str());
                let key = regex::escape(key);
                let name = format!("{}.history", family.code.as_str());
                let source = format!(r"{code}=\((?:{BODY},)?{key}=(?P<value>{COMPLETE_VALUE})");
                history.insert(container, compile(&name, &source)?);
            }
        }

        let codes = registry
            .sections()
            .iter()
            .map(|section| regex::escape(section.code.as_str()))
            .collect::<Vec<_>>()
            .join("|");
        let document = compile(
            "document",
            &format!(r"(?:^|(?:{codes})=\[(?:{NESTED_ELEMENT},?)*\],?)(?P<partial>[A-Za-z0-9_]*)$"),
        )?;
        let longest_code = registry
            .sections()
            .iter()
            .map(|section| section.code.as_str().len())
            .max()
            .unwrap_or(0);

        Ok(Self {
            sections,
            document,
            history,
            longest_code,
        })
    }

    /// Section patterns in match order.
    pub fn sections(&self) -> &[SuffixPattern] {
        &self.sections
    }

    pub fn document(&self) -> &Regex {
        &self.document
    }

    /// Pattern finding earlier `key=value` declarations for a container's selector.
    pub fn history(&self, container: Container) -> Option<&Regex> {
        self.history.get(&container)
    }

    /// The part of `prefix` starting at the innermost section opening.
    ///
    /// Section lists are the only bracketed constructs, so the last `[` opens the section the
    /// cursor may be in. Scanning only that tail keeps matching cost independent of how many
    /// sections precede the cursor.
    pub fn section_tail<'t>(&self, prefix: &'t str) -> &'t str {
        let Some(bracket) = prefix.rfind('[') else {
            return prefix;
        };
        let mut start = bracket.saturating_sub(self.longest_code + 1);
        while !prefix.is_char_boundary(start) {
            start -= 1;
        }
        &prefix[start..]
    }
}

fn role_name(role: PatternRole) -> &'static str {
    match role {
        PatternRole::FunctionValue => "function_value",
        PatternRole::FunctionField => "function_field",
        PatternRole::FunctionOpen => "function_open",
        PatternRole::FieldValue => "field_value",
        PatternRole::Field => "field",
        PatternRole::NewElement => "new_element",
    }
}

fn compile(name: &str, source: &str) -> Result<Regex, EngineError> {
    Regex::new(source).map_err(|source| EngineError::Pattern {
        name: name.to_string(),
        source,
    })
}
