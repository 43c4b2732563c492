//! Snippet templates for new elements
//!
//! Templates use LSP snippet syntax: every field becomes `name=${i:text}` and fields are joined
//! with `,` in declaration order. Tab-stop indices increase strictly, so one
//! [`TemplateBuilder`] can chain blocks from several kinds (a neuron and its nested functions)
//! into a single snippet.

use crate::grammar::{Container, ElementKind, FieldSpec};
use crate::schema::Registry;

/// Build the field list of one block, numbering tab stops from `start_offset`.
pub fn template(fields: &[FieldSpec], use_defaults: bool, start_offset: usize) -> String {
    TemplateBuilder::new(start_offset, use_defaults).fields(fields)
}

/// Text shown inside a field's placeholder.
pub fn placeholder_text(field: &FieldSpec, use_defaults: bool) -> String {
    if let [only] = field.valid_values {
        return only.to_string();
    }
    if use_defaults {
        if let Some(default) = field.formatted_default() {
            return default;
        }
    }
    field.detail.to_string()
}

/// Escape the characters snippet syntax treats specially.
pub fn escape_placeholder(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '$' | '}' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Hands out tab-stop indices across several blocks.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    next: usize,
    use_defaults: bool,
}

impl TemplateBuilder {
    pub fn new(start_offset: usize, use_defaults: bool) -> Self {
        Self {
            next: start_offset,
            use_defaults,
        }
    }

    /// Index the next placeholder will receive.
    pub fn next_index(&self) -> usize {
        self.next
    }

    pub fn fields(&mut self, fields: &[FieldSpec]) -> String {
        fields
            .iter()
            .map(|field| self.field(field))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn field(&mut self, field: &FieldSpec) -> String {
        let index = self.next;
        self.next += 1;
        let text = escape_placeholder(&placeholder_text(field, self.use_defaults));
        format!("{}=${{{}:{}}}", field.name, index, text)
    }

    /// The element's own fields followed by one `SLOT=(...)` block per function slot.
    ///
    /// Slots are filled with their family's first variant.
    pub fn element(&mut self, registry: &Registry, kind: &ElementKind) -> String {
        let mut parts = vec![self.fields(kind.fields)];
        for slot in kind.function_slots {
            if let Some(variant) = registry.default_kind(Container::Function(*slot)) {
                parts.push(format!("{}=({})", slot.as_str(), self.fields(variant.fields)));
            }
        }
        parts.retain(|part| !part.is_empty());
        parts.join(",")
    }
}
