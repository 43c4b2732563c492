use crate::classifier::{Boundary, Classifier, ResolvedContext};
use crate::grammar::{Container, ElementKind, FieldSpec};
use crate::schema::Registry;
use crate::template::{escape_placeholder, TemplateBuilder};
use crate::{EngineOptions, TemplateStyle};
use lsp_types::CompletionItemKind;
use serde::Serialize;

/// Characters that make an editor ask for completions on its own.
pub const TRIGGER_CHARACTERS: [char; 3] = ['=', ',', '('];

/// How a completion request was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerKind {
    /// Explicit request, e.g. Ctrl+Space.
    #[default]
    Invoked,
    /// Typing one of [`TRIGGER_CHARACTERS`].
    Character(char),
}

impl TriggerKind {
    /// A character trigger is stale unless it is the last character before the cursor.
    pub fn is_current(self, normalized_prefix: &str) -> bool {
        match self {
            Self::Invoked => true,
            Self::Character(ch) => normalized_prefix.ends_with(ch),
        }
    }
}

/// Describes a semantic completion candidate that can be translated into protocol specific items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionCandidate {
    pub label: String,
    pub detail: Option<String>,
    #[serde(serialize_with = "serialize_kind")]
    pub kind: CompletionItemKind,
    pub insert_text: Option<String>,
    pub documentation: Option<String>,
    /// `insert_text` uses snippet syntax.
    pub snippet: bool,
}

impl CompletionCandidate {
    fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            detail: None,
            kind,
            insert_text: None,
            documentation: None,
            snippet: false,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn with_insert_text(mut self, text: impl Into<String>) -> Self {
        self.insert_text = Some(text.into());
        self
    }

    fn with_snippet(mut self, text: impl Into<String>) -> Self {
        self.insert_text = Some(text.into());
        self.snippet = true;
        self
    }

    fn with_documentation(mut self, text: impl Into<String>) -> Self {
        self.documentation = Some(text.into());
        self
    }

    /// Text the editor inserts when the candidate is accepted.
    pub fn text(&self) -> &str {
        self.insert_text.as_deref().unwrap_or(&self.label)
    }
}

fn serialize_kind<S: serde::Serializer>(
    kind: &CompletionItemKind,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(kind_name(*kind))
}

fn kind_name(kind: CompletionItemKind) -> &'static str {
    match kind {
        CompletionItemKind::MODULE => "module",
        CompletionItemKind::SNIPPET => "snippet",
        CompletionItemKind::FIELD => "field",
        CompletionItemKind::VALUE => "value",
        CompletionItemKind::ENUM_MEMBER => "enum-member",
        CompletionItemKind::PROPERTY => "property",
        _ => "text",
    }
}

/// Produce completion candidates for a classified cursor.
pub(crate) fn completion_items(
    classifier: &Classifier,
    options: &EngineOptions,
    context: &ResolvedContext,
) -> Vec<CompletionCandidate> {
    let completer = Completer {
        classifier,
        registry: classifier.registry(),
        options,
        context,
    };
    match (context.container, context.boundary) {
        (None, _) => completer.sections(),
        (Some(container), Boundary::NewElement) => completer.elements(container),
        (Some(_), Boundary::FieldBoundary | Boundary::InsideElement) => completer.fields(),
        (Some(container), Boundary::NewFieldValue) => completer.values(container),
    }
}

struct Completer<'a> {
    classifier: &'a Classifier,
    registry: &'a Registry,
    options: &'a EngineOptions,
    context: &'a ResolvedContext,
}

impl Completer<'_> {
    fn separator(&self) -> &'static str {
        if self.context.needs_separator {
            ","
        } else {
            ""
        }
    }

    fn sections(&self) -> Vec<CompletionCandidate> {
        self.registry
            .sections()
            .iter()
            .map(|section| {
                let code = section.code.as_str();
                CompletionCandidate::new(code, CompletionItemKind::MODULE)
                    .with_detail(section.name)
                    .with_documentation(section.description)
                    .with_snippet(format!("{}{code}=[$0]", self.separator()))
            })
            .collect()
    }

    /// Whole-element templates, one pair per legal kind.
    fn elements(&self, container: Container) -> Vec<CompletionCandidate> {
        let separator = match container {
            Container::Section(_) => self.separator(),
            Container::Function(_) => "",
        };
        let styles: &[bool] = match self.options.templates {
            TemplateStyle::Both => &[false, true],
            TemplateStyle::Placeholders => &[false],
            TemplateStyle::Defaults => &[true],
        };

        let mut items = Vec::new();
        for kind in self.candidate_kinds() {
            for &use_defaults in styles {
                let body = TemplateBuilder::new(1, use_defaults).element(self.registry, kind);
                let label = if use_defaults {
                    format!("{} (defaults)", kind.name)
                } else {
                    kind.name.to_string()
                };
                items.push(
                    CompletionCandidate::new(label, CompletionItemKind::SNIPPET)
                        .with_detail(format!("{} element", container.code()))
                        .with_documentation(kind.description)
                        .with_snippet(format!("{separator}({body})")),
                );
            }
        }
        items
    }

    fn fields(&self) -> Vec<CompletionCandidate> {
        let kinds = self.candidate_kinds();
        let kind = match kinds.as_slice() {
            [] => return Vec::new(),
            [kind] => *kind,
            _ => return self.selector_assignments(&kinds),
        };

        let separator = self.separator();
        let mut items: Vec<_> = kind
            .fields
            .iter()
            .flat_map(|field| self.field_items(field))
            .collect();
        for slot in kind.function_slots {
            let Some(variant) = self.registry.default_kind(Container::Function(*slot)) else {
                continue;
            };
            let use_defaults = self.options.templates == TemplateStyle::Defaults;
            let body = TemplateBuilder::new(1, use_defaults).fields(variant.fields);
            let family = self.registry.family(*slot);
            let mut item = CompletionCandidate::new(slot.as_str(), CompletionItemKind::MODULE)
                .with_snippet(format!("{}=({body})", slot.as_str()));
            if let Some(family) = family {
                item = item
                    .with_detail(family.name)
                    .with_documentation(family.description);
            }
            items.push(item);
        }

        if !separator.is_empty() {
            for item in &mut items {
                let text = format!("{separator}{}", item.text());
                item.insert_text = Some(text);
            }
        }
        items
    }

    /// `key=value` for every variant when the kind is still open.
    fn selector_assignments(&self, kinds: &[&'static ElementKind]) -> Vec<CompletionCandidate> {
        let separator = self.separator();
        kinds
            .iter()
            .filter_map(|kind| kind.discriminator.map(|discriminator| (kind, discriminator)))
            .map(|(kind, discriminator)| {
                let text = format!("{}={}", discriminator.key, discriminator.value);
                CompletionCandidate::new(&text, CompletionItemKind::ENUM_MEMBER)
                    .with_detail(kind.name)
                    .with_documentation(kind.description)
                    .with_insert_text(format!("{separator}{text}"))
            })
            .collect()
    }

    /// `name=value` items for one field.
    fn field_items(&self, field: &FieldSpec) -> Vec<CompletionCandidate> {
        if !field.valid_values.is_empty() {
            return field
                .valid_values
                .iter()
                .map(|value| {
                    let text = format!("{}={}", field.name, self.render(field, value));
                    CompletionCandidate::new(text, CompletionItemKind::ENUM_MEMBER)
                        .with_detail(field.detail)
                        .with_documentation(field.description)
                })
                .collect();
        }
        let item = match field.default_value {
            Some(default) => CompletionCandidate::new(
                format!("{}={}", field.name, self.render(field, default)),
                CompletionItemKind::VALUE,
            ),
            None => CompletionCandidate::new(format!("{}=", field.name), CompletionItemKind::FIELD),
        };
        vec![item
            .with_detail(field.detail)
            .with_documentation(field.description)]
    }

    fn values(&self, container: Container) -> Vec<CompletionCandidate> {
        let Some(key) = self.context.field.as_deref() else {
            return Vec::new();
        };

        let kinds = self.registry.kinds_in(container);
        if kinds.len() > 1 && self.registry.selector_for(container) == Some(key) {
            return kinds
                .iter()
                .filter_map(|id| self.registry.kind(*id))
                .filter_map(|kind| kind.discriminator.map(|discriminator| (kind, discriminator)))
                .map(|(kind, discriminator)| {
                    CompletionCandidate::new(discriminator.value, CompletionItemKind::ENUM_MEMBER)
                        .with_detail(kind.name)
                        .with_documentation(kind.description)
                })
                .collect();
        }

        let Some((_, field)) = self.classifier.resolve_field(self.context, key) else {
            return Vec::new();
        };
        if !field.valid_values.is_empty() {
            return field
                .valid_values
                .iter()
                .map(|value| {
                    CompletionCandidate::new(self.render(field, value), CompletionItemKind::ENUM_MEMBER)
                        .with_detail(field.detail)
                        .with_documentation(field.description)
                })
                .collect();
        }
        let item = match field.default_value {
            Some(default) => {
                CompletionCandidate::new(self.render(field, default), CompletionItemKind::VALUE)
            }
            None => CompletionCandidate::new(field.name, CompletionItemKind::PROPERTY)
                .with_snippet(format!("${{1:{}}}", escape_placeholder(field.detail))),
        };
        vec![item
            .with_detail(field.detail)
            .with_documentation(field.description)]
    }

    fn render(&self, field: &FieldSpec, value: &str) -> String {
        if self.options.append_units {
            field.format_value(value)
        } else {
            value.to_string()
        }
    }

    fn candidate_kinds(&self) -> Vec<&'static ElementKind> {
        self.context
            .candidates
            .iter()
            .filter_map(|id| self.registry.kind(*id))
            .collect()
    }
}
