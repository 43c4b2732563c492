//! Context classification
//!
//! Maps the normalized prefix of a document to the grammar location of the cursor without
//! parsing the document. The prefix is incomplete at every keystroke, so the classifier works
//! from the end of the text backwards with anchored suffix patterns (see [`patterns`]) and
//! settles ambiguous element kinds from discriminator evidence (see [`disambiguation`]).
//!
//! Completion and hover depend only on [`Classifier::classify`] and
//! [`Classifier::resolve_field`]; the matching strategy behind them can change freely.

mod disambiguation;
mod patterns;

use crate::error::EngineError;
use crate::grammar::{Container, FamilyCode, FieldSpec, KindId};
use crate::schema::Registry;
use disambiguation::{Evidence, Resolution};
use patterns::{PatternRole, SuffixPattern, SuffixPatterns};
use regex::Captures;
use std::sync::Arc;
use tracing::{debug, trace};

/// Where the cursor sits relative to elements and fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// A new element (or section) can start here.
    NewElement,
    /// Inside an element, part-way through typing a key.
    InsideElement,
    /// Right after `key=` or inside a value.
    NewFieldValue,
    /// Right after an element opened or a field ended.
    FieldBoundary,
}

/// Grammar location of a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    /// Section list or function block holding the cursor; `None` between sections.
    pub container: Option<Container>,
    pub boundary: Boundary,
    /// The element kind, once disambiguation settled it.
    pub kind: Option<KindId>,
    /// Kinds still possible at this location.
    pub candidates: Vec<KindId>,
    /// Key whose value is being entered.
    pub field: Option<String>,
    /// Key or value fragment typed before the cursor.
    pub partial: String,
    /// Inserted text must start with a separator (the text ends with a closing bracket).
    pub needs_separator: bool,
}

impl ResolvedContext {
    fn new(container: Option<Container>, boundary: Boundary, resolution: Resolution) -> Self {
        let (kind, candidates) = match resolution {
            Resolution::Resolved(id) => (Some(id), vec![id]),
            Resolution::Ambiguous(candidates) => (None, candidates),
            Resolution::Rejected => (None, Vec::new()),
        };
        Self {
            container,
            boundary,
            kind,
            candidates,
            field: None,
            partial: String::new(),
            needs_separator: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.kind.is_some()
    }
}

pub struct Classifier {
    registry: Arc<Registry>,
    patterns: SuffixPatterns,
}

impl Classifier {
    pub fn new(registry: Arc<Registry>) -> Result<Self, EngineError> {
        let patterns = SuffixPatterns::compile(&registry)?;
        Ok(Self { registry, patterns })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Classify the cursor at the end of `prefix`.
    ///
    /// `prefix` is the normalized document up to the cursor and `lookahead` the normalized rest
    /// of the cursor's line, consulted only when the prefix holds no discriminator evidence.
    /// `None` means no grammar location fits, or the evidence names no known variant.
    pub fn classify(&self, prefix: &str, lookahead: &str) -> Option<ResolvedContext> {
        let tail = self.patterns.section_tail(prefix);
        for pattern in self.patterns.sections() {
            if let Some(caps) = pattern.regex.captures(tail) {
                trace!(pattern = %pattern.name, "suffix pattern matched");
                return self.from_section_match(pattern, &caps, tail, lookahead);
            }
        }

        let caps = self.patterns.document().captures(tail)?;
        trace!("document boundary matched");
        let mut context = ResolvedContext::new(None, Boundary::NewElement, Resolution::Rejected);
        context.partial = caps["partial"].to_string();
        context.needs_separator = prefix.ends_with(']');
        Some(context)
    }

    fn from_section_match(
        &self,
        pattern: &SuffixPattern,
        caps: &Captures<'_>,
        tail: &str,
        lookahead: &str,
    ) -> Option<ResolvedContext> {
        let section = Container::Section(pattern.section);
        let container = match caps.name("function") {
            Some(function) => Container::Function(FamilyCode::parse(function.as_str())?),
            None => section,
        };

        let context = match pattern.role {
            PatternRole::NewElement => {
                let mut context = ResolvedContext::new(
                    Some(container),
                    Boundary::NewElement,
                    self.all_kinds(container),
                );
                context.needs_separator = tail.ends_with(')');
                context
            }
            PatternRole::FunctionOpen => ResolvedContext::new(
                Some(container),
                Boundary::NewElement,
                self.all_kinds(container),
            ),
            PatternRole::FieldValue | PatternRole::FunctionValue => {
                let scope = caps.name("scope")?;
                let history = &tail[..scope.start()];
                let resolution = self.disambiguate(container, scope.as_str(), lookahead, history);
                let mut context =
                    ResolvedContext::new(Some(container), Boundary::NewFieldValue, resolution);
                context.field = Some(caps["key"].to_string());
                context.partial = caps["value"].to_string();
                context
            }
            PatternRole::Field | PatternRole::FunctionField => {
                let scope = caps.name("scope")?;
                let body = scope.as_str();
                let history = &tail[..scope.start()];
                let resolution = self.disambiguate(container, body, lookahead, history);
                let partial = body.rsplit(',').next().unwrap_or_default();
                let boundary = if partial.is_empty() || partial.ends_with(')') {
                    Boundary::FieldBoundary
                } else {
                    Boundary::InsideElement
                };
                let mut context = ResolvedContext::new(Some(container), boundary, resolution);
                if boundary == Boundary::InsideElement {
                    context.partial = partial.to_string();
                }
                context.needs_separator = body.ends_with(')');
                context
            }
        };

        if context.candidates.is_empty() {
            debug!(%container, "discriminator names no known variant");
            return None;
        }
        Some(context)
    }

    fn all_kinds(&self, container: Container) -> Resolution {
        match self.registry.kinds_in(container) {
            [only] => Resolution::Resolved(*only),
            kinds => Resolution::Ambiguous(kinds.to_vec()),
        }
    }

    fn disambiguate(
        &self,
        container: Container,
        scope: &str,
        lookahead: &str,
        history: &str,
    ) -> Resolution {
        let evidence = Evidence {
            scope,
            lookahead,
            history,
        };
        disambiguation::resolve(
            &self.registry,
            container,
            &evidence,
            self.patterns.history(container),
        )
    }

    /// The single field spec `name` refers to in `context`.
    ///
    /// A resolved kind answers directly, even when the name exists only in a sibling kind.
    /// Otherwise the name must belong to exactly one candidate.
    pub fn resolve_field(
        &self,
        context: &ResolvedContext,
        name: &str,
    ) -> Option<(KindId, &'static FieldSpec)> {
        if let Some(id) = context.kind {
            return self.registry.kind(id)?.field(name).map(|field| (id, field));
        }
        let mut matches = self.registry.field_specs_among(name, &context.candidates);
        let found = matches.next()?;
        if matches.next().is_some() {
            debug!(field = name, "field name is ambiguous without discriminator evidence");
            return None;
        }
        Some(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SectionCode;
    use crate::normalize::normalize;

    fn classifier() -> Classifier {
        Classifier::new(Arc::new(Registry::standard())).unwrap()
    }

    fn classify(source: &str) -> Option<ResolvedContext> {
        classifier().classify(&normalize(source), "")
    }

    #[test]
    fn empty_document_starts_a_section() {
        let context = classify("").unwrap();
        assert_eq!(context.container, None);
        assert_eq!(context.boundary, Boundary::NewElement);
        assert!(!context.needs_separator);
    }

    #[test]
    fn after_a_closed_section() {
        let context = classify("GRP=[(gid=g1,typ=lcl)]").unwrap();
        assert_eq!(context.container, None);
        assert!(context.needs_separator);

        let context = classify("GRP=[(gid=g1,typ=lcl)],\nNR").unwrap();
        assert_eq!(context.partial, "NR");
        assert!(!context.needs_separator);
    }

    #[test]
    fn inside_a_neuron_element() {
        let context = classify("NRN=[\n  (nid=in-1,").unwrap();
        assert_eq!(context.container, Some(Container::Section(SectionCode::Nrn)));
        assert_eq!(context.boundary, Boundary::FieldBoundary);
        assert_eq!(
            context.kind,
            Some(KindId::section(SectionCode::Nrn, "neuron"))
        );
    }

    #[test]
    fn typing_a_key() {
        let context = classify("CON=[(pre=a,ws").unwrap();
        assert_eq!(context.boundary, Boundary::InsideElement);
        assert_eq!(context.partial, "ws");
    }

    #[test]
    fn typing_a_value() {
        let context = classify("CON=[(pre=a, dly = 3").unwrap();
        assert_eq!(context.boundary, Boundary::NewFieldValue);
        assert_eq!(context.field.as_deref(), Some("dly"));
        assert_eq!(context.partial, "3");
    }

    #[test]
    fn closed_element_needs_a_separator() {
        let context = classify("CON=[(pre=a,pst=b)").unwrap();
        assert_eq!(context.boundary, Boundary::NewElement);
        assert!(context.needs_separator);
        let context = classify("CON=[(pre=a,pst=b),").unwrap();
        assert!(!context.needs_separator);
    }

    #[test]
    fn function_block_resolves_its_variant() {
        let context = classify("NRN=[(nid=a,WDF=(fnc=exp,").unwrap();
        assert_eq!(context.container, Some(Container::Function(FamilyCode::Wdf)));
        assert_eq!(context.kind, Some(KindId::function(FamilyCode::Wdf, "exp")));
        assert_eq!(context.boundary, Boundary::FieldBoundary);
    }

    #[test]
    fn function_slot_value_opens_a_function() {
        let context = classify("NRN=[(nid=a,SRP=").unwrap();
        assert_eq!(context.container, Some(Container::Function(FamilyCode::Srp)));
        assert_eq!(context.boundary, Boundary::NewElement);
        assert_eq!(context.candidates.len(), 2);
    }

    #[test]
    fn after_a_nested_function_inside_the_neuron() {
        let context = classify("NRN=[(nid=a,WDF=(fnc=zer)").unwrap();
        assert_eq!(context.container, Some(Container::Section(SectionCode::Nrn)));
        assert_eq!(context.boundary, Boundary::FieldBoundary);
        assert!(context.needs_separator);
    }

    #[test]
    fn unknown_variant_yields_no_context() {
        assert!(classify("NRN=[(nid=a,WDF=(fnc=sigmoid,").is_none());
    }

    #[test]
    fn garbage_yields_no_context() {
        assert!(classify("hello world=").is_none());
        assert!(classify("GRP=[(gid=g1)]]]x(").is_none());
    }

    #[test]
    fn whitespace_does_not_change_the_result() {
        let compact = classify("LRN=[(lid=l1,fnc=flat,");
        let spread = classify("LRN = [\n  ( lid = l1 ,\n    fnc = flat ,\n");
        assert_eq!(compact, spread);
        assert!(compact.is_some());
    }

    #[test]
    fn resolve_field_uses_the_resolved_kind() {
        let classifier = classifier();
        let context = classifier
            .classify("NRN=[(nid=a,WDF=(fnc=zer,", "")
            .unwrap();
        assert!(classifier.resolve_field(&context, "hlf").is_none());
        let (kind, field) = classifier.resolve_field(&context, "fnc").unwrap();
        assert_eq!(kind, KindId::function(FamilyCode::Wdf, "zer"));
        assert_eq!(field.valid_values, &["zer"]);
    }

    #[test]
    fn resolve_field_without_evidence() {
        let classifier = classifier();
        let context = classifier.classify("NRN=[(nid=a,LOC=(", "").unwrap();
        assert!(!context.is_resolved());
        assert!(classifier.resolve_field(&context, "rad").is_none());
        let (kind, _) = classifier.resolve_field(&context, "hgt").unwrap();
        assert_eq!(kind, KindId::function(FamilyCode::Loc, "cl"));
    }
}
