//! Schema registry
//!
//! Read-only lookups over the grammar tables. Field names are not unique: `fnc` selects the
//! function in four families and `rad` means a different radius in two location variants. The
//! registry therefore answers "which field specs carry this name" with a map keyed by element
//! kind, and leaves picking one of them to the classifier's disambiguation step.

use crate::grammar::{
    Container, Discriminator, ElementKind, FamilyCode, FamilySpec, FieldSpec, KindId, SectionCode,
    SectionSpec, FUNCTIONS, SECTIONS,
};
use std::collections::{BTreeMap, HashMap};

/// Value observed in the text for a discriminator key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observed<'a> {
    /// A value followed by a delimiter.
    Complete(&'a str),
    /// A value the cursor is still extending.
    Typing(&'a str),
}

impl Discriminator {
    /// Predicate deciding whether the observed value selects this discriminator's kind.
    pub fn matches(&self, observed: Observed<'_>) -> bool {
        match observed {
            Observed::Complete(value) => self.value == value,
            Observed::Typing(value) => !value.is_empty() && self.value.starts_with(value),
        }
    }
}

pub type FieldCandidates = BTreeMap<KindId, &'static FieldSpec>;

/// Precomputed lookup tables over a set of sections and function families.
#[derive(Debug)]
pub struct Registry {
    sections: &'static [SectionSpec],
    families: &'static [FamilySpec],
    kinds: HashMap<KindId, &'static ElementKind>,
    by_container: HashMap<Container, Vec<KindId>>,
    by_field: HashMap<&'static str, FieldCandidates>,
}

impl Registry {
    /// Registry over the built-in NTD grammar.
    pub fn standard() -> Self {
        Self::new(SECTIONS, FUNCTIONS)
    }

    pub fn new(sections: &'static [SectionSpec], families: &'static [FamilySpec]) -> Self {
        let containers = sections
            .iter()
            .map(|section| (Container::Section(section.code), section.kinds))
            .chain(
                families
                    .iter()
                    .map(|family| (Container::Function(family.code), family.kinds)),
            );

        let mut kinds = HashMap::new();
        let mut by_container: HashMap<Container, Vec<KindId>> = HashMap::new();
        let mut by_field: HashMap<&'static str, FieldCandidates> = HashMap::new();

        for (container, container_kinds) in containers {
            let ids = by_container.entry(container).or_default();
            for kind in container_kinds {
                kinds.insert(kind.id, kind);
                ids.push(kind.id);
                for field in kind.fields {
                    by_field.entry(field.name).or_default().insert(kind.id, field);
                }
            }
        }

        Self {
            sections,
            families,
            kinds,
            by_container,
            by_field,
        }
    }

    pub fn sections(&self) -> &'static [SectionSpec] {
        self.sections
    }

    pub fn families(&self) -> &'static [FamilySpec] {
        self.families
    }

    pub fn section(&self, code: SectionCode) -> Option<&'static SectionSpec> {
        self.sections.iter().find(|section| section.code == code)
    }

    pub fn family(&self, code: FamilyCode) -> Option<&'static FamilySpec> {
        self.families.iter().find(|family| family.code == code)
    }

    pub fn kind(&self, id: KindId) -> Option<&'static ElementKind> {
        self.kinds.get(&id).copied()
    }

    /// Kinds legal inside a container, in declaration order.
    pub fn kinds_in(&self, container: Container) -> &[KindId] {
        self.by_container
            .get(&container)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every field spec named `name`, keyed by the kind that owns it.
    pub fn field_specs_for(&self, name: &str) -> Option<&FieldCandidates> {
        self.by_field.get(name)
    }

    pub fn discriminator_for(&self, id: KindId) -> Option<Discriminator> {
        self.kind(id).and_then(|kind| kind.discriminator)
    }

    /// Key whose value tells the kinds of a container apart.
    pub fn selector_for(&self, container: Container) -> Option<&'static str> {
        self.kinds_in(container)
            .iter()
            .find_map(|id| self.discriminator_for(*id))
            .map(|discriminator| discriminator.key)
    }

    /// The kind used when a template has to pick one variant of a family.
    pub fn default_kind(&self, container: Container) -> Option<&'static ElementKind> {
        self.kinds_in(container)
            .first()
            .and_then(|id| self.kind(*id))
    }

    /// Field specs of `name` restricted to the given kinds.
    pub fn field_specs_among<'r>(
        &'r self,
        name: &str,
        kinds: &'r [KindId],
    ) -> impl Iterator<Item = (KindId, &'static FieldSpec)> + 'r {
        self.field_specs_for(name)
            .into_iter()
            .flat_map(|candidates| candidates.iter())
            .filter(move |(id, _)| kinds.contains(id))
            .map(|(id, field)| (*id, *field))
    }

    /// Section or family codes written as `CODE=` in descriptions.
    pub fn container_codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sections
            .iter()
            .map(|section| section.code.as_str())
            .chain(self.families.iter().map(|family| family.code.as_str()))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
