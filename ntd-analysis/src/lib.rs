//! Editor assistance for NTD network topology descriptions
//!
//!     NTD describes a spiking network as bracketed sections of parenthesised elements, e.g.
//!     `NRN=[(nid=in-1,thr=1.0mV,WDF=(fnc=exp,hlf=10ms))]`. While a description is being typed it
//!     is almost never well formed, so this crate never parses it. Requests are answered from
//!     the text before the cursor:
//!
//!         1. [`normalize`] strips comments and whitespace.
//!         2. The [`Classifier`] matches anchored suffix patterns to find the grammar location
//!            and settles shared field names through discriminator evidence.
//!         3. Completion and hover read the [`Registry`] for the resolved location.
//!
//!     Ambiguity degrades to an empty answer. Nothing is guessed.
//!
//! Usage
//!
//!     [`Engine`] bundles a registry, a classifier and [`EngineOptions`]. It is `Send + Sync`
//!     and holds no per-document state, so hosts share one instance and pass the full text
//!     with every request.

pub mod classifier;
pub mod completion;
pub mod document;
pub mod error;
pub mod grammar;
pub mod hover;
pub mod normalize;
pub mod schema;
pub mod template;

pub use classifier::{Boundary, Classifier, ResolvedContext};
pub use completion::{CompletionCandidate, TriggerKind, TRIGGER_CHARACTERS};
pub use document::{LineSpan, Position};
pub use error::EngineError;
pub use hover::HoverResult;
pub use normalize::{normalize, NormalizedText};
pub use schema::Registry;

use document::Cursor;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Which element templates completion offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateStyle {
    /// A placeholder template and a defaults template per kind.
    #[default]
    Both,
    Placeholders,
    Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub templates: TemplateStyle,
    /// Suffix suggested values with their unit (`10ms` rather than `10`).
    pub append_units: bool,
    /// Shown in hovers for fields without a unit.
    pub dimensionless_label: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            templates: TemplateStyle::Both,
            append_units: true,
            dimensionless_label: "dimensionless".to_string(),
        }
    }
}

/// Completion and hover over the NTD grammar.
pub struct Engine {
    classifier: Classifier,
    options: EngineOptions,
}

impl Engine {
    pub fn new(registry: Arc<Registry>, options: EngineOptions) -> Result<Self, EngineError> {
        Ok(Self {
            classifier: Classifier::new(registry)?,
            options,
        })
    }

    /// Engine over the built-in grammar with default options.
    pub fn standard() -> Result<Self, EngineError> {
        Self::new(Arc::new(Registry::standard()), EngineOptions::default())
    }

    pub fn registry(&self) -> &Registry {
        self.classifier.registry()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Completion candidates for the cursor at `position`.
    pub fn complete(
        &self,
        text: &str,
        position: Position,
        trigger: TriggerKind,
    ) -> Vec<CompletionCandidate> {
        let cursor = Cursor::locate(text, position);
        if cursor.in_comment() {
            return Vec::new();
        }
        let prefix = normalize(cursor.prefix());
        if !trigger.is_current(&prefix) {
            debug!(?trigger, %position, "stale trigger character");
            return Vec::new();
        }
        let lookahead = normalize(cursor.line_after());
        match self.classifier.classify(&prefix, &lookahead) {
            Some(context) => {
                debug!(
                    boundary = ?context.boundary,
                    container = ?context.container,
                    "completion context"
                );
                completion::completion_items(&self.classifier, &self.options, &context)
            }
            None => Vec::new(),
        }
    }

    /// Documentation for the key or value under the cursor.
    pub fn hover(&self, text: &str, position: Position) -> Option<HoverResult> {
        hover::hover_at(&self.classifier, &self.options, text, position)
    }
}
