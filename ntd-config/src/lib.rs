//! Shared configuration loader for the NTD tools.
//!
//! `defaults/ntd.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`NtdConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use ntd_analysis::{EngineOptions, TemplateStyle};
use serde::Deserialize;
use std::path::Path;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/ntd.default.toml");

/// Top-level configuration consumed by NTD applications.
#[derive(Debug, Clone, Deserialize)]
pub struct NtdConfig {
    pub completion: CompletionConfig,
    pub hover: HoverConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    pub templates: TemplateStyle,
    pub append_units: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HoverConfig {
    pub dimensionless_label: String,
}

/// Fallback `tracing` filter for binaries when `RUST_LOG` is unset.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl NtdConfig {
    /// Options handed to [`ntd_analysis::Engine::new`].
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            templates: self.completion.templates,
            append_units: self.completion.append_units,
            dimensionless_label: self.hover.dimensionless_label.clone(),
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<NtdConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<NtdConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.completion.templates, TemplateStyle::Both);
        assert!(config.completion.append_units);
        assert_eq!(config.logging.filter, "warn");
        assert_eq!(config.engine_options(), EngineOptions::default());
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("completion.templates", "defaults")
            .expect("override to apply")
            .set_override("completion.append_units", false)
            .expect("override to apply")
            .build()
            .expect("config to build");
        let options = config.engine_options();
        assert_eq!(options.templates, TemplateStyle::Defaults);
        assert!(!options.append_units);
    }

    #[test]
    fn user_file_layers_over_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(file, "[hover]\ndimensionless_label = \"unitless\"").expect("write config");

        let config = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");
        assert_eq!(config.hover.dimensionless_label, "unitless");
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/ntd.toml")
            .build()
            .expect("config to build");
        assert_eq!(config.completion.templates, TemplateStyle::Both);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        assert!(Loader::new().with_file("/nonexistent/ntd.toml").build().is_err());
    }

    #[test]
    fn unknown_template_style_is_rejected() {
        let result = Loader::new()
            .set_override("completion.templates", "sometimes")
            .expect("override to apply")
            .build();
        assert!(result.is_err());
    }
}
