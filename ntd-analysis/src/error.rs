use thiserror::Error;

/// Failures while constructing an [`Engine`](crate::Engine). Requests themselves never fail.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("suffix pattern `{name}` failed to compile: {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}
