use ntd_analysis::{Engine, Registry};
use ntd_lsp::{DefaultFeatureProvider, NtdLanguageServer};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

/// Environment variable naming a configuration file layered over the defaults.
const CONFIG_ENV: &str = "NTD_CONFIG";

#[tokio::main]
async fn main() -> ExitCode {
    let mut loader = ntd_config::Loader::new();
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        loader = loader.with_file(path);
    }
    let config = match loader.build() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ntd-lsp: invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    // stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let engine = match Engine::new(Arc::new(Registry::standard()), config.engine_options()) {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!(%err, "failed to build the completion engine");
            return ExitCode::FAILURE;
        }
    };
    let features = Arc::new(DefaultFeatureProvider::new(engine));

    let (service, socket) =
        LspService::new(move |client| NtdLanguageServer::with_features(client, features.clone()));
    Server::new(stdin(), stdout(), socket).serve(service).await;
    ExitCode::SUCCESS
}
