//! Main language server implementation

use std::collections::HashMap;
use std::sync::Arc;

use ntd_analysis::{
    CompletionCandidate, Engine, HoverResult, LineSpan, Position as EnginePosition, TriggerKind,
    TRIGGER_CHARACTERS,
};
use tokio::sync::RwLock;
use tower_lsp::async_trait;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CompletionContext, CompletionItem, CompletionOptions, CompletionParams, CompletionResponse,
    CompletionTriggerKind, Documentation, Hover, HoverContents, HoverParams,
    HoverProviderCapability, InitializeParams, InitializeResult, InitializedParams,
    InsertTextFormat, MarkupContent, MarkupKind, Position, Range, ServerCapabilities, ServerInfo,
    TextDocumentItem, TextDocumentSyncCapability, TextDocumentSyncKind, Url,
};
use tower_lsp::Client;
use tracing::debug;

pub trait LspClient: Send + Sync + Clone + 'static {}
impl LspClient for Client {}

pub trait FeatureProvider: Send + Sync + 'static {
    fn completion(
        &self,
        text: &str,
        position: EnginePosition,
        trigger: TriggerKind,
    ) -> Vec<CompletionCandidate>;
    fn hover(&self, text: &str, position: EnginePosition) -> Option<HoverResult>;
}

pub struct DefaultFeatureProvider {
    engine: Engine,
}

impl DefaultFeatureProvider {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }
}

impl FeatureProvider for DefaultFeatureProvider {
    fn completion(
        &self,
        text: &str,
        position: EnginePosition,
        trigger: TriggerKind,
    ) -> Vec<CompletionCandidate> {
        self.engine.complete(text, position, trigger)
    }

    fn hover(&self, text: &str, position: EnginePosition) -> Option<HoverResult> {
        self.engine.hover(text, position)
    }
}

#[derive(Default)]
struct DocumentStore {
    entries: RwLock<HashMap<Url, Arc<String>>>,
}

impl DocumentStore {
    async fn upsert(&self, uri: Url, text: String) {
        self.entries.write().await.insert(uri, Arc::new(text));
    }

    async fn get(&self, uri: &Url) -> Option<Arc<String>> {
        self.entries.read().await.get(uri).cloned()
    }

    async fn remove(&self, uri: &Url) {
        self.entries.write().await.remove(uri);
    }
}

pub struct NtdLanguageServer<C = Client, P = DefaultFeatureProvider> {
    _client: C,
    documents: DocumentStore,
    features: Arc<P>,
}

impl<C, P> NtdLanguageServer<C, P>
where
    C: LspClient,
    P: FeatureProvider,
{
    pub fn with_features(client: C, features: Arc<P>) -> Self {
        Self {
            _client: client,
            documents: DocumentStore::default(),
            features,
        }
    }

    async fn document(&self, uri: &Url) -> Option<Arc<String>> {
        self.documents.get(uri).await
    }
}

fn from_lsp_position(position: Position) -> EnginePosition {
    EnginePosition::new(position.line as usize, position.character as usize)
}

fn to_lsp_range(span: &LineSpan) -> Range {
    Range {
        start: Position::new(span.line as u32, span.start as u32),
        end: Position::new(span.line as u32, span.end as u32),
    }
}

fn trigger_kind(context: Option<&CompletionContext>) -> TriggerKind {
    let Some(context) = context else {
        return TriggerKind::Invoked;
    };
    if context.trigger_kind != CompletionTriggerKind::TRIGGER_CHARACTER {
        return TriggerKind::Invoked;
    }
    match context
        .trigger_character
        .as_deref()
        .and_then(|text| text.chars().next())
    {
        Some(ch) => TriggerKind::Character(ch),
        None => TriggerKind::Invoked,
    }
}

fn to_completion_item(candidate: CompletionCandidate) -> CompletionItem {
    let format = if candidate.snippet {
        InsertTextFormat::SNIPPET
    } else {
        InsertTextFormat::PLAIN_TEXT
    };
    CompletionItem {
        label: candidate.label,
        kind: Some(candidate.kind),
        detail: candidate.detail,
        documentation: candidate.documentation.map(Documentation::String),
        insert_text: candidate.insert_text,
        insert_text_format: Some(format),
        ..CompletionItem::default()
    }
}

#[async_trait]
impl<C, P> tower_lsp::LanguageServer for NtdLanguageServer<C, P>
where
    C: LspClient,
    P: FeatureProvider,
{
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            completion_provider: Some(CompletionOptions {
                trigger_characters: Some(
                    TRIGGER_CHARACTERS.iter().map(|ch| ch.to_string()).collect(),
                ),
                ..CompletionOptions::default()
            }),
            ..ServerCapabilities::default()
        };

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "ntd-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        debug!("client initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: lsp_types::DidOpenTextDocumentParams) {
        let TextDocumentItem { uri, text, .. } = params.text_document;
        self.documents.upsert(uri, text).await;
    }

    async fn did_change(&self, params: lsp_types::DidChangeTextDocumentParams) {
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents
                .upsert(params.text_document.uri, change.text)
                .await;
        }
    }

    async fn did_close(&self, params: lsp_types::DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let Some(text) = self.document(uri).await else {
            debug!(%uri, "completion for unknown document");
            return Ok(None);
        };
        let position = from_lsp_position(params.text_document_position.position);
        let trigger = trigger_kind(params.context.as_ref());
        let items: Vec<CompletionItem> = self
            .features
            .completion(&text, position, trigger)
            .into_iter()
            .map(to_completion_item)
            .collect();
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        if let Some(text) = self
            .document(&params.text_document_position_params.text_document.uri)
            .await
        {
            let position = from_lsp_position(params.text_document_position_params.position);
            if let Some(result) = self.features.hover(&text, position) {
                return Ok(Some(Hover {
                    contents: HoverContents::Markup(MarkupContent {
                        kind: MarkupKind::Markdown,
                        value: result.contents(),
                    }),
                    range: Some(to_lsp_range(&result.range)),
                }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tower_lsp::lsp_types::{
        CompletionItemKind, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
        DidOpenTextDocumentParams, PartialResultParams, TextDocumentContentChangeEvent,
        TextDocumentIdentifier, TextDocumentPositionParams, VersionedTextDocumentIdentifier,
        WorkDoneProgressParams,
    };
    use tower_lsp::LanguageServer;

    #[derive(Clone, Default)]
    struct NoopClient;
    impl LspClient for NoopClient {}

    #[derive(Default)]
    struct MockFeatureProvider {
        completion_called: AtomicUsize,
        hover_called: AtomicUsize,
        last_completion: Mutex<Option<(String, EnginePosition, TriggerKind)>>,
        last_hover_position: Mutex<Option<EnginePosition>>,
    }

    impl FeatureProvider for MockFeatureProvider {
        fn completion(
            &self,
            text: &str,
            position: EnginePosition,
            trigger: TriggerKind,
        ) -> Vec<CompletionCandidate> {
            self.completion_called.fetch_add(1, Ordering::SeqCst);
            *self.last_completion.lock().unwrap() = Some((text.to_string(), position, trigger));
            vec![CompletionCandidate {
                label: "GRP".into(),
                detail: Some("groups".into()),
                kind: CompletionItemKind::MODULE,
                insert_text: Some("GRP=[$0]".into()),
                documentation: None,
                snippet: true,
            }]
        }

        fn hover(&self, _: &str, position: EnginePosition) -> Option<HoverResult> {
            self.hover_called.fetch_add(1, Ordering::SeqCst);
            *self.last_hover_position.lock().unwrap() = Some(position);
            Some(HoverResult {
                key: "thr".into(),
                title: "spike threshold".into(),
                unit: "mV".into(),
                description: "hover".into(),
                range: LineSpan {
                    line: 0,
                    start: 6,
                    end: 9,
                },
            })
        }
    }

    const SAMPLE: &str = "NRN=[(thr=1.0mV)]";

    fn sample_uri() -> Url {
        Url::parse("file:///network.ntd").unwrap()
    }

    async fn open_sample_document<P: FeatureProvider>(server: &NtdLanguageServer<NoopClient, P>) {
        server
            .did_open(DidOpenTextDocumentParams {
                text_document: TextDocumentItem {
                    uri: sample_uri(),
                    language_id: "ntd".into(),
                    version: 1,
                    text: SAMPLE.to_string(),
                },
            })
            .await;
    }

    fn completion_params(position: Position, context: Option<CompletionContext>) -> CompletionParams {
        CompletionParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: sample_uri() },
                position,
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context,
        }
    }

    fn hover_params(position: Position) -> HoverParams {
        HoverParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: sample_uri() },
                position,
            },
            work_done_progress_params: Default::default(),
        }
    }

    #[tokio::test]
    async fn initialize_advertises_completion_triggers() {
        let server =
            NtdLanguageServer::with_features(NoopClient, Arc::new(MockFeatureProvider::default()));
        let result = server.initialize(InitializeParams::default()).await.unwrap();
        let triggers = result
            .capabilities
            .completion_provider
            .and_then(|options| options.trigger_characters)
            .unwrap();
        assert_eq!(triggers, ["=", ",", "("]);
        assert!(result.capabilities.hover_provider.is_some());
    }

    #[tokio::test]
    async fn completion_calls_feature_layer() {
        let provider = Arc::new(MockFeatureProvider::default());
        let server = NtdLanguageServer::with_features(NoopClient, provider.clone());
        open_sample_document(&server).await;

        let context = CompletionContext {
            trigger_kind: CompletionTriggerKind::TRIGGER_CHARACTER,
            trigger_character: Some("(".into()),
        };
        let response = server
            .completion(completion_params(Position::new(0, 6), Some(context)))
            .await
            .unwrap()
            .unwrap();

        let items = match response {
            CompletionResponse::Array(items) => items,
            CompletionResponse::List(list) => list.items,
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].insert_text_format, Some(InsertTextFormat::SNIPPET));
        assert_eq!(provider.completion_called.load(Ordering::SeqCst), 1);

        let (text, position, trigger) = provider.last_completion.lock().unwrap().clone().unwrap();
        assert_eq!(text, SAMPLE);
        assert_eq!(position, EnginePosition::new(0, 6));
        assert_eq!(trigger, TriggerKind::Character('('));
    }

    #[tokio::test]
    async fn completion_without_context_is_invoked() {
        let provider = Arc::new(MockFeatureProvider::default());
        let server = NtdLanguageServer::with_features(NoopClient, provider.clone());
        open_sample_document(&server).await;

        server
            .completion(completion_params(Position::new(0, 0), None))
            .await
            .unwrap();
        let (_, _, trigger) = provider.last_completion.lock().unwrap().clone().unwrap();
        assert_eq!(trigger, TriggerKind::Invoked);
    }

    #[tokio::test]
    async fn hover_uses_feature_provider_position() {
        let provider = Arc::new(MockFeatureProvider::default());
        let server = NtdLanguageServer::with_features(NoopClient, provider.clone());
        open_sample_document(&server).await;

        let hover = server
            .hover(hover_params(Position::new(0, 7)))
            .await
            .unwrap()
            .unwrap();

        match hover.contents {
            HoverContents::Markup(markup) => assert!(markup.value.contains("**thr**")),
            other => panic!("unexpected hover contents: {other:?}"),
        }
        assert_eq!(
            hover.range,
            Some(Range::new(Position::new(0, 6), Position::new(0, 9)))
        );
        assert_eq!(provider.hover_called.load(Ordering::SeqCst), 1);
        let stored = provider.last_hover_position.lock().unwrap().unwrap();
        assert_eq!(stored, EnginePosition::new(0, 7));
    }

    #[tokio::test]
    async fn did_change_replaces_the_stored_text() {
        let provider = Arc::new(MockFeatureProvider::default());
        let server = NtdLanguageServer::with_features(NoopClient, provider.clone());
        open_sample_document(&server).await;

        server
            .did_change(DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier {
                    uri: sample_uri(),
                    version: 2,
                },
                content_changes: vec![TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text: "GRP=[".into(),
                }],
            })
            .await;
        server
            .completion(completion_params(Position::new(0, 5), None))
            .await
            .unwrap();

        let (text, _, _) = provider.last_completion.lock().unwrap().clone().unwrap();
        assert_eq!(text, "GRP=[");
    }

    #[tokio::test]
    async fn requests_return_none_without_document_entry() {
        let provider = Arc::new(MockFeatureProvider::default());
        let server = NtdLanguageServer::with_features(NoopClient, provider.clone());
        open_sample_document(&server).await;
        server
            .did_close(DidCloseTextDocumentParams {
                text_document: TextDocumentIdentifier { uri: sample_uri() },
            })
            .await;

        assert!(server
            .hover(hover_params(Position::new(0, 0)))
            .await
            .unwrap()
            .is_none());
        assert!(server
            .completion(completion_params(Position::new(0, 0), None))
            .await
            .unwrap()
            .is_none());
        assert_eq!(provider.completion_called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn default_provider_answers_from_the_engine() {
        let engine = Engine::standard().unwrap();
        let server = NtdLanguageServer::with_features(
            NoopClient,
            Arc::new(DefaultFeatureProvider::new(engine)),
        );
        open_sample_document(&server).await;

        let hover = server
            .hover(hover_params(Position::new(0, 7)))
            .await
            .unwrap()
            .unwrap();
        let HoverContents::Markup(markup) = hover.contents else {
            panic!("expected markdown hover");
        };
        assert!(markup.value.contains("spike threshold"));
        assert!(markup.value.contains("Unit: mV"));
    }
}
