//! LSP server implementation using tower-lsp.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use embedscript_core::{
    BraceFormatter, DocumentStore, HostDocument, SessionManager, format_document,
};

use crate::capabilities::server_capabilities;
use crate::convert;

/// The embedded script language server.
pub struct EmbedScriptLanguageServer {
    /// The LSP client for sending notifications.
    client: Client,
    /// Open host documents.
    documents: Arc<RwLock<DocumentStore>>,
    /// The single engine session for the workspace.
    sessions: Arc<Mutex<SessionManager>>,
    formatter: BraceFormatter,
}

impl EmbedScriptLanguageServer {
    /// Create a new language server instance. The workspace root is the
    /// current directory until the client names one.
    pub fn new(client: Client) -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            client,
            documents: Arc::new(RwLock::new(DocumentStore::new())),
            sessions: Arc::new(Mutex::new(SessionManager::new(root))),
            formatter: BraceFormatter,
        }
    }

    /// Publish diagnostics for a document.
    async fn publish_diagnostics(&self, uri: Url) {
        let (diagnostics, version) = {
            let documents = self.documents.read().await;
            let Some(doc) = documents.get(uri.as_str()) else {
                return;
            };
            let mut sessions = self.sessions.lock().await;
            let diagnostics: Vec<Diagnostic> = sessions
                .diagnostics(doc)
                .iter()
                .map(convert::diagnostic_to_lsp)
                .collect();
            let version = i32::try_from(doc.version()).ok();
            (diagnostics, version)
        };

        tracing::debug!(uri = %uri, count = diagnostics.len(), "Publishing diagnostics");
        self.client
            .publish_diagnostics(uri, diagnostics, version)
            .await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for EmbedScriptLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(|folder| folder.uri.clone())
            .or(params.root_uri)
            .and_then(|uri| uri.to_file_path().ok());
        if let Some(root) = root {
            tracing::info!(root = %root.display(), "Workspace root");
            *self.sessions.lock().await = SessionManager::new(root);
        }

        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "embedscript-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "embedscript language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.sessions.lock().await.reset();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        let path = convert::path_from_uri(&uri);
        let version = convert::version_from_lsp(params.text_document.version);

        {
            let mut documents = self.documents.write().await;
            documents.open(uri.as_str(), path, params.text_document.text, version);
        }

        self.publish_diagnostics(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        let version = convert::version_from_lsp(params.text_document.version);

        // Full document sync, so the last change is the whole text
        if let Some(change) = params.content_changes.into_iter().last() {
            {
                let mut documents = self.documents.write().await;
                documents.change(uri.as_str(), change.text, version);
            }

            self.publish_diagnostics(uri).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;

        let closed = self.documents.write().await.close(uri.as_str());
        if let Some(doc) = closed {
            self.sessions.lock().await.close(&doc);
        }

        // Clear diagnostics for closed document
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        let documents = self.documents.read().await;
        let Some(doc) = documents.get(position.text_document.uri.as_str()) else {
            return Ok(None);
        };

        let hover = self
            .sessions
            .lock()
            .await
            .hover(doc, convert::position_from_lsp(&position.position));
        Ok(hover.as_ref().map(convert::hover_to_lsp))
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let documents = self.documents.read().await;
        let Some(doc) = documents.get(params.text_document.uri.as_str()) else {
            return Ok(None);
        };

        let edits = format_document(doc, &self.formatter).await;
        Ok(Some(edits.iter().map(convert::text_edit_to_lsp).collect()))
    }
}

/// Run the LSP server over stdio.
pub async fn run_server() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(EmbedScriptLanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
