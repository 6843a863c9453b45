//! LSP server command implementation.

use anyhow::Result;

/// Execute the LSP server.
///
/// This starts the language server, communicating over stdio with
/// JSON-RPC messages.
pub fn execute() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        embedscript_lsp::run_server().await;
    });

    Ok(())
}
