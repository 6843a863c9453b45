//! Language server for script fragments embedded in markup files.
//!
//! This crate wraps `embedscript-core` with the tower-lsp framework.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       embedscript-lsp                         │
//! │  tower-lsp wrapper, JSON-RPC/stdio, `embedscript lsp` command │
//! │                                                               │
//! │  ┌─────────────┐  ┌─────────────┐  ┌───────────────────────┐  │
//! │  │  server.rs  │  │ convert.rs  │  │    capabilities.rs    │  │
//! │  │ Open docs,  │  │ Core ↔ LSP  │  │ Capability negotiation│  │
//! │  │ one session │  │             │  │                       │  │
//! │  └──────┬──────┘  └──────┬──────┘  └───────────────────────┘  │
//! │         └────────────────┴──────────────────┐                 │
//! │  ┌──────────────────────────────────────────▼──────────────┐  │
//! │  │                    embedscript-core                     │  │
//! │  │       (session manager, adapters, formatting)           │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! embedscript lsp
//! ```
//!
//! Or programmatically:
//!
//! ```rust,ignore
//! embedscript_lsp::run_server().await;
//! ```

pub mod capabilities;
pub mod convert;
pub mod server;

pub use server::{EmbedScriptLanguageServer, run_server};
