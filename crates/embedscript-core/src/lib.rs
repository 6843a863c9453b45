//! Language intelligence for script fragments embedded in markup.
//!
//! This crate sits between an editor integration and an analysis engine.
//! It keeps every open fragment in a virtual file table, presents that
//! table to the engine as a file system, and replaces the engine when a
//! fragment switches between untyped and typed script.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐        ┌───────────────────────────────┐
//! │  embedscript-lsp     │        │  embedscript (CLI `check`)    │
//! └──────────┬───────────┘        └───────────────┬───────────────┘
//!            └───────────────┬────────────────────┘
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       embedscript-core                          │
//! │  SessionManager ── BridgeHost ── VirtualFileTable ── Snapshot   │
//! │        │                └──── ResolutionBridge                  │
//! │        └── adapters (offsets → host ranges), format             │
//! └────────────────────────────┬────────────────────────────────────┘
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              embedscript-engine (LanguageEngine)                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use embedscript_core::{ScriptDocument, SessionManager};
//!
//! let mut manager: SessionManager = SessionManager::new(workspace_root);
//! let doc = ScriptDocument::from_host("src/App.svelte", text, 1);
//!
//! let diagnostics = manager.diagnostics(&doc);
//! let hover = manager.hover(&doc, position);
//! let edits = embedscript_core::format_document(&doc, &BraceFormatter).await;
//! ```

pub mod adapters;
pub mod config;
pub mod dialect;
pub mod document;
pub mod error;
pub mod format;
pub mod fragment;
pub mod host;
pub mod resolution;
pub mod session;
pub mod snapshot;
pub mod types;
pub mod vfs;

// Re-export main types and functions for convenience
pub use adapters::{diagnostic_severity_of, dialect_label_of, to_host_range};
pub use config::ProjectConfig;
pub use dialect::Dialect;
pub use document::{DocumentStore, HostDocument, LineIndex, ScriptDocument};
pub use error::{ConfigError, FormatError};
pub use format::{BraceFormatter, FormatConfig, ScriptFormatter, detect_indent, format_document};
pub use fragment::{ScriptFragment, extract_script_fragment};
pub use host::BridgeHost;
pub use resolution::ResolutionBridge;
pub use session::{EngineSession, SessionId, SessionManager, UpdateOutcome};
pub use snapshot::Snapshot;
pub use types::{Diagnostic, DiagnosticSeverity, Hover, HoverContents, Position, Range, TextEdit};
pub use vfs::{FragmentId, VirtualFileTable};
