//! Command implementations for the embedscript CLI
//!
//! Each command module handles the CLI interface and delegates to
//! embedscript-core for the actual work.

pub mod check;
pub mod format;
pub mod lsp;
