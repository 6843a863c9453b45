//! Incremental script analysis for embedded fragments.
//!
//! The engine answers diagnostics and quick-info queries about a program
//! whose files it only ever sees through an [`EngineHost`]. It caches one
//! parse per file version, so a host that bumps versions only on real edits
//! gets incremental behaviour for free.
//!
//! # Usage
//!
//! ```rust,ignore
//! use embedscript_engine::{CompilerOptions, LanguageEngine, ScriptEngine};
//!
//! let mut engine = ScriptEngine::create(CompilerOptions::default());
//! let syntax = engine.syntactic_diagnostics(&host, path)?;
//! let semantic = engine.semantic_diagnostics(&host, path)?;
//! let hover = engine.quick_info_at_position(&host, path, offset)?;
//! ```

pub mod checker;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod host;
pub mod quick_info;
pub mod resolve;
pub mod source;

pub use diagnostic::{DiagnosticCategory, EngineDiagnostic, QuickInfo, TextSpan, codes};
pub use engine::{LanguageEngine, ScriptEngine};
pub use error::{EngineError, EngineResult};
pub use host::{
    CompilerOptions, EngineHost, Extension, ModuleResolutionHost, ModuleResolutionKind,
    ResolvedModule, ScriptKind, ScriptTarget,
};
pub use resolve::{normalize_path, resolve_module_name};
