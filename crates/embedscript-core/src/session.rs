//! The engine session manager.
//!
//! One manager owns one engine instance and the host state that feeds it.
//! Document updates go into the virtual file table; the engine picks them up
//! incrementally through the version strings the table reports. The one
//! edit that cannot be applied incrementally is a change of dialect, since
//! an engine fixes the script kind of a file when it first parses it. That
//! edit disposes the engine and creates a new one against the same host.
//!
//! ```text
//!   Uninitialized ──first update/query──▶ Active(session 1)
//!   Active(session n) ──update, same dialect──▶ Active(session n)
//!   Active(session n) ──update, dialect changed──▶ Active(session n+1)
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use embedscript_engine::{CompilerOptions, EngineDiagnostic, LanguageEngine, ScriptEngine};

use crate::adapters::{to_host_diagnostic, to_host_hover};
use crate::config::ProjectConfig;
use crate::dialect::Dialect;
use crate::document::HostDocument;
use crate::host::BridgeHost;
use crate::snapshot::Snapshot;
use crate::types::{Diagnostic, Hover, Position};
use crate::vfs::FragmentId;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one engine instance, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// An engine instance and the options it was created with.
#[derive(Debug)]
pub struct EngineSession<E> {
    id: SessionId,
    engine: E,
    options: CompilerOptions,
}

impl<E: LanguageEngine> EngineSession<E> {
    fn create(options: CompilerOptions) -> Self {
        let id = SessionId::next();
        tracing::debug!(session = %id, "Creating engine session");
        Self {
            id,
            engine: E::create(options.clone()),
            options,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

/// What an [`SessionManager::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// First snapshot of this fragment.
    Created,
    /// New snapshot, same dialect, same engine.
    Updated,
    /// The dialect changed and the engine was replaced.
    Restarted {
        previous: SessionId,
        current: SessionId,
    },
}

#[derive(Debug)]
struct ActiveSession<E> {
    host: BridgeHost,
    session: EngineSession<E>,
}

impl<E: LanguageEngine> ActiveSession<E> {
    fn start(config: Arc<ProjectConfig>) -> Self {
        let host = BridgeHost::new(config);
        let session = EngineSession::create(host.config().options.clone());
        tracing::info!(
            session = %session.id,
            root = %host.config().root.display(),
            project_files = host.config().file_names.len(),
            "Engine session started"
        );
        Self { host, session }
    }

    /// Dispose the engine, then create its replacement against the same host.
    fn restart(&mut self) -> (SessionId, SessionId) {
        let previous = self.session.id;
        self.session.engine.dispose();
        self.session = EngineSession::create(self.session.options.clone());
        (previous, self.session.id)
    }
}

/// Owns the engine session and everything it reads.
///
/// All mutation goes through `&mut self`, so a restart is a single step
/// that no query can observe half done.
#[derive(Debug)]
pub struct SessionManager<E: LanguageEngine = ScriptEngine> {
    workspace_root: PathBuf,
    config: Option<Arc<ProjectConfig>>,
    active: Option<ActiveSession<E>>,
    restart_count: u64,
}

impl<E: LanguageEngine> SessionManager<E> {
    /// A manager that discovers its configuration under `workspace_root` on
    /// first use.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            config: None,
            active: None,
            restart_count: 0,
        }
    }

    /// A manager with a fixed configuration. Nothing is discovered.
    pub fn with_config(config: ProjectConfig) -> Self {
        Self {
            workspace_root: config.root.clone(),
            config: Some(Arc::new(config)),
            active: None,
            restart_count: 0,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    fn activate(&mut self) -> &mut ActiveSession<E> {
        let root = &self.workspace_root;
        let preset = &self.config;
        self.active.get_or_insert_with(|| {
            let config = preset
                .clone()
                .unwrap_or_else(|| Arc::new(ProjectConfig::discover(root)));
            ActiveSession::start(config)
        })
    }

    /// Record a new snapshot of `doc`, restarting the engine if the
    /// fragment's dialect changed.
    pub fn update<D: HostDocument + ?Sized>(&mut self, doc: &D) -> UpdateOutcome {
        let id = FragmentId::from_path(doc.file_path());
        let dialect = Dialect::from_attributes(doc.attributes());
        let active = self.activate();

        let version = active.host.table().next_version(&id, doc.version());
        let snapshot = Snapshot::capture(doc.text(), dialect, version);
        let previous = active.host.table_mut().upsert(id.clone(), snapshot);

        let outcome = match previous {
            None => {
                tracing::debug!(fragment = %id, %dialect, version, "Tracking fragment");
                UpdateOutcome::Created
            }
            Some(previous) if previous == dialect => {
                tracing::trace!(fragment = %id, version, "Fragment updated");
                UpdateOutcome::Updated
            }
            Some(previous_dialect) => {
                let (previous, current) = active.restart();
                tracing::info!(
                    fragment = %id,
                    from = %previous_dialect,
                    to = %dialect,
                    previous = %previous,
                    current = %current,
                    "Dialect changed, engine restarted"
                );
                UpdateOutcome::Restarted { previous, current }
            }
        };
        if matches!(outcome, UpdateOutcome::Restarted { .. }) {
            self.restart_count += 1;
        }
        outcome
    }

    /// Update only if `doc` differs from what the table holds.
    fn sync<D: HostDocument + ?Sized>(&mut self, doc: &D) {
        let id = FragmentId::from_path(doc.file_path());
        let dialect = Dialect::from_attributes(doc.attributes());
        let current = self
            .active
            .as_ref()
            .and_then(|active| active.host.table().snapshot(&id));
        let stale = current
            .is_none_or(|snapshot| snapshot.dialect() != dialect || snapshot.text() != doc.text());
        if stale {
            self.update(doc);
        }
    }

    /// Syntactic then semantic diagnostics for `doc`, in host coordinates.
    pub fn diagnostics<D: HostDocument + ?Sized>(&mut self, doc: &D) -> Vec<Diagnostic> {
        self.sync(doc);
        let dialect = Dialect::from_attributes(doc.attributes());
        let id = FragmentId::from_path(doc.file_path());
        let ActiveSession { host, session } = self.activate();
        let host = &*host;

        let mut syntactic = session
            .engine
            .syntactic_diagnostics(host, id.as_path())
            .unwrap_or_else(|err| {
                tracing::warn!(fragment = %id, error = %err, "Syntactic diagnostics failed");
                Vec::new()
            });
        let mut semantic = session
            .engine
            .semantic_diagnostics(host, id.as_path())
            .unwrap_or_else(|err| {
                tracing::warn!(fragment = %id, error = %err, "Semantic diagnostics failed");
                Vec::new()
            });
        sort_by_position(&mut syntactic);
        sort_by_position(&mut semantic);

        syntactic
            .iter()
            .chain(&semantic)
            .map(|diagnostic| to_host_diagnostic(doc, diagnostic, dialect))
            .collect()
    }

    /// Hover at `position` (host coordinates). `None` when there is nothing
    /// to say about that spot.
    pub fn hover<D: HostDocument + ?Sized>(&mut self, doc: &D, position: Position) -> Option<Hover> {
        self.sync(doc);
        if !doc.contains(position) {
            return None;
        }
        let dialect = Dialect::from_attributes(doc.attributes());
        let id = FragmentId::from_path(doc.file_path());
        let offset = doc.offset_at(position);
        let ActiveSession { host, session } = self.activate();

        match session
            .engine
            .quick_info_at_position(&*host, id.as_path(), offset)
        {
            Ok(info) => info.map(|info| to_host_hover(doc, &info, dialect)),
            Err(err) => {
                tracing::warn!(fragment = %id, error = %err, "Quick info failed");
                None
            }
        }
    }

    /// The editor closed `doc`. Fragments stay tracked for the rest of the
    /// session so other fragments importing it keep resolving.
    pub fn close<D: HostDocument + ?Sized>(&mut self, doc: &D) {
        tracing::debug!(fragment = %FragmentId::from_path(doc.file_path()), "Document closed");
    }

    /// Dispose the engine and forget every fragment.
    pub fn reset(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.session.engine.dispose();
            active.host.table_mut().clear_fragments();
            tracing::info!(session = %active.session.id, "Session manager reset");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Identity of the live engine, `None` before first use.
    pub fn session_id(&self) -> Option<SessionId> {
        self.active.as_ref().map(|active| active.session.id)
    }

    /// How many times a dialect change replaced the engine.
    pub fn restart_count(&self) -> u64 {
        self.restart_count
    }

    /// The version the engine sees for `path`; `"0"` if never updated.
    pub fn version_of(&self, path: &Path) -> String {
        self.active.as_ref().map_or_else(
            || "0".to_string(),
            |active| active.host.table().version_of(&FragmentId::from_path(path)),
        )
    }

    pub fn known_files(&self) -> BTreeSet<FragmentId> {
        self.active
            .as_ref()
            .map(|active| active.host.table().list_known_files())
            .unwrap_or_default()
    }

    /// The configuration of the live session.
    pub fn config(&self) -> Option<&ProjectConfig> {
        self.active.as_ref().map(|active| active.host.config())
    }

    pub fn session(&self) -> Option<&EngineSession<E>> {
        self.active.as_ref().map(|active| &active.session)
    }
}

fn sort_by_position(diagnostics: &mut [EngineDiagnostic]) {
    diagnostics.sort_by_key(|diagnostic| diagnostic.span.start);
}
