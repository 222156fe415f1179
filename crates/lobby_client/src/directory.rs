//! Session directory: latest snapshot + current filter -> derived view.
//!
//! [`SessionDirectory`] is synchronous and performs no I/O. It must have a
//! single owner; in async code that owner is the
//! [`DirectoryTask`](crate::browser::DirectoryTask).

use lobby_shared::{SessionFilter, SessionRecord, Snapshot, ViewState};
use tracing::trace;

/// Holds the most recent [`Snapshot`], the active [`SessionFilter`] and the
/// [`ViewState`] derived from both.
///
/// The view is recomputed in full whenever the snapshot or the filter
/// changes, and on every [`tick`](Self::tick). It is never patched in place.
#[derive(Debug, Default)]
pub struct SessionDirectory {
    snapshot: Snapshot,
    filter: SessionFilter,
    view: ViewState,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: SessionFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Replaces the stored snapshot unconditionally (last write wins) and
    /// recomputes the view.
    pub fn ingest_snapshot(&mut self, snapshot: Snapshot) -> ViewState {
        self.snapshot = snapshot;
        self.recompute()
    }

    /// Replaces the filter and recomputes the view.
    pub fn set_filter(&mut self, filter: SessionFilter) -> ViewState {
        self.filter = filter;
        self.recompute()
    }

    /// Derives the view from the current (snapshot, filter) pair.
    pub fn recompute(&mut self) -> ViewState {
        self.view = derive_view(&self.snapshot, &self.filter);
        trace!(
            target: "lobby::directory",
            sessions = self.snapshot.len(),
            visible = self.view.len(),
            "view recomputed"
        );
        self.view.clone()
    }

    /// Periodic refresh. Does not fetch anything; only re-derives the view.
    pub fn tick(&mut self) -> ViewState {
        self.recompute()
    }

    /// Immutable copy of the current view.
    pub fn current_view(&self) -> ViewState {
        self.view.clone()
    }

    /// Looks a session up by exact name in the latest snapshot, ignoring the
    /// filter, so a selection made on an older view still resolves while the
    /// session exists.
    pub fn resolve(&self, name: &str) -> Option<SessionRecord> {
        self.snapshot.find(name).cloned()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn filter(&self) -> &SessionFilter {
        &self.filter
    }
}

/// Filters `snapshot` by `filter` and sorts by name using ordinal (byte-wise)
/// comparison, never locale-aware collation.
pub fn derive_view(snapshot: &Snapshot, filter: &SessionFilter) -> ViewState {
    let mut sessions: Vec<SessionRecord> = snapshot
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect();
    sessions.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    ViewState::new(sessions)
}
