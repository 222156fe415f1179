//! Single-owner task around a [`SessionDirectory`].
//!
//! Snapshot ingestion, filter changes, refresh ticks and queries all go
//! through one tokio task, so every recompute observes a consistent
//! (snapshot, filter) pair. Each recomputed view is published on a
//! `watch` channel for presentation.

use futures::{stream::BoxStream, Stream, StreamExt};
use lobby_shared::{SessionFilter, SessionRecord, Snapshot, ViewState};
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{directory::SessionDirectory, ticker::TickSource};

/// Errors surfaced by [`DirectoryHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BrowserError {
    #[error("session directory task is closed")]
    Closed,
}

/// What triggered a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeCause {
    /// Initial (empty) view before anything happened.
    Initial,
    Snapshot,
    Filter,
    Tick,
    /// Explicit refresh request (e.g. a refresh button).
    Refresh,
}

/// A published view together with its revision counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewUpdate {
    /// Increases by one per recompute.
    pub revision: u64,
    pub cause: RecomputeCause,
    pub view: ViewState,
}

impl ViewUpdate {
    fn initial() -> Self {
        Self {
            revision: 0,
            cause: RecomputeCause::Initial,
            view: ViewState::default(),
        }
    }
}

enum DirectoryCommand {
    Ingest(Snapshot),
    SetFilter(SessionFilter),
    Refresh,
    CurrentView(oneshot::Sender<ViewState>),
    Resolve(String, oneshot::Sender<Option<SessionRecord>>),
}

/// Cloneable access point to a running [`DirectoryTask`].
///
/// Once the task is gone every call returns [`BrowserError::Closed`].
#[derive(Debug, Clone)]
pub struct DirectoryHandle {
    commands: mpsc::UnboundedSender<DirectoryCommand>,
    views: watch::Receiver<ViewUpdate>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for DirectoryCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ingest(snapshot) => write!(f, "Ingest({} sessions)", snapshot.len()),
            Self::SetFilter(filter) => write!(f, "SetFilter({filter:?})"),
            Self::Refresh => f.write_str("Refresh"),
            Self::CurrentView(_) => f.write_str("CurrentView"),
            Self::Resolve(name, _) => write!(f, "Resolve({name:?})"),
        }
    }
}

impl DirectoryHandle {
    /// Replaces the directory's snapshot (last write wins).
    pub fn ingest_snapshot(&self, snapshot: Snapshot) -> Result<(), BrowserError> {
        self.send(DirectoryCommand::Ingest(snapshot))
    }

    /// Replaces the directory's filter.
    pub fn set_filter(&self, filter: SessionFilter) -> Result<(), BrowserError> {
        self.send(DirectoryCommand::SetFilter(filter))
    }

    /// Requests an immediate recompute without new data.
    pub fn refresh(&self) -> Result<(), BrowserError> {
        self.send(DirectoryCommand::Refresh)
    }

    /// Current view, after every command sent before this call was applied.
    pub async fn current_view(&self) -> Result<ViewState, BrowserError> {
        let (tx, rx) = oneshot::channel();
        self.send(DirectoryCommand::CurrentView(tx))?;
        rx.await.map_err(|_| BrowserError::Closed)
    }

    /// Resolves a session by name against the latest snapshot.
    pub async fn resolve(&self, name: &str) -> Result<Option<SessionRecord>, BrowserError> {
        let (tx, rx) = oneshot::channel();
        self.send(DirectoryCommand::Resolve(name.to_string(), tx))?;
        rx.await.map_err(|_| BrowserError::Closed)
    }

    /// Subscribes to published views. The receiver starts at the latest one.
    pub fn subscribe(&self) -> watch::Receiver<ViewUpdate> {
        self.views.clone()
    }

    /// Latest published update without waiting.
    pub fn latest(&self) -> ViewUpdate {
        self.views.borrow().clone()
    }

    /// Stops the task. Pending and later calls fail with [`BrowserError::Closed`].
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.commands.is_closed()
    }

    fn send(&self, command: DirectoryCommand) -> Result<(), BrowserError> {
        if self.cancel.is_cancelled() {
            return Err(BrowserError::Closed);
        }
        self.commands.send(command).map_err(|_| BrowserError::Closed)
    }
}

/// Owner of the directory task. Dropping it tears the task down, so no tick
/// can outlive the view that owns it.
#[derive(Debug)]
pub struct DirectoryTask {
    handle: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl DirectoryTask {
    /// Spawns the directory task on the current tokio runtime.
    ///
    /// `source` is the session source feed; every item replaces the
    /// snapshot. Pass [`futures::stream::pending`] when snapshots arrive
    /// only through [`DirectoryHandle::ingest_snapshot`]. The source ending
    /// is not an error.
    pub fn spawn<T, S>(filter: SessionFilter, ticks: T, source: S) -> (DirectoryHandle, Self)
    where
        T: TickSource,
        S: Stream<Item = Snapshot> + Send + 'static,
    {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (views_tx, views_rx) = watch::channel(ViewUpdate::initial());
        let cancel = CancellationToken::new();

        let worker = DirectoryWorker {
            directory: SessionDirectory::with_filter(filter),
            views: views_tx,
            revision: 0,
        };
        let handle = tokio::spawn(worker.run(
            commands_rx,
            source.boxed(),
            ticks,
            cancel.clone(),
        ));

        let directory = DirectoryHandle {
            commands: commands_tx,
            views: views_rx,
            cancel: cancel.clone(),
        };
        (
            directory,
            Self {
                handle: Some(handle),
                cancel,
            },
        )
    }

    /// Cancels the task and waits until it has stopped.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for DirectoryTask {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

struct DirectoryWorker {
    directory: SessionDirectory,
    views: watch::Sender<ViewUpdate>,
    revision: u64,
}

impl DirectoryWorker {
    async fn run<T: TickSource>(
        mut self,
        mut commands: mpsc::UnboundedReceiver<DirectoryCommand>,
        mut source: BoxStream<'static, Snapshot>,
        mut ticks: T,
        cancel: CancellationToken,
    ) {
        let mut source_live = true;
        let mut ticks_live = true;
        debug!(target: "lobby::directory", "directory task started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    // Every handle dropped.
                    None => break,
                },
                snapshot = source.next(), if source_live => match snapshot {
                    Some(snapshot) => {
                        debug!(target: "lobby::directory", sessions = snapshot.len(), "snapshot received");
                        let view = self.directory.ingest_snapshot(snapshot);
                        self.publish(RecomputeCause::Snapshot, view);
                    }
                    None => {
                        info!(target: "lobby::directory", "session source ended");
                        source_live = false;
                    }
                },
                tick = ticks.next_tick(), if ticks_live => match tick {
                    Some(()) => {
                        let view = self.directory.tick();
                        self.publish(RecomputeCause::Tick, view);
                    }
                    None => ticks_live = false,
                },
            }
        }

        debug!(target: "lobby::directory", revision = self.revision, "directory task stopped");
    }

    fn handle(&mut self, command: DirectoryCommand) {
        match command {
            DirectoryCommand::Ingest(snapshot) => {
                let view = self.directory.ingest_snapshot(snapshot);
                self.publish(RecomputeCause::Snapshot, view);
            }
            DirectoryCommand::SetFilter(filter) => {
                debug!(target: "lobby::directory", ?filter, "filter changed");
                let view = self.directory.set_filter(filter);
                self.publish(RecomputeCause::Filter, view);
            }
            DirectoryCommand::Refresh => {
                let view = self.directory.recompute();
                self.publish(RecomputeCause::Refresh, view);
            }
            DirectoryCommand::CurrentView(reply) => {
                let _ = reply.send(self.directory.current_view());
            }
            DirectoryCommand::Resolve(name, reply) => {
                let _ = reply.send(self.directory.resolve(&name));
            }
        }
    }

    fn publish(&mut self, cause: RecomputeCause, view: ViewState) {
        self.revision += 1;
        self.views.send_replace(ViewUpdate {
            revision: self.revision,
            cause,
            view,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticker::{manual_ticks, NoTicks};
    use futures::stream;

    fn rooms() -> Snapshot {
        Snapshot::new(vec![
            SessionRecord::new("Room_42", "eu", 3, 10),
            SessionRecord::new("alpha", "us", 10, 10),
            SessionRecord::new("Beta", "eu", 1, 10),
        ])
    }

    #[tokio::test]
    async fn commands_are_applied_in_order() {
        let (directory, _task) = DirectoryTask::spawn(SessionFilter::any(), NoTicks, stream::pending());

        directory.ingest_snapshot(rooms()).unwrap();
        directory.set_filter(SessionFilter::from_inputs("", "eu")).unwrap();
        let view = directory.current_view().await.unwrap();

        assert_eq!(view.names(), vec!["Beta", "Room_42"]);
        assert_eq!(directory.latest().revision, 2);
        assert_eq!(directory.latest().cause, RecomputeCause::Filter);
    }

    #[tokio::test]
    async fn source_items_replace_snapshot() {
        let second = Snapshot::new(vec![SessionRecord::new("gamma", "kr", 0, 4)]);
        let source = stream::iter(vec![rooms(), second]);
        let (directory, _task) = DirectoryTask::spawn(SessionFilter::any(), NoTicks, source);

        let mut views = directory.subscribe();
        views
            .wait_for(|update| update.revision == 2)
            .await
            .unwrap();

        assert_eq!(directory.resolve("alpha").await.unwrap(), None);
        assert!(directory.resolve("gamma").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn ticks_republish_without_new_data() {
        let (ticks, tick_handle) = manual_ticks();
        let (directory, _task) = DirectoryTask::spawn(SessionFilter::any(), ticks, stream::pending());
        directory.ingest_snapshot(rooms()).unwrap();

        let mut views = directory.subscribe();
        views.wait_for(|update| update.revision == 1).await.unwrap();

        tick_handle.tick();
        let update = views
            .wait_for(|update| update.revision == 2)
            .await
            .unwrap()
            .clone();
        assert_eq!(update.cause, RecomputeCause::Tick);
        assert_eq!(update.view.names(), vec!["Beta", "Room_42", "alpha"]);
    }

    #[tokio::test]
    async fn shutdown_stops_ticks_and_rejects_calls() {
        let (ticks, tick_handle) = manual_ticks();
        let (directory, task) = DirectoryTask::spawn(SessionFilter::any(), ticks, stream::pending());

        task.shutdown().await;

        assert!(!tick_handle.tick());
        assert!(directory.is_closed());
        assert_eq!(directory.ingest_snapshot(rooms()), Err(BrowserError::Closed));
        assert_eq!(directory.current_view().await, Err(BrowserError::Closed));
    }

    #[tokio::test]
    async fn dropping_task_guard_aborts_worker() {
        let (ticks, tick_handle) = manual_ticks();
        let (directory, task) = DirectoryTask::spawn(SessionFilter::any(), ticks, stream::pending());
        drop(task);

        assert_eq!(directory.resolve("x").await, Err(BrowserError::Closed));
        // The tick receiver goes away with the worker.
        tick_handle.closed().await;
        assert!(!tick_handle.tick());
    }

    #[tokio::test]
    async fn refresh_recomputes_on_request() {
        let (directory, _task) = DirectoryTask::spawn(SessionFilter::any(), NoTicks, stream::pending());
        directory.refresh().unwrap();
        let mut views = directory.subscribe();
        let update = views.wait_for(|update| update.revision == 1).await.unwrap().clone();
        assert_eq!(update.cause, RecomputeCause::Refresh);
        assert!(update.view.is_empty());
    }
}
