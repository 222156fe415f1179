//! Join coordination and lobby actions.
//!
//! The actual session connection is delegated to a [`SessionJoiner`]. The
//! [`JoinCoordinator`] turns user actions (pick from list, quick join, host,
//! join by name) into [`JoinRequest`]s, allows at most one join in flight and
//! reports progress on a [`StatusSink`].

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use futures::future::BoxFuture;
use lobby_shared::{LobbyConfig, RegionPreference};
use rand::Rng;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    browser::{BrowserError, DirectoryHandle},
    status::{LobbyStatus, StatusSink},
};

/// Everything a joiner needs to enter (or create) a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    /// `None` lets the matchmaker pick any open session.
    pub session_name: Option<String>,
    pub region: RegionPreference,
    /// Create the session if it does not exist.
    pub allow_create: bool,
    pub max_players: u16,
    pub app_version: String,
}

/// A session the local player ended up in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedSession {
    pub name: String,
    pub region: String,
}

/// Why a joiner could not enter a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinFailure {
    #[error("connection failed: {0}")]
    Connectivity(String),
    #[error("session is full")]
    SessionFull,
    #[error("session no longer exists")]
    SessionClosed,
    #[error("{0}")]
    Other(String),
}

/// Rejections raised before a join is handed to the joiner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("session '{0}' is not in the latest snapshot")]
    StaleSelection(String),
    #[error("another join is still pending")]
    JoinPending,
    #[error("room name is empty")]
    MissingRoomName,
    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// Connects the local player to a session.
///
/// Implementations may push lifecycle notices (connected, player joined, ...)
/// onto the provided sink. Failures are reported once and never retried by
/// the caller.
pub trait SessionJoiner: Send + Sync + 'static {
    fn join(
        &self,
        request: JoinRequest,
        status: StatusSink,
    ) -> BoxFuture<'static, Result<JoinedSession, JoinFailure>>;
}

/// Pending join started by the coordinator.
#[derive(Debug)]
pub struct JoinTicket {
    handle: JoinHandle<Result<JoinedSession, JoinFailure>>,
}

impl JoinTicket {
    /// Waits for the join outcome.
    pub async fn wait(self) -> Result<JoinedSession, JoinFailure> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) => Err(JoinFailure::Other(format!("join task aborted: {err}"))),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Marks a join as in flight; released on drop.
struct PendingSlot(Arc<AtomicBool>);

impl PendingSlot {
    fn try_claim(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Issues joins on behalf of the lobby UI.
#[derive(Clone)]
pub struct JoinCoordinator {
    directory: DirectoryHandle,
    joiner: Arc<dyn SessionJoiner>,
    status: StatusSink,
    pending: Arc<AtomicBool>,
    app_version: String,
    max_players: u16,
}

impl std::fmt::Debug for JoinCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinCoordinator")
            .field("pending", &self.is_pending())
            .field("app_version", &self.app_version)
            .field("max_players", &self.max_players)
            .finish_non_exhaustive()
    }
}

impl JoinCoordinator {
    pub fn new(
        directory: DirectoryHandle,
        joiner: Arc<dyn SessionJoiner>,
        status: StatusSink,
        config: &LobbyConfig,
    ) -> Self {
        let _ = status.send(LobbyStatus::AwaitingSelection);
        Self {
            directory,
            joiner,
            status,
            pending: Arc::new(AtomicBool::new(false)),
            app_version: config.app_version.clone(),
            max_players: config.default_max_players,
        }
    }

    /// `true` while a join is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Joins a session picked from the list.
    ///
    /// The name is resolved against the latest snapshot, not the view it was
    /// picked from. A session that has disappeared is reported as stale and
    /// the joiner is never called.
    pub async fn join_selected(&self, name: &str) -> Result<JoinTicket, JoinError> {
        let slot = self.claim()?;
        let Some(record) = self.directory.resolve(name).await? else {
            warn!(target: "lobby::join", session = name, "selection is stale");
            self.report(LobbyStatus::SelectionStale {
                room: name.to_string(),
            });
            return Err(JoinError::StaleSelection(name.to_string()));
        };

        self.report(LobbyStatus::Joining {
            room: record.name.clone(),
        });
        let request = JoinRequest {
            session_name: Some(record.name),
            region: RegionPreference::from_input(Some(&record.region)),
            allow_create: false,
            max_players: self.max_players,
            app_version: self.app_version.clone(),
        };
        Ok(self.dispatch(request, slot))
    }

    /// Joins any open session, creating one if none exists.
    pub fn quick_join(&self, region_text: &str) -> Result<JoinTicket, JoinError> {
        let slot = self.claim()?;
        self.report(LobbyStatus::QuickJoinSearching);
        let request = self.request(None, region_text, true);
        Ok(self.dispatch(request, slot))
    }

    /// Hosts (or joins, if it already exists) a named session. A blank name
    /// gets a random `Room_NNNN` name.
    pub fn host(&self, room_name: &str, region_text: &str) -> Result<JoinTicket, JoinError> {
        let slot = self.claim()?;
        let room = match room_name.trim() {
            "" => random_room_name(),
            name => name.to_string(),
        };
        self.report(LobbyStatus::Creating { room: room.clone() });
        let request = self.request(Some(room), region_text, true);
        Ok(self.dispatch(request, slot))
    }

    /// Joins an existing session by typed name.
    pub fn join_by_name(&self, room_name: &str, region_text: &str) -> Result<JoinTicket, JoinError> {
        let room = room_name.trim();
        if room.is_empty() {
            self.report(LobbyStatus::MissingRoomName);
            return Err(JoinError::MissingRoomName);
        }
        let slot = self.claim()?;
        self.report(LobbyStatus::Joining {
            room: room.to_string(),
        });
        let request = self.request(Some(room.to_string()), region_text, false);
        Ok(self.dispatch(request, slot))
    }

    fn request(&self, session_name: Option<String>, region_text: &str, allow_create: bool) -> JoinRequest {
        JoinRequest {
            session_name,
            region: RegionPreference::from_input(Some(region_text)),
            allow_create,
            max_players: self.max_players,
            app_version: self.app_version.clone(),
        }
    }

    fn claim(&self) -> Result<PendingSlot, JoinError> {
        PendingSlot::try_claim(&self.pending).ok_or_else(|| {
            debug!(target: "lobby::join", "join request ignored, another one is pending");
            self.report(LobbyStatus::JoinPending);
            JoinError::JoinPending
        })
    }

    fn dispatch(&self, request: JoinRequest, slot: PendingSlot) -> JoinTicket {
        info!(
            target: "lobby::join",
            session = request.session_name.as_deref().unwrap_or("<any>"),
            region = %request.region,
            allow_create = request.allow_create,
            "join requested"
        );
        let join = self.joiner.join(request, self.status.clone());
        let status = self.status.clone();

        let handle = tokio::spawn(async move {
            let outcome = join.await;
            match &outcome {
                Ok(session) => {
                    info!(target: "lobby::join", session = %session.name, region = %session.region, "joined session");
                    let _ = status.send(LobbyStatus::JoinSucceeded {
                        room: session.name.clone(),
                    });
                }
                Err(failure) => {
                    warn!(target: "lobby::join", %failure, "join failed");
                    let _ = status.send(LobbyStatus::JoinFailed {
                        reason: failure.to_string(),
                    });
                }
            }
            drop(slot);
            outcome
        });
        JoinTicket { handle }
    }

    fn report(&self, status: LobbyStatus) {
        let _ = self.status.send(status);
    }
}

/// Random fallback room name, `Room_1000` to `Room_9999`.
pub fn random_room_name() -> String {
    format!("Room_{}", rand::thread_rng().gen_range(1000..=9999))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_room_names_stay_in_range() {
        for _ in 0..200 {
            let name = random_room_name();
            let number: u32 = name.strip_prefix("Room_").unwrap().parse().unwrap();
            assert!((1000..=9999).contains(&number), "{name}");
        }
    }

    #[test]
    fn pending_slot_is_exclusive_and_released_on_drop() {
        let flag = Arc::new(AtomicBool::new(false));
        let slot = PendingSlot::try_claim(&flag).unwrap();
        assert!(PendingSlot::try_claim(&flag).is_none());
        drop(slot);
        assert!(PendingSlot::try_claim(&flag).is_some());
    }
}
