//! User-facing lobby status notices.

use std::fmt;

use tokio::sync::mpsc;

/// Channel on which joiners and the [`JoinCoordinator`](crate::join::JoinCoordinator)
/// report status changes. Closed receivers are ignored by senders.
pub type StatusSink = mpsc::UnboundedSender<LobbyStatus>;

/// Receiving end of a [`StatusSink`].
pub type StatusStream = mpsc::UnboundedReceiver<LobbyStatus>;

pub fn status_channel() -> (StatusSink, StatusStream) {
    mpsc::unbounded_channel()
}

/// Something the status line should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyStatus {
    AwaitingSelection,
    QuickJoinSearching,
    Creating { room: String },
    Joining { room: String },
    MissingRoomName,
    /// The selected session is no longer in the latest snapshot.
    SelectionStale { room: String },
    /// Another join is still in flight; the request was dropped.
    JoinPending,
    JoinSucceeded { room: String },
    JoinFailed { reason: String },
    ConnectedToServer,
    ConnectFailed { reason: String },
    Disconnected { reason: String },
    PlayerJoined { player: u32 },
    PlayerLeft { player: u32 },
    Shutdown { reason: String },
}

impl fmt::Display for LobbyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingSelection => f.write_str("Please make a selection..."),
            Self::QuickJoinSearching => f.write_str("Quick join: searching for or creating a game..."),
            Self::Creating { room } => write!(f, "Creating game \"{room}\"..."),
            Self::Joining { room } => write!(f, "Joining game \"{room}\"..."),
            Self::MissingRoomName => f.write_str("Please enter a room name!"),
            Self::SelectionStale { room } => write!(f, "Game \"{room}\" is no longer available."),
            Self::JoinPending => f.write_str("A join is already in progress."),
            Self::JoinSucceeded { room } => write!(f, "Joined game \"{room}\"."),
            Self::JoinFailed { reason } => write!(f, "Join failed: {reason}"),
            Self::ConnectedToServer => f.write_str("Connected to server."),
            Self::ConnectFailed { reason } => write!(f, "Connection failed: {reason}"),
            Self::Disconnected { reason } => write!(f, "Disconnected: {reason}"),
            Self::PlayerJoined { player } => write!(f, "Player joined: Player {player}"),
            Self::PlayerLeft { player } => write!(f, "Player left: Player {player}"),
            Self::Shutdown { reason } => write!(f, "Session ended: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_texts() {
        assert_eq!(
            LobbyStatus::Creating { room: "Room_1234".into() }.to_string(),
            "Creating game \"Room_1234\"..."
        );
        assert_eq!(
            LobbyStatus::PlayerLeft { player: 3 }.to_string(),
            "Player left: Player 3"
        );
        assert_eq!(LobbyStatus::MissingRoomName.to_string(), "Please enter a room name!");
    }
}
