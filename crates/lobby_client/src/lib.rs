//! Session browser client.
//!
//! - directory: pure snapshot + filter -> view derivation
//! - browser: single-owner task publishing views on a watch channel
//! - ticker: refresh tick sources (interval, manual)
//! - join: join coordinator and lobby actions
//! - status: user-facing status notices
//! - discovery: LAN session source
//! - announcer: LAN broadcast of a hosted session
//! - runtime: tokio runtime wrapper

pub mod announcer;
pub mod browser;
pub mod directory;
pub mod discovery;
pub mod join;
pub mod runtime;
pub mod status;
pub mod ticker;

pub use announcer::SessionAnnouncer;
pub use browser::{BrowserError, DirectoryHandle, DirectoryTask, RecomputeCause, ViewUpdate};
pub use directory::{derive_view, SessionDirectory};
pub use discovery::{AdvertisementRegistry, DiscoveryError, LanSessionSource};
pub use join::{
    random_room_name, JoinCoordinator, JoinError, JoinFailure, JoinRequest, JoinTicket,
    JoinedSession, SessionJoiner,
};
pub use runtime::{ClientRuntime, RuntimeError};
pub use status::{status_channel, LobbyStatus, StatusSink, StatusStream};
pub use ticker::{manual_ticks, IntervalTicks, ManualTickHandle, ManualTicks, NoTicks, TickSource};
