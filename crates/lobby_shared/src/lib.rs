//! Shared session-browser types for lobby clients and hosts.
//!
//! This crate hosts the primitives every participant agrees on:
//! - session: advertised session records, snapshots and derived view states
//! - region: matchmaking regions, region filters and join routing preferences
//! - filter: user-facing list filters (name substring + region)
//! - discovery: LAN advertisement packets (magic + bincode payload)
//! - config: TOML-backed configuration for browser, LAN source and announcer
//!
//! Keep this crate free of async runtimes; tasks live in `lobby_client`.

pub mod config;
pub mod discovery;
pub mod filter;
pub mod region;
pub mod serialization;
pub mod session;

/// App version sent with every join request.
pub const DEFAULT_APP_VERSION: &str = "1.0.0";

/// Session size requested when hosting or quick-joining.
pub const DEFAULT_MAX_PLAYERS: u16 = 10;

pub use config::{BrowserConfig, ConfigError, LanConfig, LobbyConfig};
pub use filter::SessionFilter;
pub use region::{Region, RegionFilter, RegionPreference, ALL_REGIONS};
pub use session::{SessionRecord, Snapshot, ViewState};

/// Convenience prelude for downstream crates.
pub mod prelude {
    pub use crate::discovery::{SessionAdvertisement, CURRENT_PROTOCOL_VERSION};
    pub use crate::filter::SessionFilter;
    pub use crate::region::{Region, RegionFilter, RegionPreference};
    pub use crate::session::{SessionRecord, Snapshot, ViewState};
}
