//! LAN session source.
//!
//! A listener receives the hosts' broadcast packets, tracks when each
//! endpoint was last heard from and hands a full [`Snapshot`] to the session
//! browser on every change. Sessions silent for longer than the TTL drop out
//! of the list.

use std::{
    collections::BTreeMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use futures::{stream, Stream};
use lobby_shared::{
    discovery::{
        decode_advertisement, AdvertisementDecodeError, AdvertisementEncodeError,
        MAX_ADVERTISEMENT_SIZE,
    },
    LanConfig, SessionRecord, Snapshot,
};
use thiserror::Error;
use tokio::{
    net::UdpSocket,
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

/// Errors raised by the LAN source and announcer.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("advertisement error: {0}")]
    Advertisement(#[from] AdvertisementEncodeError),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone)]
struct KnownSession {
    record: SessionRecord,
    last_seen: Instant,
}

/// Known sessions keyed by endpoint (sender ip + advertised port).
///
/// No I/O; callers pass the current time in.
#[derive(Debug, Clone)]
pub struct AdvertisementRegistry {
    entries: BTreeMap<SocketAddr, KnownSession>,
    ttl: Duration,
}

impl AdvertisementRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            ttl,
        }
    }

    /// Records a received advertisement. Returns `true` if the visible list
    /// changed (new session or different record).
    pub fn observe(&mut self, endpoint: SocketAddr, record: SessionRecord, now: Instant) -> bool {
        match self.entries.get_mut(&endpoint) {
            Some(known) => {
                known.last_seen = now;
                if known.record == record {
                    false
                } else {
                    known.record = record;
                    true
                }
            }
            None => {
                self.entries.insert(endpoint, KnownSession { record, last_seen: now });
                true
            }
        }
    }

    /// Drops entries not seen within the TTL. Returns `true` if any went.
    pub fn prune(&mut self, now: Instant) -> bool {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|endpoint, known| {
            let alive = now.saturating_duration_since(known.last_seen) <= ttl;
            if !alive {
                debug!(target: "lobby::discovery", %endpoint, session = %known.record.name, "LAN session expired");
            }
            alive
        });
        self.entries.len() != before
    }

    /// Full snapshot ordered by endpoint.
    pub fn snapshot(&self) -> Snapshot {
        self.entries.values().map(|known| known.record.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Session source fed by LAN advertisements.
///
/// The background task is aborted on drop.
#[derive(Debug)]
pub struct LanSessionSource {
    handle: JoinHandle<()>,
    snapshots: mpsc::UnboundedReceiver<Snapshot>,
}

impl LanSessionSource {
    /// Binds the LAN port and starts the listener on the current runtime.
    pub fn spawn(config: &LanConfig) -> Result<Self, DiscoveryError> {
        if config.port == 0 {
            return Err(DiscoveryError::InvalidConfig("lan.port must not be 0".into()));
        }
        if config.entry_ttl_ms == 0 || config.prune_interval_ms == 0 {
            return Err(DiscoveryError::InvalidConfig(
                "lan ttl and prune interval must be greater than 0".into(),
            ));
        }

        let socket = bind_lan_socket(config.port)?;
        info!(target: "lobby::discovery", port = config.port, "LAN session source listening");
        Ok(Self::with_socket(socket, config.entry_ttl(), config.prune_interval()))
    }

    /// Starts the listener on an already bound socket.
    pub fn with_socket(socket: UdpSocket, ttl: Duration, prune_interval: Duration) -> Self {
        let (tx, snapshots) = mpsc::unbounded_channel();
        let handle = tokio::spawn(listen(socket, AdvertisementRegistry::new(ttl), prune_interval, tx));
        Self { handle, snapshots }
    }

    /// Next snapshot, or `None` once the listener has stopped.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.snapshots.recv().await
    }

    /// Turns the source into a stream for the directory task. The listener
    /// lives as long as the stream.
    pub fn into_stream(self) -> impl Stream<Item = Snapshot> + Send + 'static {
        stream::unfold(self, |mut source| async move {
            source.recv().await.map(|snapshot| (snapshot, source))
        })
    }
}

impl Drop for LanSessionSource {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn listen(
    socket: UdpSocket,
    mut registry: AdvertisementRegistry,
    prune_interval: Duration,
    snapshots: mpsc::UnboundedSender<Snapshot>,
) {
    let mut buf = [0u8; MAX_ADVERTISEMENT_SIZE];
    let mut prune_tick = time::interval_at(Instant::now() + prune_interval, prune_interval);
    prune_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let changed = tokio::select! {
            result = socket.recv_from(&mut buf) => match result {
                Ok((len, source)) => handle_datagram(&buf[..len], source, &mut registry),
                Err(err) => {
                    warn!(target: "lobby::discovery", %err, "LAN discovery recv error");
                    time::sleep(Duration::from_millis(200)).await;
                    false
                }
            },
            _ = prune_tick.tick() => registry.prune(Instant::now()),
            () = snapshots.closed() => break,
        };

        if changed && snapshots.send(registry.snapshot()).is_err() {
            break;
        }
    }
    debug!(target: "lobby::discovery", "LAN session source stopped");
}

/// Handles one datagram. Foreign packets (wrong magic) are dropped silently.
fn handle_datagram(bytes: &[u8], source: SocketAddr, registry: &mut AdvertisementRegistry) -> bool {
    let advertisement = match decode_advertisement(bytes) {
        Ok(advertisement) => advertisement,
        Err(AdvertisementDecodeError::InvalidMagic) => return false,
        Err(err) => {
            warn!(target: "lobby::discovery", %source, %err, "failed to decode LAN advertisement");
            return false;
        }
    };

    if !advertisement.is_compatible() {
        debug!(
            target: "lobby::discovery",
            %source,
            version = advertisement.version,
            "ignoring advertisement with incompatible protocol version"
        );
        return false;
    }

    let endpoint = SocketAddr::new(source.ip(), advertisement.port);
    let changed = registry.observe(endpoint, advertisement.record, Instant::now());
    if changed {
        debug!(target: "lobby::discovery", %endpoint, "LAN session updated");
    }
    changed
}

fn bind_lan_socket(port: u16) -> Result<UdpSocket, DiscoveryError> {
    let std_socket = std::net::UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))?;
    std_socket.set_nonblocking(true)?;
    std_socket.set_broadcast(true)?;
    UdpSocket::from_std(std_socket).map_err(DiscoveryError::from)
}
