//! LAN announcer for hosted sessions.
//!
//! Broadcasts the session's advertisement periodically so other clients find
//! it through their [`LanSessionSource`](crate::discovery::LanSessionSource).
//! Player count and other fields can change while it runs.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use lobby_shared::{
    discovery::{encode_advertisement, SessionAdvertisement},
    LanConfig, SessionRecord,
};
use tokio::{net::UdpSocket, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::discovery::DiscoveryError;

/// Background task sending session packets. Aborted on drop.
#[derive(Debug)]
pub struct SessionAnnouncer {
    advertisement: Arc<RwLock<SessionAdvertisement>>,
    payload: Arc<RwLock<Vec<u8>>>,
    handle: JoinHandle<()>,
}

impl SessionAnnouncer {
    /// Starts broadcasting to `255.255.255.255:<lan.port>` on the current runtime.
    ///
    /// Fails if the encoded advertisement would not fit a listener's receive
    /// buffer.
    pub fn spawn(config: &LanConfig, advertisement: SessionAdvertisement) -> Result<Self, DiscoveryError> {
        if config.port == 0 {
            return Err(DiscoveryError::InvalidConfig("lan.port must not be 0".into()));
        }
        if config.announce_interval_ms == 0 {
            return Err(DiscoveryError::InvalidConfig(
                "lan.announce_interval_ms must be greater than 0".into(),
            ));
        }

        let payload = Arc::new(RwLock::new(encode_advertisement(&advertisement)?));
        let socket = create_broadcast_socket()?;
        let target = SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), config.port);
        info!(
            target: "lobby::discovery",
            session = %advertisement.record.name,
            port = config.port,
            "announcing hosted session"
        );

        let handle = tokio::spawn(broadcast(
            socket,
            target,
            config.announce_interval(),
            payload.clone(),
        ));

        Ok(Self {
            advertisement: Arc::new(RwLock::new(advertisement)),
            payload,
            handle,
        })
    }

    /// Copy of the advertisement currently sent.
    pub fn advertisement(&self) -> SessionAdvertisement {
        self.advertisement
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the advertised record. An oversized record is rejected and
    /// the previous one keeps being sent.
    pub fn update_record(&self, record: SessionRecord) -> Result<(), DiscoveryError> {
        self.update(|advertisement| advertisement.record = record)
    }

    /// Updates the occupied slots.
    pub fn set_player_count(&self, player_count: u32) -> Result<(), DiscoveryError> {
        self.update(|advertisement| advertisement.record.player_count = player_count)
    }

    fn update(&self, apply: impl FnOnce(&mut SessionAdvertisement)) -> Result<(), DiscoveryError> {
        let mut advertisement = self
            .advertisement
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = advertisement.clone();
        apply(&mut next);
        let encoded = encode_advertisement(&next)?;

        *advertisement = next;
        *self.payload.write().unwrap_or_else(PoisonError::into_inner) = encoded;
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SessionAnnouncer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn broadcast(socket: UdpSocket, target: SocketAddr, period: Duration, payload: Arc<RwLock<Vec<u8>>>) {
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        let bytes = payload.read().unwrap_or_else(PoisonError::into_inner).clone();
        if bytes.is_empty() {
            continue;
        }
        match socket.send_to(&bytes, target).await {
            Ok(_) => debug!(target: "lobby::discovery", %target, "LAN advertisement sent"),
            Err(err) => warn!(target: "lobby::discovery", %err, "LAN broadcast failed"),
        }
    }
}

fn create_broadcast_socket() -> Result<UdpSocket, DiscoveryError> {
    let std_socket = std::net::UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0))?;
    std_socket.set_nonblocking(true)?;
    std_socket.set_broadcast(true)?;
    UdpSocket::from_std(std_socket).map_err(DiscoveryError::from)
}
