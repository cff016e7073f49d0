use futures::{AsyncReadExt, AsyncWriteExt, StreamExt};
use libp2p::multiaddr::Protocol;
use libp2p::swarm::{Config as SwarmConfig, SwarmEvent};
use libp2p::{Multiaddr, PeerId, Stream, Swarm};
use tokio::sync::mpsc;

use super::behavior::{ProgressBehaviorEvent, build_behavior};
use super::transport::build_transport;
use super::PROGRESS_PROTOCOL;
use crate::common::types::ProgressMessage;
use crate::common::NetworkEvent;
use crate::error::ListenError;
use crate::identity;

/// Listens for inbound progress update streams and surfaces them as
/// [`NetworkEvent`]s on the channel given at construction.
pub struct ProgressListener {
    port: u16,
    seed: Option<u64>,
    event_sender: mpsc::Sender<NetworkEvent>,
}

impl ProgressListener {
    pub fn new(port: u16, seed: Option<u64>, event_sender: mpsc::Sender<NetworkEvent>) -> Self {
        Self {
            port,
            seed,
            event_sender,
        }
    }

    /// Bind, register the progress protocol, then serve inbound streams
    /// until the task is cancelled. Only startup failures return an error;
    /// once listening this never returns `Ok`.
    pub async fn run(self) -> Result<(), ListenError> {
        let local_key = identity::make_keypair(self.seed)?;
        let local_peer_id = PeerId::from(local_key.public());
        log::info!("Local PeerID: {local_peer_id}");

        let transport = build_transport(&local_key)?;
        let behavior = build_behavior(&local_key);

        let mut swarm = Swarm::new(
            transport,
            behavior,
            local_peer_id,
            SwarmConfig::with_tokio_executor(),
        );

        // Register before listening so no early stream is dropped.
        let mut incoming = swarm
            .behaviour()
            .stream
            .new_control()
            .accept(PROGRESS_PROTOCOL)?;

        let listen_addr: Multiaddr = format!("/ip4/0.0.0.0/tcp/{}", self.port)
            .parse()
            .map_err(|err: libp2p::multiaddr::Error| ListenError::Bind {
                port: self.port,
                cause: err.to_string(),
            })?;
        swarm.listen_on(listen_addr).map_err(|err| ListenError::Bind {
            port: self.port,
            cause: err.to_string(),
        })?;

        // The first listen address confirms the port is actually bound;
        // a listener failure before that is fatal.
        loop {
            match swarm.select_next_some().await {
                SwarmEvent::NewListenAddr { address, .. } => {
                    self.emit_listening(local_peer_id, address).await;
                    break;
                }
                SwarmEvent::ListenerError { error, .. } => {
                    return Err(ListenError::Bind {
                        port: self.port,
                        cause: error.to_string(),
                    });
                }
                SwarmEvent::ListenerClosed {
                    reason: Err(error), ..
                } => {
                    return Err(ListenError::Bind {
                        port: self.port,
                        cause: error.to_string(),
                    });
                }
                _ => {}
            }
        }

        log::info!("Listener event loop started");

        loop {
            tokio::select! {
                Some((peer, stream)) = incoming.next() => {
                    let events = self.event_sender.clone();
                    tokio::spawn(handle_stream(peer, stream, events));
                }
                event = swarm.select_next_some() => {
                    self.handle_swarm_event(event, local_peer_id).await;
                }
            }
        }
    }

    async fn handle_swarm_event(
        &self,
        event: SwarmEvent<ProgressBehaviorEvent>,
        local_peer_id: PeerId,
    ) {
        match event {
            SwarmEvent::NewListenAddr { address, .. } => {
                self.emit_listening(local_peer_id, address).await;
            }
            SwarmEvent::ConnectionEstablished { peer_id, .. } => {
                log::info!("Peer connected: {peer_id}");
            }
            SwarmEvent::ConnectionClosed { peer_id, .. } => {
                log::info!("Peer disconnected: {peer_id}");
            }
            SwarmEvent::Behaviour(ProgressBehaviorEvent::Identify(event)) => {
                log::debug!("Identify event: {event:?}");
            }
            _ => {}
        }
    }

    async fn emit_listening(&self, local_peer_id: PeerId, address: Multiaddr) {
        let full_addr = address.with(Protocol::P2p(local_peer_id));
        log::info!("Listening on {full_addr}");
        if let Err(err) = self
            .event_sender
            .send(NetworkEvent::Listening {
                peer_id: local_peer_id,
                address: full_addr,
            })
            .await
        {
            log::warn!("Failed to emit listening event: {err}");
        }
    }
}

/// One-way handler, one invocation per inbound stream.
/// Read until the peer closes, surface the result, close. Never write.
async fn handle_stream(peer: PeerId, mut stream: Stream, events: mpsc::Sender<NetworkEvent>) {
    let mut payload = Vec::new();
    match stream.read_to_end(&mut payload).await {
        // Stream opened and closed without a payload; nothing to surface.
        Ok(0) => {}
        Ok(_) => match ProgressMessage::from_bytes(&payload) {
            Ok(message) => {
                if let Err(err) = events
                    .send(NetworkEvent::ProgressReceived { peer, message })
                    .await
                {
                    log::warn!("Failed to emit progress event: {err}");
                }
            }
            Err(error) => {
                log::warn!("Invalid progress payload from {peer}: {error}");
                let _ = events.send(NetworkEvent::ReceiveFailed { peer, error }).await;
            }
        },
        Err(err) => {
            log::warn!("Failed to read progress stream from {peer}: {err}");
        }
    }

    // Best-effort close; a close failure never outranks what was already
    // reported above.
    if let Err(err) = stream.close().await {
        log::debug!("Failed to close stream from {peer}: {err}");
    }
}
