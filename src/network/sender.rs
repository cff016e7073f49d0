use futures::{AsyncWriteExt, StreamExt};
use libp2p::swarm::{Config as SwarmConfig, SwarmEvent};
use libp2p::{PeerId, Swarm};
use tokio::time::{Duration, timeout};

use super::behavior::build_behavior;
use super::transport::build_transport;
use super::PROGRESS_PROTOCOL;
use crate::common::types::{Destination, ProgressMessage};
use crate::error::SendError;
use crate::identity;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const OPEN_TIMEOUT: Duration = Duration::from_secs(10);
const TEARDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Send a single progress update to `destination` and return once the
/// stream is closed. No acknowledgement is awaited and nothing is retried;
/// any failure aborts this one attempt.
pub async fn send_message(
    destination: &str,
    user: &str,
    lesson_id: &str,
    status: &str,
    seed: Option<u64>,
) -> Result<(), SendError> {
    let destination: Destination = destination.parse()?;

    let message = ProgressMessage::new(user, lesson_id, status);
    let payload = message.to_bytes().map_err(SendError::Encode)?;

    deliver(&destination, payload, seed).await
}

/// Deliver a raw payload over a fresh one-shot progress stream:
/// connect, open, write, close. Closing the stream is what marks the end
/// of the message for the receiver; there is no reply to wait for.
pub async fn deliver(
    destination: &Destination,
    payload: Vec<u8>,
    seed: Option<u64>,
) -> Result<(), SendError> {
    let local_key = identity::make_keypair(seed)?;
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

    let mut control = swarm.behaviour().stream.new_control();
    let target = destination.peer_id;

    swarm
        .dial(destination.dial_addr())
        .map_err(|err| SendError::Connect {
            peer: target,
            cause: err.to_string(),
        })?;

    // Drive the swarm until the connection to the target is up.
    let connected = async {
        loop {
            match swarm.select_next_some().await {
                SwarmEvent::ConnectionEstablished { peer_id, .. } if peer_id == target => {
                    break Ok(());
                }
                SwarmEvent::OutgoingConnectionError { peer_id, error, .. }
                    if peer_id == Some(target) =>
                {
                    break Err(SendError::Connect {
                        peer: target,
                        cause: error.to_string(),
                    });
                }
                _ => {}
            }
        }
    };
    timeout(CONNECT_TIMEOUT, connected)
        .await
        .map_err(|_| SendError::Connect {
            peer: target,
            cause: "timed out".to_owned(),
        })??;

    log::info!("Connected to {target}");

    // Stream negotiation needs the swarm polled alongside the request.
    let open = control.open_stream(target, PROGRESS_PROTOCOL);
    tokio::pin!(open);
    let opened = async {
        loop {
            tokio::select! {
                result = &mut open => break result,
                _ = swarm.select_next_some() => {}
            }
        }
    };
    let mut stream = match timeout(OPEN_TIMEOUT, opened).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(err)) => {
            return Err(SendError::StreamOpen {
                peer: target,
                cause: err.to_string(),
            });
        }
        Err(_) => {
            return Err(SendError::StreamOpen {
                peer: target,
                cause: "timed out".to_owned(),
            });
        }
    };

    let io = async {
        stream.write_all(&payload).await?;
        stream.close().await
    };
    tokio::pin!(io);
    loop {
        tokio::select! {
            result = &mut io => {
                result?;
                break;
            }
            _ = swarm.select_next_some() => {}
        }
    }

    // Yamux acks `close()` once the FIN is queued, before the payload has
    // necessarily reached the socket. Keep the connection alive until it is
    // torn down so the receiver sees a clean end-of-stream.
    let drained = async {
        loop {
            match swarm.select_next_some().await {
                SwarmEvent::ConnectionClosed { peer_id, .. } if peer_id == target => break,
                _ => {}
            }
        }
    };
    if timeout(TEARDOWN_TIMEOUT, drained).await.is_err() {
        log::debug!("Connection to {target} still open after close; leaving teardown to the peer");
    }

    log::info!("Progress update delivered to {target}");
    Ok(())
}
