use std::time::Duration;

use libp2p::PeerId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use learnfil_p2p::common::{Destination, NetworkEvent};
use learnfil_p2p::error::{ListenError, SendError};
use learnfil_p2p::network::{ProgressListener, deliver, send_message};

const EVENT_WAIT: Duration = Duration::from_secs(10);

/// Start a listener on an OS-assigned port and return its event stream
/// plus a ready-to-dial loopback destination string.
async fn start_listener(
    seed: u64,
) -> (
    mpsc::Receiver<NetworkEvent>,
    String,
    JoinHandle<Result<(), ListenError>>,
) {
    let (event_tx, mut event_rx) = mpsc::channel(16);
    let listener = ProgressListener::new(0, Some(seed), event_tx);
    let handle = tokio::spawn(listener.run());

    let destination = loop {
        let event = timeout(EVENT_WAIT, event_rx.recv())
            .await
            .expect("timed out waiting for listener to start")
            .expect("listener stopped before binding");
        match event {
            NetworkEvent::Listening { address, .. } => {
                let address = address.to_string();
                if address.contains("127.0.0.1") {
                    break address;
                }
            }
            other => panic!("unexpected event before listening: {other:?}"),
        }
    };

    (event_rx, destination, handle)
}

/// Next non-`Listening` event; further listen addresses may trickle in.
async fn next_receive_event(event_rx: &mut mpsc::Receiver<NetworkEvent>) -> NetworkEvent {
    loop {
        let event = timeout(EVENT_WAIT, event_rx.recv())
            .await
            .expect("timed out waiting for a receive event")
            .expect("listener stopped");
        if !matches!(event, NetworkEvent::Listening { .. }) {
            break event;
        }
    }
}

#[tokio::test]
async fn delivers_progress_update_over_loopback() {
    let (mut event_rx, destination, listener) = start_listener(1).await;

    let sent_at = chrono::Utc::now().timestamp();
    send_message(&destination, "alice", "lesson-001", "completed", Some(2))
        .await
        .expect("send failed");

    let message = match next_receive_event(&mut event_rx).await {
        NetworkEvent::ProgressReceived { message, .. } => message,
        other => panic!("unexpected event: {other:?}"),
    };

    assert_eq!(message.user, "alice");
    assert_eq!(message.lesson_id, "lesson-001");
    assert_eq!(message.status, "completed");
    assert!((message.timestamp - sent_at).abs() <= 5);

    listener.abort();
}

#[tokio::test]
async fn reports_decode_failure_and_stays_up() {
    let (mut event_rx, destination, listener) = start_listener(11).await;
    let parsed: Destination = destination.parse().unwrap();

    deliver(&parsed, b"not json".to_vec(), None)
        .await
        .expect("raw delivery failed");

    match next_receive_event(&mut event_rx).await {
        NetworkEvent::ReceiveFailed { .. } => {}
        other => panic!("unexpected event: {other:?}"),
    }

    // The listener must still accept well-formed updates afterwards.
    send_message(&destination, "bob", "lesson-002", "started", None)
        .await
        .expect("send after bad payload failed");

    match next_receive_event(&mut event_rx).await {
        NetworkEvent::ProgressReceived { message, .. } => {
            assert_eq!(message.user, "bob");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    listener.abort();
}

#[tokio::test]
async fn ignores_empty_inbound_payload() {
    let (mut event_rx, destination, listener) = start_listener(21).await;
    let parsed: Destination = destination.parse().unwrap();

    // A stream opened and closed without any bytes is a silent no-op.
    deliver(&parsed, Vec::new(), None)
        .await
        .expect("empty delivery failed");

    // The only surfaced event should be the follow-up message, not an
    // error for the empty stream.
    send_message(&destination, "carol", "lesson-003", "completed", None)
        .await
        .expect("send after empty stream failed");

    match next_receive_event(&mut event_rx).await {
        NetworkEvent::ProgressReceived { message, .. } => {
            assert_eq!(message.user, "carol");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    listener.abort();
}

#[tokio::test]
async fn unreachable_destination_is_a_connect_error() {
    let peer = PeerId::random();
    let destination = format!("/ip4/127.0.0.1/tcp/9/p2p/{peer}");

    let err = send_message(&destination, "alice", "lesson-001", "completed", None)
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::Connect { .. }), "got: {err}");
}

#[tokio::test]
async fn malformed_destination_is_an_address_error() {
    let err = send_message("not a multiaddr", "alice", "lesson-001", "completed", None)
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::Address(_)), "got: {err}");
}
