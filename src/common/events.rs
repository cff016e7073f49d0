use libp2p::{Multiaddr, PeerId};

use super::types::ProgressMessage;
use crate::error::DecodeError;

/// Events the network layer surfaces to its caller.
#[derive(Debug)]
pub enum NetworkEvent {
    /// The listener is bound and reachable at `address` (includes the
    /// `/p2p/<peer>` suffix, ready to use as a send destination).
    Listening {
        peer_id: PeerId,
        address: Multiaddr,
    },
    /// A peer delivered a complete progress update.
    ProgressReceived {
        peer: PeerId,
        message: ProgressMessage,
    },
    /// A peer delivered a payload that did not decode. The stream was
    /// still closed cleanly.
    ReceiveFailed { peer: PeerId, error: DecodeError },
}
