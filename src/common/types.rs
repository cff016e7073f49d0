use std::str::FromStr;

use chrono::Utc;
use libp2p::multiaddr::Protocol;
use libp2p::{Multiaddr, PeerId};
use serde::{Deserialize, Serialize};

use crate::error::{AddressError, DecodeError};

/// A single one-shot progress update. Immutable once constructed; it is
/// created by the sender, serialized, and rebuilt on the receiving side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMessage {
    pub user: String,
    #[serde(rename = "lessonId")]
    pub lesson_id: String,
    pub status: String,
    /// Seconds since epoch, stamped at construction.
    pub timestamp: i64,
}

impl ProgressMessage {
    /// Build a message stamped with the current time.
    pub fn new(
        user: impl Into<String>,
        lesson_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            lesson_id: lesson_id.into(),
            status: status.into(),
            timestamp: Utc::now().timestamp(),
        }
    }

    /// Encode to the wire format: a JSON object with exactly the keys
    /// `user`, `lessonId`, `status` and an integer `timestamp`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Where a progress update goes: a dialable address plus the peer expected
/// to answer there. Parsed from a full multiaddr ending in `/p2p/<PeerId>`.
#[derive(Debug, Clone)]
pub struct Destination {
    pub peer_id: PeerId,
    pub address: Multiaddr,
}

impl Destination {
    /// The full multiaddr including the `/p2p/<PeerId>` suffix.
    pub fn dial_addr(&self) -> Multiaddr {
        self.address.clone().with(Protocol::P2p(self.peer_id))
    }
}

impl FromStr for Destination {
    type Err = AddressError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut address: Multiaddr = input.parse()?;
        match address.pop() {
            Some(Protocol::P2p(peer_id)) => Ok(Self { peer_id, address }),
            _ => Err(AddressError::MissingPeerId(input.to_owned())),
        }
    }
}
