pub mod behavior;
pub mod listener;
pub mod sender;
pub mod transport;

use libp2p::StreamProtocol;

/// Protocol identifier for one-shot progress update streams.
pub const PROGRESS_PROTOCOL: StreamProtocol = StreamProtocol::new("/learnfil/progress/1.0.0");

pub use listener::ProgressListener;
pub use sender::{deliver, send_message};
