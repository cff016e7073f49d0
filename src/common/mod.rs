pub mod events;
pub mod types;

pub use events::NetworkEvent;
pub use types::{Destination, ProgressMessage};
