pub mod common;
pub mod error;
pub mod identity;
pub mod network;
