//! Wire protocol: JSON message types and the tolerant payload decoder.

pub mod messages;
pub mod payload;

pub use messages::{AckStatus, ClientMessage, FavoriteEntry, HostMessage};
pub use payload::Payload;
