//! Infrastructure layer: everything that touches the outside world.
//!
//! Configuration and credential files, vendor shortcut stores, OS seams
//! (detection and emission), and the WebSocket listener.  The application
//! layer above depends on the traits defined here, never on the concrete
//! platform code.

pub mod adapters;
pub mod config;
pub mod credentials;
pub mod detect;
pub mod emit;
pub mod server;
pub mod store;
