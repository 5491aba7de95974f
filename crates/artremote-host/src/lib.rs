//! artremote-host library crate.
//!
//! The host side of Art Remote: it accepts JSON-over-WebSocket sessions from
//! handheld devices, authenticates them, resolves incoming commands against
//! the foreground creative application's shortcut configuration, and emits
//! the resulting key sequences.
//!
//! # Architecture
//!
//! ```text
//! Remote device (JSON over WebSocket)
//!         ↕
//! [artremote-host]
//!   ├── application/
//!   │     ├── sessions/  auth state machine and session registry
//!   │     ├── cache/     TTL + file-watch cache of shortcut tables
//!   │     └── dispatch/  command → key-sequence resolution and pacing
//!   └── infrastructure/
//!         ├── server/    WebSocket accept loop (tokio-tungstenite)
//!         ├── adapters/  Clip Studio Paint / Krita store readers
//!         ├── store/     pooled read-only SQLite access
//!         ├── detect/    foreground-application probe seam
//!         ├── emit/      synthetic-input seam
//!         ├── config/    TOML host configuration
//!         └── credentials/ token + PIN pairing record
//! ```
//!
//! Shared wire messages and the shortcut-table domain live in
//! `artremote-core`.

pub mod application;
pub mod infrastructure;
