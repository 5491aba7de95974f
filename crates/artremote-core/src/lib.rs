//! # artremote-core
//!
//! Shared library for Art Remote containing the JSON wire protocol types,
//! the canonical action vocabulary, key-token sequences, and per-application
//! shortcut tables.
//!
//! This crate is pure domain logic: it has zero dependencies on OS APIs,
//! sockets, or the filesystem.  The host application (`artremote-host`)
//! layers sessions, caching, and dispatch on top of it.
//!
//! # Architecture overview
//!
//! Art Remote lets a handheld device send abstract creative-tool commands
//! ("zoom in", "switch to eraser", "select favorite 5") to a host computer.
//! The host translates each command into the concrete keyboard shortcut for
//! whichever supported art application (Krita, Clip Studio Paint) currently
//! has focus.
//!
//! This crate defines:
//!
//! - **`protocol`** – The JSON messages exchanged with the remote device,
//!   including the tolerant payload decoder that normalizes both structured
//!   objects and the legacy `"{direction=in, amount=1.5}"` string format.
//!
//! - **`domain`** – The canonical action vocabulary ([`ActionName`]), key
//!   tokens ([`KeyToken`], [`KeySequence`]), the per-application shortcut
//!   table ([`ShortcutTable`]), built-in default tables, and the normalized
//!   [`Command`] variants the dispatcher consumes.

pub mod domain;
pub mod protocol;

pub use domain::action::{ActionName, Command, PanDirection, ZoomDirection};
pub use domain::app::{AppId, Platform};
pub use domain::keys::{KeySequence, KeyToken};
pub use domain::shortcut_table::{FavoriteSlot, SlotSource, ShortcutTable, SLOT_COUNT};
pub use protocol::messages::{AckStatus, ClientMessage, FavoriteEntry, HostMessage};
pub use protocol::payload::Payload;
