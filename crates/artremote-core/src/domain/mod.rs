//! Domain module: actions, applications, key tokens, and shortcut tables.

pub mod action;
pub mod app;
pub mod builtin;
pub mod keys;
pub mod shortcut_table;

pub use action::{ActionName, Command};
pub use app::{AppId, Platform};
pub use keys::{KeySequence, KeyToken};
pub use shortcut_table::{FavoriteSlot, ShortcutTable};
