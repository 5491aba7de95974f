//! Shortcut-source adapters: one per supported creative application.
//!
//! An adapter knows where its application keeps shortcut configuration on
//! disk and how to decode it into a [`ShortcutTable`].  Adapters degrade
//! instead of failing: a missing or unreadable store yields a partial (or
//! empty) table and the built-in defaults fill the gaps downstream.

use std::path::PathBuf;
use std::time::Duration;

use artremote_core::{AppId, Platform, ShortcutTable};

pub mod clip_studio;
pub mod krita;

pub use clip_studio::ClipStudioSource;
pub use krita::KritaSource;

/// A source of shortcut configuration for one application.
pub trait ShortcutSource: Send + Sync {
    /// The application this adapter reads configuration for.
    fn app(&self) -> AppId;

    /// On-disk files backing the table.  The cache watches their
    /// modification times and reloads when any of them changes.
    fn source_paths(&self) -> Vec<PathBuf>;

    /// How long a loaded table stays fresh when the backing files are
    /// untouched.
    fn ttl(&self) -> Duration;

    /// Reads the vendor store(s) and builds the discovered table.
    ///
    /// Blocking: performs file and database I/O.  Callers on the async
    /// runtime wrap this in `spawn_blocking`.  Never fails — unreadable
    /// stores are logged and contribute nothing.
    fn load(&self, platform: Platform) -> ShortcutTable;
}

/// Registry of adapters, keyed by application.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<std::sync::Arc<dyn ShortcutSource>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: std::sync::Arc<dyn ShortcutSource>) {
        self.adapters.push(adapter);
    }

    pub fn get(&self, app: AppId) -> Option<std::sync::Arc<dyn ShortcutSource>> {
        self.adapters
            .iter()
            .find(|a| a.app() == app)
            .map(std::sync::Arc::clone)
    }
}
