//! Input emission: delivering key sequences to the operating system.
//!
//! The [`InputEmitter`] trait is the second OS seam (detection being the
//! first).  The dispatcher resolves a command to a [`KeySequence`] and hands
//! it here; what "pressing" means — OS synthesis, a test recording, or a log
//! line — is the implementation's business.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use thiserror::Error;
use tracing::info;

use artremote_core::KeySequence;

/// Error type for input emission.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The platform layer rejected or failed the synthetic input.
    #[error("input emission failed: {0}")]
    Platform(String),
}

/// Delivers a key sequence as synthetic input.
pub trait InputEmitter: Send + Sync {
    /// Presses the chord: modifiers down, key, modifiers up.
    ///
    /// Blocking: platform input synthesis may stall briefly.  Callers on the
    /// async runtime wrap this in `spawn_blocking`.
    fn emit(&self, keys: &KeySequence) -> Result<(), EmitError>;
}

/// Emitter that logs instead of synthesizing input.  Used on platforms
/// without a synthesis backend and when running the host dry.
pub struct LogOnlyEmitter;

impl InputEmitter for LogOnlyEmitter {
    fn emit(&self, keys: &KeySequence) -> Result<(), EmitError> {
        info!(keys = %keys, "would emit key sequence");
        Ok(())
    }
}

// ── Mock ──────────────────────────────────────────────────────────────────────

pub mod mock {
    //! Recording emitter for unit and integration tests.

    use super::*;

    /// A mock emitter that records every emitted sequence in order and can
    /// be told to start failing.
    pub struct MockInputEmitter {
        emitted: Mutex<Vec<KeySequence>>,
        should_fail: AtomicBool,
    }

    impl MockInputEmitter {
        pub fn new() -> Self {
            Self {
                emitted: Mutex::new(Vec::new()),
                should_fail: AtomicBool::new(false),
            }
        }

        /// All sequences emitted so far, in emission order.
        pub fn emitted(&self) -> Vec<KeySequence> {
            self.emitted.lock().expect("lock poisoned").clone()
        }

        pub fn emitted_count(&self) -> usize {
            self.emitted.lock().expect("lock poisoned").len()
        }

        /// Makes subsequent `emit` calls fail.
        pub fn fail_from_now(&self) {
            self.should_fail.store(true, Ordering::Relaxed);
        }

        pub fn clear(&self) {
            self.emitted.lock().expect("lock poisoned").clear();
        }
    }

    impl Default for MockInputEmitter {
        fn default() -> Self {
            Self::new()
        }
    }

    impl InputEmitter for MockInputEmitter {
        fn emit(&self, keys: &KeySequence) -> Result<(), EmitError> {
            if self.should_fail.load(Ordering::Relaxed) {
                return Err(EmitError::Platform("mock emitter set to fail".to_string()));
            }
            self.emitted.lock().expect("lock poisoned").push(keys.clone());
            Ok(())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
