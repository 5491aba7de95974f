//! Foreground-application detection.
//!
//! The [`AppDetector`] trait is the seam between the dispatcher and the
//! operating system: an implementation reports which application currently
//! owns the screen (window title, process name — whatever the platform
//! provides).  The raw string is normalized to an [`AppId`] by
//! [`RateLimitedDetector`], which also throttles probing so a burst of
//! commands does not hammer the OS.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use artremote_core::AppId;

/// Reports the raw identity of the foreground application.
pub trait AppDetector: Send + Sync {
    /// Raw identifier of the foreground application, or `None` when nothing
    /// could be determined.  Implementations must be cheap and non-blocking
    /// enough to call from the dispatch path.
    fn detect_active_app(&self) -> Option<String>;
}

/// Detector for platforms without a probe implementation.  Always reports
/// nothing, which routes every dispatch to the generic fallback table.
pub struct NullAppDetector {
    warned: AtomicBool,
}

impl NullAppDetector {
    pub fn new() -> Self {
        Self {
            warned: AtomicBool::new(false),
        }
    }
}

impl Default for NullAppDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl AppDetector for NullAppDetector {
    fn detect_active_app(&self) -> Option<String> {
        if !self.warned.swap(true, Ordering::Relaxed) {
            warn!("no application detector available; using generic shortcut defaults");
        }
        None
    }
}

/// Caches the normalized detection result for a minimum interval between
/// probes of the underlying detector.
pub struct RateLimitedDetector {
    inner: Arc<dyn AppDetector>,
    interval: Duration,
    last: Mutex<Option<ProbeResult>>,
}

#[derive(Clone, Copy)]
struct ProbeResult {
    at: Instant,
    app: Option<AppId>,
}

impl RateLimitedDetector {
    pub fn new(inner: Arc<dyn AppDetector>, interval: Duration) -> Self {
        Self {
            inner,
            interval,
            last: Mutex::new(None),
        }
    }

    /// The current foreground application, probed at most once per interval.
    /// `None` means undetected (or the detected application is not one we
    /// know) — callers fall back to generic defaults.
    pub fn current_app(&self) -> Option<AppId> {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(result) = *last {
            if result.at.elapsed() < self.interval {
                return result.app;
            }
        }

        let raw = self.inner.detect_active_app();
        let app = raw.as_deref().and_then(AppId::from_raw);
        if let (Some(raw), None) = (&raw, app) {
            debug!(raw, "foreground application not recognized");
        }
        *last = Some(ProbeResult {
            at: Instant::now(),
            app,
        });
        app
    }

    /// Drops the cached result so the next call probes immediately.
    pub fn force_refresh(&self) {
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

// ── Mock ──────────────────────────────────────────────────────────────────────

pub mod mock {
    //! Scripted detector for unit and integration tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::AppDetector;

    /// A mock detector returning a preset raw identifier and counting probes.
    pub struct MockAppDetector {
        result: Mutex<Option<String>>,
        probe_count: AtomicUsize,
    }

    impl MockAppDetector {
        pub fn new(result: Option<&str>) -> Self {
            Self {
                result: Mutex::new(result.map(str::to_string)),
                probe_count: AtomicUsize::new(0),
            }
        }

        /// Changes what subsequent probes report.
        pub fn set_result(&self, result: Option<&str>) {
            *self.result.lock().expect("lock poisoned") = result.map(str::to_string);
        }

        /// How many times the underlying probe ran (rate limiting makes this
        /// smaller than the number of `current_app` calls).
        pub fn probe_count(&self) -> usize {
            self.probe_count.load(Ordering::Relaxed)
        }
    }

    impl AppDetector for MockAppDetector {
        fn detect_active_app(&self) -> Option<String> {
            self.probe_count.fetch_add(1, Ordering::Relaxed);
            self.result.lock().expect("lock poisoned").clone()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
