//! Dependency-aware cache for loaded shortcut tables.
//!
//! An entry stays fresh while (a) it is younger than its TTL and (b) none of
//! the on-disk files it was loaded from has changed.  "Changed" covers a
//! newer modification time, a tracked file disappearing, and a file that was
//! absent at load time appearing — any of these forces a reload on the next
//! lookup.
//!
//! Loads are single-flight per key: the per-key async mutex is held across
//! the loader future, so concurrent requests for a stale key run the loader
//! once and everyone receives the same replacement value.  Values are
//! replaced wholesale; readers never observe a partially updated entry.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant, SystemTime};

use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

/// Keyed cache of `Arc<T>` values loaded from on-disk sources.
pub struct SourceCache<T> {
    slots: StdMutex<HashMap<String, Arc<Slot<T>>>>,
}

struct Slot<T> {
    state: AsyncMutex<Option<Entry<T>>>,
}

struct Entry<T> {
    value: Arc<T>,
    loaded_at: Instant,
    ttl: Duration,
    sources: Vec<TrackedSource>,
}

/// A watched file and its modification time at load.  `mtime == None`
/// records that the file did not exist (or was unreadable) at load time.
struct TrackedSource {
    path: PathBuf,
    mtime: Option<SystemTime>,
}

impl<T> Default for SourceCache<T> {
    fn default() -> Self {
        Self {
            slots: StdMutex::new(HashMap::new()),
        }
    }
}

impl<T: Send + Sync> SourceCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, running `loader` when the entry
    /// is missing, expired, or backed by changed files.
    ///
    /// `loader` returns the value together with the paths it was loaded
    /// from; their modification times are snapshotted after the load so a
    /// write racing the load is caught on the next lookup.
    pub async fn get_or_load<F, Fut>(&self, key: &str, ttl: Duration, loader: F) -> Arc<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = (T, Vec<PathBuf>)>,
    {
        let slot = self.slot(key);
        let mut state = slot.state.lock().await;

        if let Some(entry) = state.as_ref() {
            if entry.is_fresh() {
                return Arc::clone(&entry.value);
            }
            debug!(key, "cache entry stale; reloading");
        }

        // Lock held across the load: concurrent callers for this key queue
        // here and find the fresh entry when they acquire the lock.
        let (value, paths) = loader().await;
        let value = Arc::new(value);
        *state = Some(Entry {
            value: Arc::clone(&value),
            loaded_at: Instant::now(),
            ttl,
            sources: paths.into_iter().map(TrackedSource::snapshot).collect(),
        });
        value
    }

    /// Drops the entry for `key` (if any); the next lookup reloads.
    pub fn invalidate(&self, key: &str) {
        let removed = self
            .slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
            .is_some();
        if removed {
            debug!(key, "cache entry invalidated");
        }
    }

    fn slot(&self, key: &str) -> Arc<Slot<T>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(slots.entry(key.to_string()).or_insert_with(|| {
            Arc::new(Slot {
                state: AsyncMutex::new(None),
            })
        }))
    }
}

impl<T> Entry<T> {
    fn is_fresh(&self) -> bool {
        self.loaded_at.elapsed() < self.ttl && self.sources.iter().all(TrackedSource::unchanged)
    }
}

impl TrackedSource {
    fn snapshot(path: PathBuf) -> Self {
        let mtime = read_mtime(&path);
        Self { path, mtime }
    }

    fn unchanged(&self) -> bool {
        match (self.mtime, read_mtime(&self.path)) {
            // Still absent, or present with the same (or older) stamp.
            (None, None) => true,
            (Some(recorded), Some(current)) => current <= recorded,
            // Appeared or disappeared since the load.
            _ => false,
        }
    }
}

fn read_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LONG_TTL: Duration = Duration::from_secs(3600);

    /// Loader that counts invocations and returns its call number.
    fn counting_loader(
        counter: Arc<AtomicUsize>,
        paths: Vec<PathBuf>,
    ) -> impl FnOnce() -> std::future::Ready<(usize, Vec<PathBuf>)> {
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready((n, paths))
        }
    }

    fn bump_mtime(path: &Path) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();
    }

    #[tokio::test]
    async fn test_fresh_entry_served_without_reload() {
        // Arrange
        let cache = SourceCache::new();
        let loads = Arc::new(AtomicUsize::new(0));

        // Act
        let a = cache
            .get_or_load("k", LONG_TTL, counting_loader(loads.clone(), vec![]))
            .await;
        let b = cache
            .get_or_load("k", LONG_TTL, counting_loader(loads.clone(), vec![]))
            .await;

        // Assert
        assert_eq!((*a, *b), (1, 1));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_ttl_triggers_reload() {
        // Arrange: zero TTL expires immediately.
        let cache = SourceCache::new();
        let loads = Arc::new(AtomicUsize::new(0));

        // Act
        cache
            .get_or_load("k", Duration::ZERO, counting_loader(loads.clone(), vec![]))
            .await;
        let second = cache
            .get_or_load("k", Duration::ZERO, counting_loader(loads.clone(), vec![]))
            .await;

        // Assert
        assert_eq!(*second, 2);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_source_mtime_advance_invalidates() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("store.db");
        std::fs::write(&file, "v1").unwrap();

        let cache = SourceCache::new();
        let loads = Arc::new(AtomicUsize::new(0));
        cache
            .get_or_load(
                "k",
                LONG_TTL,
                counting_loader(loads.clone(), vec![file.clone()]),
            )
            .await;

        // Act: the application rewrites its store.
        bump_mtime(&file);
        let value = cache
            .get_or_load(
                "k",
                LONG_TTL,
                counting_loader(loads.clone(), vec![file.clone()]),
            )
            .await;

        // Assert
        assert_eq!(*value, 2);
    }

    #[tokio::test]
    async fn test_source_appearing_after_load_invalidates() {
        // Arrange: the tracked file does not exist at load time.
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("store.db");

        let cache = SourceCache::new();
        let loads = Arc::new(AtomicUsize::new(0));
        cache
            .get_or_load(
                "k",
                LONG_TTL,
                counting_loader(loads.clone(), vec![file.clone()]),
            )
            .await;

        // Act: the application is installed / writes its store.
        std::fs::write(&file, "now exists").unwrap();
        let value = cache
            .get_or_load(
                "k",
                LONG_TTL,
                counting_loader(loads.clone(), vec![file.clone()]),
            )
            .await;

        // Assert
        assert_eq!(*value, 2);
    }

    #[tokio::test]
    async fn test_source_disappearing_invalidates() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("store.db");
        std::fs::write(&file, "v1").unwrap();

        let cache = SourceCache::new();
        let loads = Arc::new(AtomicUsize::new(0));
        cache
            .get_or_load(
                "k",
                LONG_TTL,
                counting_loader(loads.clone(), vec![file.clone()]),
            )
            .await;

        // Act
        std::fs::remove_file(&file).unwrap();
        let value = cache
            .get_or_load(
                "k",
                LONG_TTL,
                counting_loader(loads.clone(), vec![file.clone()]),
            )
            .await;

        // Assert
        assert_eq!(*value, 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        // Arrange
        let cache = SourceCache::new();
        let loads = Arc::new(AtomicUsize::new(0));
        cache
            .get_or_load("k", LONG_TTL, counting_loader(loads.clone(), vec![]))
            .await;

        // Act
        cache.invalidate("k");
        let value = cache
            .get_or_load("k", LONG_TTL, counting_loader(loads.clone(), vec![]))
            .await;

        // Assert
        assert_eq!(*value, 2);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        // Arrange
        let cache = SourceCache::new();
        let loads = Arc::new(AtomicUsize::new(0));

        // Act
        let a = cache
            .get_or_load("a", LONG_TTL, counting_loader(loads.clone(), vec![]))
            .await;
        let b = cache
            .get_or_load("b", LONG_TTL, counting_loader(loads.clone(), vec![]))
            .await;

        // Assert: each key loaded once.
        assert_eq!((*a, *b), (1, 2));
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_single_flight() {
        // Arrange: a slow loader; two tasks race on a cold key.
        let cache = Arc::new(SourceCache::new());
        let loads = Arc::new(AtomicUsize::new(0));

        let slow_loader = |loads: Arc<AtomicUsize>| {
            move || async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let n = loads.fetch_add(1, Ordering::SeqCst) + 1;
                (n, Vec::new())
            }
        };

        // Act
        let c1 = Arc::clone(&cache);
        let l1 = loads.clone();
        let t1 = tokio::spawn(async move {
            *c1.get_or_load("k", LONG_TTL, slow_loader(l1)).await
        });
        let c2 = Arc::clone(&cache);
        let l2 = loads.clone();
        let t2 = tokio::spawn(async move {
            *c2.get_or_load("k", LONG_TTL, slow_loader(l2)).await
        });

        let (a, b) = (t1.await.unwrap(), t2.await.unwrap());

        // Assert: one load served both tasks.
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(a, 1);
        assert_eq!(b, 1);
    }
}
