//! TOML-based configuration for the host.
//!
//! Reads `HostConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\ArtRemote\config.toml`
//! - Linux:    `~/.config/artremote/config.toml`
//! - macOS:    `~/Library/Application Support/ArtRemote/config.toml`
//!
//! Every field carries a serde default so the host works on first run
//! (before a config file exists) and keeps working when an older file is
//! missing newer fields.  A missing file is not an error; malformed TOML is.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level host configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HostConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub clip_studio: ClipStudioConfig,
    #[serde(default)]
    pub krita: KritaConfig,
}

/// WebSocket listener and authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// IP address to bind the listener to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// TCP port for the WebSocket listener.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whether new sessions must authenticate before sending commands.
    #[serde(default = "default_true")]
    pub auth_enabled: bool,
    /// How long an unauthenticated session may linger before being closed.
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,
}

/// `tracing` log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Shortcut-table cache lifetimes.
///
/// Menu shortcuts change rarely (the user edited application settings), so
/// they get a long TTL.  Tool palettes churn during a session, so they get a
/// short one.  Either way an on-disk store change invalidates immediately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_menu_ttl_secs")]
    pub menu_ttl_secs: u64,
    #[serde(default = "default_tool_ttl_secs")]
    pub tool_ttl_secs: u64,
}

/// Command-dispatch pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    /// Minimum interval between foreground-application probes.
    #[serde(default = "default_detect_interval_ms")]
    pub detect_interval_ms: u64,
    /// Delay between the individual keystrokes of a decomposed command
    /// (zoom/rotate steps), so the target application keeps up.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    /// Dispatches slower than this are logged at `warn`.
    #[serde(default = "default_slow_warn_ms")]
    pub slow_warn_ms: u64,
}

/// Clip Studio Paint shortcut-store location and slot decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClipStudioConfig {
    /// Root of the CSP settings tree.  When absent the platform default is
    /// probed (`~/Library/CELSYS/...` on macOS, `%APPDATA%\CELSys\...` on
    /// Windows).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    /// Offset subtracted from a raw tool shortcut code to obtain the
    /// function-key slot number (raw 37 → F1 at the default offset).
    #[serde(default = "default_slot_offset")]
    pub slot_offset: u32,
}

/// Krita shortcut-file and resource-database locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KritaConfig {
    /// Explicit path to `kritashortcutsrc`.  When absent the platform
    /// default locations are probed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,

    /// Explicit path to `resourcecache.sqlite`, the brush-preset database
    /// backing the Krita favorites slots.  When absent the platform default
    /// locations are probed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_db: Option<PathBuf>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8765
}
fn default_true() -> bool {
    true
}
fn default_auth_timeout_secs() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_menu_ttl_secs() -> u64 {
    1800
}
fn default_tool_ttl_secs() -> u64 {
    300
}
fn default_detect_interval_ms() -> u64 {
    2000
}
fn default_step_delay_ms() -> u64 {
    50
}
fn default_slow_warn_ms() -> u64 {
    50
}
fn default_slot_offset() -> u32 {
    36
}

impl Default for ClipStudioConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            slot_offset: default_slot_offset(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            auth_enabled: default_true(),
            auth_timeout_secs: default_auth_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            menu_ttl_secs: default_menu_ttl_secs(),
            tool_ttl_secs: default_tool_ttl_secs(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            detect_interval_ms: default_detect_interval_ms(),
            step_delay_ms: default_step_delay_ms(),
            slow_warn_ms: default_slow_warn_ms(),
        }
    }
}

// Duration accessors so callers never juggle raw millisecond fields.
impl ServerConfig {
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }
}

impl CacheConfig {
    pub fn menu_ttl(&self) -> Duration {
        Duration::from_secs(self.menu_ttl_secs)
    }

    pub fn tool_ttl(&self) -> Duration {
        Duration::from_secs(self.tool_ttl_secs)
    }
}

impl DispatchConfig {
    pub fn detect_interval(&self) -> Duration {
        Duration::from_millis(self.detect_interval_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn slow_warn(&self) -> Duration {
        Duration::from_millis(self.slow_warn_ms)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for host state (config file
/// and credential record).
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads `HostConfig` from `path`, or from the platform default location when
/// `path` is `None`.  A missing file yields `HostConfig::default()`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&std::path::Path>) -> Result<HostConfig, ConfigError> {
    let path = resolve_config_path(path)?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: HostConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Like [`load_config`], but on first run (no file at the resolved path)
/// writes a default `config.toml` there so users have a file to edit.
///
/// # Errors
///
/// As [`load_config`], plus the write errors of [`save_config`].
pub fn load_or_init_config(path: Option<&std::path::Path>) -> Result<HostConfig, ConfigError> {
    let path = resolve_config_path(path)?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: HostConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let cfg = HostConfig::default();
            save_config(&path, &cfg)?;
            Ok(cfg)
        }
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

fn resolve_config_path(explicit: Option<&std::path::Path>) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(config_dir()?.join("config.toml")),
    }
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &std::path::Path, config: &HostConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ArtRemote"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("artremote"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("ArtRemote")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_host_config_default_has_expected_server_settings() {
        // Arrange / Act
        let cfg = HostConfig::default();

        // Assert
        assert_eq!(cfg.server.bind_address, "0.0.0.0");
        assert_eq!(cfg.server.port, 8765);
        assert!(cfg.server.auth_enabled);
        assert_eq!(cfg.server.auth_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_host_config_default_cache_ttls() {
        let cfg = HostConfig::default();
        assert_eq!(cfg.cache.menu_ttl(), Duration::from_secs(1800));
        assert_eq!(cfg.cache.tool_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_host_config_default_slot_offset_is_36() {
        let cfg = HostConfig::default();
        assert_eq!(cfg.clip_studio.slot_offset, 36);
        assert_eq!(cfg.clip_studio.base_dir, None);
    }

    #[test]
    fn test_dispatch_config_default_pacing() {
        let cfg = DispatchConfig::default();
        assert_eq!(cfg.detect_interval(), Duration::from_secs(2));
        assert_eq!(cfg.step_delay(), Duration::from_millis(50));
    }

    // ── TOML round-trip ───────────────────────────────────────────────────────

    #[test]
    fn test_host_config_serializes_and_deserializes_round_trip() {
        // Arrange
        let mut cfg = HostConfig::default();
        cfg.server.port = 9000;
        cfg.clip_studio.base_dir = Some(PathBuf::from("/tmp/csp"));

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: HostConfig = toml::from_str(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        // Arrange: every section carries a serde default.
        let cfg: HostConfig = toml::from_str("").expect("deserialize empty");

        // Assert
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_deserialize_partial_server_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[server]
port = 9999
auth_enabled = false
"#;

        // Act
        let cfg: HostConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.server.port, 9999);
        assert!(!cfg.server.auth_enabled);
        // Unspecified fields keep their defaults.
        assert_eq!(cfg.server.bind_address, "0.0.0.0");
        assert_eq!(cfg.cache.menu_ttl_secs, 1800);
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        let bad_toml = "[[[ not valid toml";
        let result: Result<HostConfig, toml::de::Error> = toml::from_str(bad_toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_missing_file_yields_default() {
        // Arrange
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");

        // Act
        let cfg = load_config(Some(&path)).expect("missing file is not an error");

        // Assert
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_load_config_reads_explicit_path() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 4242\n").unwrap();

        // Act
        let cfg = load_config(Some(&path)).unwrap();

        // Assert
        assert_eq!(cfg.server.port, 4242);
    }

    #[test]
    fn test_load_or_init_writes_default_config_on_first_run() {
        // Arrange: the file (and its directory) do not exist yet.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        // Act
        let cfg = load_or_init_config(Some(&path)).expect("first run must succeed");

        // Assert: defaults returned and persisted for the user to edit.
        assert_eq!(cfg, HostConfig::default());
        let reread = load_config(Some(&path)).unwrap();
        assert_eq!(reread, cfg);
    }

    #[test]
    fn test_load_or_init_keeps_existing_config() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 4242\n").unwrap();

        // Act
        let cfg = load_or_init_config(Some(&path)).unwrap();

        // Assert: the customized file is read, not overwritten.
        assert_eq!(cfg.server.port, 4242);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("4242"));
    }

    #[test]
    fn test_save_config_round_trips_through_load() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = HostConfig::default();
        cfg.server.port = 9000;
        cfg.cache.tool_ttl_secs = 60;

        // Act
        save_config(&path, &cfg).unwrap();
        let reread = load_config(Some(&path)).unwrap();

        // Assert
        assert_eq!(reread, cfg);
    }
}
