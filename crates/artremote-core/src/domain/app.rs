//! Supported applications and host platforms.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host operating system, used to pick the right shortcut variant
/// (macOS builds use Cmd where Windows/Linux use Ctrl).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Returns the platform this binary was compiled for.
    pub fn current() -> Self {
        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }
        #[cfg(target_os = "macos")]
        {
            Platform::MacOs
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            Platform::Linux
        }
    }

    /// Stable lowercase identifier, used in cache keys and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
            Platform::Linux => "linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supported art application with a shortcut source adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppId {
    Krita,
    ClipStudioPaint,
}

impl AppId {
    /// Stable identifier used on the wire and in cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppId::Krita => "krita",
            AppId::ClipStudioPaint => "clip_studio_paint",
        }
    }

    /// Human-readable name pushed to clients in `app_detected`.
    pub fn display_name(&self) -> &'static str {
        match self {
            AppId::Krita => "Krita",
            AppId::ClipStudioPaint => "Clip Studio Paint",
        }
    }

    /// Maps a raw identifier from the foreground-app detector (window title
    /// or process name) to a known application.
    ///
    /// The detector is an external collaborator and reports free-form
    /// strings; substring matching mirrors how titles and process names
    /// actually look ("krita.exe", "CLIP STUDIO PAINT", "untitled - Krita").
    /// Unrecognized strings return `None` and the dispatcher falls back to
    /// the generic built-in table.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let lower = raw.to_ascii_lowercase();
        if lower.contains("krita") {
            Some(AppId::Krita)
        } else if lower.contains("clip studio") || lower.contains("clipstudio") {
            Some(AppId::ClipStudioPaint)
        } else {
            None
        }
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
