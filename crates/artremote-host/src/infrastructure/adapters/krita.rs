//! Krita shortcut-file and brush-preset adapter.
//!
//! Krita persists user shortcut overrides in `kritashortcutsrc`, an INI-style
//! file with a `[Shortcuts]` section:
//!
//! ```ini
//! [Shortcuts]
//! edit_undo=Ctrl+Z
//! view_zoom_in=Ctrl++; Ctrl+=
//! rotate_canvas_left=Ctrl+[
//! ```
//!
//! Values list alternatives separated by `"; "`; the first one is the
//! binding we emit.  `none` marks an explicitly unbound action.  Krita
//! action identifiers map onto the canonical vocabulary through a fixed
//! synonym table; unmapped identifiers are simply skipped.
//!
//! Brush presets live in `resourcecache.sqlite` (the resource database a
//! Krita install maintains next to its config).  Active `paintoppresets`
//! rows whose names match the everyday preset families (basic, pencil, ink,
//! watercolor, ...) fill the twelve favorites slots in family-priority
//! order, giving a Krita session the same F-key favorites a Clip Studio
//! session gets from its tool palette.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use artremote_core::{
    ActionName, AppId, FavoriteSlot, KeySequence, Platform, ShortcutTable, SlotSource, SLOT_COUNT,
};

use crate::infrastructure::store::{StoreError, StorePool};

const SHORTCUTS_SECTION: &str = "[Shortcuts]";

pub struct KritaSource {
    pool: Arc<StorePool>,
    config_path: Option<PathBuf>,
    resource_db: Option<PathBuf>,
    ttl: Duration,
    warned: AtomicBool,
    db_warned: AtomicBool,
}

impl KritaSource {
    pub fn new(
        pool: Arc<StorePool>,
        config_path: Option<PathBuf>,
        resource_db: Option<PathBuf>,
        ttl: Duration,
    ) -> Self {
        Self {
            pool,
            config_path,
            resource_db,
            ttl,
            warned: AtomicBool::new(false),
            db_warned: AtomicBool::new(false),
        }
    }

    /// The shortcut file to read: the configured path if set, otherwise the
    /// first stock location that exists, otherwise the primary stock
    /// location (so the cache still tracks it appearing later).
    fn resolve_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            return Some(path.clone());
        }
        resolve_first_or_primary(default_paths())
    }

    /// Same resolution policy for the resource database.
    fn resolve_resource_db(&self) -> Option<PathBuf> {
        if let Some(path) = &self.resource_db {
            return Some(path.clone());
        }
        resolve_first_or_primary(default_resource_db_paths())
    }

    fn load_shortcuts(&self, table: &mut ShortcutTable) {
        let Some(path) = self.resolve_path() else {
            return;
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "krita shortcut file absent");
                return;
            }
            Err(e) => {
                if !self.warned.swap(true, Ordering::Relaxed) {
                    warn!(path = %path.display(), "failed to read krita shortcut file: {e}");
                }
                return;
            }
        };

        parse_shortcuts(&content, table);
    }

    /// Fills the favorites slots from the brush presets in the resource
    /// database, best preset family first.
    fn load_presets(&self, table: &mut ShortcutTable) {
        let Some(path) = self.resolve_resource_db() else {
            return;
        };
        let rows = self.pool.with_connection(&path, |conn| {
            let mut stmt = conn.prepare(
                "SELECT r.name, GROUP_CONCAT(t.name) \
                 FROM resources r \
                 LEFT JOIN resource_tags rt ON rt.resource_id = r.id \
                 LEFT JOIN tags t ON t.id = rt.tag_id \
                 WHERE r.resource_type_id = \
                       (SELECT id FROM resource_types WHERE name = 'paintoppresets') \
                   AND r.status = 1 \
                 GROUP BY r.id, r.name",
            )?;
            let mapped = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?;
            Ok(mapped.filter_map(|r| r.ok()).collect::<Vec<_>>())
        });

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                self.report_db_failure(&e);
                return;
            }
        };

        let mut ranked: Vec<(u8, String, Vec<String>)> = rows
            .into_iter()
            .filter_map(|(name, tags)| {
                let rank = preset_rank(&name)?;
                let tags = tags
                    .map(|t| t.split(',').map(str::to_string).collect())
                    .unwrap_or_default();
                Some((rank, name, tags))
            })
            .collect();
        ranked.sort_by(|a, b| (a.0, a.1.as_str()).cmp(&(b.0, b.1.as_str())));

        for (index, (_, name, tags)) in ranked.into_iter().take(usize::from(SLOT_COUNT)).enumerate()
        {
            let slot = index as u8 + 1;
            let icon = preset_icon(&name, &tags).to_string();
            table.assign_slot(
                slot,
                FavoriteSlot {
                    description: name.clone(),
                    command: name,
                    icon,
                    source: SlotSource::Tool,
                },
            );
        }
    }

    /// An absent database is normal (Krita not installed); an unreadable
    /// one is warned about once per process.
    fn report_db_failure(&self, err: &StoreError) {
        match err {
            StoreError::NotFound(path) => {
                debug!(path = %path.display(), "krita resource database absent");
            }
            StoreError::Sqlite { .. } => {
                if !self.db_warned.swap(true, Ordering::Relaxed) {
                    warn!("failed to read krita resource database: {err}");
                }
            }
        }
    }
}

impl super::ShortcutSource for KritaSource {
    fn app(&self) -> AppId {
        AppId::Krita
    }

    fn source_paths(&self) -> Vec<PathBuf> {
        [self.resolve_path(), self.resolve_resource_db()]
            .into_iter()
            .flatten()
            .collect()
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn load(&self, _platform: Platform) -> ShortcutTable {
        let mut table = ShortcutTable::new();
        self.load_shortcuts(&mut table);
        self.load_presets(&mut table);
        table
    }
}

fn resolve_first_or_primary(candidates: Vec<PathBuf>) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|p| p.exists())
        .cloned()
        .or_else(|| candidates.into_iter().next())
}

fn parse_shortcuts(content: &str, table: &mut ShortcutTable) {
    let mut in_shortcuts = false;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            in_shortcuts = line == SHORTCUTS_SECTION;
            continue;
        }
        if !in_shortcuts {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let Some(action) = krita_synonym(key.trim()) else {
            continue;
        };

        // First alternative only; "none" means explicitly unbound.
        let combo = value.split(';').next().unwrap_or("").trim();
        if combo.is_empty() || combo.eq_ignore_ascii_case("none") {
            continue;
        }
        match KeySequence::parse_combo(combo) {
            Ok(seq) => table.insert(action, seq),
            Err(e) => {
                debug!(key, combo, "skipping unparseable krita binding: {e}");
            }
        }
    }
}

/// Maps a Krita action identifier to a canonical action.
fn krita_synonym(identifier: &str) -> Option<ActionName> {
    match identifier {
        "edit_undo" => Some(ActionName::Undo),
        "edit_redo" => Some(ActionName::Redo),
        "view_zoom_in" => Some(ActionName::ZoomIn),
        "view_zoom_out" => Some(ActionName::ZoomOut),
        "rotate_canvas_left" => Some(ActionName::RotateLeft),
        "rotate_canvas_right" => Some(ActionName::RotateRight),
        "reset_canvas_rotation" => Some(ActionName::ResetCanvas),
        "KritaShape/KisToolBrush" => Some(ActionName::ToolBrush),
        "KritaShape/KisToolDyna" => Some(ActionName::ToolPen),
        "KritaFill/KisToolFill" => Some(ActionName::ToolFill),
        "KritaSelected/KisToolColorPicker" => Some(ActionName::ToolEyedropper),
        "KisToolSelectRectangular" => Some(ActionName::ToolSelect),
        "PanTool" => Some(ActionName::ToolPan),
        "erase_action" => Some(ActionName::ToolEraser),
        "add_new_paint_layer" => Some(ActionName::LayerNew),
        "remove_layer" => Some(ActionName::LayerDelete),
        "move_layer_up" => Some(ActionName::LayerUp),
        "move_layer_down" => Some(ActionName::LayerDown),
        "increase_brush_size" => Some(ActionName::BrushSizeUp),
        "decrease_brush_size" => Some(ActionName::BrushSizeDown),
        _ => None,
    }
}

/// Priority of a preset for favorites assignment, lower first.  Presets
/// outside the everyday families are not auto-assigned.
fn preset_rank(name: &str) -> Option<u8> {
    let name = name.to_lowercase();
    if name.contains("basic") {
        Some(1)
    } else if name.contains("default") {
        Some(2)
    } else if name.contains("pencil") {
        Some(3)
    } else if name.contains("ink") {
        Some(4)
    } else if name.contains("watercolor") {
        Some(5)
    } else if name.contains("airbrush") {
        Some(6)
    } else if name.contains("eraser") {
        Some(7)
    } else if name.contains("paint") {
        Some(8)
    } else {
        None
    }
}

/// Display icon for a preset, from its name or tag assignments.
fn preset_icon(name: &str, tags: &[String]) -> &'static str {
    let name = name.to_lowercase();
    let matches = |keyword: &str| {
        name.contains(keyword) || tags.iter().any(|t| t.to_lowercase().contains(keyword))
    };
    if matches("pencil") {
        "✏️"
    } else if matches("ink") {
        "🖊️"
    } else if matches("water") {
        "💧"
    } else if matches("airbrush") {
        "💨"
    } else if matches("eraser") {
        "🧽"
    } else if matches("paint") {
        "🎨"
    } else {
        "🖌️"
    }
}

/// Stock `kritashortcutsrc` locations for the current platform.
fn default_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(|p| vec![PathBuf::from(p).join("krita").join("kritashortcutsrc")])
            .unwrap_or_default()
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| {
                vec![PathBuf::from(h)
                    .join("Library")
                    .join("Preferences")
                    .join("kritashortcutsrc")]
            })
            .unwrap_or_default()
    }

    #[cfg(target_os = "linux")]
    {
        let mut paths = Vec::new();
        if let Some(base) = std::env::var_os("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(base).join("kritashortcutsrc"));
        }
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("kritashortcutsrc"),
            );
        }
        paths
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        Vec::new()
    }
}

/// Stock `resourcecache.sqlite` locations for the current platform.
fn default_resource_db_paths() -> Vec<PathBuf> {
    const DB_FILE: &str = "resourcecache.sqlite";

    #[cfg(target_os = "windows")]
    {
        ["APPDATA", "LOCALAPPDATA"]
            .iter()
            .filter_map(|var| std::env::var_os(var))
            .map(|p| PathBuf::from(p).join("krita").join(DB_FILE))
            .collect()
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| {
                vec![PathBuf::from(h)
                    .join("Library")
                    .join("Application Support")
                    .join("krita")
                    .join(DB_FILE)]
            })
            .unwrap_or_default()
    }

    #[cfg(target_os = "linux")]
    {
        let mut paths = Vec::new();
        if let Some(base) = std::env::var_os("XDG_DATA_HOME") {
            paths.push(PathBuf::from(base).join("krita").join(DB_FILE));
        }
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join("krita")
                    .join(DB_FILE),
            );
        }
        paths
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        Vec::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
