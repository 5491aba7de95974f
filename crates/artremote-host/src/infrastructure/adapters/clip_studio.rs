//! Clip Studio Paint shortcut-store adapter.
//!
//! CSP keeps shortcut configuration in SQLite databases under its settings
//! tree:
//!
//! - `Shortcut/default.khc` — menu shortcuts (`shortcutmenu` table).  Each
//!   row carries a vendor command identifier, a key name, and a modifier
//!   bitmap.
//! - `Tool/EditImageTool.todb` — the tool palette (`Node` table).  A tool
//!   assigned to a function key stores `NodeShortCutKey = offset + n` where
//!   `n` is the slot number; at the stock offset of 36, raw code 37 is F1
//!   and 48 is F12.
//!
//! Menu rows bound to F-keys and tool rows both populate the favorites
//! slots; a tool assignment wins over a menu entry on the same slot because
//! tool rows are decoded second.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use artremote_core::domain::builtin::{command_description, command_icon, tool_icon};
use artremote_core::{
    ActionName, AppId, FavoriteSlot, KeySequence, KeyToken, Platform, ShortcutTable, SlotSource,
    SLOT_COUNT,
};

use crate::infrastructure::store::{StoreError, StorePool};

const MENU_STORE: &str = "Shortcut/default.khc";
const TOOL_STORE: &str = "Tool/EditImageTool.todb";

pub struct ClipStudioSource {
    pool: Arc<StorePool>,
    base_dir: Option<PathBuf>,
    slot_offset: i64,
    ttl: Duration,
    menu_warned: AtomicBool,
    tool_warned: AtomicBool,
}

impl ClipStudioSource {
    pub fn new(
        pool: Arc<StorePool>,
        base_dir: Option<PathBuf>,
        slot_offset: u32,
        ttl: Duration,
    ) -> Self {
        Self {
            pool,
            base_dir,
            slot_offset: i64::from(slot_offset),
            ttl,
            menu_warned: AtomicBool::new(false),
            tool_warned: AtomicBool::new(false),
        }
    }

    fn base_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.base_dir {
            return Some(dir.clone());
        }
        default_base_dir()
    }

    fn menu_store(&self) -> Option<PathBuf> {
        self.base_dir().map(|d| d.join(MENU_STORE))
    }

    fn tool_store(&self) -> Option<PathBuf> {
        self.base_dir().map(|d| d.join(TOOL_STORE))
    }

    fn load_menu(&self, table: &mut ShortcutTable, platform: Platform) {
        let Some(path) = self.menu_store() else {
            return;
        };
        let rows = self.pool.with_connection(&path, |conn| {
            let mut stmt = conn.prepare(
                "SELECT menucommand, shortcut, modifier FROM shortcutmenu \
                 WHERE shortcut IS NOT NULL AND shortcut != ''",
            )?;
            let mapped = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?;
            // Per-row decode errors (NULLs, wrong types) skip that row only.
            Ok(mapped.filter_map(|r| r.ok()).collect::<Vec<_>>())
        });

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                self.report_store_failure(&self.menu_warned, "menu", &e);
                return;
            }
        };

        for (command, shortcut, modifier) in rows {
            self.decode_menu_row(table, platform, &command, &shortcut, modifier);
        }
    }

    fn decode_menu_row(
        &self,
        table: &mut ShortcutTable,
        platform: Platform,
        command: &str,
        shortcut: &str,
        modifier: i64,
    ) {
        // A bare F-key menu binding is a favorites assignment.
        if modifier == 0 {
            if let Some(slot) = fkey_slot(shortcut) {
                table.assign_slot(
                    slot,
                    FavoriteSlot {
                        command: command.to_string(),
                        description: command_description(command),
                        icon: command_icon(command).to_string(),
                        source: SlotSource::Menu,
                    },
                );
                return;
            }
        }

        // Otherwise the row may refine a canonical action's key sequence.
        let Some(action) = menu_synonym(command) else {
            return;
        };
        let Ok(key) = KeyToken::from_str(shortcut) else {
            debug!(command, shortcut, "skipping menu row with unrecognized key");
            return;
        };
        let Some(mods) = decode_modifier(modifier, platform) else {
            debug!(command, modifier, "skipping menu row with unknown modifier bitmap");
            return;
        };
        let mut tokens = mods;
        tokens.push(key);
        table.insert(action, KeySequence::new(tokens));
    }

    fn load_tools(&self, table: &mut ShortcutTable) {
        let Some(path) = self.tool_store() else {
            return;
        };
        let lo = self.slot_offset + 1;
        let hi = self.slot_offset + i64::from(SLOT_COUNT);
        let rows = self.pool.with_connection(&path, |conn| {
            let mut stmt = conn.prepare(
                "SELECT NodeName, NodeShortCutKey FROM Node \
                 WHERE NodeShortCutKey BETWEEN ?1 AND ?2",
            )?;
            let mapped = stmt.query_map([lo, hi], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            Ok(mapped.filter_map(|r| r.ok()).collect::<Vec<_>>())
        });

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                self.report_store_failure(&self.tool_warned, "tool", &e);
                return;
            }
        };

        for (name, raw) in rows {
            let slot = raw - self.slot_offset;
            // The query already bounds the range; this guards the cast.
            let Ok(slot) = u8::try_from(slot) else {
                continue;
            };
            table.assign_slot(
                slot,
                FavoriteSlot {
                    command: format!("custom_tool_{raw}"),
                    description: name.clone(),
                    icon: tool_icon(&name).to_string(),
                    source: SlotSource::Tool,
                },
            );
        }
    }

    /// An absent store is normal (CSP not installed, or never customized);
    /// an unreadable one is warned about once per process.
    fn report_store_failure(&self, warned: &AtomicBool, which: &str, err: &StoreError) {
        match err {
            StoreError::NotFound(path) => {
                debug!(store = which, path = %path.display(), "shortcut store absent");
            }
            StoreError::Sqlite { .. } => {
                if !warned.swap(true, Ordering::Relaxed) {
                    warn!(store = which, "failed to read Clip Studio shortcut store: {err}");
                }
            }
        }
    }
}

impl super::ShortcutSource for ClipStudioSource {
    fn app(&self) -> AppId {
        AppId::ClipStudioPaint
    }

    fn source_paths(&self) -> Vec<PathBuf> {
        [self.menu_store(), self.tool_store()]
            .into_iter()
            .flatten()
            .collect()
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn load(&self, platform: Platform) -> ShortcutTable {
        let mut table = ShortcutTable::new();
        // Menu first, tools second: a tool assignment on the same slot wins.
        self.load_menu(&mut table, platform);
        self.load_tools(&mut table);
        table
    }
}

/// Decodes the CSP modifier bitmap into modifier tokens.  `primary` is Cmd
/// on macOS, Ctrl elsewhere.
fn decode_modifier(modifier: i64, platform: Platform) -> Option<Vec<KeyToken>> {
    let primary = match platform {
        Platform::MacOs => KeyToken::Cmd,
        Platform::Windows | Platform::Linux => KeyToken::Ctrl,
    };
    match modifier {
        0 => Some(vec![]),
        1 => Some(vec![KeyToken::Alt]),
        2 => Some(vec![KeyToken::Shift]),
        3 => Some(vec![KeyToken::Shift, KeyToken::Alt]),
        4 => Some(vec![primary]),
        5 => Some(vec![primary, KeyToken::Alt]),
        6 => Some(vec![primary, KeyToken::Shift]),
        _ => None,
    }
}

/// Slot number for an F-key name, `"F1"..="F12"`.
fn fkey_slot(key: &str) -> Option<u8> {
    let n: u8 = key
        .strip_prefix('F')
        .or_else(|| key.strip_prefix('f'))?
        .parse()
        .ok()?;
    (1..=SLOT_COUNT).contains(&n).then_some(n)
}

/// Maps a CSP menu-command identifier to a canonical action.
fn menu_synonym(command: &str) -> Option<ActionName> {
    match command {
        "undo" => Some(ActionName::Undo),
        "redo" => Some(ActionName::Redo),
        "zoomin" => Some(ActionName::ZoomIn),
        "zoomout" => Some(ActionName::ZoomOut),
        _ => None,
    }
}

/// Stock CSP settings root for the current platform.
fn default_base_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(|p| PathBuf::from(p).join("CELSys").join("CLIPStudioPaintVer1_5_0"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("CELSYS")
                .join("CLIPStudioPaintVer1_5_0")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // CSP has no Linux release; only an explicit base_dir (e.g. a Wine
        // prefix) makes this adapter productive here.
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
