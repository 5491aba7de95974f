//! Per-application, per-platform shortcut tables and favorites slots.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::action::ActionName;
use crate::domain::keys::KeySequence;

/// Number of quick-access favorites slots (F1..F12).
pub const SLOT_COUNT: u8 = 12;

/// Where a favorites slot assignment was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    /// The application's menu-shortcut store.
    Menu,
    /// The application's tool store (custom tool assignments win over menu
    /// entries for the same slot).
    Tool,
}

/// A discovered quick-access slot assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteSlot {
    /// Vendor command identifier (menu command name or `custom_tool_<raw>`).
    pub command: String,
    /// Human-readable description shown on the remote.
    pub description: String,
    /// Single-glyph icon shown on the remote.
    pub icon: String,
    pub source: SlotSource,
}

/// Mapping from canonical action to key sequence for one
/// (application, platform) pair, plus the discovered favorites slots.
///
/// Action names are unique within a table.  A missing action is a defined
/// "unsupported" outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortcutTable {
    entries: HashMap<ActionName, KeySequence>,
    favorites: BTreeMap<u8, FavoriteSlot>,
}

impl ShortcutTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the sequence for an action.
    pub fn insert(&mut self, action: ActionName, keys: KeySequence) {
        self.entries.insert(action, keys);
    }

    /// Looks up the key sequence for an action.
    pub fn lookup(&self, action: ActionName) -> Option<&KeySequence> {
        self.entries.get(&action)
    }

    /// Records a favorites slot assignment.  Slots outside `1..=SLOT_COUNT`
    /// are ignored (callers validate the raw encoding first; this is the
    /// last line of defence for the table invariant).
    pub fn assign_slot(&mut self, slot: u8, info: FavoriteSlot) {
        if (1..=SLOT_COUNT).contains(&slot) {
            self.favorites.insert(slot, info);
        }
    }

    pub fn slot(&self, slot: u8) -> Option<&FavoriteSlot> {
        self.favorites.get(&slot)
    }

    /// All assigned slots, ordered by slot number.
    pub fn slots(&self) -> impl Iterator<Item = (u8, &FavoriteSlot)> {
        self.favorites.iter().map(|(n, info)| (*n, info))
    }

    pub fn assigned_slot_count(&self) -> usize {
        self.favorites.len()
    }

    pub fn has_favorites(&self) -> bool {
        !self.favorites.is_empty()
    }

    /// Actions with a mapping in this table, for the `app_detected` push.
    pub fn supported_actions(&self) -> Vec<ActionName> {
        ActionName::all()
            .iter()
            .copied()
            .filter(|a| self.entries.contains_key(a))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.favorites.is_empty()
    }

    /// Source-precedence merge: entries already present in `self` (the
    /// store-discovered table) win; `defaults` fill the gaps.  Favorites
    /// merge the same way.
    pub fn merge_over(mut self, defaults: &ShortcutTable) -> ShortcutTable {
        for (action, keys) in &defaults.entries {
            self.entries.entry(*action).or_insert_with(|| keys.clone());
        }
        for (slot, info) in &defaults.favorites {
            self.favorites.entry(*slot).or_insert_with(|| info.clone());
        }
        self
    }
}
