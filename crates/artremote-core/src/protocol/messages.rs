//! JSON wire messages exchanged with remote devices.
//!
//! The transport is message-oriented (one JSON text frame per logical
//! operation), but every command receives exactly one response, preserving a
//! request/response feel.  Marker enums pin the literal tag values
//! (`"authenticate"`, `"auth_response"`, …) so an incompatible frame fails
//! deserialization instead of silently matching the wrong variant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::app::AppId;
use crate::domain::shortcut_table::{ShortcutTable, SLOT_COUNT};

// ── Marker tags ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthenticateTag {
    #[serde(rename = "authenticate")]
    Authenticate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthRequiredTag {
    #[serde(rename = "auth_required")]
    AuthRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthResponseTag {
    #[serde(rename = "auth_response")]
    AuthResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppDetectedTag {
    #[serde(rename = "app_detected")]
    AppDetected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FavoritesDataTag {
    #[serde(rename = "favorites_data")]
    FavoritesData,
}

// ── Client → Host ─────────────────────────────────────────────────────────────

/// A message received from a remote device.
///
/// The two forms are distinguished structurally: authentication frames carry
/// `type: "authenticate"`, command frames carry `action`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    Authenticate {
        #[serde(rename = "type")]
        kind: AuthenticateTag,
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        pin: Option<String>,
        /// Free-form client metadata (device name, app version).
        #[serde(default)]
        client_info: Option<Value>,
    },
    Command {
        action: String,
        #[serde(default)]
        value: Option<Value>,
    },
}

// ── Host → Client ─────────────────────────────────────────────────────────────

/// Outcome status of a command dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    /// Accepted; no emission was required.
    Received,
    /// Resolved and emitted to the input collaborator.
    Executed,
    /// No mapping anywhere; not a session-ending error.
    Unknown,
    /// Resolution or emission failed; the session continues.
    Error,
}

/// One favorites slot in a `favorites_data` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub assigned: bool,
    pub icon: String,
    pub description: String,
    pub command: Option<String>,
}

/// A message sent to a remote device.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HostMessage {
    /// Sent on connect: lists the acceptable credential forms.
    AuthRequired {
        #[serde(rename = "type")]
        kind: AuthRequiredTag,
        methods: Vec<String>,
        message: String,
    },
    /// Handshake outcome.
    AuthResponse {
        #[serde(rename = "type")]
        kind: AuthResponseTag,
        success: bool,
        message: String,
    },
    /// Unsolicited push after authentication and on app change.
    AppDetected {
        action: AppDetectedTag,
        app: Option<String>,
        app_name: Option<String>,
        supported_tools: Vec<String>,
        has_favorites: bool,
    },
    /// Snapshot of the twelve quick-access slots.
    FavoritesData {
        action: FavoritesDataTag,
        favorites: BTreeMap<String, FavoriteEntry>,
        total_assigned: usize,
    },
    /// Per-command acknowledgement.
    Ack {
        status: AckStatus,
        action: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl HostMessage {
    pub fn auth_required() -> Self {
        HostMessage::AuthRequired {
            kind: AuthRequiredTag::AuthRequired,
            methods: vec!["token".to_string(), "pin".to_string()],
            message: "Authentication required".to_string(),
        }
    }

    pub fn auth_response(success: bool, message: impl Into<String>) -> Self {
        HostMessage::AuthResponse {
            kind: AuthResponseTag::AuthResponse,
            success,
            message: message.into(),
        }
    }

    /// Builds the `app_detected` push from the detected application and its
    /// merged shortcut table.
    pub fn app_detected(app: Option<AppId>, table: &ShortcutTable) -> Self {
        HostMessage::AppDetected {
            action: AppDetectedTag::AppDetected,
            app: app.map(|a| a.as_str().to_string()),
            app_name: app.map(|a| a.display_name().to_string()),
            supported_tools: table
                .supported_actions()
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            has_favorites: table.has_favorites(),
        }
    }

    /// Builds the full F1..F12 snapshot; unassigned slots are reported as
    /// available rather than omitted so the remote can render all twelve.
    pub fn favorites_data(table: &ShortcutTable) -> Self {
        let mut favorites = BTreeMap::new();
        for slot in 1..=SLOT_COUNT {
            let label = format!("F{slot}");
            let entry = match table.slot(slot) {
                Some(info) => FavoriteEntry {
                    assigned: true,
                    icon: info.icon.clone(),
                    description: info.description.clone(),
                    command: Some(info.command.clone()),
                },
                None => FavoriteEntry {
                    assigned: false,
                    icon: "➕".to_string(),
                    description: format!("Available F{slot}"),
                    command: None,
                },
            };
            favorites.insert(label, entry);
        }
        HostMessage::FavoritesData {
            action: FavoritesDataTag::FavoritesData,
            total_assigned: table.assigned_slot_count(),
            favorites,
        }
    }

    pub fn ack(status: AckStatus, action: impl Into<String>) -> Self {
        HostMessage::Ack {
            status,
            action: action.into(),
            message: None,
        }
    }

    pub fn ack_with_message(
        status: AckStatus,
        action: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        HostMessage::Ack {
            status,
            action: action.into(),
            message: Some(message.into()),
        }
    }
}
