//! Canonical action vocabulary and normalized commands.
//!
//! Remote devices send loosely-typed `{action, value}` records.  This module
//! turns them into a closed set of [`Command`] variants exactly once, at the
//! message boundary, so the dispatcher never performs ad hoc string matching.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::protocol::payload::Payload;

/// Canonical, application-agnostic action name.
///
/// These are the unique keys of a [`crate::ShortcutTable`].  A missing entry
/// for a given application/platform is a defined "unsupported" outcome, not
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    Undo,
    Redo,
    ZoomIn,
    ZoomOut,
    RotateLeft,
    RotateRight,
    ToolBrush,
    ToolPen,
    ToolPencil,
    ToolAirbrush,
    ToolDecoration,
    ToolBlend,
    ToolLiquify,
    ToolEraser,
    ToolPan,
    ToolSelect,
    ToolFill,
    ToolEyedropper,
    LayerNew,
    LayerDelete,
    LayerUp,
    LayerDown,
    LayerFolder,
    LayerMerge,
    BrushSizeUp,
    BrushSizeDown,
    ResetCanvas,
}

impl ActionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::Undo => "undo",
            ActionName::Redo => "redo",
            ActionName::ZoomIn => "zoom_in",
            ActionName::ZoomOut => "zoom_out",
            ActionName::RotateLeft => "rotate_left",
            ActionName::RotateRight => "rotate_right",
            ActionName::ToolBrush => "tool_brush",
            ActionName::ToolPen => "tool_pen",
            ActionName::ToolPencil => "tool_pencil",
            ActionName::ToolAirbrush => "tool_airbrush",
            ActionName::ToolDecoration => "tool_decoration",
            ActionName::ToolBlend => "tool_blend",
            ActionName::ToolLiquify => "tool_liquify",
            ActionName::ToolEraser => "tool_eraser",
            ActionName::ToolPan => "tool_pan",
            ActionName::ToolSelect => "tool_select",
            ActionName::ToolFill => "tool_fill",
            ActionName::ToolEyedropper => "tool_eyedropper",
            ActionName::LayerNew => "layer_new",
            ActionName::LayerDelete => "layer_delete",
            ActionName::LayerUp => "layer_up",
            ActionName::LayerDown => "layer_down",
            ActionName::LayerFolder => "layer_folder",
            ActionName::LayerMerge => "layer_merge",
            ActionName::BrushSizeUp => "brush_size_up",
            ActionName::BrushSizeDown => "brush_size_down",
            ActionName::ResetCanvas => "reset_canvas",
        }
    }

    /// Every canonical action, in declaration order.  Used to report
    /// `supported_tools` for a freshly detected application.
    pub fn all() -> &'static [ActionName] {
        use ActionName::*;
        &[
            Undo,
            Redo,
            ZoomIn,
            ZoomOut,
            RotateLeft,
            RotateRight,
            ToolBrush,
            ToolPen,
            ToolPencil,
            ToolAirbrush,
            ToolDecoration,
            ToolBlend,
            ToolLiquify,
            ToolEraser,
            ToolPan,
            ToolSelect,
            ToolFill,
            ToolEyedropper,
            LayerNew,
            LayerDelete,
            LayerUp,
            LayerDown,
            LayerFolder,
            LayerMerge,
            BrushSizeUp,
            BrushSizeDown,
            ResetCanvas,
        ]
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ActionName::*;
        match s {
            "undo" => Ok(Undo),
            "redo" => Ok(Redo),
            "zoom_in" => Ok(ZoomIn),
            "zoom_out" => Ok(ZoomOut),
            "rotate_left" => Ok(RotateLeft),
            "rotate_right" => Ok(RotateRight),
            "tool_brush" => Ok(ToolBrush),
            "tool_pen" => Ok(ToolPen),
            "tool_pencil" => Ok(ToolPencil),
            "tool_airbrush" => Ok(ToolAirbrush),
            "tool_decoration" => Ok(ToolDecoration),
            "tool_blend" => Ok(ToolBlend),
            "tool_liquify" => Ok(ToolLiquify),
            "tool_eraser" => Ok(ToolEraser),
            "tool_pan" => Ok(ToolPan),
            "tool_select" => Ok(ToolSelect),
            "tool_fill" => Ok(ToolFill),
            "tool_eyedropper" => Ok(ToolEyedropper),
            "layer_new" => Ok(LayerNew),
            "layer_delete" => Ok(LayerDelete),
            "layer_up" => Ok(LayerUp),
            "layer_down" => Ok(LayerDown),
            "layer_folder" => Ok(LayerFolder),
            "layer_merge" => Ok(LayerMerge),
            "brush_size_up" => Ok(BrushSizeUp),
            "brush_size_down" => Ok(BrushSizeDown),
            "reset_canvas" => Ok(ResetCanvas),
            _ => Err(()),
        }
    }
}

/// Zoom/scroll direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Canvas pan direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Left,
    Right,
}

/// A normalized command, produced by [`Command::from_wire`] from the raw
/// `{action, value}` record.
///
/// Compound variants (zoom, rotate, favorites selection) carry the data the
/// dispatcher needs for its decomposition step; everything else resolves via
/// a single shortcut-table lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Direct shortcut-table lookup, e.g. `undo` or `tool_brush`.
    Simple(ActionName),
    /// Repeated zoom emissions scaled by intensity.
    Zoom {
        direction: ZoomDirection,
        intensity: f64,
    },
    /// Repeated rotate emissions, one step per five degrees.
    Rotate { degrees: f64 },
    /// Wheel-style zoom: a single zoom step per event.
    Scroll { direction: ZoomDirection },
    /// Tool switch by short name (`brush`, `eraser`, `pan`, `select`).
    Tool { name: String },
    /// Brush size nudge; the sign of `delta` selects the direction.
    BrushSize { delta: i64 },
    /// Temporary hand-tool pan.
    CanvasPan { direction: PanDirection },
    /// Legacy `{action: "layer", value: {action: new|delete}}` form.
    LayerLegacy { create: bool },
    /// Tool/sub-tool selection, including favorites slots (`F1`..`F12`).
    SelectTool {
        tool: String,
        subtool_name: String,
        /// Favorites slot number when `tool == "favorites"`.
        slot: Option<u8>,
    },
    /// Control command: rescan the vendor store and return the slot table.
    RefreshFavorites,
    /// Action with no mapping anywhere; answered with `status: "unknown"`.
    Unknown(String),
}

impl Command {
    /// Normalizes a raw wire record into a `Command`.
    ///
    /// `value` may be a structured object, a legacy `"{k=v, ...}"` string, a
    /// bare number, or absent; [`Payload`] flattens all of these.  This is
    /// the only place that interprets the wire encoding of command payloads.
    pub fn from_wire(action: &str, value: Option<&serde_json::Value>) -> Command {
        let payload = value.map(Payload::decode).unwrap_or_default();

        match action {
            "zoom" => Command::Zoom {
                direction: zoom_direction(payload.str_field("direction")),
                intensity: payload.num_field("intensity").unwrap_or(1.0),
            },
            "rotate" => Command::Rotate {
                degrees: payload
                    .num_field("degrees")
                    .or_else(|| payload.bare_number())
                    .unwrap_or(15.0),
            },
            "scroll" => match payload.str_field("direction") {
                Some("down") => Command::Scroll {
                    direction: ZoomDirection::Out,
                },
                _ => Command::Scroll {
                    direction: ZoomDirection::In,
                },
            },
            "tool" => match payload.str_field("name") {
                Some(name) => Command::Tool {
                    name: name.to_string(),
                },
                None => Command::Unknown(action.to_string()),
            },
            "brush_size" => Command::BrushSize {
                delta: payload.num_field("delta").unwrap_or(0.0) as i64,
            },
            "canvas_pan" => match payload.str_field("direction") {
                Some("left") => Command::CanvasPan {
                    direction: PanDirection::Left,
                },
                Some("right") => Command::CanvasPan {
                    direction: PanDirection::Right,
                },
                _ => Command::Unknown(action.to_string()),
            },
            "layer" => match payload.str_field("action") {
                Some("new") => Command::LayerLegacy { create: true },
                Some("delete") => Command::LayerLegacy { create: false },
                _ => Command::Unknown(action.to_string()),
            },
            "select_brush" | "select_subtool" | "select_tool" => {
                let tool = payload
                    .str_field("tool")
                    .unwrap_or("unknown")
                    .to_string();
                let subtool_name = payload
                    .str_field("subtool_name")
                    .or_else(|| payload.str_field("tool_name"))
                    .or_else(|| payload.str_field("name"))
                    .unwrap_or("unknown")
                    .to_string();
                let slot = payload
                    .str_field("subtool_uuid")
                    .or_else(|| payload.str_field("uuid"))
                    .and_then(parse_slot_label);
                Command::SelectTool {
                    tool,
                    subtool_name,
                    slot,
                }
            }
            "get_favorites" => Command::RefreshFavorites,
            other => match other.parse::<ActionName>() {
                Ok(name) => Command::Simple(name),
                Err(()) => Command::Unknown(other.to_string()),
            },
        }
    }
}

fn zoom_direction(raw: Option<&str>) -> ZoomDirection {
    match raw {
        Some("out") => ZoomDirection::Out,
        _ => ZoomDirection::In,
    }
}

/// Parses a favorites slot label like `"F5"` into its slot number.
///
/// Labels outside `F1`..`F12` are rejected; the caller answers with an
/// error ack rather than guessing.
fn parse_slot_label(label: &str) -> Option<u8> {
    let rest = label.strip_prefix('F').or_else(|| label.strip_prefix('f'))?;
    let n: u8 = rest.parse().ok()?;
    (1..=crate::domain::shortcut_table::SLOT_COUNT).contains(&n).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_name_round_trip() {
        for name in ActionName::all() {
            assert_eq!(name.as_str().parse::<ActionName>(), Ok(*name));
        }
    }

    #[test]
    fn test_from_wire_structured_zoom() {
        // Arrange
        let value = json!({"direction": "in", "intensity": 1.5});

        // Act
        let cmd = Command::from_wire("zoom", Some(&value));

        // Assert
        assert_eq!(
            cmd,
            Command::Zoom {
                direction: ZoomDirection::In,
                intensity: 1.5
            }
        );
    }

    #[test]
    fn test_from_wire_legacy_string_zoom() {
        // The legacy Android client sends the payload as a formatted string.
        let value = json!("{direction=out, intensity=2.0}");
        let cmd = Command::from_wire("zoom", Some(&value));
        assert_eq!(
            cmd,
            Command::Zoom {
                direction: ZoomDirection::Out,
                intensity: 2.0
            }
        );
    }

    #[test]
    fn test_from_wire_rotate_bare_number() {
        let value = json!(-20.0);
        let cmd = Command::from_wire("rotate", Some(&value));
        assert_eq!(cmd, Command::Rotate { degrees: -20.0 });
    }

    #[test]
    fn test_from_wire_favorites_slot() {
        let value = json!({"tool": "favorites", "tool_name": "Wet Oil", "subtool_uuid": "F5"});
        let cmd = Command::from_wire("select_tool", Some(&value));
        assert_eq!(
            cmd,
            Command::SelectTool {
                tool: "favorites".to_string(),
                subtool_name: "Wet Oil".to_string(),
                slot: Some(5),
            }
        );
    }

    #[test]
    fn test_from_wire_invalid_slot_label_is_none() {
        let value = json!({"tool": "favorites", "subtool_uuid": "F13"});
        let cmd = Command::from_wire("select_brush", Some(&value));
        match cmd {
            Command::SelectTool { slot, .. } => assert_eq!(slot, None),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_from_wire_direct_action_name() {
        let cmd = Command::from_wire("layer_new", None);
        assert_eq!(cmd, Command::Simple(ActionName::LayerNew));
    }

    #[test]
    fn test_from_wire_unknown_action() {
        let cmd = Command::from_wire("make_coffee", None);
        assert_eq!(cmd, Command::Unknown("make_coffee".to_string()));
    }

    #[test]
    fn test_from_wire_brush_size_legacy_delta() {
        let value = json!("{delta=5}");
        let cmd = Command::from_wire("brush_size", Some(&value));
        assert_eq!(cmd, Command::BrushSize { delta: 5 });
    }
}
