//! Built-in default shortcut tables and display-label heuristics.
//!
//! Defaults fill the gaps left by an application's own configuration store
//! (or replace it entirely when the store is missing).  The key choices
//! mirror each application's stock bindings: Krita follows the platform
//! convention (Cmd on macOS, Ctrl elsewhere); Clip Studio Paint binds Ctrl
//! on every platform.

use crate::domain::action::ActionName;
use crate::domain::app::{AppId, Platform};
use crate::domain::keys::{KeySequence, KeyToken};
use crate::domain::shortcut_table::ShortcutTable;
use crate::keyseq;

use ActionName::*;
use KeyToken::*;

/// Returns the built-in table for a known application.
pub fn table_for(app: AppId, platform: Platform) -> ShortcutTable {
    match app {
        AppId::Krita => krita(platform),
        AppId::ClipStudioPaint => clip_studio(platform),
    }
}

/// Fallback table used when the foreground application is unrecognized or
/// undetected.  Only the bindings that are near-universal across canvas
/// applications, so a dispatch always resolves to *something* sensible.
pub fn generic(platform: Platform) -> ShortcutTable {
    let primary = primary_modifier(platform);
    let mut t = ShortcutTable::new();
    t.insert(Undo, keyseq![primary, Char('z')]);
    t.insert(Redo, keyseq![primary, Shift, Char('z')]);
    t.insert(ZoomIn, keyseq![primary, Char('+')]);
    t.insert(ZoomOut, keyseq![primary, Char('-')]);
    t.insert(ToolBrush, KeySequence::single(Char('b')));
    t.insert(ToolEraser, KeySequence::single(Char('e')));
    t
}

fn krita(platform: Platform) -> ShortcutTable {
    let primary = primary_modifier(platform);
    let mut t = ShortcutTable::new();
    t.insert(Undo, keyseq![primary, Char('z')]);
    t.insert(Redo, keyseq![primary, Shift, Char('z')]);
    t.insert(ZoomIn, keyseq![primary, Char('+')]);
    t.insert(ZoomOut, keyseq![primary, Char('-')]);
    t.insert(RotateLeft, keyseq![primary, Char('[')]);
    t.insert(RotateRight, keyseq![primary, Char(']')]);
    t.insert(ToolBrush, KeySequence::single(Char('b')));
    t.insert(ToolEraser, KeySequence::single(Char('e')));
    t.insert(ToolPan, KeySequence::single(Space));
    t.insert(ToolSelect, KeySequence::single(Char('r')));
    t.insert(LayerNew, keyseq![Ctrl, Shift, Char('n')]);
    t.insert(LayerDelete, KeySequence::single(Delete));
    t.insert(LayerUp, keyseq![Alt, Char(']')]);
    t.insert(LayerDown, keyseq![Alt, Char('[')]);
    t.insert(BrushSizeUp, KeySequence::single(Char(']')));
    t.insert(BrushSizeDown, KeySequence::single(Char('[')));
    t
}

fn clip_studio(platform: Platform) -> ShortcutTable {
    // CSP keeps Ctrl-based menu shortcuts on macOS as well; only the
    // layer-management chords follow the platform modifier.
    let primary = primary_modifier(platform);
    let mut t = ShortcutTable::new();
    t.insert(Undo, keyseq![Ctrl, Char('z')]);
    t.insert(Redo, keyseq![Ctrl, Char('y')]);
    t.insert(ZoomIn, keyseq![Ctrl, Char('+')]);
    t.insert(ZoomOut, keyseq![Ctrl, Char('-')]);
    t.insert(RotateLeft, KeySequence::single(Char('-')));
    t.insert(RotateRight, keyseq![Shift, Char('6')]);
    t.insert(ToolBrush, KeySequence::single(Char('b')));
    t.insert(ToolPen, KeySequence::single(Char('p')));
    t.insert(ToolPencil, KeySequence::single(Char('c')));
    t.insert(ToolAirbrush, KeySequence::single(Char('a')));
    t.insert(ToolDecoration, KeySequence::single(Char('d')));
    t.insert(ToolBlend, KeySequence::single(Char('j')));
    t.insert(ToolLiquify, KeySequence::single(Char('q')));
    t.insert(ToolEraser, KeySequence::single(Char('e')));
    t.insert(ToolPan, KeySequence::single(Char('h')));
    t.insert(ToolSelect, KeySequence::single(Char('m')));
    t.insert(ToolFill, KeySequence::single(Char('g')));
    t.insert(ToolEyedropper, KeySequence::single(Char('i')));
    t.insert(LayerNew, keyseq![primary, Shift, Char('n')]);
    t.insert(LayerFolder, keyseq![primary, Char('g')]);
    t.insert(LayerMerge, KeySequence::single(Char('e')));
    t.insert(LayerDelete, KeySequence::single(Delete));
    t.insert(LayerUp, keyseq![Alt, Char(']')]);
    t.insert(LayerDown, keyseq![Alt, Char('[')]);
    t.insert(BrushSizeUp, KeySequence::single(Char(']')));
    t.insert(BrushSizeDown, KeySequence::single(Char('[')));
    t.insert(ResetCanvas, keyseq![primary, Char('2')]);
    t
}

fn primary_modifier(platform: Platform) -> KeyToken {
    match platform {
        Platform::MacOs => Cmd,
        Platform::Windows | Platform::Linux => Ctrl,
    }
}

// ── Display-label heuristics ──────────────────────────────────────────────────

/// Icon for a custom tool, guessed from its name.
pub fn tool_icon(tool_name: &str) -> &'static str {
    let lower = tool_name.to_lowercase();
    if lower.contains("watercolor") {
        "💧"
    } else if lower.contains("brush") {
        "🖌️"
    } else if lower.contains("pen") {
        "🖊️"
    } else if lower.contains("pencil") {
        "✏️"
    } else if lower.contains("eraser") {
        "🧽"
    } else if lower.contains("airbrush") {
        "🎨"
    } else {
        "🔧"
    }
}

/// Readable description for a vendor menu-command identifier.
pub fn command_description(command: &str) -> String {
    match command {
        "cut" => "Cut".to_string(),
        "copy" => "Copy".to_string(),
        "paste" => "Paste".to_string(),
        "undo" => "Undo".to_string(),
        "redo" => "Redo".to_string(),
        "helponlinehowto" => "Help/Tutorial".to_string(),
        "subtoolprevioussubtool" => "Previous Sub-tool".to_string(),
        "subtoolnextsubtool" => "Next Sub-tool".to_string(),
        "selectinvert" => "Invert Selection".to_string(),
        other => title_case(other),
    }
}

/// Icon for a vendor menu-command identifier.
pub fn command_icon(command: &str) -> &'static str {
    match command {
        "cut" => "✂️",
        "copy" => "📋",
        "paste" => "📥",
        "undo" => "↶",
        "redo" => "↷",
        "helponlinehowto" => "❓",
        "subtoolprevioussubtool" => "⬅️",
        "subtoolnextsubtool" => "➡️",
        "selectinvert" => "🔄",
        _ => "🔧",
    }
}

fn title_case(identifier: &str) -> String {
    identifier
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_krita_macos_uses_cmd_for_undo() {
        let table = table_for(AppId::Krita, Platform::MacOs);
        let seq = table.lookup(ActionName::Undo).unwrap();
        assert_eq!(seq.tokens()[0], KeyToken::Cmd);
    }

    #[test]
    fn test_clip_studio_keeps_ctrl_on_macos() {
        // CSP's menu shortcuts stay Ctrl-based even on macOS.
        let table = table_for(AppId::ClipStudioPaint, Platform::MacOs);
        let seq = table.lookup(ActionName::Undo).unwrap();
        assert_eq!(seq.tokens()[0], KeyToken::Ctrl);
    }

    #[test]
    fn test_generic_table_covers_zoom_both_ways() {
        let table = generic(Platform::Windows);
        assert!(table.lookup(ActionName::ZoomIn).is_some());
        assert!(table.lookup(ActionName::ZoomOut).is_some());
        assert!(table.lookup(ActionName::LayerMerge).is_none());
    }

    #[test]
    fn test_tool_icon_heuristics() {
        assert_eq!(tool_icon("Watercolor Round"), "💧");
        assert_eq!(tool_icon("G-Pen"), "🖊️");
        assert_eq!(tool_icon("Mystery Gadget"), "🔧");
    }

    #[test]
    fn test_command_description_falls_back_to_title_case() {
        assert_eq!(command_description("undo"), "Undo");
        assert_eq!(command_description("flip_horizontal"), "Flip Horizontal");
    }
}
