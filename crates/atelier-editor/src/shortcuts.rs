//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s, then filters
//! them through the `keyEvent` toggles of the canvas config. The map lives
//! in Rust so the WASM bridge and native hosts agree on bindings.

use crate::input::Modifiers;
use atelier_core::config::KeyEventConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    // ── Edit ──
    /// Move the selection by `(dx, dy)` canvas px.
    Nudge { dx: f64, dy: f64 },
    Delete,
    SelectAll,
    Copy,
    Cut,
    Paste,
    Duplicate,
    Undo,
    Redo,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomToFit,
    ZoomOneToOne,
    /// Space held: temporary grab mode.
    GrabStart,
    GrabEnd,

    // ── Modes ──
    Escape,
}

/// Nudge distances.
const NUDGE: f64 = 1.0;
const NUDGE_SHIFT: f64 = 10.0;

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key-down event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"ArrowLeft"`).
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "c" | "C" => Some(ShortcutAction::Copy),
                "x" | "X" => Some(ShortcutAction::Cut),
                "v" | "V" => Some(ShortcutAction::Paste),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomToFit),
                "1" => Some(ShortcutAction::ZoomOneToOne),
                _ => None,
            };
        }

        let step = if modifiers.shift { NUDGE_SHIFT } else { NUDGE };
        match key {
            "ArrowLeft" => Some(ShortcutAction::Nudge { dx: -step, dy: 0.0 }),
            "ArrowRight" => Some(ShortcutAction::Nudge { dx: step, dy: 0.0 }),
            "ArrowUp" => Some(ShortcutAction::Nudge { dx: 0.0, dy: -step }),
            "ArrowDown" => Some(ShortcutAction::Nudge { dx: 0.0, dy: step }),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Escape),
            " " => Some(ShortcutAction::GrabStart),
            _ => None,
        }
    }

    /// Resolve a key-up event. Only releasing space means anything.
    pub fn resolve_release(key: &str) -> Option<ShortcutAction> {
        (key == " ").then_some(ShortcutAction::GrabEnd)
    }

    /// Is this action switched on by the `keyEvent` toggles?
    pub fn enabled(action: ShortcutAction, keys: &KeyEventConfig) -> bool {
        match action {
            ShortcutAction::Nudge { .. } => keys.nudge,
            ShortcutAction::Delete => keys.del,
            ShortcutAction::SelectAll => keys.all,
            ShortcutAction::Copy => keys.copy,
            ShortcutAction::Cut => keys.cut,
            ShortcutAction::Paste => keys.paste,
            ShortcutAction::Duplicate => keys.copy && keys.paste,
            ShortcutAction::Undo | ShortcutAction::Redo => keys.transaction,
            ShortcutAction::ZoomIn
            | ShortcutAction::ZoomOut
            | ShortcutAction::ZoomToFit
            | ShortcutAction::ZoomOneToOne => keys.zoom,
            ShortcutAction::GrabStart | ShortcutAction::GrabEnd => keys.grab,
            ShortcutAction::Escape => keys.esc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };

    #[test]
    fn resolve_undo_redo() {
        assert_eq!(ShortcutMap::resolve("z", CTRL), Some(ShortcutAction::Undo));
        let cmd_shift = Modifiers {
            shift: true,
            meta: true,
            ..Modifiers::NONE
        };
        assert_eq!(ShortcutMap::resolve("Z", cmd_shift), Some(ShortcutAction::Redo));
        assert_eq!(ShortcutMap::resolve("y", CTRL), Some(ShortcutAction::Redo));
    }

    #[test]
    fn arrows_nudge_one_or_ten() {
        assert_eq!(
            ShortcutMap::resolve("ArrowLeft", Modifiers::NONE),
            Some(ShortcutAction::Nudge { dx: -1.0, dy: 0.0 })
        );
        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };
        assert_eq!(
            ShortcutMap::resolve("ArrowDown", shift),
            Some(ShortcutAction::Nudge { dx: 0.0, dy: 10.0 })
        );
    }

    #[test]
    fn clipboard_and_view_keys() {
        assert_eq!(ShortcutMap::resolve("c", CTRL), Some(ShortcutAction::Copy));
        assert_eq!(ShortcutMap::resolve("v", CTRL), Some(ShortcutAction::Paste));
        assert_eq!(ShortcutMap::resolve("0", CTRL), Some(ShortcutAction::ZoomToFit));
        assert_eq!(ShortcutMap::resolve("v", Modifiers::NONE), None);
    }

    #[test]
    fn space_press_and_release() {
        assert_eq!(
            ShortcutMap::resolve(" ", Modifiers::NONE),
            Some(ShortcutAction::GrabStart)
        );
        assert_eq!(ShortcutMap::resolve_release(" "), Some(ShortcutAction::GrabEnd));
        assert_eq!(ShortcutMap::resolve_release("a"), None);
    }

    #[test]
    fn toggles_gate_actions() {
        let keys = KeyEventConfig {
            del: false,
            ..KeyEventConfig::default()
        };
        assert!(!ShortcutMap::enabled(ShortcutAction::Delete, &keys));
        assert!(ShortcutMap::enabled(ShortcutAction::Undo, &keys));
    }
}
