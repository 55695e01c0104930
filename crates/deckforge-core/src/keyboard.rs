//! Keyboard shortcut registry.

use crate::input::Modifiers;

/// Action bound to a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutAction {
    Group,
    Ungroup,
    DeleteSelection,
    /// Cancel the gesture, leave group edit, or clear the selection.
    Escape,
    Undo,
    Redo,
    SelectAll,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    /// Cmd on macOS, Ctrl elsewhere.
    pub command: bool,
    pub shift: bool,
    pub action: ShortcutAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        command: bool,
        shift: bool,
        action: ShortcutAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            command,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+G").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.command {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    /// Whether a key press triggers this shortcut. Letter keys match
    /// case-insensitively since Shift changes the reported case.
    pub fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.key.eq_ignore_ascii_case(key)
            && self.command == modifiers.command()
            && self.shift == modifiers.shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("G", true, false, ShortcutAction::Group, "Group selected components"),
            Shortcut::new("G", true, true, ShortcutAction::Ungroup, "Ungroup selected groups"),
            Shortcut::new("Delete", false, false, ShortcutAction::DeleteSelection, "Delete selected components"),
            Shortcut::new("Backspace", false, false, ShortcutAction::DeleteSelection, "Delete selected components"),
            Shortcut::new("Escape", false, false, ShortcutAction::Escape, "Cancel drag, leave group, or clear selection"),
            Shortcut::new("Z", true, false, ShortcutAction::Undo, "Undo"),
            Shortcut::new("Z", true, true, ShortcutAction::Redo, "Redo"),
            Shortcut::new("Y", true, false, ShortcutAction::Redo, "Redo"),
            Shortcut::new("A", true, false, ShortcutAction::SelectAll, "Select all components"),
        ]
    }
}

/// Resolve a key press to an action.
pub fn resolve_shortcut(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
    ShortcutRegistry::all()
        .into_iter()
        .find(|shortcut| shortcut.matches(key, modifiers))
        .map(|shortcut| shortcut.action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd_shift() -> Modifiers {
        Modifiers {
            shift: true,
            meta: true,
            ..Modifiers::NONE
        }
    }

    #[test]
    fn test_group_shortcuts() {
        assert_eq!(resolve_shortcut("g", Modifiers::meta()), Some(ShortcutAction::Group));
        assert_eq!(resolve_shortcut("g", Modifiers::ctrl()), Some(ShortcutAction::Group));
        assert_eq!(resolve_shortcut("G", cmd_shift()), Some(ShortcutAction::Ungroup));
        assert_eq!(resolve_shortcut("g", Modifiers::NONE), None);
    }

    #[test]
    fn test_delete_and_escape() {
        assert_eq!(resolve_shortcut("Delete", Modifiers::NONE), Some(ShortcutAction::DeleteSelection));
        assert_eq!(resolve_shortcut("Backspace", Modifiers::NONE), Some(ShortcutAction::DeleteSelection));
        assert_eq!(resolve_shortcut("Escape", Modifiers::NONE), Some(ShortcutAction::Escape));
    }

    #[test]
    fn test_undo_redo() {
        assert_eq!(resolve_shortcut("z", Modifiers::ctrl()), Some(ShortcutAction::Undo));
        assert_eq!(resolve_shortcut("Z", cmd_shift()), Some(ShortcutAction::Redo));
        assert_eq!(resolve_shortcut("y", Modifiers::ctrl()), Some(ShortcutAction::Redo));
        assert_eq!(resolve_shortcut("a", Modifiers::meta()), Some(ShortcutAction::SelectAll));
    }

    #[test]
    fn test_format() {
        let ungroup = ShortcutRegistry::all()
            .into_iter()
            .find(|s| s.action == ShortcutAction::Ungroup)
            .unwrap();
        assert_eq!(ungroup.format(), "Ctrl+Shift+G");
    }
}
