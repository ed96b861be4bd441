#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Character(char),
    Enter,
    Escape,
    Delete,
    Backspace,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortcutModifiers {
    pub ctrl: bool,
    pub shift: bool,
    /// Cmd on macOS, Super elsewhere.
    pub meta: bool,
}

impl ShortcutModifiers {
    pub const fn new(ctrl: bool, shift: bool) -> Self {
        Self {
            ctrl,
            shift,
            meta: false,
        }
    }

    pub const fn command() -> Self {
        Self::new(true, false)
    }

    pub const fn with_meta(mut self, meta: bool) -> Self {
        self.meta = meta;
        self
    }

    /// Ctrl or Cmd, whichever the platform uses for editing shortcuts.
    pub const fn is_command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    pub text_input_active: bool,
    pub crop_dragging: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    TextInsertLineBreak,
    TextCommit,
    TextCopySelection,
    TextCancel,
    CropCancel,
    EditorUndo,
    EditorRedo,
    EditorCopyImage,
}

fn resolve_text_shortcut(key: ShortcutKey, modifiers: ShortcutModifiers) -> Option<ShortcutAction> {
    match (key, modifiers.is_command(), modifiers.shift) {
        (ShortcutKey::Enter, false, true) => Some(ShortcutAction::TextInsertLineBreak),
        (ShortcutKey::Enter, _, _) => Some(ShortcutAction::TextCommit),
        (ShortcutKey::Character('c' | 'C'), true, _) => Some(ShortcutAction::TextCopySelection),
        (ShortcutKey::Character('z' | 'Z'), true, false) => Some(ShortcutAction::EditorUndo),
        (ShortcutKey::Character('z' | 'Z'), true, true)
        | (ShortcutKey::Character('y' | 'Y'), true, _) => Some(ShortcutAction::EditorRedo),
        (ShortcutKey::Escape, _, _) => Some(ShortcutAction::TextCancel),
        _ => None,
    }
}

fn resolve_crop_shortcut(key: ShortcutKey) -> Option<ShortcutAction> {
    match key {
        ShortcutKey::Escape => Some(ShortcutAction::CropCancel),
        _ => None,
    }
}

fn resolve_editor_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
) -> Option<ShortcutAction> {
    if !modifiers.is_command() {
        return None;
    }
    let ShortcutKey::Character(character) = key else {
        return None;
    };
    match (character.to_ascii_lowercase(), modifiers.shift) {
        ('z', false) => Some(ShortcutAction::EditorUndo),
        ('z', true) | ('y', _) => Some(ShortcutAction::EditorRedo),
        ('c' | 'v', _) => Some(ShortcutAction::EditorCopyImage),
        _ => None,
    }
}

/// Maps a key press to an editor action. Text composition owns the keyboard
/// while it is open apart from undo and redo, and a crop drag only reacts to
/// Escape.
pub fn resolve_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    if context.text_input_active {
        return resolve_text_shortcut(key, modifiers);
    }

    if context.crop_dragging {
        return resolve_crop_shortcut(key);
    }

    resolve_editor_shortcut(key, modifiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_shortcut_prioritizes_text_over_editor_copy_and_paste() {
        let context = InputContext {
            text_input_active: true,
            ..Default::default()
        };
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('c'),
                ShortcutModifiers::command(),
                context
            ),
            Some(ShortcutAction::TextCopySelection)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('v'),
                ShortcutModifiers::command(),
                context
            ),
            None
        );
    }

    #[test]
    fn resolve_shortcut_keeps_undo_and_redo_while_typing() {
        let context = InputContext {
            text_input_active: true,
            ..Default::default()
        };
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('z'),
                ShortcutModifiers::command(),
                context
            ),
            Some(ShortcutAction::EditorUndo)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('Z'),
                ShortcutModifiers::new(true, true),
                context
            ),
            Some(ShortcutAction::EditorRedo)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('y'),
                ShortcutModifiers::default().with_meta(true),
                context
            ),
            Some(ShortcutAction::EditorRedo)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('z'),
                ShortcutModifiers::default(),
                context
            ),
            None
        );
    }

    #[test]
    fn resolve_shortcut_maps_enter_variants_while_typing() {
        let context = InputContext {
            text_input_active: true,
            ..Default::default()
        };
        assert_eq!(
            resolve_shortcut(ShortcutKey::Enter, ShortcutModifiers::default(), context),
            Some(ShortcutAction::TextCommit)
        );
        assert_eq!(
            resolve_shortcut(ShortcutKey::Enter, ShortcutModifiers::new(false, true), context),
            Some(ShortcutAction::TextInsertLineBreak)
        );
        assert_eq!(
            resolve_shortcut(ShortcutKey::Escape, ShortcutModifiers::default(), context),
            Some(ShortcutAction::TextCancel)
        );
    }

    #[test]
    fn resolve_shortcut_limits_crop_drag_to_escape() {
        let context = InputContext {
            crop_dragging: true,
            ..Default::default()
        };
        assert_eq!(
            resolve_shortcut(ShortcutKey::Escape, ShortcutModifiers::default(), context),
            Some(ShortcutAction::CropCancel)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('z'),
                ShortcutModifiers::command(),
                context
            ),
            None
        );
    }

    #[test]
    fn resolve_shortcut_maps_editor_shortcuts() {
        let context = InputContext::default();
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('z'),
                ShortcutModifiers::command(),
                context
            ),
            Some(ShortcutAction::EditorUndo)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('Z'),
                ShortcutModifiers::new(true, true),
                context
            ),
            Some(ShortcutAction::EditorRedo)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('y'),
                ShortcutModifiers::default().with_meta(true),
                context
            ),
            Some(ShortcutAction::EditorRedo)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('v'),
                ShortcutModifiers::command(),
                context
            ),
            Some(ShortcutAction::EditorCopyImage)
        );
    }

    #[test]
    fn resolve_shortcut_ignores_plain_keys_and_idle_escape() {
        let context = InputContext::default();
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('z'),
                ShortcutModifiers::default(),
                context
            ),
            None
        );
        assert_eq!(
            resolve_shortcut(ShortcutKey::Escape, ShortcutModifiers::default(), context),
            None
        );
    }
}
