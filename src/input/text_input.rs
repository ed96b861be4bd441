use super::{ShortcutKey, ShortcutModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputEvent {
    Character(char),
    Backspace,
    Enter,
    ShiftEnter,
    CtrlEnter,
    CtrlC,
    Escape,
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputAction {
    InsertCharacter(char),
    DeleteBackward,
    InsertLineBreak,
    MoveCursor,
    Commit,
    Cancel,
    /// Copy belongs to the text field; the image copy must not fire.
    CopyRequested,
    NoTextTarget,
    NoAction,
}

pub fn resolve_text_input(event: TextInputEvent, has_target: bool) -> TextInputAction {
    if !has_target {
        return TextInputAction::NoTextTarget;
    }
    match event {
        TextInputEvent::Character(c) if !c.is_control() => TextInputAction::InsertCharacter(c),
        TextInputEvent::Character(_) => TextInputAction::NoAction,
        TextInputEvent::Backspace => TextInputAction::DeleteBackward,
        TextInputEvent::ShiftEnter => TextInputAction::InsertLineBreak,
        TextInputEvent::Enter | TextInputEvent::CtrlEnter => TextInputAction::Commit,
        TextInputEvent::CtrlC => TextInputAction::CopyRequested,
        TextInputEvent::Escape => TextInputAction::Cancel,
        TextInputEvent::CursorLeft
        | TextInputEvent::CursorRight
        | TextInputEvent::CursorUp
        | TextInputEvent::CursorDown => TextInputAction::MoveCursor,
    }
}

/// Translates a raw key press into a text-field event.
pub fn text_input_event(key: ShortcutKey, modifiers: ShortcutModifiers) -> Option<TextInputEvent> {
    if modifiers.is_command() {
        return match key {
            ShortcutKey::Enter => Some(TextInputEvent::CtrlEnter),
            ShortcutKey::Character('c' | 'C') => Some(TextInputEvent::CtrlC),
            _ => cursor_event_from_key(key),
        };
    }

    match key {
        ShortcutKey::Enter if modifiers.shift => Some(TextInputEvent::ShiftEnter),
        ShortcutKey::Enter => Some(TextInputEvent::Enter),
        ShortcutKey::Backspace => Some(TextInputEvent::Backspace),
        ShortcutKey::Escape => Some(TextInputEvent::Escape),
        ShortcutKey::Character(c) => Some(TextInputEvent::Character(c)),
        ShortcutKey::Delete => None,
        _ => cursor_event_from_key(key),
    }
}

fn cursor_event_from_key(key: ShortcutKey) -> Option<TextInputEvent> {
    match key {
        ShortcutKey::ArrowLeft => Some(TextInputEvent::CursorLeft),
        ShortcutKey::ArrowRight => Some(TextInputEvent::CursorRight),
        ShortcutKey::ArrowUp => Some(TextInputEvent::CursorUp),
        ShortcutKey::ArrowDown => Some(TextInputEvent::CursorDown),
        _ => None,
    }
}
