//! Stateless translation of key taps into text surface edits.

use crate::surface::TextSurface;

/// A discrete key action from the on-screen keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// A printable character key.
    Char(char),
    Backspace,
    Space,
    Return,
}

/// Maps key actions onto `TextSurface` edits. Holds no state.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyDispatcher;

impl KeyDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Apply a key action to the surface.
    pub fn dispatch(&self, surface: &dyn TextSurface, action: KeyAction) {
        match action {
            KeyAction::Char(ch) => self.press_key(surface, ch),
            KeyAction::Backspace => self.backspace(surface),
            KeyAction::Space => self.insert_text(surface, " "),
            KeyAction::Return => self.insert_text(surface, "\n"),
        }
    }

    /// Insert a printable key's character at the cursor.
    pub fn press_key(&self, surface: &dyn TextSurface, ch: char) {
        let mut buf = [0u8; 4];
        self.insert_text(surface, ch.encode_utf8(&mut buf));
    }

    /// Insert text at the cursor, replacing the current selection. The
    /// cursor ends up just after the inserted text, and the surface emits
    /// its change notification.
    pub fn insert_text(&self, surface: &dyn TextSurface, text: &str) {
        let (start, end) = surface.selection();
        let current = surface.value();
        let chars: Vec<char> = current.chars().collect();

        let mut new_value: String = chars[..start.min(chars.len())].iter().collect();
        new_value.push_str(text);
        new_value.extend(&chars[end.min(chars.len())..]);

        surface.set_value(&new_value);

        let cursor = start + text.chars().count();
        surface.set_selection(cursor, cursor);
        tracing::trace!(inserted = text.chars().count(), cursor, "Key insert");
    }

    /// Remove exactly one character before the cursor. No-op at offset 0.
    pub fn backspace(&self, surface: &dyn TextSurface) {
        let (start, _) = surface.selection();
        if start == 0 {
            return;
        }

        let current = surface.value();
        let chars: Vec<char> = current.chars().collect();
        let mut new_value: String = chars[..start - 1].iter().collect();
        new_value.extend(&chars[start.min(chars.len())..]);

        surface.set_value(&new_value);
        surface.set_selection(start - 1, start - 1);
    }
}
