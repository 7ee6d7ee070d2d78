use std::collections::HashSet;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Logical keyboard key consumed by the engine core.
///
/// The window layer translates platform scancodes into this fixed set;
/// the core never sees raw platform input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    LeftShift,
    RightShift,
    Space,
    Escape,
}

impl Key {
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "Left" => Key::Left,
            "Right" => Key::Right,
            "Up" => Key::Up,
            "Down" => Key::Down,
            "LeftShift" | "LShift" => Key::LeftShift,
            "RightShift" | "RShift" => Key::RightShift,
            "Space" => Key::Space,
            "Escape" | "Esc" => Key::Escape,
            _ => return None,
        };
        Some(key)
    }
}

/// Thread-safe snapshot of the pressed-key set.
///
/// The event loop writes into it as window events arrive; the frame step
/// reads it. All mutation of game state stays on the render thread.
#[derive(Debug, Default)]
pub struct InputState {
    keys: RwLock<HashSet<Key>>,
    close_requested: RwLock<bool>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&self, key: Key) {
        self.keys.write().insert(key);
    }

    pub fn set_key_up(&self, key: Key) {
        self.keys.write().remove(&key);
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys.read().contains(&key)
    }

    /// True while either shift key is held.
    pub fn is_shift_down(&self) -> bool {
        let keys = self.keys.read();
        keys.contains(&Key::LeftShift) || keys.contains(&Key::RightShift)
    }

    pub fn request_close(&self) {
        *self.close_requested.write() = true;
    }

    /// True once the window asked to close or escape was pressed.
    pub fn should_close(&self) -> bool {
        *self.close_requested.read() || self.is_key_down(Key::Escape)
    }
}

/// Key-to-button mapping with an optional modifier table.
///
/// Bindings are scanned in registration order and the first pressed key
/// wins, which makes the tie-break between simultaneously held keys
/// deterministic. When the modifier key is held only the modified table
/// is consulted.
#[derive(Debug, Clone)]
pub struct InputMap<B: Copy> {
    bindings: Vec<(Key, B)>,
    modifier: Option<Key>,
    modified_bindings: Vec<(Key, B)>,
}

impl<B: Copy> Default for InputMap<B> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
            modifier: None,
            modified_bindings: Vec::new(),
        }
    }
}

impl<B: Copy> InputMap<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, key: Key, button: B) {
        self.bindings.push((key, button));
    }

    pub fn set_modifier(&mut self, key: Key) {
        self.modifier = Some(key);
    }

    pub fn bind_modified(&mut self, key: Key, button: B) {
        self.modified_bindings.push((key, button));
    }

    /// Resolves the currently pressed keys into at most one button.
    pub fn resolve(&self, input: &InputState) -> Option<B> {
        let modified = match self.modifier {
            Some(Key::LeftShift) | Some(Key::RightShift) => input.is_shift_down(),
            Some(key) => input.is_key_down(key),
            None => false,
        };
        let table = if modified {
            &self.modified_bindings
        } else {
            &self.bindings
        };
        table
            .iter()
            .find(|(key, _)| input.is_key_down(*key))
            .map(|(_, button)| *button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_names() {
        assert_eq!(Key::from_name("Left"), Some(Key::Left));
        assert_eq!(Key::from_name("LShift"), Some(Key::LeftShift));
        assert_eq!(Key::from_name("Banana"), None);
    }

    #[test]
    fn input_state_tracks_keys() {
        let state = InputState::new();
        state.set_key_down(Key::Space);
        assert!(state.is_key_down(Key::Space));
        state.set_key_up(Key::Space);
        assert!(!state.is_key_down(Key::Space));
    }

    #[test]
    fn escape_or_close_request_ends_the_session() {
        let state = InputState::new();
        assert!(!state.should_close());
        state.set_key_down(Key::Escape);
        assert!(state.should_close());

        let state = InputState::new();
        state.request_close();
        assert!(state.should_close());
    }

    #[test]
    fn first_binding_wins_when_keys_conflict() {
        let mut map = InputMap::new();
        map.bind(Key::Left, 1u8);
        map.bind(Key::Right, 2u8);

        let state = InputState::new();
        state.set_key_down(Key::Right);
        state.set_key_down(Key::Left);
        assert_eq!(map.resolve(&state), Some(1));
    }

    #[test]
    fn modifier_selects_the_alternate_table() {
        let mut map = InputMap::new();
        map.bind(Key::Right, 1u8);
        map.set_modifier(Key::LeftShift);
        map.bind_modified(Key::Right, 3u8);

        let state = InputState::new();
        state.set_key_down(Key::Right);
        assert_eq!(map.resolve(&state), Some(1));
        state.set_key_down(Key::LeftShift);
        assert_eq!(map.resolve(&state), Some(3));
    }

    #[test]
    fn either_shift_key_acts_as_the_modifier() {
        let mut map = InputMap::new();
        map.bind(Key::Left, 1u8);
        map.set_modifier(Key::LeftShift);
        map.bind_modified(Key::Left, 2u8);

        let state = InputState::new();
        state.set_key_down(Key::RightShift);
        state.set_key_down(Key::Left);
        assert_eq!(map.resolve(&state), Some(2));
    }

    #[test]
    fn no_match_yields_no_button() {
        let map: InputMap<u8> = InputMap::new();
        let state = InputState::new();
        state.set_key_down(Key::Up);
        assert_eq!(map.resolve(&state), None);
    }
}
