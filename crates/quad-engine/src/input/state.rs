use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState};

/// Current input state for the window.
///
/// Answers "is this key held right now", which is what the frame loop polls.
#[derive(Debug, Default)]
pub struct InputState {
    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,
}

impl InputState {
    /// Applies a platform-agnostic input event to the current state.
    pub fn apply_event(&mut self, ev: InputEvent) {
        match ev {
            // On focus loss the release events go elsewhere; avoid stuck keys.
            InputEvent::Focused(false) => self.keys_down.clear(),
            InputEvent::Focused(true) => {}

            InputEvent::Key { key, state } => match state {
                KeyState::Pressed => {
                    self.keys_down.insert(key);
                }
                KeyState::Released => {
                    self.keys_down.remove(&key);
                }
            },
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn key_state(&self, key: Key) -> KeyState {
        if self.key_down(key) {
            KeyState::Pressed
        } else {
            KeyState::Released
        }
    }
}
