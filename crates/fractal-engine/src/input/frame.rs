use std::collections::HashSet;

use super::types::Key;

/// Per-frame input transitions.
///
/// `InputState` holds what is currently down; `InputFrame` records what went
/// down since the last rendered frame. The runtime clears it after every frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Keys that went down this frame (repeats excluded).
    pub keys_pressed: HashSet<Key>,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.keys_pressed.clear();
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }
}
