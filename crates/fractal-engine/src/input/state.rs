use std::collections::HashSet;

use crate::coords::Vec2;

use super::frame::InputFrame;
use super::types::{InputEvent, Key, KeyState, MouseButton, MouseButtonState, PointerButtonEvent};

/// Current input state for the window.
///
/// Holds "is down" information and the last known pointer position.
/// Per-frame transitions are recorded into an `InputFrame`.
#[derive(Debug, Default)]
pub struct InputState {
    /// Pointer position in logical pixels, `None` while outside the window.
    pub pointer_pos: Option<Vec2>,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies a platform-agnostic input event and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::Focused(f) => {
                if !*f {
                    // Focus loss releases everything.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(pos) => {
                self.pointer_pos = Some(*pos);
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => {
                    if self.keys_down.insert(*key) {
                        frame.keys_pressed.insert(*key);
                    }
                }
                KeyState::Released => {
                    self.keys_down.remove(key);
                }
            },

            InputEvent::PointerButton(PointerButtonEvent { button, state, pos }) => {
                // An unknown position never replaces a known one.
                if let Some(pos) = pos {
                    self.pointer_pos = Some(*pos);
                }

                match state {
                    MouseButtonState::Pressed => {
                        self.buttons_down.insert(*button);
                    }
                    MouseButtonState::Released => {
                        self.buttons_down.remove(button);
                    }
                }
            }
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key { key, state, repeat: false }
    }

    #[test]
    fn press_is_recorded_once_while_held() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::E, KeyState::Pressed));
        assert!(state.key_down(Key::E));
        assert!(frame.key_pressed(Key::E));

        frame.clear();
        // Auto-repeat arrives as another press; it is not a new transition.
        state.apply_event(&mut frame, InputEvent::Key { key: Key::E, state: KeyState::Pressed, repeat: true });
        assert!(state.key_down(Key::E));
        assert!(!frame.key_pressed(Key::E));
    }

    #[test]
    fn release_clears_held_key() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::W, KeyState::Pressed));
        state.apply_event(&mut frame, key(Key::W, KeyState::Released));
        assert!(!state.key_down(Key::W));
        assert!(frame.key_pressed(Key::W));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::A, KeyState::Pressed));
        state.apply_event(
            &mut frame,
            InputEvent::PointerButton(PointerButtonEvent {
                button: MouseButton::Left,
                state: MouseButtonState::Pressed,
                pos: Some(Vec2::new(10.0, 20.0)),
            }),
        );
        state.apply_event(&mut frame, InputEvent::Focused(false));

        assert!(state.keys_down.is_empty());
        assert!(state.buttons_down.is_empty());
    }

    #[test]
    fn button_event_updates_pointer_position() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(
            &mut frame,
            InputEvent::PointerButton(PointerButtonEvent {
                button: MouseButton::Left,
                state: MouseButtonState::Pressed,
                pos: Some(Vec2::new(300.0, 150.0)),
            }),
        );

        assert_eq!(state.pointer_pos, Some(Vec2::new(300.0, 150.0)));
        assert!(state.button_down(MouseButton::Left));

        state.apply_event(&mut frame, InputEvent::PointerLeft);
        assert_eq!(state.pointer_pos, None);
    }

    #[test]
    fn press_before_any_motion_leaves_position_unknown() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        let press = |pos| {
            InputEvent::PointerButton(PointerButtonEvent {
                button: MouseButton::Left,
                state: MouseButtonState::Pressed,
                pos,
            })
        };

        state.apply_event(&mut frame, press(None));
        assert!(state.button_down(MouseButton::Left));
        assert_eq!(state.pointer_pos, None);

        state.apply_event(&mut frame, InputEvent::PointerMoved(Vec2::new(5.0, 6.0)));
        state.apply_event(&mut frame, press(None));
        assert_eq!(state.pointer_pos, Some(Vec2::new(5.0, 6.0)));
    }
}
