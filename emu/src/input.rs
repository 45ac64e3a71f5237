//! Host input: a stable key enumeration, the per-frame key-state set and
//! the [`InputSource`] the machine polls once per frame.
//!
//! Escape halts the run loop; routing the other keys into IOC keyboard
//! registers is the host's business.

use std::collections::HashSet;

/// Host keys the core recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Space,
    /// A printable key, identified by its ASCII byte.
    Char(u8),
}

/// Boolean key states gathered by one poll.
#[derive(Default, Debug, Clone)]
pub struct KeyState {
    pressed: HashSet<Key>,
}

impl KeyState {
    pub fn press(&mut self, key: Key) {
        self.pressed.insert(key);
    }

    #[must_use]
    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }
}

/// Polled once per frame by [`run_frame`].
///
/// [`run_frame`]: crate::archimedes::Archimedes::run_frame
pub trait InputSource {
    fn poll(&mut self) -> KeyState;
}

/// Reports no keys; useful headless and in tests.
pub struct NullInput;

impl InputSource for NullInput {
    fn poll(&mut self) -> KeyState {
        KeyState::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_state_tracks_presses() {
        let mut state = KeyState::default();
        assert!(!state.is_pressed(Key::Escape));

        state.press(Key::Escape);
        state.press(Key::Char(b'a'));

        assert!(state.is_pressed(Key::Escape));
        assert!(state.is_pressed(Key::Char(b'a')));
        assert!(!state.is_pressed(Key::Space));
    }
}
