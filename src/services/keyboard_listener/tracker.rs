use super::modifier_state::ModifierState;
use crate::events::{KeyEvent, KeyState};
use crate::mappings::EvdevToKeySym;
use crate::services::HeldKeys;
use crate::trace_if_enabled;
use evdev::KeyCode;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Turns raw device key events into the held key set and a stream of canonical events.
pub struct KeyTracker {
    held: Arc<HeldKeys>,
    modifiers: Mutex<ModifierState>,
    events: UnboundedSender<KeyEvent>,
}

impl KeyTracker {
    pub fn new(held: Arc<HeldKeys>, events: UnboundedSender<KeyEvent>) -> Self {
        Self {
            held,
            modifiers: Mutex::new(ModifierState::new()),
            events,
        }
    }

    /// Apply one evdev key event (`value`: 0 release, 1 press, 2 autorepeat).
    /// Keys outside the vocabulary and autorepeats are ignored.
    pub fn handle(&self, key: KeyCode, value: i32) -> Option<KeyEvent> {
        let state = match value {
            0 => KeyState::Released,
            1 => KeyState::Pressed,
            _ => return None,
        };

        let modifiers = {
            let mut modifier_state = self.modifiers.lock();
            modifier_state.update_key(key, state == KeyState::Pressed);
            modifier_state.to_modifiers()
        };

        let symbol = match state {
            KeyState::Pressed => {
                let symbol = EvdevToKeySym::translate(key, modifiers.shift)?;
                self.held.press(key.code(), symbol);
                symbol
            }
            _ => self.held.release(key.code())?,
        };

        let event = KeyEvent::new(key.code(), symbol, state, modifiers);
        trace_if_enabled!("Key event: {}", event);
        // Nobody listening for hotkeys is not an error
        let _ = self.events.send(event);
        Some(event)
    }

    /// Forget every held key, e.g. when the device goes away.
    pub fn reset(&self) {
        self.held.clear();
        *self.modifiers.lock() = ModifierState::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::KeySym;
    use tokio::sync::mpsc;

    #[test]
    fn press_and_release_update_held_set_and_publish() {
        let held = Arc::new(HeldKeys::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tracker = KeyTracker::new(held.clone(), tx);

        tracker.handle(KeyCode::KEY_W, 1);
        assert!(held.contains(KeySym::W));
        tracker.handle(KeyCode::KEY_W, 2);
        tracker.handle(KeyCode::KEY_W, 0);
        assert!(held.is_empty());

        let pressed = rx.try_recv().unwrap();
        let released = rx.try_recv().unwrap();
        assert_eq!(pressed.state, KeyState::Pressed);
        assert_eq!(released.state, KeyState::Released);
        assert_eq!(released.symbol, KeySym::W);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn shifted_digit_is_tracked_as_symbol() {
        let held = Arc::new(HeldKeys::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let tracker = KeyTracker::new(held.clone(), tx);

        tracker.handle(KeyCode::KEY_LEFTSHIFT, 1);
        tracker.handle(KeyCode::KEY_1, 1);
        assert!(held.contains(KeySym::parse("!").unwrap()));
        assert!(held.contains(KeySym::SHIFT_L));

        tracker.handle(KeyCode::KEY_LEFTSHIFT, 0);
        tracker.handle(KeyCode::KEY_1, 0);
        assert!(held.is_empty());
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let held = Arc::new(HeldKeys::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tracker = KeyTracker::new(held.clone(), tx);

        assert!(tracker.handle(KeyCode::KEY_F5, 1).is_none());
        assert!(tracker.handle(KeyCode::KEY_F5, 0).is_none());
        assert!(held.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn ctrl_digit_carries_ctrl_modifier() {
        let held = Arc::new(HeldKeys::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let tracker = KeyTracker::new(held, tx);

        tracker.handle(KeyCode::KEY_RIGHTCTRL, 1);
        let event = tracker.handle(KeyCode::KEY_3, 1).unwrap();
        assert_eq!(event.preset_hotkey(), Some(3));
    }
}
