//! Closed-loop key injection.
//!
//! Walks a key script one token per frame, driving the model's keyboard
//! mask pin. The protocol against the simulated scanner: assert a key,
//! hold it until the scan routine has had a frame to observe it, release
//! (mask to zero), give the release a frame, then move on. Shift-class
//! modifiers are the exception: they are asserted together with the key
//! that follows them in the same frame, since a shifted key only reads as
//! shifted while both matrix bits are down at once.

use sim_core::KeyboardPort;

use crate::keymap;

/// Whether the session still has work to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    /// Script exhausted and the last press released. No further mask
    /// changes will be made.
    Done,
}

/// State machine walking one key script. Frame completion is its only
/// notion of time; call [`on_frame`](Self::on_frame) once per completed
/// frame.
pub struct KeyInjectionSession {
    script: String,
    cursor: usize,
    /// Do nothing until the completed-frame index reaches this.
    wait_frame: u64,
}

impl KeyInjectionSession {
    #[must_use]
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            cursor: 0,
            wait_frame: 0,
        }
    }

    /// Remaining unconsumed script text.
    #[must_use]
    pub fn remaining(&self) -> &str {
        &self.script[self.cursor..]
    }

    /// Advance the state machine for one completed frame.
    pub fn on_frame<M: KeyboardPort>(&mut self, frame: u64, model: &mut M) -> SessionStatus {
        if frame < self.wait_frame {
            return SessionStatus::Active;
        }

        // A still-asserted key has not been released yet: release it and
        // give the scanner a frame to see the release.
        if model.keyboard_mask() != 0 {
            model.set_keyboard_mask(0);
            self.wait_frame = frame + 1;
            return SessionStatus::Active;
        }

        if self.cursor >= self.script.len() {
            return SessionStatus::Done;
        }

        // Press the next token; keep absorbing shift-class modifiers so
        // SHIFT+key pairs go down together.
        let mut mask = 0u64;
        while self.cursor < self.script.len() {
            let rest = &self.script[self.cursor..];
            match keymap::match_longest(rest) {
                Some(def) => {
                    mask |= def.mask_bit();
                    self.cursor += def.token.len();
                    self.wait_frame = frame + 1;
                    if !def.is_shift() {
                        break;
                    }
                }
                None => {
                    // No token matches here. Skip one character rather
                    // than stalling at this cursor position forever.
                    let skip = rest.chars().next().map_or(1, char::len_utf8);
                    eprintln!(
                        "key script: no key matches {:?}, skipping one character",
                        &rest[..skip]
                    );
                    self.cursor += skip;
                }
            }
        }

        if mask != 0 {
            model.set_keyboard_mask(mask);
            SessionStatus::Active
        } else if self.cursor >= self.script.len() {
            SessionStatus::Done
        } else {
            SessionStatus::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::match_longest;

    #[derive(Default)]
    struct KeyPin {
        mask: u64,
    }

    impl KeyboardPort for KeyPin {
        fn keyboard_mask(&self) -> u64 {
            self.mask
        }

        fn set_keyboard_mask(&mut self, mask: u64) {
            self.mask = mask;
        }
    }

    fn bit(token: &str) -> u64 {
        match_longest(token).expect("known token").mask_bit()
    }

    #[test]
    fn single_key_press_release_cycle() {
        let mut session = KeyInjectionSession::new("A");
        let mut pin = KeyPin::default();

        assert_eq!(session.on_frame(0, &mut pin), SessionStatus::Active);
        assert_eq!(pin.mask, bit("A"));

        // Release next frame, then done once the release has settled.
        assert_eq!(session.on_frame(1, &mut pin), SessionStatus::Active);
        assert_eq!(pin.mask, 0);
        assert_eq!(session.on_frame(2, &mut pin), SessionStatus::Done);
    }

    #[test]
    fn shift_modifier_held_with_following_key() {
        let mut session = KeyInjectionSession::new("<LSHIFT>A");
        let mut pin = KeyPin::default();

        // Both matrix bits go down within the same frame.
        session.on_frame(0, &mut pin);
        assert_eq!(pin.mask, bit("<LSHIFT>") | bit("A"));

        // First ack cycle: released together.
        assert_eq!(session.on_frame(1, &mut pin), SessionStatus::Active);
        assert_eq!(pin.mask, 0);

        // Second ack cycle: nothing left, session done.
        assert_eq!(session.on_frame(2, &mut pin), SessionStatus::Done);
    }

    #[test]
    fn two_keys_take_alternating_frames() {
        let mut session = KeyInjectionSession::new("AB");
        let mut pin = KeyPin::default();

        session.on_frame(0, &mut pin);
        assert_eq!(pin.mask, bit("A"));
        session.on_frame(1, &mut pin);
        assert_eq!(pin.mask, 0);
        session.on_frame(2, &mut pin);
        assert_eq!(pin.mask, bit("B"));
        session.on_frame(3, &mut pin);
        assert_eq!(pin.mask, 0);
        assert_eq!(session.on_frame(4, &mut pin), SessionStatus::Done);
    }

    #[test]
    fn wait_frame_gates_progress() {
        let mut session = KeyInjectionSession::new("AB");
        let mut pin = KeyPin::default();

        session.on_frame(0, &mut pin);
        let pressed = pin.mask;
        // Re-running the same frame must not advance the machine.
        session.on_frame(0, &mut pin);
        assert_eq!(pin.mask, pressed);
        assert_eq!(session.remaining(), "B");
    }

    #[test]
    fn externally_held_mask_is_released_first() {
        let mut session = KeyInjectionSession::new("A");
        let mut pin = KeyPin { mask: 0xFF };

        // Frame 0 only clears the stale mask.
        session.on_frame(0, &mut pin);
        assert_eq!(pin.mask, 0);
        // Frame 1 presses the scripted key.
        session.on_frame(1, &mut pin);
        assert_eq!(pin.mask, bit("A"));
    }

    #[test]
    fn unrecognised_character_is_skipped() {
        let mut session = KeyInjectionSession::new("aZ");
        let mut pin = KeyPin::default();

        session.on_frame(0, &mut pin);
        assert_eq!(pin.mask, bit("Z"));
    }

    #[test]
    fn all_garbage_script_terminates() {
        let mut session = KeyInjectionSession::new("~~~");
        let mut pin = KeyPin::default();
        assert_eq!(session.on_frame(0, &mut pin), SessionStatus::Done);
        assert_eq!(pin.mask, 0);
    }

    #[test]
    fn trailing_shift_is_still_released() {
        let mut session = KeyInjectionSession::new("<LSHIFT>");
        let mut pin = KeyPin::default();

        session.on_frame(0, &mut pin);
        assert_eq!(pin.mask, bit("<LSHIFT>"));
        session.on_frame(1, &mut pin);
        assert_eq!(pin.mask, 0);
        assert_eq!(session.on_frame(2, &mut pin), SessionStatus::Done);
    }
}
