use crate::events::{ControlScheme, KeySym};

const WASD_KEYS: [KeySym; 4] = [KeySym::W, KeySym::A, KeySym::S, KeySym::D];
const ARROW_KEYS: [KeySym; 4] = [KeySym::UP, KeySym::DOWN, KeySym::LEFT, KeySym::RIGHT];

/// Symbol to inject into a toon using `scheme` for a globally pressed `key`,
/// or `None` when that toon must not receive it.
///
/// A toon driven with arrows ignores the physical WASD keys (another toon moves with them),
/// receives the arrows as their WASD equivalents, and never receives Return. A toon driven
/// with WASD ignores the arrows.
pub fn translate(key: KeySym, scheme: ControlScheme) -> Option<KeySym> {
    match scheme {
        ControlScheme::Arrows if WASD_KEYS.contains(&key) => None,
        ControlScheme::Wasd if ARROW_KEYS.contains(&key) => None,
        ControlScheme::Arrows => {
            let mapped = match key {
                KeySym::UP => KeySym::W,
                KeySym::DOWN => KeySym::S,
                KeySym::LEFT => KeySym::A,
                KeySym::RIGHT => KeySym::D,
                other => other,
            };
            if mapped == KeySym::RETURN {
                None
            } else {
                Some(mapped)
            }
        }
        ControlScheme::Wasd => Some(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(name: &str) -> KeySym {
        KeySym::parse(name).unwrap()
    }

    #[test]
    fn arrows_are_suppressed_under_wasd() {
        for key in ARROW_KEYS {
            assert_eq!(translate(key, ControlScheme::Wasd), None, "{}", key);
        }
    }

    #[test]
    fn wasd_letters_are_suppressed_under_arrows() {
        for key in WASD_KEYS {
            assert_eq!(translate(key, ControlScheme::Arrows), None, "{}", key);
        }
    }

    #[test]
    fn arrows_map_to_wasd_under_arrows() {
        assert_eq!(translate(KeySym::UP, ControlScheme::Arrows), Some(KeySym::W));
        assert_eq!(translate(KeySym::DOWN, ControlScheme::Arrows), Some(KeySym::S));
        assert_eq!(translate(KeySym::LEFT, ControlScheme::Arrows), Some(KeySym::A));
        assert_eq!(translate(KeySym::RIGHT, ControlScheme::Arrows), Some(KeySym::D));
    }

    #[test]
    fn return_is_dropped_only_under_arrows() {
        assert_eq!(translate(KeySym::RETURN, ControlScheme::Arrows), None);
        assert_eq!(translate(KeySym::RETURN, ControlScheme::Wasd), Some(KeySym::RETURN));
    }

    #[test]
    fn other_keys_pass_through() {
        for name in ["e", "space", "Control_L", "1", "!", "BackSpace"] {
            assert_eq!(translate(k(name), ControlScheme::Wasd), Some(k(name)));
            assert_eq!(translate(k(name), ControlScheme::Arrows), Some(k(name)));
        }
    }

    #[test]
    fn translation_is_deterministic() {
        for name in ["w", "Up", "Return", "x", "?"] {
            for scheme in [ControlScheme::Wasd, ControlScheme::Arrows] {
                assert_eq!(translate(k(name), scheme), translate(k(name), scheme));
            }
        }
    }
}
