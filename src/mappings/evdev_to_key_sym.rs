use crate::events::KeySym;
use evdev::KeyCode;

/// Translation of evdev key codes into the canonical key vocabulary (US layout).
/// Answers for the shift state at the moment of the press.
pub struct EvdevToKeySym;

impl EvdevToKeySym {
    pub fn translate(key: KeyCode, shift: bool) -> Option<KeySym> {
        let name = match key {
            // Letters ignore shift: the key is the same physical key either way
            KeyCode::KEY_A => "a",
            KeyCode::KEY_B => "b",
            KeyCode::KEY_C => "c",
            KeyCode::KEY_D => "d",
            KeyCode::KEY_E => "e",
            KeyCode::KEY_F => "f",
            KeyCode::KEY_G => "g",
            KeyCode::KEY_H => "h",
            KeyCode::KEY_I => "i",
            KeyCode::KEY_J => "j",
            KeyCode::KEY_K => "k",
            KeyCode::KEY_L => "l",
            KeyCode::KEY_M => "m",
            KeyCode::KEY_N => "n",
            KeyCode::KEY_O => "o",
            KeyCode::KEY_P => "p",
            KeyCode::KEY_Q => "q",
            KeyCode::KEY_R => "r",
            KeyCode::KEY_S => "s",
            KeyCode::KEY_T => "t",
            KeyCode::KEY_U => "u",
            KeyCode::KEY_V => "v",
            KeyCode::KEY_W => "w",
            KeyCode::KEY_X => "x",
            KeyCode::KEY_Y => "y",
            KeyCode::KEY_Z => "z",

            // Digit row
            KeyCode::KEY_1 => if shift { "!" } else { "1" },
            KeyCode::KEY_2 => if shift { "@" } else { "2" },
            KeyCode::KEY_3 => if shift { "#" } else { "3" },
            KeyCode::KEY_4 => if shift { "$" } else { "4" },
            KeyCode::KEY_5 => if shift { "%" } else { "5" },
            KeyCode::KEY_6 => if shift { "^" } else { "6" },
            KeyCode::KEY_7 => if shift { "&" } else { "7" },
            KeyCode::KEY_8 => if shift { "*" } else { "8" },
            KeyCode::KEY_9 => if shift { "(" } else { "9" },
            KeyCode::KEY_0 => if shift { ")" } else { "0" },

            // Punctuation
            KeyCode::KEY_GRAVE => if shift { "~" } else { "`" },
            KeyCode::KEY_MINUS => if shift { "_" } else { "-" },
            KeyCode::KEY_EQUAL => if shift { "+" } else { "=" },
            KeyCode::KEY_LEFTBRACE => if shift { "{" } else { "[" },
            KeyCode::KEY_RIGHTBRACE => if shift { "}" } else { "]" },
            KeyCode::KEY_BACKSLASH => if shift { "|" } else { "\\" },
            KeyCode::KEY_SEMICOLON => if shift { ":" } else { ";" },
            KeyCode::KEY_APOSTROPHE => if shift { "\"" } else { "'" },
            KeyCode::KEY_COMMA => if shift { "<" } else { "," },
            KeyCode::KEY_DOT => if shift { ">" } else { "." },
            KeyCode::KEY_SLASH => if shift { "?" } else { "/" },

            // Named keys
            KeyCode::KEY_SPACE => "space",
            KeyCode::KEY_ENTER | KeyCode::KEY_KPENTER => "Return",
            KeyCode::KEY_BACKSPACE => "BackSpace",
            KeyCode::KEY_TAB => "Tab",
            KeyCode::KEY_ESC => "Escape",
            KeyCode::KEY_DELETE => "Delete",
            KeyCode::KEY_UP => "Up",
            KeyCode::KEY_DOWN => "Down",
            KeyCode::KEY_LEFT => "Left",
            KeyCode::KEY_RIGHT => "Right",

            // Modifiers: right variants collapse onto the left name
            KeyCode::KEY_LEFTSHIFT | KeyCode::KEY_RIGHTSHIFT => "Shift_L",
            KeyCode::KEY_LEFTCTRL | KeyCode::KEY_RIGHTCTRL => "Control_L",
            KeyCode::KEY_LEFTALT | KeyCode::KEY_RIGHTALT => "Alt_L",

            _ => return None,
        };

        Some(KeySym::from_static(name))
    }
}
