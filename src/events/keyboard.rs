use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Keys forwarded with key-down/key-up hold semantics.
const HOLD_KEYS: &[&str] = &[
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m",
    "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "0",
    "`", "-", "=", "[", "]", "\\", ";", "'", ",", ".", "/",
    "space", "Return", "BackSpace", "Tab", "Escape", "Delete",
    "Up", "Down", "Left", "Right",
    "Shift_L", "Control_L", "Alt_L",
];

/// Shifted punctuation, forwarded as one-shot text.
const TEXT_KEYS: &[&str] = &[
    "!", "@", "#", "$", "%", "^", "&", "*", "(", ")", "_", "+",
    "{", "}", "|", ":", "\"", "<", ">", "?", "~",
];

// Lowercased spellings accepted by KeySym::parse in addition to the canonical names
static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for &name in HOLD_KEYS.iter().chain(TEXT_KEYS) {
        map.insert(name, name);
    }
    map.insert("return", "Return");
    map.insert("enter", "Return");
    map.insert("backspace", "BackSpace");
    map.insert("tab", "Tab");
    map.insert("escape", "Escape");
    map.insert("esc", "Escape");
    map.insert("delete", "Delete");
    map.insert("up", "Up");
    map.insert("down", "Down");
    map.insert("left", "Left");
    map.insert("right", "Right");
    map.insert("shift", "Shift_L");
    map.insert("shift_l", "Shift_L");
    map.insert("shift_r", "Shift_L");
    map.insert("ctrl", "Control_L");
    map.insert("control", "Control_L");
    map.insert("control_l", "Control_L");
    map.insert("control_r", "Control_L");
    map.insert("alt", "Alt_L");
    map.insert("alt_l", "Alt_L");
    map.insert("alt_r", "Alt_L");
    map
});

/// Canonical key symbol, spelled the way xdotool expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeySym(&'static str);

impl KeySym {
    pub const W: KeySym = KeySym("w");
    pub const A: KeySym = KeySym("a");
    pub const S: KeySym = KeySym("s");
    pub const D: KeySym = KeySym("d");
    pub const UP: KeySym = KeySym("Up");
    pub const DOWN: KeySym = KeySym("Down");
    pub const LEFT: KeySym = KeySym("Left");
    pub const RIGHT: KeySym = KeySym("Right");
    pub const RETURN: KeySym = KeySym("Return");
    pub const SHIFT_L: KeySym = KeySym("Shift_L");

    /// Resolve user-supplied text to a symbol of the vocabulary.
    /// Named keys are matched case-insensitively; single characters are taken literally,
    /// except that upper-case letters fold to their lower-case key.
    pub fn parse(text: &str) -> Option<KeySym> {
        let text = text.trim();
        if let Some(&name) = ALIASES.get(text) {
            return Some(KeySym(name));
        }
        ALIASES.get(text.to_lowercase().as_str()).map(|&name| KeySym(name))
    }

    pub(crate) const fn from_static(name: &'static str) -> KeySym {
        KeySym(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn class(&self) -> KeyClass {
        if TEXT_KEYS.contains(&self.0) {
            KeyClass::Text
        } else {
            KeyClass::Hold
        }
    }

    pub fn is_text(&self) -> bool {
        self.class() == KeyClass::Text
    }
}

impl fmt::Display for KeySym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// How a key is forwarded to the targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    /// key-down on press, key-up on release
    Hold,
    /// injected once as text per press gesture
    Text,
}

/// Synthetic key transition sent to a target window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAction {
    Down,
    Up,
}

impl KeyAction {
    pub fn xdotool_command(&self) -> &'static str {
        match self {
            KeyAction::Down => "keydown",
            KeyAction::Up => "keyup",
        }
    }
}

/// Physical key state as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
    Repeat,
}

/// Modifiers held at the time of an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift
    }

    pub fn to_vec(&self) -> Vec<&'static str> {
        let mut result = Vec::new();
        if self.ctrl { result.push("ctrl"); }
        if self.alt { result.push("alt"); }
        if self.shift { result.push("shift"); }
        result
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}

/// Global key transition published by the keyboard listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: u16,
    pub symbol: KeySym,
    pub state: KeyState,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(code: u16, symbol: KeySym, state: KeyState, modifiers: Modifiers) -> Self {
        Self {
            code,
            symbol,
            state,
            modifiers,
        }
    }

    /// Preset hotkey slot (Ctrl+1..Ctrl+5) carried by this event, if any.
    pub fn preset_hotkey(&self) -> Option<u8> {
        if self.state != KeyState::Pressed || !self.modifiers.ctrl {
            return None;
        }
        match self.symbol.as_str() {
            "1" => Some(1),
            "2" => Some(2),
            "3" => Some(3),
            "4" => Some(4),
            "5" => Some(5),
            _ => None,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{} ({}) {:?}", self.symbol, self.code, self.state)
        } else {
            write!(f, "{}+{} ({}) {:?}", self.modifiers, self.symbol, self.code, self.state)
        }
    }
}
