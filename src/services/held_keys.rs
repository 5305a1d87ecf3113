use crate::events::KeySym;
use dashmap::DashMap;
use std::collections::HashSet;

/// Keys physically held right now, across every application.
///
/// Entries are keyed by device key code and remember the symbol that was produced at
/// press time, so the release removes exactly what the press inserted even if the
/// shift state changed in between.
#[derive(Debug, Default)]
pub struct HeldKeys {
    keys: DashMap<u16, KeySym>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, code: u16, symbol: KeySym) {
        self.keys.insert(code, symbol);
    }

    pub fn release(&self, code: u16) -> Option<KeySym> {
        self.keys.remove(&code).map(|(_, symbol)| symbol)
    }

    #[cfg(test)]
    pub fn contains(&self, symbol: KeySym) -> bool {
        self.keys.iter().any(|entry| *entry.value() == symbol)
    }

    /// Consistent copy of the held symbols for one dispatch tick.
    pub fn snapshot(&self) -> HashSet<KeySym> {
        self.keys.iter().map(|entry| *entry.value()).collect()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&self) {
        self.keys.clear();
    }
}
