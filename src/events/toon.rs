use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of toon slots; also the cap on discovered target windows.
pub const TOON_SLOTS: usize = 4;

/// Movement key layout the operator uses for a toon
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControlScheme {
    #[default]
    Wasd,
    Arrows,
}

impl ControlScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlScheme::Wasd => "WASD",
            ControlScheme::Arrows => "ARROWS",
        }
    }
}

impl fmt::Display for ControlScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WASD" => Ok(ControlScheme::Wasd),
            "ARROWS" | "ARROW" => Ok(ControlScheme::Arrows),
            other => Err(format!("unknown control scheme '{}'", other)),
        }
    }
}

/// Per-toon configuration, written by the controller and read by the dispatch loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToonSlot {
    pub enabled: bool,
    pub scheme: ControlScheme,
}
