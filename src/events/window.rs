use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque X11 window id as printed by xdotool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

impl WindowHandle {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WindowHandle {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(WindowHandle)
    }
}

/// Window position and size on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowGeometry {
    /// Parse the output of `xdotool getwindowgeometry <id>`:
    ///
    /// ```text
    /// Window 71303175
    ///   Position: 1920,0 (screen: 0)
    ///   Geometry: 1280x720
    /// ```
    ///
    /// Both the position and the size lines must be present.
    pub fn parse_xdotool(output: &str) -> Option<Self> {
        let mut position = None;
        let mut size = None;

        for line in output.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("Position:") {
                let coords = rest.split_whitespace().next()?;
                let (x, y) = coords.split_once(',')?;
                position = Some((x.parse().ok()?, y.parse().ok()?));
            } else if let Some(rest) = line.strip_prefix("Geometry:") {
                let (w, h) = rest.trim().split_once('x')?;
                size = Some((w.parse().ok()?, h.parse().ok()?));
            }
        }

        let ((x, y), (width, height)) = (position?, size?);
        Some(Self { x, y, width, height })
    }
}

/// Discovered game client window. Identity is the handle; the geometry is
/// cached at discovery time and never refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetWindow {
    pub handle: WindowHandle,
    pub geometry: WindowGeometry,
}

impl TargetWindow {
    pub fn new(handle: WindowHandle, geometry: WindowGeometry) -> Self {
        Self { handle, geometry }
    }

    pub fn x(&self) -> i32 {
        self.geometry.x
    }
}

impl fmt::Display for TargetWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {},{} ({}x{})",
            self.handle, self.geometry.x, self.geometry.y, self.geometry.width, self.geometry.height
        )
    }
}
