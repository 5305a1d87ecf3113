pub mod keyboard;
pub mod toon;
pub mod window;

pub use keyboard::{KeyAction, KeyEvent, KeyState, KeySym, Modifiers};
pub use toon::{ControlScheme, ToonSlot, TOON_SLOTS};
pub use window::{TargetWindow, WindowGeometry, WindowHandle};
