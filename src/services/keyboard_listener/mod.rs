//! Global keyboard tracking: reads the keyboard device without grabbing it, so the key
//! set is observed no matter which application has focus, while the keys still reach
//! that application normally.

mod dry_keyboard_listener;
mod keyboard_listener;
mod modifier_state;
mod tracker;
mod r#trait;

pub use self::r#trait::create_keyboard_listener;
pub use self::tracker::KeyTracker;
