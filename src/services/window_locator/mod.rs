//! Window locator service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for finding game client windows,
//! reading their geometry and reporting which window has input focus. It MUST NOT contain
//! any forwarding logic; every decision about what to send where is made by the
//! Broadcaster.

mod dry_run;
mod locator;
mod r#trait;
mod xdotool;

pub use self::locator::WindowLocator;
pub use self::r#trait::{create_window_query, WindowQuery};
