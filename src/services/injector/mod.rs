//! Window-scoped synthetic input. Every call targets one window and never touches the
//! global input state; each call reports its own success or failure.

mod dry_run;
mod r#trait;
mod xdotool;

pub use self::r#trait::{create_injector, InputInjector};
