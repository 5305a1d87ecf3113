pub mod evdev_to_key_sym;

pub use evdev_to_key_sym::EvdevToKeySym;
