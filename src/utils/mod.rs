pub mod activity_log;
pub mod device_finder;
pub mod permissions;

pub use activity_log::{ActivityLog, LogSink};
pub use device_finder::DeviceFinder;

// Conditional logging macros for the hot dispatch path
#[macro_export]
macro_rules! debug_if_enabled {
    ($($arg:tt)*) => {
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! trace_if_enabled {
    ($($arg:tt)*) => {
        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!($($arg)*);
        }
    };
}
