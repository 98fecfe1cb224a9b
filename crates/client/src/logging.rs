//! Session logging.
//!
//! Every condition the session reports instead of raising (sends while
//! closed, frames salvaged by the decoder, rejected state transitions) goes
//! through these macros. They dispatch to `tracing` under the `relaychat`
//! target so a subscriber can filter session chatter separately.

/// `tracing` target shared by every session log line.
pub const TARGET: &str = "relaychat";

/// Log an info message under [`TARGET`]
pub fn log_info_impl(msg: &str) {
    tracing::info!(target: TARGET, "{}", msg);
}

/// Log an error message under [`TARGET`]
pub fn log_error_impl(msg: &str) {
    tracing::error!(target: TARGET, "{}", msg);
}

/// Log a warning message under [`TARGET`]
pub fn log_warn_impl(msg: &str) {
    tracing::warn!(target: TARGET, "{}", msg);
}

/// Log a debug message under [`TARGET`]
pub fn log_debug_impl(msg: &str) {
    tracing::debug!(target: TARGET, "{}", msg);
}

/// Log an info message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::log_info_impl(&format!($($arg)*))
    };
}

/// Log an error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::log_error_impl(&format!($($arg)*))
    };
}

/// Log a warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logging::log_warn_impl(&format!($($arg)*))
    };
}

/// Log a debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::log_debug_impl(&format!($($arg)*))
    };
}
