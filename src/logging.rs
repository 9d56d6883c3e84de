//! Logging abstraction layer.
//!
//! Provides macros that dispatch to either the [`log`](https://docs.rs/log)
//! or [`tracing`](https://docs.rs/tracing) crate depending on which feature
//! is enabled. The two features are **mutually exclusive**, enable at most one.
//! With neither enabled the macros expand to nothing.
//!
//! | Feature    | Backend         | Default |
//! |------------|-----------------|---------|
//! | `log`      | `log` crate     | yes     |
//! | `tracing`  | `tracing` crate | no      |
//!
//! # Available macros
//!
//! - `trace_log!`: guard and pop-handler evaluation, cache lookups.
//! - `debug_log!`: guard decisions, route matches, sink commits.
//! - `info_log!`: committed stack mutations and reconciliations.
//! - `warn_log!`: resolution failures, refused pops, interrupted reconciliations.
//! - `error_log!`: failing guards.
//!
//! All macros accept `format!`-style arguments:
//!
//! ```ignore
//! use stacked_navigator::{debug_log, info_log, warn_log};
//!
//! debug_log!("Reconciling '{}' -> '{}'", from, to);
//! info_log!("Pushed '{}' (depth {})", path, depth);
//! warn_log!("Pop of '{}' refused by handler", path);
//! ```

/// Emit a **trace**-level log message.
///
/// Dispatches to `log::trace!` or `tracing::trace!`. Used for per-guard and
/// per-handler evaluation and for resolution cache lookups.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
    };
}

/// Emit a **debug**-level log message.
///
/// Dispatches to `log::debug!` or `tracing::debug!`. Used for guard
/// decisions, route matches and sink commits.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    };
}

/// Emit an **info**-level log message.
///
/// Dispatches to `log::info!` or `tracing::info!`. Used for committed stack
/// mutations and reconciliations.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!($($arg)*);
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
    };
}

/// Emit a **warn**-level log message.
///
/// Dispatches to `log::warn!` or `tracing::warn!`. Used for resolution
/// failures, refused pops and interrupted reconciliations.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
    };
}

/// Emit an **error**-level log message.
///
/// Dispatches to `log::error!` or `tracing::error!`. Used when a guard fails;
/// the failure itself is still returned to the caller as
/// [`StackError::GuardFailure`](crate::StackError::GuardFailure).
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!($($arg)*);
        #[cfg(feature = "log")]
        ::log::error!($($arg)*);
    };
}
