//! Error types for stack mutations.
//!
//! Only two things are errors here:
//!
//! - [`StackError::Resolution`]: the fragment does not name a usable page.
//! - [`StackError::GuardFailure`]: a guard itself failed.
//!
//! A guard veto or a refused pop is a normal outcome and is reported through
//! [`PushOutcome`](crate::PushOutcome) and [`PopOutcome`](crate::PopOutcome)
//! instead.
//!
//! # Examples
//!
//! ```
//! use stacked_navigator::{ResolutionFailure, StackError};
//!
//! let err = StackError::resolution("/missing", ResolutionFailure::NotFound);
//! assert!(err.is_resolution());
//! assert_eq!(err.to_string(), "cannot stack '/missing': no matching route");
//! ```

use thiserror::Error;

/// Error raised by a guard implementation.
pub type GuardError = Box<dyn std::error::Error + Send + Sync>;

/// Why a fragment could not become a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// No route matched.
    NotFound,
    /// The matched route is not marked stackable.
    NotStackable,
    /// The matched route has nothing to render.
    NoContent,
    /// The fragment would not survive encoding at this depth, e.g. a second
    /// `/` page, which would encode as `//` and read back as one page.
    Ambiguous,
}

impl std::fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NotFound => "no matching route",
            Self::NotStackable => "route is not stackable",
            Self::NoContent => "route has no content",
            Self::Ambiguous => "fragment cannot be encoded at this depth",
        })
    }
}

/// Failure of `push`, `replace` or a reconciliation push phase.
#[derive(Debug, Error)]
pub enum StackError {
    /// The target could not be resolved into a page.
    #[error("cannot stack '{path}': {reason}")]
    Resolution {
        /// Requested path (or route name).
        path: String,
        /// What was wrong with it.
        reason: ResolutionFailure,
    },

    /// A guard returned an error instead of a decision.
    #[error("guard '{guard}' failed while navigating to '{path}'")]
    GuardFailure {
        /// Name of the failing guard.
        guard: &'static str,
        /// Path being pushed.
        path: String,
        /// The guard's error.
        #[source]
        source: GuardError,
    },
}

impl StackError {
    /// Build a [`StackError::Resolution`].
    pub fn resolution(path: impl Into<String>, reason: ResolutionFailure) -> Self {
        Self::Resolution {
            path: path.into(),
            reason,
        }
    }

    /// Check if this is a resolution error.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }

    /// Check if this is a guard failure.
    pub fn is_guard_failure(&self) -> bool {
        matches!(self, Self::GuardFailure { .. })
    }
}

/// Result alias for stack operations.
pub type StackResult<T> = Result<T, StackError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_resolution_display() {
        let err = StackError::resolution("/plain", ResolutionFailure::NotStackable);
        assert_eq!(
            err.to_string(),
            "cannot stack '/plain': route is not stackable"
        );
        assert!(!err.is_guard_failure());
    }

    #[test]
    fn test_guard_failure_keeps_source() {
        let err = StackError::GuardFailure {
            guard: "SessionGuard",
            path: "/account".to_string(),
            source: "session store offline".into(),
        };
        assert!(err.is_guard_failure());
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("session store offline".to_string())
        );
    }
}
