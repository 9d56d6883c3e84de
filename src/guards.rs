//! Navigation guards evaluated before a push commits.
//!
//! Guards decide whether a page may be pushed, and may send the push
//! somewhere else instead. They are asynchronous so a guard can wait on a
//! confirmation dialog or a session lookup.
//!
//! # Evaluation
//!
//! [`GuardRegistry::evaluate`] awaits the registered guards one at a time, in
//! registration order:
//!
//! - every guard sees the **originally requested** location, never a redirect
//!   proposed by an earlier guard;
//! - the first [`Deny`](NavigationAction::Deny) ends evaluation;
//! - redirects do not end evaluation; the **last** redirect seen wins;
//! - a guard returning `Err` aborts evaluation and surfaces as
//!   [`StackError::GuardFailure`](crate::StackError::GuardFailure).
//!
//! There is no timeout: a guard that never resolves stalls the push. Callers
//! that need a deadline must build it into the guard.
//!
//! # Example
//!
//! ```
//! use stacked_navigator::{guard_fn, GuardRegistry, NavigationAction};
//!
//! let guards = GuardRegistry::new();
//! guards.register(guard_fn(|target, _current| async move {
//!     if target.path.starts_with("/admin") {
//!         Ok(NavigationAction::redirect("/login"))
//!     } else {
//!         Ok(NavigationAction::Continue)
//!     }
//! }));
//! assert_eq!(guards.len(), 1);
//! ```

use crate::error::GuardError;
use crate::page::Location;
use crate::{debug_log, error_log, trace_log};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

// ============================================================================
// NavigationAction
// ============================================================================

/// Decision returned by a guard.
///
/// # Example
///
/// ```
/// use stacked_navigator::NavigationAction;
///
/// let action = NavigationAction::deny("Unsaved changes");
/// assert!(action.is_deny());
///
/// let action = NavigationAction::redirect("/login");
/// assert_eq!(action.redirect_path(), Some("/login"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationAction {
    /// Allow the push.
    Continue,

    /// Veto the push.
    Deny {
        /// Human-readable reason for the veto.
        reason: String,
    },

    /// Push a different fragment instead.
    Redirect {
        /// Fragment to push instead.
        to: String,
        /// Optional human-readable reason for redirecting.
        reason: Option<String>,
    },
}

impl NavigationAction {
    /// Alias for [`Continue`](Self::Continue).
    pub fn allow() -> Self {
        Self::Continue
    }

    /// Veto with a reason.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny {
            reason: reason.into(),
        }
    }

    /// Redirect to another fragment.
    pub fn redirect(to: impl Into<String>) -> Self {
        Self::Redirect {
            to: to.into(),
            reason: None,
        }
    }

    /// Redirect with a human-readable reason.
    pub fn redirect_with_reason(to: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Redirect {
            to: to.into(),
            reason: Some(reason.into()),
        }
    }

    /// Check if this action allows the push.
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// Check if this action vetoes the push.
    pub fn is_deny(&self) -> bool {
        matches!(self, Self::Deny { .. })
    }

    /// Check if this action redirects the push.
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }

    /// Get the redirect target, if this is a redirect.
    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            Self::Redirect { to, .. } => Some(to.as_str()),
            _ => None,
        }
    }
}

/// Result type returned by guards.
pub type GuardResult = Result<NavigationAction, GuardError>;

// ============================================================================
// NavigationGuard trait
// ============================================================================

/// A check run before every push.
///
/// `target` is the resolved candidate page, `current` the location on top of
/// the stack (if any).
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use stacked_navigator::{GuardResult, Location, NavigationAction, NavigationGuard};
///
/// struct MaxDepth(usize);
///
/// #[async_trait]
/// impl NavigationGuard for MaxDepth {
///     async fn check(&self, target: &Location, _current: Option<&Location>) -> GuardResult {
///         if target.path.len() > self.0 {
///             Ok(NavigationAction::deny("path too long"))
///         } else {
///             Ok(NavigationAction::Continue)
///         }
///     }
///
///     fn name(&self) -> &'static str {
///         "MaxDepth"
///     }
/// }
/// ```
#[async_trait]
pub trait NavigationGuard: Send + Sync + 'static {
    /// Decide whether `target` may be pushed on top of `current`.
    async fn check(&self, target: &Location, current: Option<&Location>) -> GuardResult;

    /// Guard name for logs and error messages.
    fn name(&self) -> &'static str {
        "NavigationGuard"
    }
}

// ============================================================================
// guard_fn helper
// ============================================================================

/// Create a guard from an async closure.
///
/// The closure receives owned clones of the target and current locations so
/// the returned future can be `'static`.
pub fn guard_fn<F, Fut>(f: F) -> FnGuard<F>
where
    F: Fn(Location, Option<Location>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = GuardResult> + Send + 'static,
{
    FnGuard { f, name: "FnGuard" }
}

/// Guard created from a closure via [`guard_fn`].
pub struct FnGuard<F> {
    f: F,
    name: &'static str,
}

impl<F> FnGuard<F> {
    /// Give the guard a name for logs and errors.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl<F, Fut> NavigationGuard for FnGuard<F>
where
    F: Fn(Location, Option<Location>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = GuardResult> + Send + 'static,
{
    async fn check(&self, target: &Location, current: Option<&Location>) -> GuardResult {
        (self.f)(target.clone(), current.cloned()).await
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

// ============================================================================
// GuardRegistry
// ============================================================================

/// Combined outcome of running every registered guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// All guards continued.
    Accepted,
    /// A guard vetoed.
    Vetoed {
        /// Name of the vetoing guard.
        guard: &'static str,
        /// The veto reason.
        reason: String,
    },
    /// At least one guard redirected and none vetoed.
    Redirected {
        /// Name of the guard whose redirect is applied.
        guard: &'static str,
        /// Fragment to push instead.
        to: String,
    },
}

/// Failure of a single guard during [`GuardRegistry::evaluate`].
#[derive(Debug)]
pub struct GuardFailed {
    /// Name of the failing guard.
    pub guard: &'static str,
    /// The guard's error.
    pub error: GuardError,
}

/// Ordered, append-only list of guards shared by one or more stacks.
///
/// Pass it to [`StackBuilder::guards`](crate::StackBuilder::guards). Guards
/// may be registered at any time, but registering them before the first push
/// keeps every push under the same policy.
#[derive(Default)]
pub struct GuardRegistry {
    guards: RwLock<Vec<Arc<dyn NavigationGuard>>>,
}

impl GuardRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a guard. There is no way to unregister it.
    pub fn register<G: NavigationGuard>(&self, guard: G) {
        debug_log!("Registered guard '{}'", guard.name());
        self.guards.write().push(Arc::new(guard));
    }

    /// Number of registered guards.
    pub fn len(&self) -> usize {
        self.guards.read().len()
    }

    /// Return `true` if no guard is registered.
    pub fn is_empty(&self) -> bool {
        self.guards.read().is_empty()
    }

    /// Run every guard against `target`, see the module docs for the rules.
    pub async fn evaluate(
        &self,
        target: &Location,
        current: Option<&Location>,
    ) -> Result<GuardDecision, GuardFailed> {
        let guards: Vec<Arc<dyn NavigationGuard>> = self.guards.read().clone();
        let mut redirect: Option<(&'static str, String)> = None;

        for guard in &guards {
            let action = match guard.check(target, current).await {
                Ok(action) => action,
                Err(error) => {
                    error_log!(
                        "Guard '{}' failed for '{}': {}",
                        guard.name(),
                        target.path,
                        error
                    );
                    return Err(GuardFailed {
                        guard: guard.name(),
                        error,
                    });
                }
            };
            trace_log!("Guard '{}' -> {:?}", guard.name(), action);

            match action {
                NavigationAction::Continue => {}
                NavigationAction::Deny { reason } => {
                    debug_log!(
                        "Guard '{}' vetoed '{}': {}",
                        guard.name(),
                        target.path,
                        reason
                    );
                    return Ok(GuardDecision::Vetoed {
                        guard: guard.name(),
                        reason,
                    });
                }
                NavigationAction::Redirect { to, reason } => {
                    debug_log!(
                        "Guard '{}' redirects '{}' to '{}' ({:?})",
                        guard.name(),
                        target.path,
                        to,
                        reason
                    );
                    redirect = Some((guard.name(), to));
                }
            }
        }

        Ok(match redirect {
            Some((guard, to)) => GuardDecision::Redirected { guard, to },
            None => GuardDecision::Accepted,
        })
    }
}

impl fmt::Debug for GuardRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&'static str> = self.guards.read().iter().map(|g| g.name()).collect();
        f.debug_struct("GuardRegistry")
            .field("guards", &names)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn target() -> Location {
        Location::new("/sample")
    }

    fn fixed(
        action: NavigationAction,
    ) -> FnGuard<
        impl Fn(Location, Option<Location>) -> std::future::Ready<GuardResult>
            + Send
            + Sync
            + 'static,
    > {
        guard_fn(move |_, _| std::future::ready(Ok(action.clone())))
    }

    #[test]
    fn test_navigation_action_helpers() {
        assert!(NavigationAction::allow().is_continue());
        assert!(NavigationAction::deny("no").is_deny());
        let redirect = NavigationAction::redirect_with_reason("/login", "auth");
        assert!(redirect.is_redirect());
        assert_eq!(redirect.redirect_path(), Some("/login"));
        assert_eq!(NavigationAction::Continue.redirect_path(), None);
    }

    #[test]
    fn test_empty_registry_accepts() {
        let registry = GuardRegistry::new();
        let decision = pollster::block_on(registry.evaluate(&target(), None)).unwrap();
        assert_eq!(decision, GuardDecision::Accepted);
    }

    #[test]
    fn test_deny_short_circuits() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = GuardRegistry::new();
        registry.register(fixed(NavigationAction::deny("closed")).named("Closed"));
        let log = seen.clone();
        registry.register(guard_fn(move |t, _| {
            log.lock().push(t.path);
            async { Ok(NavigationAction::Continue) }
        }));

        let decision = pollster::block_on(registry.evaluate(&target(), None)).unwrap();
        assert_eq!(
            decision,
            GuardDecision::Vetoed {
                guard: "Closed",
                reason: "closed".to_string()
            }
        );
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_last_redirect_wins_and_guards_see_original_target() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = GuardRegistry::new();
        registry.register(fixed(NavigationAction::redirect("/first")));
        let log = seen.clone();
        registry.register(guard_fn(move |t, _| {
            log.lock().push(t.path);
            async { Ok(NavigationAction::Continue) }
        }));
        registry.register(fixed(NavigationAction::redirect("/second")).named("Second"));

        let decision = pollster::block_on(registry.evaluate(&target(), None)).unwrap();
        assert_eq!(
            decision,
            GuardDecision::Redirected {
                guard: "Second",
                to: "/second".to_string()
            }
        );
        assert_eq!(*seen.lock(), vec!["/sample".to_string()]);
    }

    #[test]
    fn test_deny_after_redirect_still_vetoes() {
        let registry = GuardRegistry::new();
        registry.register(fixed(NavigationAction::redirect("/elsewhere")));
        registry.register(fixed(NavigationAction::deny("late veto")));

        let decision = pollster::block_on(registry.evaluate(&target(), None)).unwrap();
        assert!(matches!(decision, GuardDecision::Vetoed { .. }));
    }

    #[test]
    fn test_guard_error_is_failure() {
        let registry = GuardRegistry::new();
        registry.register(
            guard_fn(|_, _| async { Err::<NavigationAction, GuardError>("boom".into()) })
                .named("Broken"),
        );

        let failed = pollster::block_on(registry.evaluate(&target(), None)).unwrap_err();
        assert_eq!(failed.guard, "Broken");
        assert_eq!(failed.error.to_string(), "boom");
    }

    #[test]
    fn test_guard_receives_current_location() {
        let registry = GuardRegistry::new();
        registry.register(guard_fn(|_, current: Option<Location>| async move {
            match current {
                Some(c) if c.path == "/" => Ok(NavigationAction::Continue),
                _ => Ok(NavigationAction::deny("must start from root")),
            }
        }));

        let root = Location::new("/");
        let accepted = pollster::block_on(registry.evaluate(&target(), Some(&root))).unwrap();
        assert_eq!(accepted, GuardDecision::Accepted);
        let vetoed = pollster::block_on(registry.evaluate(&target(), None)).unwrap();
        assert!(matches!(vetoed, GuardDecision::Vetoed { .. }));
    }
}
