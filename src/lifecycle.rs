//! Before-pop interception.
//!
//! A page can register any number of [`PopHandler`]s, for example to keep a
//! form with unsaved changes on screen. Before the page leaves the stack (by
//! [`pop`](crate::PageStack::pop) or [`remove`](crate::PageStack::remove)) the
//! handlers run in registration order; the first one returning `false` refuses
//! the pop and the remaining handlers are not called.
//!
//! Handlers are synchronous predicates. [`replace`](crate::PageStack::replace)
//! never consults them.

use crate::trace_log;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Predicate consulted before a page is popped; `false` refuses the pop.
pub type PopHandler = Arc<dyn Fn() -> bool + Send + Sync>;

/// Append-only, ordered list of [`PopHandler`]s owned by one page.
#[derive(Default)]
pub struct PopHandlers {
    handlers: Mutex<Vec<PopHandler>>,
}

impl PopHandlers {
    /// Create an empty handler list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler. Handlers are never removed individually.
    pub fn push<F>(&self, handler: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.handlers.lock().push(Arc::new(handler));
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Return `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }

    /// Run the handlers in order and report whether the pop may proceed.
    ///
    /// The list is snapshotted first so a handler may register further
    /// handlers without deadlocking; those only apply to the next attempt.
    pub fn allows_pop(&self) -> bool {
        let handlers: Vec<PopHandler> = self.handlers.lock().clone();
        for (index, handler) in handlers.iter().enumerate() {
            if !handler() {
                trace_log!("Pop handler #{} refused", index);
                return false;
            }
        }
        true
    }
}

impl fmt::Debug for PopHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopHandlers")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_list_allows_pop() {
        assert!(PopHandlers::new().allows_pop());
    }

    #[test]
    fn test_first_refusal_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handlers = PopHandlers::new();

        let c = calls.clone();
        handlers.push(move || {
            c.fetch_add(1, Ordering::SeqCst);
            true
        });
        handlers.push(|| false);
        let c = calls.clone();
        handlers.push(move || {
            c.fetch_add(100, Ordering::SeqCst);
            true
        });

        assert!(!handlers.allows_pop());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handlers.len(), 3);
    }

    #[test]
    fn test_handler_may_register_another() {
        let handlers = Arc::new(PopHandlers::new());
        let inner = handlers.clone();
        handlers.push(move || {
            inner.push(|| false);
            true
        });

        assert!(handlers.allows_pop());
        assert!(!handlers.allows_pop());
    }
}
