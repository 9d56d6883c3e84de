//! Test utilities for stack and reconciliation tests
//!
//! Provides a route table fixture, a history-backed harness and small helpers.

#![allow(dead_code)]

use stacked_navigator::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Route the test log output through `env_logger`.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Route table used across the integration tests.
///
/// - `/` and `/sample2/` plain pages
/// - `/sample/:v1?/:v2?/:v3?` with optional parameters, named `sample`
/// - `/login` as a redirect target
/// - `/locked` matched but not stackable
/// - `/blank` stackable but without content
pub fn routes() -> RouteTable {
    RouteTable::new()
        .with_route(RouteDef::new("/").content("root").name("root"))
        .and_then(|t| {
            t.with_route(
                RouteDef::new("/sample/:v1?/:v2?/:v3?")
                    .content("sample")
                    .name("sample"),
            )
        })
        .and_then(|t| t.with_route(RouteDef::new("/sample2/").content("sample2")))
        .and_then(|t| t.with_route(RouteDef::new("/login").content("login")))
        .and_then(|t| {
            t.with_route(
                RouteDef::new("/locked")
                    .content("locked")
                    .stackable(false),
            )
        })
        .and_then(|t| t.with_route(RouteDef::new("/blank")))
        .expect("fixture routes are valid")
}

/// A stack wired to an in-memory history and a reconciler without pacing.
pub struct Harness {
    pub stack: PageStack,
    pub history: Arc<MemoryHistory>,
    pub reconciler: Reconciler,
}

impl Harness {
    /// Harness whose history starts at `initial`. The stack starts empty;
    /// call [`Harness::load`] to build it.
    pub fn new(initial: &str) -> Self {
        Self::with_options(initial, ReconcileOptions::default().no_delay())
    }

    pub fn with_options(initial: &str, options: ReconcileOptions) -> Self {
        init_logging();
        let history = Arc::new(MemoryHistory::new(initial));
        let stack = PageStack::builder(Arc::new(routes()))
            .sink(history.clone())
            .build();
        Self {
            stack,
            history,
            reconciler: Reconciler::with_options(options),
        }
    }

    /// Build the stack from the initial address, as on a page load.
    pub async fn load(&mut self) -> StackResult<ReconcileReport> {
        let change = PathChange::new(self.history.location(), "");
        self.reconciler.handle(&mut self.stack, &change).await
    }

    /// Navigate the history to `path` and reconcile.
    pub async fn navigate(&mut self, path: &str) -> StackResult<ReconcileReport> {
        let change = self.history.navigate(path);
        self.reconciler.handle(&mut self.stack, &change).await
    }

    /// Step the history back and reconcile.
    pub async fn back(&mut self) -> Option<StackResult<ReconcileReport>> {
        let change = self.history.back()?;
        Some(self.reconciler.handle(&mut self.stack, &change).await)
    }

    /// Step the history forward and reconcile.
    pub async fn forward(&mut self) -> Option<StackResult<ReconcileReport>> {
        let change = self.history.forward()?;
        Some(self.reconciler.handle(&mut self.stack, &change).await)
    }

    /// Feed every change the stack's own commits triggered back in.
    pub async fn settle(&mut self) -> Vec<ReconcileReport> {
        let mut reports = Vec::new();
        for change in self.history.drain_pending() {
            let report = self
                .reconciler
                .handle(&mut self.stack, &change)
                .await
                .expect("self-triggered change reconciles");
            reports.push(report);
        }
        reports
    }

    pub fn fragments(&self) -> Vec<String> {
        self.stack.fragments()
    }
}

/// Register a pop handler on every page that counts its calls and answers
/// `allow`.
pub fn count_pop_handlers(stack: &PageStack, allow: bool) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    for page in stack.pages() {
        let calls = calls.clone();
        page.on_before_pop(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            allow
        });
    }
    calls
}

/// Guard that redirects `from` to `to` and lets everything else through.
pub fn redirect_guard(from: &'static str, to: &'static str) -> impl NavigationGuard {
    guard_fn(move |target, _| async move {
        if target.path == from {
            Ok(NavigationAction::redirect(to))
        } else {
            Ok(NavigationAction::Continue)
        }
    })
    .named("redirect")
}

/// Guard that vetoes `path` and lets everything else through.
pub fn deny_guard(path: &'static str) -> impl NavigationGuard {
    guard_fn(move |target, _| async move {
        if target.path == path {
            Ok(NavigationAction::deny("not allowed"))
        } else {
            Ok(NavigationAction::Continue)
        }
    })
    .named("deny")
}
