//! # Stacked Navigator
//!
//! A stack of pages whose depth lives in a single address.
//!
//! Each page is addressed by one path fragment; the whole stack is the
//! fragments joined by `//`, so `/inbox//message/42` is an inbox page with a
//! message page on top of it. The address stays the source of truth: every
//! committed mutation is written back to a [`PathSink`], and every external
//! address change (back button, deep link) is turned back into pops and pushes
//! by the [`Reconciler`].
//!
//! # Features
//!
//! - **Path codec**: [`path::split`] and [`path::encode`] between addresses and
//!   fragments, plus prefix arithmetic on fragment sequences
//! - **Page stack**: push, pop, remove and identity-preserving replace
//! - **Guards**: async checks that may veto or redirect a push
//! - **Pop handlers**: per-page predicates that may refuse a pop
//! - **Reconciliation**: minimal pop/push edits with pacing between pops
//! - **Route table**: a ready-made [`Resolver`] with parameters and named routes
//! - **Logging**: `log` (default) or `tracing` via feature flags
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//! use stacked_navigator::{
//!     MemoryHistory, PageStack, ReconcileOptions, Reconciler, RouteDef, RouteTable,
//! };
//!
//! let routes = RouteTable::new()
//!     .with_route(RouteDef::new("/").content("home"))
//!     .and_then(|t| t.with_route(RouteDef::new("/settings").content("settings")))
//!     .unwrap();
//!
//! let history = Arc::new(MemoryHistory::new("/"));
//! let mut stack = PageStack::builder(Arc::new(routes))
//!     .sink(history.clone())
//!     .build();
//! let reconciler = Reconciler::with_options(ReconcileOptions::default().no_delay());
//!
//! pollster::block_on(async {
//!     // The user opens a deep link.
//!     let change = history.navigate("//settings");
//!     reconciler.handle(&mut stack, &change).await.unwrap();
//! });
//!
//! assert_eq!(stack.fragments(), vec!["/", "/settings"]);
//! assert_eq!(history.location(), "//settings");
//! ```
//!
//! # Concurrency
//!
//! A stack is driven from one task. Mutations take `&mut self` and a push
//! suspends only while its guards run; a guard that never completes stalls
//! that push, there is no timeout.

#[cfg(feature = "cache")]
pub mod cache;
pub mod error;
pub mod guards;
pub mod history;
pub mod lifecycle;
pub mod logging;
pub mod pacing;
pub mod page;
pub mod params;
pub mod path;
pub mod reconcile;
pub mod resolve;
pub mod routes;
pub mod stack;

#[cfg(feature = "cache")]
pub use cache::{CacheStats, ResolutionCache};
pub use error::{GuardError, ResolutionFailure, StackError, StackResult};
pub use guards::{
    guard_fn, FnGuard, GuardDecision, GuardFailed, GuardRegistry, GuardResult, NavigationAction,
    NavigationGuard,
};
pub use history::{CommitKind, DiscardSink, MemoryHistory, PathChange, PathSink};
pub use lifecycle::{PopHandler, PopHandlers};
pub use pacing::{FixedDelay, NoDelay, Pacer};
pub use page::{Content, Location, Page, PageId};
pub use params::RouteParams;
pub use reconcile::{
    DivergenceStrategy, Interruption, ReconcileOptions, ReconcilePlan, ReconcileReport, Reconciler,
};
pub use resolve::{NavigationTarget, Resolver};
pub use routes::{RouteDef, RouteError, RouteTable};
pub use stack::{
    PageStack, PopOutcome, PushOutcome, RemoveOutcome, StackBuilder, StackSnapshot, SubscriptionId,
};
