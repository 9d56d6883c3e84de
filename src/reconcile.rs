//! Address-driven reconciliation.
//!
//! When the address changes from outside the stack (back/forward, a deep link,
//! a typed URL) the [`Reconciler`] diffs the new address against the stack and
//! applies the minimal set of pops and pushes:
//!
//! 1. If the new address equals the encoded stack, or splits into the stack's
//!    fragments, nothing happens; this absorbs the change every sink commit
//!    triggers. An empty stack thus ignores an empty address.
//! 2. Strip the common prefix. The stack's remainder is the *pop tail*, the
//!    address's remainder the *push tail*.
//! 3. Only a pop tail: pop it top-down (emptying the root is allowed), pausing
//!    between pops. Only a push tail: push it in order.
//! 4. Both tails non-empty: by default the whole stack is torn down and rebuilt
//!    from the new address ([`DivergenceStrategy::Rebuild`]).
//!    [`DivergenceStrategy::KeepCommonPrefix`] pops the pop tail only.
//!
//! A pop refused by a pop handler stops the teardown and nothing is pushed.
//! A vetoed or redirected push stops the remaining pushes but keeps the pages
//! already pushed. Pushes are committed to the sink once for the whole batch,
//! as a [`CommitKind::Push`] when nothing was popped and as a
//! [`CommitKind::Replace`] after pops, which have already rewritten the
//! current address. If the stack stops short of the new address, the address
//! is corrected to the stack's true state with a single `Replace` instead.
//!
//! ```
//! use std::sync::Arc;
//! use stacked_navigator::{
//!     Location, PageStack, PathChange, ReconcileOptions, Reconciler,
//! };
//!
//! let mut stack = PageStack::builder(Arc::new(|path: &str| {
//!     Some(Location::new(path).with_content(()))
//! }))
//! .build();
//! let reconciler = Reconciler::with_options(ReconcileOptions::default().no_delay());
//!
//! pollster::block_on(async {
//!     reconciler.handle(&mut stack, &PathChange::new("/inbox//message/1", "")).await.unwrap();
//!     assert_eq!(stack.fragments(), vec!["/inbox", "/message/1"]);
//!
//!     reconciler.handle(&mut stack, &PathChange::new("/inbox", "/inbox//message/1")).await.unwrap();
//!     assert_eq!(stack.fragments(), vec!["/inbox"]);
//! });
//! ```

use crate::error::StackResult;
use crate::history::{CommitKind, PathChange};
use crate::pacing::{FixedDelay, NoDelay, Pacer};
use crate::path;
use crate::resolve::NavigationTarget;
use crate::stack::{PageStack, PopOutcome, PushOutcome};
use crate::{info_log, trace_log, warn_log};
use std::fmt;
use std::sync::Arc;

/// How to handle an address whose fragments diverge from the stack below the
/// top, so that pages must be both popped and pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DivergenceStrategy {
    /// Pop every page, then push every fragment of the new address.
    #[default]
    Rebuild,
    /// Pop down to the common prefix, then push the remainder.
    KeepCommonPrefix,
}

/// Tuning for a [`Reconciler`].
#[derive(Clone)]
pub struct ReconcileOptions {
    pacer: Arc<dyn Pacer>,
    strategy: DivergenceStrategy,
}

impl ReconcileOptions {
    /// Use `pacer` to pause between pops.
    pub fn pacer(mut self, pacer: impl Pacer + 'static) -> Self {
        self.pacer = Arc::new(pacer);
        self
    }

    /// Pop without pausing.
    pub fn no_delay(self) -> Self {
        self.pacer(NoDelay)
    }

    /// Choose how diverging stacks are reconciled.
    pub fn strategy(mut self, strategy: DivergenceStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            pacer: Arc::new(FixedDelay::DEFAULT),
            strategy: DivergenceStrategy::default(),
        }
    }
}

impl fmt::Debug for ReconcileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconcileOptions")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Shape of the work derived from an address change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePlan {
    /// The stack already matches the address.
    Unchanged,
    /// Pages are popped.
    Pop,
    /// Pages are pushed.
    Push,
    /// The pop tail is popped, then the push tail is pushed.
    PopThenPush,
    /// The whole stack is popped and rebuilt.
    Rebuild,
}

/// Why a reconciliation stopped before reaching the new address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interruption {
    /// A pop handler refused to let `path` go.
    PopRefused {
        /// Fragment of the page that stayed.
        path: String,
    },
    /// A guard vetoed pushing `path`.
    Vetoed {
        /// Fragment that was not pushed.
        path: String,
        /// Name of the vetoing guard.
        guard: &'static str,
        /// The veto reason.
        reason: String,
    },
    /// A guard redirected the push of `requested` to `to`.
    Redirected {
        /// Fragment that was requested.
        requested: String,
        /// Fragment that was pushed instead.
        to: String,
    },
}

/// What one [`Reconciler::handle`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// The plan that was followed.
    pub plan: ReconcilePlan,
    /// Number of pages popped.
    pub popped: usize,
    /// Number of pages pushed.
    pub pushed: usize,
    /// Set when the stack did not reach the new address.
    pub interrupted: Option<Interruption>,
    /// Encoded address of the stack afterwards.
    pub path: String,
}

impl ReconcileReport {
    fn unchanged(path: String) -> Self {
        Self {
            plan: ReconcilePlan::Unchanged,
            popped: 0,
            pushed: 0,
            interrupted: None,
            path,
        }
    }

    /// Check if the stack now matches the new address.
    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }
}

/// Applies address changes to a [`PageStack`].
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    /// Create a reconciler with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reconciler with custom options.
    pub fn with_options(options: ReconcileOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Bring `stack` in line with `change.to`.
    ///
    /// Resolution and guard failures abort the remaining pushes and are
    /// returned after the address has been corrected to the pages pushed so
    /// far.
    pub async fn handle(
        &self,
        stack: &mut PageStack,
        change: &PathChange,
    ) -> StackResult<ReconcileReport> {
        if stack.path() == change.to {
            trace_log!("Address '{}' is already committed", change.to);
            return Ok(ReconcileReport::unchanged(stack.path()));
        }

        let target = path::split(&change.to);
        let current = stack.fragments();

        if current == target {
            trace_log!("Address '{}' already matches the stack", change.to);
            return Ok(ReconcileReport::unchanged(stack.path()));
        }

        let pop_len = path::remove_prefix(&current, &target).len();
        let push_len = path::remove_prefix(&target, &current).len();
        let plan = match (pop_len, push_len) {
            (0, 0) => ReconcilePlan::Unchanged,
            (_, 0) => ReconcilePlan::Pop,
            (0, _) => ReconcilePlan::Push,
            _ => match self.options.strategy {
                DivergenceStrategy::Rebuild => ReconcilePlan::Rebuild,
                DivergenceStrategy::KeepCommonPrefix => ReconcilePlan::PopThenPush,
            },
        };
        info_log!(
            "Reconciling '{}' -> '{}': {:?} (pop {}, push {})",
            change.from,
            change.to,
            plan,
            pop_len,
            push_len
        );

        let mut report = ReconcileReport {
            plan,
            popped: 0,
            pushed: 0,
            interrupted: None,
            path: String::new(),
        };

        let teardown = match plan {
            ReconcilePlan::Unchanged | ReconcilePlan::Push => 0,
            ReconcilePlan::Pop | ReconcilePlan::PopThenPush => pop_len,
            ReconcilePlan::Rebuild => stack.len(),
        };
        self.pop_many(stack, teardown, &mut report).await;

        let result = if report.interrupted.is_none() {
            Self::push_remaining(stack, &target, &mut report).await
        } else {
            Ok(())
        };

        // Pops have already rewritten the current address, so after a teardown
        // the final state goes into that same entry.
        if stack.fragments() != target || (report.popped > 0 && report.pushed > 0) {
            stack.commit_path(CommitKind::Replace);
        } else if report.pushed > 0 {
            stack.commit_path(CommitKind::Push);
        }

        report.path = stack.path();
        if let Some(interruption) = &report.interrupted {
            warn_log!(
                "Reconciliation to '{}' stopped at '{}': {:?}",
                change.to,
                report.path,
                interruption
            );
        } else {
            info_log!(
                "Reconciled '{}' (popped {}, pushed {})",
                report.path,
                report.popped,
                report.pushed
            );
        }

        result.map(|()| report)
    }

    async fn pop_many(&self, stack: &mut PageStack, count: usize, report: &mut ReconcileReport) {
        for i in 0..count {
            if i > 0 {
                self.options.pacer.pause().await;
            }
            match stack.pop(true) {
                PopOutcome::Popped(_) => report.popped += 1,
                PopOutcome::Refused => {
                    report.interrupted = Some(Interruption::PopRefused {
                        path: stack.top().map(|p| p.path().to_string()).unwrap_or_default(),
                    });
                    return;
                }
                PopOutcome::RootKept | PopOutcome::Empty => return,
            }
        }
    }

    async fn push_remaining(
        stack: &mut PageStack,
        target: &[String],
        report: &mut ReconcileReport,
    ) -> StackResult<()> {
        let current = stack.fragments();
        let tail = path::remove_prefix(target, &current).to_vec();

        for fragment in tail {
            match stack
                .push_uncommitted(NavigationTarget::Path(fragment.clone()))
                .await
            {
                Ok(PushOutcome::Pushed(_)) => report.pushed += 1,
                Ok(PushOutcome::Redirected { requested, page }) => {
                    report.pushed += 1;
                    report.interrupted = Some(Interruption::Redirected {
                        requested,
                        to: page.path().to_string(),
                    });
                    break;
                }
                Ok(PushOutcome::Vetoed { guard, reason }) => {
                    report.interrupted = Some(Interruption::Vetoed {
                        path: fragment,
                        guard,
                        reason,
                    });
                    break;
                }
                Err(error) => return Err(error),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::{guard_fn, NavigationAction};
    use crate::history::CommitKind;
    use crate::page::Location;
    use parking_lot::Mutex;

    type Commits = Arc<Mutex<Vec<(String, CommitKind)>>>;

    fn stack_with_commits() -> (PageStack, Commits) {
        let commits: Commits = Arc::default();
        let log = commits.clone();
        let stack = PageStack::builder(Arc::new(|path: &str| {
            (path != "/missing").then(|| Location::new(path).with_content(()))
        }))
        .sink(Arc::new(move |path: &str, kind: CommitKind| {
            log.lock().push((path.to_string(), kind));
        }))
        .build();
        (stack, commits)
    }

    fn reconciler() -> Reconciler {
        Reconciler::with_options(ReconcileOptions::default().no_delay())
    }

    fn go(stack: &mut PageStack, to: &str) -> StackResult<ReconcileReport> {
        let change = PathChange::new(to, stack.path());
        pollster::block_on(reconciler().handle(stack, &change))
    }

    #[test]
    fn test_matching_address_is_noop() {
        let (mut stack, commits) = stack_with_commits();
        go(&mut stack, "//a").unwrap();
        commits.lock().clear();

        let report = go(&mut stack, "//a").unwrap();
        assert_eq!(report.plan, ReconcilePlan::Unchanged);
        assert!(commits.lock().is_empty());
    }

    #[test]
    fn test_push_batch_commits_once() {
        let (mut stack, commits) = stack_with_commits();
        let report = go(&mut stack, "//a//b//c").unwrap();

        assert_eq!(report.plan, ReconcilePlan::Push);
        assert_eq!(report.pushed, 4);
        assert_eq!(*commits.lock(), vec![("//a//b//c".to_string(), CommitKind::Push)]);
    }

    #[test]
    fn test_pop_tail_commits_each_pop() {
        let (mut stack, commits) = stack_with_commits();
        go(&mut stack, "//a//b").unwrap();
        commits.lock().clear();

        let report = go(&mut stack, "/").unwrap();
        assert_eq!(report.plan, ReconcilePlan::Pop);
        assert_eq!(report.popped, 2);
        assert_eq!(
            *commits.lock(),
            vec![
                ("//a".to_string(), CommitKind::Pop),
                ("/".to_string(), CommitKind::Pop)
            ]
        );
    }

    #[test]
    fn test_rebuild_on_divergence() {
        let (mut stack, commits) = stack_with_commits();
        go(&mut stack, "//a").unwrap();
        let root = stack.pages()[0].id();
        commits.lock().clear();

        let report = go(&mut stack, "//b").unwrap();
        assert_eq!(report.plan, ReconcilePlan::Rebuild);
        assert_eq!(report.popped, 2);
        assert_eq!(stack.fragments(), vec!["/", "/b"]);
        assert_ne!(stack.pages()[0].id(), root);
        assert_eq!(
            *commits.lock(),
            vec![
                ("/".to_string(), CommitKind::Pop),
                (String::new(), CommitKind::Pop),
                ("//b".to_string(), CommitKind::Replace)
            ]
        );
    }

    #[test]
    fn test_empty_address_on_empty_stack_is_noop() {
        let (mut stack, commits) = stack_with_commits();
        let report = go(&mut stack, "").unwrap();
        assert_eq!(report.plan, ReconcilePlan::Unchanged);
        assert!(stack.is_empty());
        assert!(commits.lock().is_empty());
    }

    #[test]
    fn test_keep_common_prefix_strategy() {
        let (mut stack, _) = stack_with_commits();
        go(&mut stack, "//a").unwrap();
        let root = stack.pages()[0].id();

        let reconciler = Reconciler::with_options(
            ReconcileOptions::default()
                .no_delay()
                .strategy(DivergenceStrategy::KeepCommonPrefix),
        );
        let change = PathChange::new("//b", "//a");
        let report = pollster::block_on(reconciler.handle(&mut stack, &change)).unwrap();

        assert_eq!(report.plan, ReconcilePlan::PopThenPush);
        assert_eq!((report.popped, report.pushed), (1, 1));
        assert_eq!(stack.pages()[0].id(), root);
    }

    #[test]
    fn test_refused_pop_abandons_and_corrects_address() {
        let (mut stack, commits) = stack_with_commits();
        go(&mut stack, "//a//b").unwrap();
        stack.pages()[2].on_before_pop(|| false);
        commits.lock().clear();

        let report = go(&mut stack, "//c").unwrap();
        assert_eq!(
            report.interrupted,
            Some(Interruption::PopRefused {
                path: "/b".to_string()
            })
        );
        assert_eq!(stack.len(), 3);
        assert_eq!(
            *commits.lock(),
            vec![("//a//b".to_string(), CommitKind::Replace)]
        );
    }

    #[test]
    fn test_veto_keeps_partial_progress() {
        let (mut stack, _) = stack_with_commits();
        stack.register_guard(guard_fn(|t, _| async move {
            if t.path == "/c" {
                Ok(NavigationAction::deny("locked"))
            } else {
                Ok(NavigationAction::Continue)
            }
        }));

        let report = go(&mut stack, "//b//c//d").unwrap();
        assert_eq!(stack.fragments(), vec!["/", "/b"]);
        assert!(matches!(
            report.interrupted,
            Some(Interruption::Vetoed { ref path, .. }) if path == "/c"
        ));
    }

    #[test]
    fn test_resolution_error_commits_partial_progress() {
        let (mut stack, commits) = stack_with_commits();
        let err = go(&mut stack, "//a//missing//b").unwrap_err();

        assert!(err.is_resolution());
        assert_eq!(stack.fragments(), vec!["/", "/a"]);
        assert_eq!(*commits.lock(), vec![("//a".to_string(), CommitKind::Replace)]);
    }
}
