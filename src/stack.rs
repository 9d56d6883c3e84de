//! The page stack.
//!
//! [`PageStack`] owns the ordered pages (index 0 is the root, the last index
//! the top) and is the only place they change. Four mutations exist:
//!
//! | Operation | Guards | Pop handlers | Sink commit |
//! |-----------|--------|--------------|-------------|
//! | [`push`](PageStack::push) | yes | no | [`CommitKind::Push`] |
//! | [`pop`](PageStack::pop) | no | top page | [`CommitKind::Pop`] |
//! | [`remove`](PageStack::remove) | no | removed page | [`CommitKind::Remove`] |
//! | [`replace`](PageStack::replace) | no | no | [`CommitKind::Replace`] |
//!
//! After each mutation the stack publishes a fresh [`StackSnapshot`] to its
//! subscribers and writes the encoded address to its [`PathSink`].
//!
//! Mutations take `&mut self`, so calls against one stack are serialized by
//! the borrow checker; a push suspends only while its guards run.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stacked_navigator::{PageStack, RouteDef, RouteTable};
//!
//! let table = RouteTable::new()
//!     .with_route(RouteDef::new("/").content("home"))
//!     .and_then(|t| t.with_route(RouteDef::new("/detail/:id").content("detail")))
//!     .unwrap();
//! let mut stack = PageStack::builder(Arc::new(table)).build();
//!
//! pollster::block_on(async {
//!     stack.push("/").await.unwrap();
//!     stack.push("/detail/7").await.unwrap();
//! });
//! assert_eq!(stack.path(), "//detail/7");
//!
//! stack.pop(false);
//! assert_eq!(stack.path(), "/");
//! ```

use crate::error::{ResolutionFailure, StackError, StackResult};
use crate::guards::{GuardDecision, GuardRegistry, NavigationGuard};
use crate::history::{CommitKind, DiscardSink, PathSink};
use crate::page::{Location, Page, PageId};
use crate::path;
use crate::resolve::{resolve_target, NavigationTarget, Resolver};
use crate::{debug_log, info_log, warn_log};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Outcomes
// ============================================================================

/// Result of a push that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// The requested page is now on top.
    Pushed(Page),
    /// A guard redirected; the redirect target is now on top.
    Redirected {
        /// Fragment originally requested.
        requested: String,
        /// The page actually pushed.
        page: Page,
    },
    /// A guard vetoed; the stack is unchanged.
    Vetoed {
        /// Name of the vetoing guard.
        guard: &'static str,
        /// The veto reason.
        reason: String,
    },
}

impl PushOutcome {
    /// Check if a page was added (requested or redirected).
    pub fn is_performed(&self) -> bool {
        !self.is_vetoed()
    }

    /// Check if the requested page was added as is.
    pub fn is_pushed(&self) -> bool {
        matches!(self, Self::Pushed(_))
    }

    /// Check if a redirect target was added instead.
    pub fn is_redirected(&self) -> bool {
        matches!(self, Self::Redirected { .. })
    }

    /// Check if a guard declined the push.
    pub fn is_vetoed(&self) -> bool {
        matches!(self, Self::Vetoed { .. })
    }

    /// The page added to the stack, if any.
    pub fn page(&self) -> Option<&Page> {
        match self {
            Self::Pushed(page) | Self::Redirected { page, .. } => Some(page),
            Self::Vetoed { .. } => None,
        }
    }
}

/// Result of [`PageStack::pop`].
#[derive(Debug, Clone, PartialEq)]
pub enum PopOutcome {
    /// The top page was discarded.
    Popped(Page),
    /// A pop handler of the top page refused.
    Refused,
    /// Only the root is left and emptying the stack was not allowed.
    RootKept,
    /// The stack was already empty.
    Empty,
}

impl PopOutcome {
    /// Check if a page was discarded.
    pub fn is_popped(&self) -> bool {
        matches!(self, Self::Popped(_))
    }
}

/// Result of [`PageStack::remove`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    /// The page was spliced out of the stack.
    Removed {
        /// Index the page occupied.
        index: usize,
        /// The removed page.
        page: Page,
    },
    /// A pop handler of the page refused.
    Refused,
    /// No page with that identity is on the stack.
    NotFound,
}

impl RemoveOutcome {
    /// Check if a page was removed.
    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }
}

// ============================================================================
// StackSnapshot
// ============================================================================

/// Immutable view of the stack at one point in time.
///
/// Snapshots are cheap to clone and never change; take a new one (or
/// subscribe) to observe later mutations.
#[derive(Clone)]
pub struct StackSnapshot {
    pages: Arc<[Page]>,
}

impl Default for StackSnapshot {
    fn default() -> Self {
        Self::capture(&[])
    }
}

impl StackSnapshot {
    fn capture(pages: &[Page]) -> Self {
        Self {
            pages: pages.into(),
        }
    }

    /// Pages from root to top.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Return `true` if the stack was empty.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page at `depth` (0 is the root).
    pub fn get(&self, depth: usize) -> Option<&Page> {
        self.pages.get(depth)
    }

    /// The root page.
    pub fn root(&self) -> Option<&Page> {
        self.pages.first()
    }

    /// The top page.
    pub fn top(&self) -> Option<&Page> {
        self.pages.last()
    }

    /// Depth of the page with identity `id`.
    pub fn position(&self, id: PageId) -> Option<usize> {
        self.pages.iter().position(|p| p.id() == id)
    }

    /// Iterate from root to top.
    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.pages.iter()
    }

    /// Each page's fragment, root first.
    pub fn fragments(&self) -> Vec<String> {
        self.pages.iter().map(|p| p.path().to_string()).collect()
    }

    /// The encoded address.
    pub fn path(&self) -> String {
        path::encode(self.pages.iter().map(Page::path))
    }
}

impl fmt::Debug for StackSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.pages.iter().map(Page::path))
            .finish()
    }
}

impl<'a> IntoIterator for &'a StackSnapshot {
    type Item = &'a Page;
    type IntoIter = std::slice::Iter<'a, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

/// Handle returned by [`PageStack::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&StackSnapshot) + Send + Sync>;

// ============================================================================
// PageStack
// ============================================================================

/// Builder for [`PageStack`].
#[must_use]
pub struct StackBuilder {
    resolver: Arc<dyn Resolver>,
    guards: Option<Arc<GuardRegistry>>,
    sink: Option<Arc<dyn PathSink>>,
}

impl StackBuilder {
    /// Use a shared guard registry. Defaults to an empty one.
    pub fn guards(mut self, guards: Arc<GuardRegistry>) -> Self {
        self.guards = Some(guards);
        self
    }

    /// Write committed addresses to `sink`. Defaults to [`DiscardSink`].
    pub fn sink(mut self, sink: Arc<dyn PathSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build an empty stack.
    pub fn build(self) -> PageStack {
        PageStack {
            pages: Vec::new(),
            snapshot: StackSnapshot::default(),
            resolver: self.resolver,
            guards: self.guards.unwrap_or_default(),
            sink: self.sink.unwrap_or_else(|| Arc::new(DiscardSink)),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }
}

/// Ordered stack of pages kept in sync with an encoded address.
pub struct PageStack {
    pages: Vec<Page>,
    snapshot: StackSnapshot,
    resolver: Arc<dyn Resolver>,
    guards: Arc<GuardRegistry>,
    sink: Arc<dyn PathSink>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl PageStack {
    /// Start building a stack around `resolver`.
    pub fn builder(resolver: Arc<dyn Resolver>) -> StackBuilder {
        StackBuilder {
            resolver,
            guards: None,
            sink: None,
        }
    }

    // ========================================================================
    // Read access
    // ========================================================================

    /// Pages from root to top.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// The view published after the last mutation.
    pub fn snapshot(&self) -> StackSnapshot {
        self.snapshot.clone()
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Return `true` if the stack holds no page.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// The top page.
    pub fn top(&self) -> Option<&Page> {
        self.pages.last()
    }

    /// Each page's fragment, root first.
    pub fn fragments(&self) -> Vec<String> {
        self.snapshot.fragments()
    }

    /// The encoded address of the current stack.
    pub fn path(&self) -> String {
        self.snapshot.path()
    }

    /// The registry consulted before every push.
    pub fn guards(&self) -> &Arc<GuardRegistry> {
        &self.guards
    }

    /// Append a guard to this stack's registry.
    pub fn register_guard<G: NavigationGuard>(&self, guard: G) {
        self.guards.register(guard);
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Call `observer` with a new snapshot after every mutation.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&StackSnapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(observer)));
        id
    }

    /// Stop notifying a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Resolve `target`, run the guards, and push the result.
    ///
    /// Fails with [`StackError::Resolution`] if the target (or a guard's
    /// redirect target) does not resolve to a usable page, and with
    /// [`StackError::GuardFailure`] if a guard errors. In both cases the stack
    /// is unchanged. A veto is reported as [`PushOutcome::Vetoed`].
    pub async fn push(&mut self, target: impl Into<NavigationTarget>) -> StackResult<PushOutcome> {
        let outcome = self.push_uncommitted(target.into()).await?;
        if outcome.is_performed() {
            self.commit_path(CommitKind::Push);
        }
        Ok(outcome)
    }

    /// Push without writing the address; the reconciler commits once per batch.
    pub(crate) async fn push_uncommitted(
        &mut self,
        target: NavigationTarget,
    ) -> StackResult<PushOutcome> {
        let candidate = resolve_target(self.resolver.as_ref(), &target)?;
        self.ensure_encodable(&candidate, false)?;
        let current = self.pages.last().map(|page| page.location().clone());
        let guards = Arc::clone(&self.guards);

        let decision = guards
            .evaluate(&candidate, current.as_ref())
            .await
            .map_err(|failed| StackError::GuardFailure {
                guard: failed.guard,
                path: candidate.path.clone(),
                source: failed.error,
            })?;

        match decision {
            GuardDecision::Accepted => {
                let page = Page::new(candidate);
                self.append(page.clone());
                Ok(PushOutcome::Pushed(page))
            }
            GuardDecision::Vetoed { guard, reason } => {
                info_log!(
                    "Push of '{}' vetoed by '{}': {}",
                    candidate.path,
                    guard,
                    reason
                );
                Ok(PushOutcome::Vetoed { guard, reason })
            }
            GuardDecision::Redirected { guard, to } => {
                debug_log!(
                    "Guard '{}' redirected '{}' to '{}'",
                    guard,
                    candidate.path,
                    to
                );
                let location = resolve_target(self.resolver.as_ref(), &NavigationTarget::Path(to))?;
                self.ensure_encodable(&location, false)?;
                let page = Page::new(location);
                self.append(page.clone());
                Ok(PushOutcome::Redirected {
                    requested: candidate.path,
                    page,
                })
            }
        }
    }

    /// Fail if `location` on top (or in place of the top) would make the
    /// address decode to a different stack.
    fn ensure_encodable(&self, location: &Location, replacing_top: bool) -> StackResult<()> {
        let keep = if replacing_top {
            self.pages.len().saturating_sub(1)
        } else {
            self.pages.len()
        };
        let mut fragments: Vec<&str> = self.pages[..keep].iter().map(Page::path).collect();
        fragments.push(&location.path);
        if path::is_encodable(&fragments) {
            return Ok(());
        }
        warn_log!(
            "Cannot stack '{}': '{}' would not decode",
            location.path,
            path::encode(&fragments)
        );
        Err(StackError::resolution(
            location.path.clone(),
            ResolutionFailure::Ambiguous,
        ))
    }

    fn append(&mut self, page: Page) {
        self.pages.push(page);
        self.publish();
        info_log!(
            "Pushed '{}' (depth {})",
            self.pages.last().map_or("", Page::path),
            self.pages.len() - 1
        );
    }

    /// Pop the top page.
    ///
    /// No-op when the stack is empty, when only the root is left and
    /// `allow_emptying_root` is `false`, or when one of the top page's pop
    /// handlers refuses. The root check comes first, so handlers are not
    /// consulted for a pop that could not happen anyway.
    pub fn pop(&mut self, allow_emptying_root: bool) -> PopOutcome {
        let Some(top) = self.pages.len().checked_sub(1) else {
            return PopOutcome::Empty;
        };
        if top == 0 && !allow_emptying_root {
            debug_log!("Keeping root page '{}'", self.pages[top].path());
            return PopOutcome::RootKept;
        }
        if !self.pages[top].allows_pop() {
            warn_log!("Pop of '{}' refused by a pop handler", self.pages[top].path());
            return PopOutcome::Refused;
        }

        let page = self.pages.remove(top);
        self.publish();
        info_log!("Popped '{}' (depth {})", page.path(), self.pages.len());
        self.commit_path(CommitKind::Pop);
        PopOutcome::Popped(page)
    }

    /// Remove the page with identity `id`, wherever it sits in the stack.
    pub fn remove(&mut self, id: PageId) -> RemoveOutcome {
        let Some(index) = self.pages.iter().position(|p| p.id() == id) else {
            return RemoveOutcome::NotFound;
        };
        if !self.pages[index].allows_pop() {
            warn_log!(
                "Removal of '{}' refused by a pop handler",
                self.pages[index].path()
            );
            return RemoveOutcome::Refused;
        }

        let page = self.pages.remove(index);
        self.publish();
        info_log!("Removed '{}' from depth {}", page.path(), index);
        self.commit_path(CommitKind::Remove);
        RemoveOutcome::Removed { index, page }
    }

    /// Swap the top page's content for `target`, keeping its identity.
    ///
    /// Neither guards nor pop handlers run, and the old page's handlers are
    /// discarded. On an empty stack the new page becomes the root with a
    /// fresh identity.
    pub fn replace(&mut self, target: impl Into<NavigationTarget>) -> StackResult<Page> {
        let location = resolve_target(self.resolver.as_ref(), &target.into())?;
        self.ensure_encodable(&location, true)?;
        let page = match self.pages.last_mut() {
            Some(top) => {
                let page = Page::with_id(location, top.id());
                *top = page.clone();
                page
            }
            None => {
                let page = Page::new(location);
                self.pages.push(page.clone());
                page
            }
        };
        self.publish();
        info_log!(
            "Replaced top with '{}' (depth {})",
            page.path(),
            self.pages.len() - 1
        );
        self.commit_path(CommitKind::Replace);
        Ok(page)
    }

    // ========================================================================
    // Publication
    // ========================================================================

    fn publish(&mut self) {
        self.snapshot = StackSnapshot::capture(&self.pages);
        for (_, subscriber) in &self.subscribers {
            subscriber(&self.snapshot);
        }
    }

    /// Write the current address to the sink.
    pub(crate) fn commit_path(&self, kind: CommitKind) {
        let path = self.path();
        debug_log!("Committing '{}' ({:?})", path, kind);
        self.sink.adopt(&path, kind);
    }
}

impl fmt::Debug for PageStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageStack")
            .field("pages", &self.snapshot)
            .field("guards", &self.guards)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
