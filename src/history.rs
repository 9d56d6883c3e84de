//! The address side of the stack.
//!
//! The stack writes every committed address to a [`PathSink`]. The address
//! owner (a browser history, a window title bar, a deep-link handler) reports
//! address changes back as [`PathChange`]s, which the
//! [`Reconciler`](crate::Reconciler) turns into stack mutations. A sink commit
//! normally triggers such a change itself; the reconciler ignores a change
//! whose target already matches the stack.
//!
//! [`MemoryHistory`] is an in-memory implementation of both sides, useful for
//! tests and for hosts without a real history. Only push commits that change
//! the address queue a change; the other kinds rewrite the current entry
//! silently.

use crate::debug_log;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// An address change reported by the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChange {
    /// The new address.
    pub to: String,
    /// The address before the change.
    pub from: String,
}

impl PathChange {
    /// Create a change notification.
    pub fn new(to: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
        }
    }
}

/// The stack mutation behind a sink commit.
///
/// History backends usually add an entry for [`Push`](Self::Push) and rewrite
/// the current entry for the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitKind {
    /// One or more pages were pushed.
    Push,
    /// The top page was popped.
    Pop,
    /// A page was removed from the middle of the stack.
    Remove,
    /// The top page was replaced, or the address was corrected to match the
    /// stack after a declined transition.
    Replace,
}

/// Receives the encoded address after committed mutations.
pub trait PathSink: Send + Sync {
    /// Adopt `path` as the current address.
    fn adopt(&self, path: &str, kind: CommitKind);
}

impl<F> PathSink for F
where
    F: Fn(&str, CommitKind) + Send + Sync,
{
    fn adopt(&self, path: &str, kind: CommitKind) {
        self(path, kind);
    }
}

/// Sink that ignores every commit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl PathSink for DiscardSink {
    fn adopt(&self, _path: &str, _kind: CommitKind) {}
}

#[derive(Debug)]
struct HistoryState {
    entries: Vec<String>,
    current: usize,
    commits: Vec<(String, CommitKind)>,
    pending: VecDeque<PathChange>,
}

impl HistoryState {
    fn location(&self) -> &str {
        &self.entries[self.current]
    }
}

/// In-memory history with back/forward navigation.
///
/// # Example
///
/// ```
/// use stacked_navigator::{CommitKind, MemoryHistory, PathSink};
///
/// let history = MemoryHistory::new("/");
/// let change = history.navigate("//inbox");
/// assert_eq!(change.from, "/");
///
/// history.adopt("//inbox//message/1", CommitKind::Push);
/// assert_eq!(history.location(), "//inbox//message/1");
/// assert_eq!(history.drain_pending().len(), 1);
///
/// let back = history.back().unwrap();
/// assert_eq!(back.to, "//inbox");
/// ```
#[derive(Debug)]
pub struct MemoryHistory {
    state: Mutex<HistoryState>,
}

impl MemoryHistory {
    /// Create a history whose only entry is `initial`.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(HistoryState {
                entries: vec![initial.into()],
                current: 0,
                commits: Vec::new(),
                pending: VecDeque::new(),
            }),
        }
    }

    /// The current address.
    pub fn location(&self) -> String {
        self.state.lock().location().to_string()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.state.lock().entries.clone()
    }

    /// Navigate to `path` as a user would, dropping forward entries.
    pub fn navigate(&self, path: impl Into<String>) -> PathChange {
        let mut state = self.state.lock();
        let from = state.location().to_string();
        let to = path.into();
        let keep = state.current + 1;
        state.entries.truncate(keep);
        state.entries.push(to.clone());
        state.current += 1;
        PathChange { to, from }
    }

    /// Step back one entry.
    pub fn back(&self) -> Option<PathChange> {
        let mut state = self.state.lock();
        if state.current == 0 {
            return None;
        }
        let from = state.location().to_string();
        state.current -= 1;
        Some(PathChange {
            to: state.location().to_string(),
            from,
        })
    }

    /// Step forward one entry.
    pub fn forward(&self) -> Option<PathChange> {
        let mut state = self.state.lock();
        if state.current + 1 >= state.entries.len() {
            return None;
        }
        let from = state.location().to_string();
        state.current += 1;
        Some(PathChange {
            to: state.location().to_string(),
            from,
        })
    }

    /// Check if [`back`](Self::back) would move.
    pub fn can_go_back(&self) -> bool {
        self.state.lock().current > 0
    }

    /// Check if [`forward`](Self::forward) would move.
    pub fn can_go_forward(&self) -> bool {
        let state = self.state.lock();
        state.current + 1 < state.entries.len()
    }

    /// Every commit received through [`PathSink::adopt`], oldest first.
    pub fn commits(&self) -> Vec<(String, CommitKind)> {
        self.state.lock().commits.clone()
    }

    /// Take the changes triggered by sink commits, oldest first.
    pub fn drain_pending(&self) -> Vec<PathChange> {
        self.state.lock().pending.drain(..).collect()
    }
}

impl PathSink for MemoryHistory {
    fn adopt(&self, path: &str, kind: CommitKind) {
        let mut state = self.state.lock();
        let from = state.location().to_string();
        state.commits.push((path.to_string(), kind));

        if from == path {
            return;
        }

        match kind {
            CommitKind::Push => {
                let keep = state.current + 1;
                state.entries.truncate(keep);
                state.entries.push(path.to_string());
                state.current += 1;
                state.pending.push_back(PathChange::new(path, from));
            }
            // Rewrites in place and, like a replaced browser entry, does not
            // notify.
            CommitKind::Pop | CommitKind::Remove | CommitKind::Replace => {
                let current = state.current;
                state.entries[current] = path.to_string();
            }
        }
        debug_log!("History adopted '{}' ({:?})", path, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation() {
        let history = MemoryHistory::new("/");
        history.navigate("//a");
        history.navigate("//a//b");
        assert_eq!(history.location(), "//a//b");

        let back = history.back().unwrap();
        assert_eq!(back, PathChange::new("//a", "//a//b"));
        assert!(history.can_go_forward());

        let forward = history.forward().unwrap();
        assert_eq!(forward.to, "//a//b");
        assert!(history.forward().is_none());
    }

    #[test]
    fn test_navigate_drops_forward_entries() {
        let history = MemoryHistory::new("/");
        history.navigate("//a");
        history.back();
        history.navigate("//b");
        assert_eq!(history.entries(), vec!["/", "//b"]);
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_pop_commit_rewrites_current_entry() {
        let history = MemoryHistory::new("//a//b");
        history.adopt("//a", CommitKind::Pop);
        assert_eq!(history.entries(), vec!["//a"]);
        assert!(!history.can_go_back());
        assert!(history.drain_pending().is_empty());
    }

    #[test]
    fn test_push_commit_adds_entry_and_notifies() {
        let history = MemoryHistory::new("/");
        history.adopt("//a", CommitKind::Push);
        assert_eq!(history.entries(), vec!["/", "//a"]);
        assert_eq!(history.drain_pending(), vec![PathChange::new("//a", "/")]);
    }

    #[test]
    fn test_unchanged_commit_is_recorded_only() {
        let history = MemoryHistory::new("//a");
        history.adopt("//a", CommitKind::Push);
        history.adopt("//a", CommitKind::Replace);
        assert!(history.drain_pending().is_empty());
        assert_eq!(history.entries(), vec!["//a"]);
        assert_eq!(history.commits().len(), 2);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |path: &str, kind: CommitKind| seen.lock().push((path.to_string(), kind));
        sink.adopt("/", CommitKind::Push);
        assert_eq!(seen.lock().len(), 1);
    }
}
