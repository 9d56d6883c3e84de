//! Pages and resolved locations.
//!
//! A [`Location`] is what a [`Resolver`](crate::Resolver) produces for one
//! path fragment: the canonical fragment, the matched route's name and
//! parameters, an opaque content reference and the `stackable` flag.
//!
//! A [`Page`] wraps a location with an identity and its pop handlers. Pages
//! compare by identity only, never by location: pushing the same fragment
//! twice yields two distinct pages.

use crate::lifecycle::PopHandlers;
use crate::params::RouteParams;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Opaque content reference carried by a location (a view, a component key,
/// a factory). The stack never looks inside.
pub type Content = Arc<dyn Any + Send + Sync>;

/// Stable identity of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(Uuid);

impl PageId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A resolved route for one fragment of a stacked path.
#[derive(Clone)]
pub struct Location {
    /// Canonical fragment, always starting with `/`.
    pub path: String,
    /// Name of the matched route, if it has one.
    pub name: Option<String>,
    /// Parameters captured from the fragment.
    pub params: RouteParams,
    /// Renderable content; `None` makes the location unusable as a page.
    pub content: Option<Content>,
    /// Whether the matched route may appear in a stack.
    pub stackable: bool,
}

impl Location {
    /// A stackable location without content or parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            params: RouteParams::new(),
            content: None,
            stackable: true,
        }
    }

    /// Set the route name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the captured parameters.
    pub fn with_params(mut self, params: RouteParams) -> Self {
        self.params = params;
        self
    }

    /// Attach a content reference.
    pub fn with_content<T: Any + Send + Sync>(mut self, content: T) -> Self {
        self.content = Some(Arc::new(content));
        self
    }

    /// Attach an already shared content reference.
    pub fn with_shared_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    /// Set the stackable flag.
    pub fn stackable(mut self, stackable: bool) -> Self {
        self.stackable = stackable;
        self
    }

    /// Downcast the content reference.
    pub fn content<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.content.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Location")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("has_content", &self.content.is_some())
            .field("stackable", &self.stackable)
            .finish()
    }
}

struct PageInner {
    id: PageId,
    location: Location,
    pop_handlers: PopHandlers,
}

/// One unit of the page stack.
///
/// Cloning a `Page` is cheap and yields a handle to the same page: handlers
/// registered through any clone apply to all of them.
#[derive(Clone)]
pub struct Page {
    inner: Arc<PageInner>,
}

impl Page {
    /// Wrap a location with a fresh identity.
    pub fn new(location: Location) -> Self {
        Self::with_id(location, PageId::new())
    }

    /// Wrap a location under an existing identity. Used by
    /// [`PageStack::replace`](crate::PageStack::replace) to keep a slot's
    /// identity stable while its content changes.
    pub(crate) fn with_id(location: Location, id: PageId) -> Self {
        Self {
            inner: Arc::new(PageInner {
                id,
                location,
                pop_handlers: PopHandlers::new(),
            }),
        }
    }

    /// Identity of this page.
    pub fn id(&self) -> PageId {
        self.inner.id
    }

    /// The resolved location this page shows.
    pub fn location(&self) -> &Location {
        &self.inner.location
    }

    /// Shortcut for `self.location().path`.
    pub fn path(&self) -> &str {
        &self.inner.location.path
    }

    /// Shortcut for `self.location().params`.
    pub fn params(&self) -> &RouteParams {
        &self.inner.location.params
    }

    /// Register a handler consulted before this page is popped or removed.
    ///
    /// ```
    /// use stacked_navigator::{Location, Page};
    ///
    /// let page = Page::new(Location::new("/editor"));
    /// page.on_before_pop(|| false);
    /// assert!(!page.allows_pop());
    /// ```
    pub fn on_before_pop<F>(&self, handler: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.inner.pop_handlers.push(handler);
    }

    /// Evaluate the pop handlers in registration order.
    pub fn allows_pop(&self) -> bool {
        self.inner.pop_handlers.allows_pop()
    }

    /// Number of registered pop handlers.
    pub fn pop_handler_count(&self) -> usize {
        self.inner.pop_handlers.len()
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Page {}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.inner.id)
            .field("path", &self.inner.location.path)
            .field("pop_handlers", &self.inner.pop_handlers.len())
            .finish()
    }
}
