//! Fragment resolution.
//!
//! The stack does not know any route table. It asks a [`Resolver`] to turn a
//! fragment into a [`Location`] and then checks that the location is usable as
//! a page: it must exist, be marked stackable, and carry content. Any other
//! outcome is a [`StackError::Resolution`].
//!
//! [`RouteTable`](crate::RouteTable) is the built-in resolver; a closure works
//! too:
//!
//! ```
//! use stacked_navigator::{Location, Resolver};
//!
//! let resolver = |path: &str| Some(Location::new(path).with_content(()));
//! assert!(resolver.resolve("/anything").is_some());
//! ```

use crate::error::{ResolutionFailure, StackError, StackResult};
use crate::page::Location;
use crate::params::RouteParams;
use crate::path::normalize_fragment;
use crate::{trace_log, warn_log};

/// Maps a single fragment to a resolved [`Location`].
pub trait Resolver: Send + Sync {
    /// Resolve a fragment (always starting with `/`), or `None` if nothing
    /// matches.
    fn resolve(&self, path: &str) -> Option<Location>;

    /// Build the fragment for a named route. Resolvers without named routes
    /// keep the default.
    fn url_for(&self, name: &str, params: &RouteParams) -> Option<String> {
        let _ = (name, params);
        None
    }
}

impl<F> Resolver for F
where
    F: Fn(&str) -> Option<Location> + Send + Sync,
{
    fn resolve(&self, path: &str) -> Option<Location> {
        self(path)
    }
}

/// What a caller asks to push or replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// A single fragment such as `/message/42`.
    Path(String),
    /// A named route with its parameters.
    Named {
        /// Route name.
        name: String,
        /// Values substituted into the route pattern.
        params: RouteParams,
    },
}

impl NavigationTarget {
    /// Target a named route.
    pub fn named(name: impl Into<String>, params: RouteParams) -> Self {
        Self::Named {
            name: name.into(),
            params,
        }
    }

    /// Short description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.clone(),
            Self::Named { name, params } => format!("{}{}", name, params),
        }
    }
}

impl From<&str> for NavigationTarget {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for NavigationTarget {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<&String> for NavigationTarget {
    fn from(path: &String) -> Self {
        Self::Path(path.clone())
    }
}

/// Resolve `target` and check that the result can become a page.
pub(crate) fn resolve_target(
    resolver: &dyn Resolver,
    target: &NavigationTarget,
) -> StackResult<Location> {
    let path = match target {
        NavigationTarget::Path(path) => normalize_fragment(path).into_owned(),
        NavigationTarget::Named { name, params } => {
            resolver.url_for(name, params).ok_or_else(|| {
                warn_log!("Named route '{}' is not registered", name);
                StackError::resolution(target.describe(), ResolutionFailure::NotFound)
            })?
        }
    };
    trace_log!("Resolving '{}'", path);

    let failure = match resolver.resolve(&path) {
        None => ResolutionFailure::NotFound,
        Some(location) if !location.stackable => ResolutionFailure::NotStackable,
        Some(location) if location.content.is_none() => ResolutionFailure::NoContent,
        Some(location) => return Ok(location),
    };
    warn_log!("Cannot stack '{}': {}", path, failure);
    Err(StackError::resolution(path, failure))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(path: &str) -> Option<Location> {
        match path {
            "/" | "/inbox" => Some(Location::new(path).with_content("view")),
            "/plain" => Some(Location::new(path).with_content("view").stackable(false)),
            "/empty" => Some(Location::new(path)),
            _ => None,
        }
    }

    fn failure(target: &str) -> Option<ResolutionFailure> {
        match resolve_target(&resolver, &target.into()) {
            Err(StackError::Resolution { reason, .. }) => Some(reason),
            _ => None,
        }
    }

    #[test]
    fn test_resolves_and_normalizes() {
        let location = resolve_target(&resolver, &"inbox".into()).unwrap();
        assert_eq!(location.path, "/inbox");
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(failure("/missing"), Some(ResolutionFailure::NotFound));
        assert_eq!(failure("/plain"), Some(ResolutionFailure::NotStackable));
        assert_eq!(failure("/empty"), Some(ResolutionFailure::NoContent));
        assert_eq!(failure("/"), None);
    }

    #[test]
    fn test_named_target_without_registry() {
        let target = NavigationTarget::named("inbox", RouteParams::new());
        let err = resolve_target(&resolver, &target).unwrap_err();
        assert!(err.is_resolution());
    }
}
