//! Built-in route table.
//!
//! [`RouteTable`] implements [`Resolver`] on top of [`matchit`]. Patterns use
//! `:name` for a parameter segment, a trailing run of `:name?` for optional
//! segments and `*name` for a final catch-all:
//!
//! ```
//! use stacked_navigator::{Resolver, RouteDef, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.add_route(RouteDef::new("/").content("home")).unwrap();
//! table
//!     .add_route(RouteDef::new("/sample/:v1?/:v2?").content("sample").name("sample"))
//!     .unwrap();
//!
//! let location = table.resolve("/sample/a/").unwrap();
//! assert_eq!(location.path, "/sample/a/");
//! assert_eq!(location.params.get("v1"), Some("a"));
//! assert!(table.resolve("/elsewhere").is_none());
//! ```
//!
//! Matching ignores trailing slashes, empty segments, and any `?query` or
//! `#hash` suffix. The returned [`Location`] keeps the fragment exactly as
//! requested.

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, ResolutionCache};
use crate::page::{Content, Location};
use crate::params::RouteParams;
use crate::resolve::Resolver;
use crate::{debug_log, info_log};
#[cfg(feature = "cache")]
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error raised while registering a route.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The pattern uses the segment syntax incorrectly.
    #[error("invalid route pattern '{pattern}': {message}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// What is wrong with it.
        message: &'static str,
    },

    /// The matcher rejected the pattern, usually because it overlaps an
    /// existing route.
    #[error("cannot register route '{pattern}'")]
    Insert {
        /// Offending pattern.
        pattern: String,
        /// Matcher error.
        #[source]
        source: matchit::InsertError,
    },

    /// Another route already uses this name.
    #[error("route name '{0}' is already registered")]
    DuplicateName(String),
}

/// One registered route.
#[derive(Clone)]
pub struct RouteDef {
    pattern: String,
    name: Option<String>,
    content: Option<Content>,
    stackable: bool,
}

impl RouteDef {
    /// A stackable route without content.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            name: None,
            content: None,
            stackable: true,
        }
    }

    /// Name the route for [`RouteTable::url_for`].
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach content returned with every match.
    pub fn content<T: Any + Send + Sync>(mut self, content: T) -> Self {
        self.content = Some(Arc::new(content));
        self
    }

    /// Attach already shared content.
    pub fn shared_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    /// Mark the route as (not) stackable.
    pub fn stackable(mut self, stackable: bool) -> Self {
        self.stackable = stackable;
        self
    }

    /// The pattern as registered.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Debug for RouteDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDef")
            .field("pattern", &self.pattern)
            .field("name", &self.name)
            .field("has_content", &self.content.is_some())
            .field("stackable", &self.stackable)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Optional(String),
    CatchAll(String),
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RouteError> {
    let invalid = |message| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        message,
    };

    let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(raw.len());
    for (i, seg) in raw.iter().enumerate() {
        let segment = if let Some(name) = seg.strip_prefix(':') {
            match name.strip_suffix('?') {
                Some(name) => Segment::Optional(name.to_string()),
                None => Segment::Param(name.to_string()),
            }
        } else if let Some(name) = seg.strip_prefix('*') {
            if i + 1 != raw.len() {
                return Err(invalid("catch-all must be the last segment"));
            }
            Segment::CatchAll(name.to_string())
        } else {
            Segment::Literal((*seg).to_string())
        };

        if let Segment::Param(name) | Segment::Optional(name) | Segment::CatchAll(name) = &segment
        {
            if name.is_empty() {
                return Err(invalid("parameter without a name"));
            }
        }
        let after_optional = matches!(segments.last(), Some(Segment::Optional(_)));
        if after_optional && !matches!(segment, Segment::Optional(_)) {
            return Err(invalid("optional segments must come last"));
        }
        segments.push(segment);
    }
    Ok(segments)
}

/// Render segments in matchit's syntax.
fn to_matchit(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        match segment {
            Segment::Literal(text) => out.push_str(&text.replace('{', "{{").replace('}', "}}")),
            Segment::Param(name) | Segment::Optional(name) => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
            Segment::CatchAll(name) => {
                out.push_str("{*");
                out.push_str(name);
                out.push('}');
            }
        }
    }
    out
}

/// Every concrete pattern an optional-tail pattern stands for, shortest first.
fn expand_optionals(segments: &[Segment]) -> Vec<Vec<Segment>> {
    let required = segments
        .iter()
        .take_while(|s| !matches!(s, Segment::Optional(_)))
        .count();
    (required..=segments.len())
        .map(|end| segments[..end].to_vec())
        .collect()
}

/// Fragment reduced to what the matcher compares.
fn match_key(path: &str) -> String {
    let bare = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = bare.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

struct Entry {
    def: RouteDef,
    segments: Vec<Segment>,
}

/// A [`Resolver`] over registered [`RouteDef`]s.
pub struct RouteTable {
    router: matchit::Router<usize>,
    patterns: Vec<(String, usize)>,
    entries: Vec<Entry>,
    names: HashMap<String, usize>,
    #[cfg(feature = "cache")]
    cache: Mutex<ResolutionCache>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            router: matchit::Router::new(),
            patterns: Vec::new(),
            entries: Vec::new(),
            names: HashMap::new(),
            #[cfg(feature = "cache")]
            cache: Mutex::new(ResolutionCache::new()),
        }
    }

    /// Create an empty table whose resolution cache holds `capacity` entries.
    #[cfg(feature = "cache")]
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(ResolutionCache::with_capacity(capacity)),
            ..Self::new()
        }
    }

    /// Register a route.
    pub fn add_route(&mut self, def: RouteDef) -> Result<(), RouteError> {
        let segments = parse_pattern(&def.pattern)?;
        if let Some(name) = &def.name {
            if self.names.contains_key(name) {
                return Err(RouteError::DuplicateName(name.clone()));
            }
        }

        // All variants go in or none do: the router is rebuilt and only
        // swapped in once every pattern inserted cleanly.
        let index = self.entries.len();
        let mut patterns = self.patterns.clone();
        patterns.extend(
            expand_optionals(&segments)
                .iter()
                .map(|variant| (to_matchit(variant), index)),
        );
        let mut router = matchit::Router::new();
        for (route, value) in &patterns {
            router
                .insert(route.as_str(), *value)
                .map_err(|source| RouteError::Insert {
                    pattern: def.pattern.clone(),
                    source,
                })?;
        }
        self.router = router;
        self.patterns = patterns;

        match &def.name {
            Some(name) => {
                info_log!("Registered route '{}' (name: '{}')", def.pattern, name);
                self.names.insert(name.clone(), index);
            }
            None => {
                info_log!("Registered route '{}'", def.pattern);
            }
        }
        self.entries.push(Entry { def, segments });

        #[cfg(feature = "cache")]
        self.cache.lock().clear();
        Ok(())
    }

    /// Register a route, builder style.
    pub fn with_route(mut self, def: RouteDef) -> Result<Self, RouteError> {
        self.add_route(def)?;
        Ok(self)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if no route is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolution cache statistics.
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats().clone()
    }

    fn lookup(&self, path: &str) -> Option<Location> {
        let key = match_key(path);
        let matched = self.router.at(&key).ok()?;
        let entry = &self.entries[*matched.value];
        let params: RouteParams = matched.params.iter().collect();
        debug_log!(
            "Fragment '{}' matched route '{}' {}",
            path,
            entry.def.pattern,
            params
        );

        Some(Location {
            path: path.to_string(),
            name: entry.def.name.clone(),
            params,
            content: entry.def.content.clone(),
            stackable: entry.def.stackable,
        })
    }
}

impl Resolver for RouteTable {
    fn resolve(&self, path: &str) -> Option<Location> {
        #[cfg(feature = "cache")]
        if let Some(cached) = self.cache.lock().get(path) {
            return cached;
        }

        let location = self.lookup(path);

        #[cfg(feature = "cache")]
        self.cache.lock().insert(path.to_string(), location.clone());
        location
    }

    /// Substitute `params` into a named route's pattern. Missing optional
    /// parameters truncate the fragment; a missing required one yields `None`.
    fn url_for(&self, name: &str, params: &RouteParams) -> Option<String> {
        let entry = &self.entries[*self.names.get(name)?];
        let mut parts = Vec::with_capacity(entry.segments.len());
        for segment in &entry.segments {
            match segment {
                Segment::Literal(text) => parts.push(text.clone()),
                Segment::Param(key) | Segment::CatchAll(key) => {
                    parts.push(params.get(key)?.to_string());
                }
                Segment::Optional(key) => match params.get(key) {
                    Some(value) => parts.push(value.to_string()),
                    None => break,
                },
            }
        }
        Some(format!("/{}", parts.join("/")))
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<&str> = self.entries.iter().map(|e| e.def.pattern()).collect();
        f.debug_struct("RouteTable")
            .field("routes", &patterns)
            .finish()
    }
}
