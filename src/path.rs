//! Stacked path encoding.
//!
//! A stacked address packs an ordered list of page paths ("fragments") into a
//! single string. Fragments are separated by a double slash that is followed by
//! a non-slash character, so `/inbox//message/42` is the two-page stack
//! `["/inbox", "/message/42"]`.
//!
//! # Normalization rules
//!
//! 1. Every fragment starts with exactly one `/`.
//! 2. An empty address, or a lone `/`, is the single root fragment `"/"`.
//! 3. A run of three or more slashes splits at its **last** two slashes, so the
//!    extra slashes stay with the left fragment (`/a/b///c` → `["/a/b/", "/c"]`).
//! 4. A trailing `//` is not a separator (`//a/b//` → `["/", "/a/b//"]`).
//!
//! ```
//! use stacked_navigator::path;
//!
//! assert_eq!(path::split("/a/b//c"), vec!["/a/b", "/c"]);
//! assert_eq!(path::split("///a/b///c/"), vec!["/", "/a/b/", "/c/"]);
//! assert_eq!(path::encode(["/", "/sample/"]), "//sample/");
//! ```
//!
//! Encoding is the inverse of [`split`] for fragments that do not themselves
//! contain a separator; such fragments cannot round-trip.

use std::borrow::Cow;

/// Token that separates two fragments in a stacked address.
pub const SEPARATOR: &str = "//";

/// Split a stacked address into its page fragments.
///
/// Always returns at least one fragment.
pub fn split(path: &str) -> Vec<String> {
    let bytes = path.as_bytes();
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i + 2 < bytes.len() {
        if bytes[i] == b'/' && bytes[i + 1] == b'/' && bytes[i + 2] != b'/' {
            fragments.push(normalize_fragment(&path[start..i]).into_owned());
            start = i + 2;
            i += 2;
        } else {
            i += 1;
        }
    }
    fragments.push(normalize_fragment(&path[start..]).into_owned());
    fragments
}

/// Give a fragment exactly one leading slash.
pub fn normalize_fragment(fragment: &str) -> Cow<'_, str> {
    if fragment.starts_with('/') && !fragment.starts_with(SEPARATOR) {
        return Cow::Borrowed(fragment);
    }
    Cow::Owned(format!("/{}", fragment.trim_start_matches('/')))
}

/// Join page fragments into a stacked address.
///
/// An empty sequence encodes to the empty string. A leading root fragment is
/// folded into the first separator, so `["/", "/a"]` encodes as `//a`.
pub fn encode<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    let mut iter = fragments.into_iter().peekable();

    let Some(first) = iter.next() else {
        return out;
    };
    let first = normalize_fragment(first.as_ref()).into_owned();
    if first != "/" || iter.peek().is_none() {
        out.push_str(&first);
    }
    for fragment in iter {
        out.push_str(SEPARATOR);
        out.push_str(fragment.as_ref().trim_start_matches('/'));
    }
    out
}

/// Alias of [`encode`] for call sites that read better as a join.
pub fn join<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    encode(fragments)
}

/// Number of leading elements on which `a` and `b` agree.
pub fn common_prefix_len<A, B>(a: &[A], b: &[B]) -> usize
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    a.iter()
        .zip(b)
        .take_while(|(x, y)| x.as_ref() == y.as_ref())
        .count()
}

/// The longest prefix shared element-wise by `a` and `b`, borrowed from `a`.
pub fn longest_common_prefix<'a, A, B>(a: &'a [A], b: &[B]) -> &'a [A]
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    &a[..common_prefix_len(a, b)]
}

/// What remains of `a` once the prefix it shares with `b` is stripped.
///
/// `remove_prefix(current, target)` is the tail to pop and
/// `remove_prefix(target, current)` is the tail to push.
///
/// ```
/// use stacked_navigator::path::remove_prefix;
///
/// assert_eq!(remove_prefix(&["/a", "/b"], &["/a"]), &["/b"]);
/// assert_eq!(remove_prefix(&["/a", "/b"], &["/b"]), &["/a", "/b"]);
/// ```
pub fn remove_prefix<'a, A, B>(a: &'a [A], b: &[B]) -> &'a [A]
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    &a[common_prefix_len(a, b)..]
}

/// Whether `fragments` read back unchanged after [`encode`] and [`split`].
///
/// ```
/// use stacked_navigator::path;
///
/// assert!(path::is_encodable(&["/", "/a"]));
/// assert!(!path::is_encodable(&["/", "/"]));
/// assert!(!path::is_encodable(&["/", "/a//b"]));
/// ```
pub fn is_encodable<S: AsRef<str>>(fragments: &[S]) -> bool {
    if fragments.is_empty() {
        return true;
    }
    let decoded = split(&encode(fragments));
    decoded.len() == fragments.len()
        && decoded.iter().zip(fragments).all(|(d, f)| d == f.as_ref())
}

/// Whether two addresses describe the same sequence of fragments.
pub fn same_stack(a: &str, b: &str) -> bool {
    a == b || split(a) == split(b)
}

/// Address reached by pushing `fragment` on top of `address`.
///
/// ```
/// use stacked_navigator::path;
///
/// assert_eq!(path::append("/", "/sample"), "//sample");
/// assert_eq!(path::append("/inbox", "message/1"), "/inbox//message/1");
/// ```
pub fn append(address: &str, fragment: &str) -> String {
    let mut fragments = split(address);
    fragments.push(normalize_fragment(fragment).into_owned());
    encode(&fragments)
}

/// Address reached by popping the top fragment, or `None` at the root.
pub fn parent(address: &str) -> Option<String> {
    let mut fragments = split(address);
    if fragments.len() < 2 {
        return None;
    }
    fragments.pop();
    Some(encode(&fragments))
}
