//! Process-wide registry of void (self-closing) tag names.
//!
//! [§ 13.1.2 Elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
//! "Void elements only have a start tag; end tags must not be specified
//! for void elements."
//!
//! The registry is shared across all documents in the process: a custom
//! component tag registered here is treated as void by every subsequent
//! parse. Names are case-insensitive and stored lowercased. Each
//! [`Document`](crate::Document) snapshots the registry when it parses, so
//! later registry edits do not change how an already loaded document
//! serializes.

use std::collections::HashSet;
use std::sync::Mutex;

/// [§ 13.1.2](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
/// The standard void elements.
const DEFAULT_VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

static REGISTRY: Mutex<Option<HashSet<String>>> = Mutex::new(None);

fn with_registry<R>(f: impl FnOnce(&mut HashSet<String>) -> R) -> R {
    let mut guard = REGISTRY.lock().unwrap();
    let set = guard
        .get_or_insert_with(|| DEFAULT_VOID_TAGS.iter().map(ToString::to_string).collect());
    f(set)
}

/// Register one tag name as void.
///
/// # Panics
/// Panics if the registry mutex is poisoned.
pub fn add_self_closing_tag(tag: &str) {
    with_registry(|set| {
        set.insert(tag.to_lowercase());
    });
}

/// Remove one tag name from the registry.
///
/// # Panics
/// Panics if the registry mutex is poisoned.
pub fn remove_self_closing_tag(tag: &str) {
    with_registry(|set| {
        set.remove(&tag.to_lowercase());
    });
}

/// Register several tag names as void.
///
/// # Panics
/// Panics if the registry mutex is poisoned.
pub fn register_self_closing_tags<I, S>(tags: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    with_registry(|set| {
        set.extend(tags.into_iter().map(|t| t.as_ref().to_lowercase()));
    });
}

/// Restore the registry to the standard void elements.
///
/// # Panics
/// Panics if the registry mutex is poisoned.
pub fn reset_self_closing_tags() {
    let mut guard = REGISTRY.lock().unwrap();
    *guard = Some(DEFAULT_VOID_TAGS.iter().map(ToString::to_string).collect());
}

/// The registered void tag names, sorted.
///
/// # Panics
/// Panics if the registry mutex is poisoned.
#[must_use]
pub fn self_closing_tags() -> Vec<String> {
    let mut tags = with_registry(|set| set.iter().cloned().collect::<Vec<_>>());
    tags.sort();
    tags
}

/// Whether `tag` is registered as void (case-insensitive).
///
/// # Panics
/// Panics if the registry mutex is poisoned.
#[must_use]
pub fn is_self_closing_tag(tag: &str) -> bool {
    with_registry(|set| set.contains(&tag.to_lowercase()))
}

/// Snapshot the current registry contents.
///
/// # Panics
/// Panics if the registry mutex is poisoned.
#[must_use]
pub(crate) fn snapshot() -> HashSet<String> {
    with_registry(|set| set.clone())
}
