//! Ordered options bag handed to every worker body.
//!
//! A bag is a list of tagged entries: bare flags, JSON values, or worker
//! handles (peers). Tags may repeat; lookups return every match in
//! declaration order. The runtime prepends exactly one [`NEXT`] peers entry
//! before the body runs, carrying the worker's downstream handles; caller
//! entries pass through untouched, which is what makes application-level
//! routing tags possible.
//!
//! # Examples
//!
//! ```
//! use chainline::{Options, NEXT};
//! use serde_json::json;
//!
//! let opts: Options<String> = Options::new()
//!     .with_flag("verbose")
//!     .with_value("limit", json!(8))
//!     .with_value("limit", json!(16));
//!
//! assert!(opts.contains("verbose"));
//! assert_eq!(opts.values("limit"), vec![&json!(8), &json!(16)]);
//! assert!(opts.peers(NEXT).is_empty());
//! ```

use std::fmt;

use crate::runtime::WorkerHandle;

/// The distinguished tag bound to a worker's downstream handles.
pub const NEXT: &str = "next";

/// One entry of an options bag.
pub enum OptionEntry<P> {
    /// A bare tag with no value.
    Flag(String),
    /// A tag bound to an opaque caller value.
    Value(String, serde_json::Value),
    /// A tag bound to addressable worker handles.
    Peers(String, Vec<WorkerHandle<P>>),
}

impl<P> OptionEntry<P> {
    /// The entry's tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            OptionEntry::Flag(tag) => tag,
            OptionEntry::Value(tag, _) => tag,
            OptionEntry::Peers(tag, _) => tag,
        }
    }
}

impl<P> Clone for OptionEntry<P> {
    fn clone(&self) -> Self {
        match self {
            OptionEntry::Flag(tag) => OptionEntry::Flag(tag.clone()),
            OptionEntry::Value(tag, value) => OptionEntry::Value(tag.clone(), value.clone()),
            OptionEntry::Peers(tag, peers) => OptionEntry::Peers(tag.clone(), peers.clone()),
        }
    }
}

impl<P> fmt::Debug for OptionEntry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionEntry::Flag(tag) => f.debug_tuple("Flag").field(tag).finish(),
            OptionEntry::Value(tag, value) => f.debug_tuple("Value").field(tag).field(value).finish(),
            OptionEntry::Peers(tag, peers) => {
                let ids: Vec<_> = peers.iter().map(WorkerHandle::id).collect();
                f.debug_tuple("Peers").field(tag).field(&ids).finish()
            }
        }
    }
}

/// Ordered, duplicate-friendly bag of tagged entries.
pub struct Options<P> {
    entries: Vec<OptionEntry<P>>,
}

impl<P> Options<P> {
    /// An empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a bare flag.
    #[must_use]
    pub fn with_flag(mut self, tag: impl Into<String>) -> Self {
        self.entries.push(OptionEntry::Flag(tag.into()));
        self
    }

    /// Append a tag bound to a JSON value.
    #[must_use]
    pub fn with_value(mut self, tag: impl Into<String>, value: serde_json::Value) -> Self {
        self.entries.push(OptionEntry::Value(tag.into(), value));
        self
    }

    /// Append a tag bound to a single worker handle.
    #[must_use]
    pub fn with_peer(mut self, tag: impl Into<String>, peer: WorkerHandle<P>) -> Self {
        self.entries
            .push(OptionEntry::Peers(tag.into(), vec![peer]));
        self
    }

    /// Whether any entry carries the tag.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.iter().any(|entry| entry.tag() == tag)
    }

    /// Every JSON value bound to `tag`, in declaration order.
    #[must_use]
    pub fn values(&self, tag: &str) -> Vec<&serde_json::Value> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                OptionEntry::Value(t, value) if t == tag => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Every addressable handle bound to `tag`, in declaration order.
    ///
    /// Flag and value entries under the same tag are not addressable and are
    /// skipped, which is what lets a routing tag have optional recipients.
    #[must_use]
    pub fn peers(&self, tag: &str) -> Vec<WorkerHandle<P>> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                OptionEntry::Peers(t, peers) if t == tag => Some(peers.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// All entries, in order.
    #[must_use]
    pub fn entries(&self) -> &[OptionEntry<P>] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Install a peers entry at the head of the bag.
    pub(crate) fn prepend_peers(&mut self, tag: &str, peers: Vec<WorkerHandle<P>>) {
        self.entries
            .insert(0, OptionEntry::Peers(tag.to_string(), peers));
    }
}

impl<P> Default for Options<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for Options<P> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<P> fmt::Debug for Options<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}
