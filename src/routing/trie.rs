//! Segment trie backing the path matcher.
//!
//! # Responsibilities
//! - Store entries under the trie keys of their template
//! - Remove entries and prune nodes left empty
//! - Backtracking descent over a decoded request path
//!
//! # Design Decisions
//! - Three explicit child slots per node (literal map, `*`, `**`) instead of
//!   polymorphic nodes
//! - Child priority is literal, then `*`, then `**`, decided per segment
//! - Nothing is registered below a `**` child
//! - An empty request segment satisfies no key

use std::collections::HashMap;
use crate::routing::method::Method;
use crate::routing::segments::DecodedSegment;
use crate::routing::template::{SegmentKey, Template};

/// An operation stored at a terminal node.
#[derive(Debug, Clone)]
pub(crate) struct Entry<T> {
    pub(crate) operation: T,
    pub(crate) template: Template,
    pub(crate) body_field_path: Option<String>,
}

/// Entries for one custom verb at one node, keyed by method.
#[derive(Debug)]
struct MethodTable<T> {
    exact: HashMap<String, Entry<T>>,
    any: Option<Entry<T>>,
}

impl<T> Default for MethodTable<T> {
    fn default() -> Self {
        Self {
            exact: HashMap::new(),
            any: None,
        }
    }
}

impl<T> MethodTable<T> {
    fn get(&self, method: &str) -> Option<&Entry<T>> {
        self.exact.get(method).or(self.any.as_ref())
    }

    fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.any.is_none()
    }
}

#[derive(Debug)]
pub(crate) struct Node<T> {
    literals: HashMap<String, Node<T>>,
    single: Option<Box<Node<T>>>,
    multi: Option<Box<Node<T>>>,
    /// Custom verb ("" for none) to method table.
    entries: HashMap<String, MethodTable<T>>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            literals: HashMap::new(),
            single: None,
            multi: None,
            entries: HashMap::new(),
        }
    }
}

impl<T> Node<T> {
    /// Insert `entry` under `keys`, handing it back if the slot is taken.
    pub(crate) fn insert(
        &mut self,
        keys: &[SegmentKey],
        method: &Method,
        verb: &str,
        entry: Entry<T>,
    ) -> Result<(), Entry<T>> {
        let mut node = self;
        for key in keys {
            node = match key {
                SegmentKey::Literal(text) => node.literals.entry(text.clone()).or_default(),
                SegmentKey::Single => &mut **node.single.get_or_insert_with(Box::default),
                SegmentKey::Multi => &mut **node.multi.get_or_insert_with(Box::default),
            };
        }

        let table = node.entries.entry(verb.to_string()).or_default();
        match method {
            Method::Any => {
                if table.any.is_some() {
                    return Err(entry);
                }
                table.any = Some(entry);
            }
            Method::Exact(name) => {
                if table.exact.contains_key(name) {
                    return Err(entry);
                }
                table.exact.insert(name.clone(), entry);
            }
        }
        Ok(())
    }

    /// Remove the entry under `keys`, pruning children that end up empty.
    pub(crate) fn remove(
        &mut self,
        keys: &[SegmentKey],
        method: &Method,
        verb: &str,
    ) -> Option<Entry<T>> {
        let Some((first, rest)) = keys.split_first() else {
            let table = self.entries.get_mut(verb)?;
            let removed = match method {
                Method::Any => table.any.take(),
                Method::Exact(name) => table.exact.remove(name),
            };
            if table.is_empty() {
                self.entries.remove(verb);
            }
            return removed;
        };

        match first {
            SegmentKey::Literal(text) => {
                let child = self.literals.get_mut(text)?;
                let removed = child.remove(rest, method, verb);
                if child.is_empty() {
                    self.literals.remove(text);
                }
                removed
            }
            SegmentKey::Single => {
                let child = self.single.as_mut()?;
                let removed = child.remove(rest, method, verb);
                if child.is_empty() {
                    self.single = None;
                }
                removed
            }
            SegmentKey::Multi => {
                let child = self.multi.as_mut()?;
                let removed = child.remove(rest, method, verb);
                if child.is_empty() {
                    self.multi = None;
                }
                removed
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.literals.is_empty()
            && self.single.is_none()
            && self.multi.is_none()
            && self.entries.is_empty()
    }

    /// Depth-first search for the entry answering `segments`.
    ///
    /// `method` must already be upper-cased.
    pub(crate) fn find(
        &self,
        segments: &[DecodedSegment<'_>],
        method: &str,
        verb: &str,
    ) -> Option<&Entry<T>> {
        let Some((first, rest)) = segments.split_first() else {
            return self.terminal(method, verb);
        };
        if first.is_empty() {
            return None;
        }

        if let Some(child) = first.text().and_then(|text| self.literals.get(text)) {
            if let Some(entry) = child.find(rest, method, verb) {
                return Some(entry);
            }
        }

        if let Some(child) = &self.single {
            if let Some(entry) = child.find(rest, method, verb) {
                return Some(entry);
            }
        }

        if let Some(child) = &self.multi {
            if rest.iter().all(|segment| !segment.is_empty()) {
                return child.terminal(method, verb);
            }
        }

        None
    }

    fn terminal(&self, method: &str, verb: &str) -> Option<&Entry<T>> {
        self.entries.get(verb)?.get(method)
    }
}
