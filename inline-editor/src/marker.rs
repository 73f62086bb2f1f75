//! Editable markers embedded in rendered class names.
//!
//! A rendered value cell looks like `<div class="editable attr-displayName row-3">`.
//! The `editable` class makes the region editable; `noneditable` on any
//! ancestor vetoes it. Every other class is read as a `key-value` token.

use std::collections::BTreeMap;

use crate::document::{DocumentSurface, NodeId};

pub const EDITABLE_CLASS: &str = "editable";
pub const NON_EDITABLE_CLASS: &str = "noneditable";

/// Metadata key naming the attribute a region displays
pub const ATTRIBUTE_KEY: &str = "attr";

/// Tags that bound the upward search for an editable region.
const BOUNDARY_TAGS: &[&str] = &["tr", "li"];

/// Key → value pairs parsed from an editable marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditMetadata(BTreeMap<String, String>);

impl EditMetadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The attribute this region displays, if the marker names one.
    pub fn attribute(&self) -> Option<&str> {
        self.get(ATTRIBUTE_KEY)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse a space-separated list of `key-value` tokens.
///
/// Tokens that do not contain exactly one `-` are dropped.
pub fn parse_marker(marker: &str) -> EditMetadata {
    let mut entries = BTreeMap::new();
    for token in marker.split_whitespace() {
        let mut parts = token.split('-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => {
                entries.insert(key.to_string(), value.to_string());
            }
            _ => {
                tracing::trace!(token, "Dropping malformed marker token");
            }
        }
    }
    EditMetadata(entries)
}

fn has_class(class_name: &str, wanted: &str) -> bool {
    class_name.split_whitespace().any(|c| c == wanted)
}

/// Walk up from `target` to the element carrying the editable marker.
///
/// Returns `None` when a `noneditable` element, a row / list-item boundary,
/// or the top of the tree is reached first.
pub fn locate_editable<D: DocumentSurface + ?Sized>(doc: &D, target: NodeId) -> Option<NodeId> {
    let mut current = Some(target);
    while let Some(node) = current {
        if let Some(class_name) = doc.class_name(node) {
            if has_class(class_name, NON_EDITABLE_CLASS) {
                return None;
            }
            if has_class(class_name, EDITABLE_CLASS) {
                return Some(node);
            }
        }
        if doc
            .tag(node)
            .is_some_and(|tag| BOUNDARY_TAGS.contains(&tag))
        {
            return None;
        }
        current = doc.parent(node);
    }
    None
}
