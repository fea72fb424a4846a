//! Defines the core abstraction for a transformable document tree.
//!
//! The engine is written exclusively against [`JsonNode`], allowing it to
//! filter any host representation (a `serde_json::Value`, a borrowed DOM,
//! a serializer's event tree) that implements the capability set.

mod value;

use crate::error::SiftError;
use serde_json::Value;
use std::fmt;

/// The shape of a node, aligned with the JSON data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

/// One element of a document path: a named object property or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    Property(String),
    Index(usize),
}

impl PathElement {
    pub fn is_index(&self) -> bool {
        matches!(self, PathElement::Index(_))
    }
}

/// The path from the document root to the node currently being visited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPath {
    elements: Vec<PathElement>,
}

impl DocumentPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    /// The property names along the path, skipping array indexes. Matching
    /// operates on this view of the path.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            PathElement::Property(name) => Some(name.as_str()),
            PathElement::Index(_) => None,
        })
    }

    /// Extends the path while descending. Exposed for host-side
    /// [`JsonNode::transform`] implementations.
    pub fn push(&mut self, element: PathElement) {
        self.elements.push(element);
    }

    pub fn pop(&mut self) {
        self.elements.pop();
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match element {
                PathElement::Property(name) => f.write_str(name)?,
                PathElement::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

/// Context handed to the transform callback for each visited node.
///
/// `key` starts as the node's property key (or stringified index) and may be
/// reassigned to rename the property in the output; matching always uses the
/// original key.
pub struct NodeContext<'a, N> {
    path: &'a DocumentPath,
    pub key: String,
    parent: Option<&'a N>,
}

impl<'a, N> NodeContext<'a, N> {
    /// Builds a context for one callback invocation. Host-side
    /// [`JsonNode::transform`] implementations construct these as they walk.
    pub fn new(path: &'a DocumentPath, key: String, parent: Option<&'a N>) -> Self {
        Self { path, key, parent }
    }

    pub fn path(&self) -> &DocumentPath {
        self.path
    }

    pub fn parent(&self) -> Option<&N> {
        self.parent
    }
}

/// The capability set a host node type must supply for the engine to walk it.
pub trait JsonNode: Sized + Clone {
    /// The shape of this node.
    fn kind(&self) -> NodeKind;

    /// Bridges the node's value into the function system.
    fn to_value(&self) -> Value;

    /// Wraps a plain value as a node of the same host kind.
    fn create(&self, value: Value) -> Self;

    /// Depth-first rewrite. The callback runs for the root (with an empty
    /// path) and then for every property and element, parents before
    /// children; returning `None` prunes the node and its unvisited
    /// descendants. The result of the callback is what gets descended into,
    /// so value functions see their own output walked.
    fn transform<F>(&self, f: &mut F) -> Result<Self, SiftError>
    where
        F: FnMut(&mut NodeContext<'_, Self>, Self) -> Result<Option<Self>, SiftError>;
}
