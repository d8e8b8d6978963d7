//! Stable identifiers for document nodes.
//!
//! A [`NodeId`] names one element of a host document for as long as the host
//! keeps the element alive. The enhancer uses it as the key of every
//! per-diagram record instead of storing marker state on the element itself.

use std::fmt;

/// Handle of one element in a host document.
///
/// Identifiers are allocated by the host and never reused while the host is
/// alive, so a detached element keeps its identifier and a newly created
/// element never collides with it.
///
/// # Examples
///
/// ```
/// use vista_core::identifier::NodeId;
///
/// let body = NodeId::new(0);
/// let diagram = NodeId::new(7);
///
/// assert_ne!(body, diagram);
/// assert_eq!(diagram.index(), 7);
/// assert_eq!(diagram.to_string(), "#7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a `NodeId` from a raw arena index.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw arena index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
