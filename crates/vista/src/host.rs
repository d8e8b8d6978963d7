//! The document and script environment the enhancer runs against.
//!
//! [`Host`] is the only way the enhancer observes or changes the page. It
//! mirrors the small slice of a browser document the enhancer needs: class
//! queries, class and style mutation, a button factory, focus, layout sizes,
//! the script environment, and a mutation log. [`crate::page::Page`] is the
//! in-memory implementation used by the CLI and the tests; an embedding in a
//! real browser binds the same operations to its DOM.

use vista_core::{geometry::Size, identifier::NodeId};

/// Parse state of the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// The document is still being parsed.
    Loading,
    /// Parsing finished; subresources may still be loading.
    Interactive,
    /// The document and its subresources are loaded.
    Complete,
}

impl ReadyState {
    /// Returns `true` once parsing has finished.
    pub fn is_parsed(self) -> bool {
        !matches!(self, ReadyState::Loading)
    }
}

/// How the host announces that its content is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadySignal {
    /// The host emits a navigation event for every displayed document,
    /// including the first one (single-page style navigation).
    Navigation,
    /// The host has a plain parse state and emits a one-shot
    /// content-loaded event when parsing ends.
    ParseState(ReadyState),
}

/// One batch of child-list changes observed in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationRecord {
    added: Vec<NodeId>,
    removed: Vec<NodeId>,
}

impl MutationRecord {
    /// Creates a record for a batch of added and removed nodes.
    pub fn new(added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self { added, removed }
    }

    /// Nodes inserted by this batch.
    pub fn added(&self) -> &[NodeId] {
        &self.added
    }

    /// Nodes detached by this batch.
    pub fn removed(&self) -> &[NodeId] {
        &self.removed
    }
}

/// Document and script environment consumed by the enhancer.
pub trait Host {
    /// Returns the readiness mechanism this host offers.
    fn ready_signal(&self) -> ReadySignal;

    /// Returns all connected elements carrying `class`, in document order.
    fn elements_by_class(&self, class: &str) -> Vec<NodeId>;

    /// Returns the first descendant of `node` with the given tag name.
    fn first_descendant_by_tag(&self, node: NodeId, tag: &str) -> Option<NodeId>;

    /// Returns the first descendant of `node` carrying `class`.
    fn first_descendant_by_class(&self, node: NodeId, class: &str) -> Option<NodeId>;

    /// Returns `true` while `node` is attached to the document.
    fn is_connected(&self, node: NodeId) -> bool;

    /// Returns `true` if `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn add_class(&mut self, node: NodeId, class: &str);

    fn remove_class(&mut self, node: NodeId, class: &str);

    /// Sets an inline style property on `node`.
    fn set_style(&mut self, node: NodeId, property: &str, value: &str);

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Returns the body's inline `overflow` value (empty when unset).
    fn body_overflow(&self) -> String;

    fn set_body_overflow(&mut self, value: &str);

    /// Appends a new button to `parent` and returns it.
    fn append_button(&mut self, parent: NodeId, class: &str, title: &str, label: &str) -> NodeId;

    /// Moves keyboard focus to `node`.
    fn focus(&mut self, node: NodeId);

    /// Returns the laid-out inner size of `node`.
    fn client_size(&self, node: NodeId) -> Size;

    /// Returns the intrinsic size of a rendered image.
    fn intrinsic_size(&self, image: NodeId) -> Size;

    /// Returns `true` once the viewport capability script has been evaluated.
    fn capability_available(&self) -> bool;

    /// Starts loading a script from `url` without waiting for it.
    fn request_script(&mut self, url: &str);

    /// Starts recording child-list mutations of the whole document.
    fn observe_mutations(&mut self);

    /// Drains the mutation batches recorded since the last call.
    fn take_mutations(&mut self) -> Vec<MutationRecord>;
}
