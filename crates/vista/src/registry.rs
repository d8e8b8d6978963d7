//! Per-diagram state keyed by container identity.
//!
//! The registry replaces a marker stored on each element: a container is
//! enhanced exactly when its [`DiagramRecord`] says so. Records whose
//! container has left the document are pruned so identities of removed
//! elements do not accumulate.

use indexmap::IndexMap;
use log::debug;

use vista_core::{identifier::NodeId, viewport::PanZoom};

use crate::{
    controller::{Attachment, Shortcut},
    host::Host,
};

/// State of one diagram container.
#[derive(Debug, Clone)]
pub struct DiagramRecord {
    container: NodeId,
    initialized: bool,
    image: Option<NodeId>,
    button: Option<NodeId>,
    controls: Vec<(NodeId, Shortcut)>,
    viewport: Option<PanZoom>,
}

impl DiagramRecord {
    fn new(container: NodeId) -> Self {
        Self {
            container,
            initialized: false,
            image: None,
            button: None,
            controls: Vec::new(),
            viewport: None,
        }
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Whether a viewport has been attached to this container.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The rendered image, once the rendering engine produced one.
    pub fn image(&self) -> Option<NodeId> {
        self.image
    }

    /// The injected fullscreen toggle button.
    pub fn button(&self) -> Option<NodeId> {
        self.button
    }

    /// The zoom icon that triggers `shortcut`, if icons were added.
    pub fn zoom_control(&self, shortcut: Shortcut) -> Option<NodeId> {
        self.controls
            .iter()
            .find(|&&(_, s)| s == shortcut)
            .map(|&(control, _)| control)
    }

    pub fn viewport(&self) -> Option<&PanZoom> {
        self.viewport.as_ref()
    }

    pub(crate) fn viewport_mut(&mut self) -> Option<&mut PanZoom> {
        self.viewport.as_mut()
    }
}

/// All diagram records seen so far, in discovery order.
#[derive(Debug, Default)]
pub struct DiagramRegistry {
    records: IndexMap<NodeId, DiagramRecord>,
}

impl DiagramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of known containers.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, container: NodeId) -> Option<&DiagramRecord> {
        self.records.get(&container)
    }

    pub(crate) fn get_mut(&mut self, container: NodeId) -> Option<&mut DiagramRecord> {
        self.records.get_mut(&container)
    }

    /// Returns the number of containers with an attached viewport.
    pub fn initialized_count(&self) -> usize {
        self.records.values().filter(|r| r.initialized).count()
    }

    /// Registers a container seen by discovery, returning its record.
    pub(crate) fn observe(&mut self, container: NodeId) -> &mut DiagramRecord {
        self.records
            .entry(container)
            .or_insert_with(|| DiagramRecord::new(container))
    }

    pub(crate) fn is_initialized(&self, container: NodeId) -> bool {
        self.records
            .get(&container)
            .is_some_and(|record| record.initialized)
    }

    /// Stores a successful attachment and marks the container initialized.
    pub(crate) fn attach(&mut self, container: NodeId, image: NodeId, attachment: Attachment) {
        let record = self.observe(container);
        record.initialized = true;
        record.image = Some(image);
        record.button = Some(attachment.button);
        record.controls = attachment.controls;
        record.viewport = Some(attachment.viewport);
    }

    /// Finds the enhanced container whose image is or contains `target`.
    pub(crate) fn container_for_image_target<H: Host>(
        &self,
        host: &H,
        target: NodeId,
    ) -> Option<NodeId> {
        self.records
            .values()
            .filter(|record| record.initialized)
            .find(|record| record.image.is_some_and(|image| host.contains(image, target)))
            .map(|record| record.container)
    }

    /// Finds the enhanced container that is or contains `target`.
    pub(crate) fn container_for_target<H: Host>(&self, host: &H, target: NodeId) -> Option<NodeId> {
        self.records
            .values()
            .filter(|record| record.initialized)
            .find(|record| host.contains(record.container, target))
            .map(|record| record.container)
    }

    /// Finds the container owning the fullscreen button `button`.
    pub(crate) fn container_for_button(&self, button: NodeId) -> Option<NodeId> {
        self.records
            .values()
            .find(|record| record.button == Some(button))
            .map(|record| record.container)
    }

    /// Finds the container and shortcut behind the zoom icon `control`.
    pub(crate) fn zoom_control_target(&self, control: NodeId) -> Option<(NodeId, Shortcut)> {
        self.records.values().find_map(|record| {
            record
                .controls
                .iter()
                .find(|&&(c, _)| c == control)
                .map(|&(_, shortcut)| (record.container, shortcut))
        })
    }

    /// Drops records whose container is no longer in the document.
    /// Returns the number of records removed.
    pub(crate) fn prune<H: Host>(&mut self, host: &H) -> usize {
        let before = self.records.len();
        self.records
            .retain(|&container, _| host.is_connected(container));
        let removed = before - self.records.len();
        if removed > 0 {
            debug!(removed = removed; "Pruned records of removed diagrams");
        }
        removed
    }
}
