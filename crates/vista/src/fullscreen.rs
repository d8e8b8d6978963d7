//! Fullscreen state shared by all diagrams.
//!
//! A container is fullscreen while it carries the fullscreen marker class.
//! While any container is fullscreen the page body does not scroll. The body
//! overflow value found when the first container entered is remembered and
//! written back once, when the last one leaves.
//!
//! Every transition returns the containers whose size changed so the caller
//! can schedule the resize/fit/center refit of their viewports.

use log::{debug, info};

use vista_core::identifier::NodeId;

use crate::{config::SelectorConfig, host::Host};

#[derive(Debug)]
pub(crate) struct FullscreenCoordinator {
    exclusive: bool,
    saved_overflow: Option<String>,
}

impl FullscreenCoordinator {
    pub(crate) fn new(exclusive: bool) -> Self {
        Self {
            exclusive,
            saved_overflow: None,
        }
    }

    /// Returns `true` while the body scroll is suppressed.
    pub(crate) fn is_scroll_locked(&self) -> bool {
        self.saved_overflow.is_some()
    }

    /// Enters or leaves fullscreen for `container`.
    pub(crate) fn toggle<H: Host>(
        &mut self,
        host: &mut H,
        selectors: &SelectorConfig,
        container: NodeId,
    ) -> Vec<NodeId> {
        let marker = selectors.fullscreen_class();

        if host.has_class(container, marker) {
            host.remove_class(container, marker);
            info!(container:% = container; "Exited fullscreen");
            if host.elements_by_class(marker).is_empty() {
                self.unlock_scroll(host);
            }
            return vec![container];
        }

        let mut changed = Vec::new();
        if self.exclusive {
            for other in host.elements_by_class(marker) {
                host.remove_class(other, marker);
                debug!(container:% = other; "Left fullscreen for another diagram");
                changed.push(other);
            }
        }

        host.add_class(container, marker);
        self.lock_scroll(host);
        info!(container:% = container; "Entered fullscreen");
        changed.push(container);
        changed
    }

    /// Clears the marker from every fullscreen container and restores the
    /// body scroll once.
    pub(crate) fn exit_all<H: Host>(&mut self, host: &mut H, selectors: &SelectorConfig) -> Vec<NodeId> {
        let marker = selectors.fullscreen_class();
        let active = host.elements_by_class(marker);
        if active.is_empty() {
            return active;
        }

        for &container in &active {
            host.remove_class(container, marker);
        }
        self.unlock_scroll(host);

        info!(count = active.len(); "Exited fullscreen on escape");
        active
    }

    /// Restores the body scroll if no connected container is fullscreen any
    /// more, e.g. after the fullscreen diagram was removed from the page.
    pub(crate) fn release_if_idle<H: Host>(&mut self, host: &mut H, selectors: &SelectorConfig) {
        if self.is_scroll_locked() && host.elements_by_class(selectors.fullscreen_class()).is_empty() {
            debug!("Fullscreen container left the page");
            self.unlock_scroll(host);
        }
    }

    fn lock_scroll<H: Host>(&mut self, host: &mut H) {
        if self.saved_overflow.is_none() {
            self.saved_overflow = Some(host.body_overflow());
            host.set_body_overflow("hidden");
        }
    }

    fn unlock_scroll<H: Host>(&mut self, host: &mut H) {
        let original = self.saved_overflow.take().unwrap_or_default();
        host.set_body_overflow(&original);
    }
}
