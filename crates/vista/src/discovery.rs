//! Finding diagram containers and deciding which ones are ready.

use vista_core::identifier::NodeId;

use crate::{config::SelectorConfig, host::Host, registry::DiagramRegistry};

/// Readiness of one container within a discovery pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Candidate {
    /// The rendering engine has not produced an image yet.
    NotRendered,
    /// A viewport is already attached.
    AlreadyEnhanced,
    /// The container holds `image` and can be attached.
    Ready { image: NodeId },
}

/// Returns every diagram container currently in the document.
pub(crate) fn find_containers<H: Host>(host: &H, selectors: &SelectorConfig) -> Vec<NodeId> {
    host.elements_by_class(selectors.diagram_class())
}

/// Classifies `container`. The image check comes first so an unrendered
/// container is never considered enhanced.
pub(crate) fn classify<H: Host>(
    host: &H,
    registry: &DiagramRegistry,
    selectors: &SelectorConfig,
    container: NodeId,
) -> Candidate {
    let Some(image) = host.first_descendant_by_tag(container, selectors.image_tag()) else {
        return Candidate::NotRendered;
    };

    if registry.is_initialized(container) {
        Candidate::AlreadyEnhanced
    } else {
        Candidate::Ready { image }
    }
}

/// Returns `true` if `node` is a diagram container or contains one.
pub(crate) fn holds_diagram<H: Host>(host: &H, selectors: &SelectorConfig, node: NodeId) -> bool {
    host.has_class(node, selectors.diagram_class())
        || host
            .first_descendant_by_class(node, selectors.diagram_class())
            .is_some()
}

/// Counts of what one discovery pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Containers examined by the pass.
    pub found: usize,
    /// Containers enhanced by the pass.
    pub enhanced: usize,
    /// Containers skipped because their image is not rendered yet.
    pub not_rendered: usize,
    /// Containers skipped because they were already enhanced.
    pub already_enhanced: usize,
    /// Containers that left the document before the pass reached them.
    pub detached: usize,
    /// Containers whose viewport could not be constructed.
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use vista_core::{
        geometry::Size,
        viewport::{PanZoom, ViewportOptions},
    };

    use super::*;
    use crate::{
        controller::Attachment,
        host::{ReadySignal, ReadyState},
        page::Page,
    };

    fn page() -> Page {
        Page::new(ReadySignal::ParseState(ReadyState::Complete))
    }

    #[test]
    fn test_container_without_image_is_not_rendered() {
        let mut page = page();
        let body = page.body();
        let container = page.add_element(body, "div", &["mermaid"], Size::new(100.0, 100.0));
        let registry = DiagramRegistry::new();

        let candidate = classify(&page, &registry, &SelectorConfig::default(), container);

        assert_eq!(candidate, Candidate::NotRendered);
    }

    #[test]
    fn test_rendered_container_is_ready_until_enhanced() {
        let mut page = page();
        let body = page.body();
        let container = page.add_element(body, "div", &["mermaid"], Size::new(100.0, 100.0));
        let image = page.add_element(container, "svg", &[], Size::new(50.0, 50.0));
        let selectors = SelectorConfig::default();
        let mut registry = DiagramRegistry::new();

        assert_eq!(
            classify(&page, &registry, &selectors, container),
            Candidate::Ready { image }
        );

        let viewport = PanZoom::new(
            ViewportOptions::default(),
            Size::new(50.0, 50.0),
            Size::new(100.0, 100.0),
        )
        .expect("valid viewport");
        let attachment = Attachment {
            viewport,
            button: NodeId::new(99),
            controls: Vec::new(),
        };
        registry.attach(container, image, attachment);

        assert_eq!(
            classify(&page, &registry, &selectors, container),
            Candidate::AlreadyEnhanced
        );
    }

    #[test]
    fn test_holds_diagram_matches_self_and_descendants() {
        let mut page = page();
        let body = page.body();
        let article = page.add_element(body, "article", &[], Size::default());
        let wrapper = page.add_element(article, "div", &[], Size::default());
        let container = page.add_element(wrapper, "div", &["mermaid"], Size::default());
        let other = page.add_element(body, "p", &[], Size::default());
        let selectors = SelectorConfig::default();

        assert!(holds_diagram(&page, &selectors, container));
        assert!(holds_diagram(&page, &selectors, article));
        assert!(!holds_diagram(&page, &selectors, other));
    }
}
