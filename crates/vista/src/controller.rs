//! Attaching a viewport to one diagram, and its keyboard shortcuts.
//!
//! Attachment builds the viewport first; only a successfully constructed
//! viewport leads to changes in the page, so a failed diagram is left
//! exactly as the rendering engine produced it. Every change stays inside
//! the one container and its descendants.

use log::debug;

use vista_core::{
    identifier::NodeId,
    viewport::{PanZoom, ViewportError},
};

use crate::{config::AppConfig, host::Host};

const BUTTON_LABEL: &str = "⛶";
const BUTTON_TITLE: &str = "Toggle fullscreen (F)";

/// On-screen zoom icons, in the order they are stacked.
const ZOOM_CONTROLS: [(Shortcut, &str, &str); 3] = [
    (Shortcut::ZoomIn, "Zoom in", "+"),
    (Shortcut::Reset, "Reset zoom", "↺"),
    (Shortcut::ZoomOut, "Zoom out", "−"),
];

/// Keyboard shortcuts bound on an enhanced diagram's image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// `r`: back to 1× and re-centered.
    Reset,
    /// `f`: fullscreen on or off.
    ToggleFullscreen,
    /// `+` or `=`: one zoom step in.
    ZoomIn,
    /// `-`: one zoom step out.
    ZoomOut,
    /// `0`: fit to the container and re-center.
    Fit,
}

impl Shortcut {
    /// Maps a key value to its shortcut, ignoring letter case.
    ///
    /// # Examples
    ///
    /// ```
    /// # use vista::Shortcut;
    /// assert_eq!(Shortcut::from_key("R"), Some(Shortcut::Reset));
    /// assert_eq!(Shortcut::from_key("="), Some(Shortcut::ZoomIn));
    /// assert_eq!(Shortcut::from_key("Escape"), None);
    /// ```
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_lowercase().as_str() {
            "r" => Some(Self::Reset),
            "f" => Some(Self::ToggleFullscreen),
            "+" | "=" => Some(Self::ZoomIn),
            "-" => Some(Self::ZoomOut),
            "0" => Some(Self::Fit),
            _ => None,
        }
    }

    /// Applies a viewport-only shortcut. Returns `false` for
    /// [`Shortcut::ToggleFullscreen`], which needs the fullscreen coordinator.
    pub(crate) fn apply(self, viewport: &mut PanZoom) -> bool {
        match self {
            Self::Reset => {
                viewport.reset_zoom();
                viewport.center();
            }
            Self::ZoomIn => {
                viewport.zoom_in();
            }
            Self::ZoomOut => {
                viewport.zoom_out();
            }
            Self::Fit => {
                viewport.fit();
                viewport.center();
            }
            Self::ToggleFullscreen => return false,
        }
        true
    }
}

/// What a successful attachment produced.
#[derive(Debug)]
pub(crate) struct Attachment {
    pub(crate) viewport: PanZoom,
    pub(crate) button: NodeId,
    /// Zoom icons and the shortcut each one triggers. Empty when the
    /// viewport options disable control icons.
    pub(crate) controls: Vec<(NodeId, Shortcut)>,
}

/// Attaches a viewport over `image` inside `container`.
///
/// # Errors
///
/// Returns the [`ViewportError`] raised by viewport construction; the page
/// is left untouched in that case.
pub(crate) fn attach<H: Host>(
    host: &mut H,
    config: &AppConfig,
    container: NodeId,
    image: NodeId,
) -> Result<Attachment, ViewportError> {
    let selectors = config.selectors();

    let viewport = PanZoom::new(
        config.viewport().clone(),
        host.intrinsic_size(image),
        host.client_size(container),
    )?;

    host.set_style(container, "position", "relative");
    host.set_style(container, "overflow", "visible");

    let button = match host.first_descendant_by_class(container, selectors.button_class()) {
        Some(existing) => {
            debug!(container:% = container; "Fullscreen button already present");
            existing
        }
        None => host.append_button(
            container,
            selectors.button_class(),
            BUTTON_TITLE,
            BUTTON_LABEL,
        ),
    };

    let controls = if config.viewport().control_icons_enabled() {
        ZOOM_CONTROLS
            .iter()
            .map(|&(shortcut, title, label)| {
                let control =
                    host.append_button(container, selectors.zoom_control_class(), title, label);
                (control, shortcut)
            })
            .collect()
    } else {
        Vec::new()
    };

    host.set_attribute(container, selectors.initialized_attribute(), "true");
    host.set_attribute(image, "tabindex", "0");

    Ok(Attachment {
        viewport,
        button,
        controls,
    })
}

#[cfg(test)]
mod tests {
    use vista_core::geometry::Size;

    use super::*;
    use crate::{
        host::{ReadySignal, ReadyState},
        page::Page,
    };

    fn page_with_diagram(image_size: Size) -> (Page, NodeId, NodeId) {
        let mut page = Page::new(ReadySignal::ParseState(ReadyState::Complete));
        let body = page.body();
        let container = page.add_element(body, "div", &["mermaid"], Size::new(400.0, 300.0));
        let image = page.add_element(container, "svg", &[], image_size);
        (page, container, image)
    }

    #[test]
    fn test_shortcut_keys() {
        assert_eq!(Shortcut::from_key("r"), Some(Shortcut::Reset));
        assert_eq!(Shortcut::from_key("F"), Some(Shortcut::ToggleFullscreen));
        assert_eq!(Shortcut::from_key("+"), Some(Shortcut::ZoomIn));
        assert_eq!(Shortcut::from_key("-"), Some(Shortcut::ZoomOut));
        assert_eq!(Shortcut::from_key("0"), Some(Shortcut::Fit));
        assert_eq!(Shortcut::from_key("x"), None);
        assert_eq!(Shortcut::from_key(""), None);
    }

    #[test]
    fn test_attach_prepares_container() {
        let (mut page, container, image) = page_with_diagram(Size::new(200.0, 100.0));
        let config = AppConfig::default();

        let attachment = attach(&mut page, &config, container, image).expect("attaches");

        let element = page.element(container);
        assert_eq!(element.style("position"), Some("relative"));
        assert_eq!(element.style("overflow"), Some("visible"));
        assert_eq!(element.attribute("data-pan-zoom-initialized"), Some("true"));
        assert_eq!(page.element(image).attribute("tabindex"), Some("0"));

        let button = page.element(attachment.button);
        assert!(button.has_class("mermaid-fullscreen-btn"));
        assert_eq!(button.attribute("title"), Some("Toggle fullscreen (F)"));
        assert_eq!(attachment.viewport.scale(), 2.0);

        let shortcuts: Vec<_> = attachment.controls.iter().map(|&(_, s)| s).collect();
        assert_eq!(
            shortcuts,
            [Shortcut::ZoomIn, Shortcut::Reset, Shortcut::ZoomOut]
        );
        for &(control, _) in &attachment.controls {
            assert!(page.element(control).has_class("svg-pan-zoom-control"));
        }
    }

    #[test]
    fn test_attach_without_control_icons() {
        let (mut page, container, image) = page_with_diagram(Size::new(200.0, 100.0));
        let config: AppConfig =
            toml::from_str("[viewport]\ncontrol_icons_enabled = false\n").expect("config parses");

        let attachment = attach(&mut page, &config, container, image).expect("attaches");

        assert!(attachment.controls.is_empty());
        assert!(
            page.first_descendant_by_class(container, "svg-pan-zoom-control")
                .is_none()
        );
    }

    #[test]
    fn test_attach_reuses_existing_button() {
        let (mut page, container, image) = page_with_diagram(Size::new(200.0, 100.0));
        let existing = page.add_element(
            container,
            "button",
            &["mermaid-fullscreen-btn"],
            Size::default(),
        );
        let config = AppConfig::default();

        let attachment = attach(&mut page, &config, container, image).expect("attaches");

        assert_eq!(attachment.button, existing);
        let buttons = page
            .element(container)
            .children()
            .iter()
            .filter(|&&child| page.element(child).has_class("mermaid-fullscreen-btn"))
            .count();
        assert_eq!(buttons, 1);
    }

    #[test]
    fn test_failed_attach_leaves_page_untouched() {
        let (mut page, container, image) = page_with_diagram(Size::new(0.0, 0.0));
        let config = AppConfig::default();

        let result = attach(&mut page, &config, container, image);

        assert!(matches!(result, Err(ViewportError::DegenerateContent { .. })));
        let element = page.element(container);
        assert_eq!(element.children(), &[image]);
        assert_eq!(element.style("position"), None);
        assert_eq!(element.attribute("data-pan-zoom-initialized"), None);
    }
}
