//! Pan/zoom viewport over one rendered diagram.
//!
//! A [`PanZoom`] frames diagram content of a fixed intrinsic [`Size`] inside
//! a container. Its state is a uniform scale plus a pan offset: a content
//! point `p` is displayed at `pan + p * scale`.
//!
//! Zoom levels reported by [`PanZoom::zoom`] are relative to the initial
//! framing, so `1.0` always means "as first attached", whatever absolute
//! scale the fit computed. The configured zoom range is relative as well.
//!
//! # Example
//!
//! ```
//! # use vista_core::geometry::Size;
//! # use vista_core::viewport::{PanZoom, ViewportOptions};
//! let mut viewport = PanZoom::new(
//!     ViewportOptions::default(),
//!     Size::new(200.0, 100.0),
//!     Size::new(400.0, 400.0),
//! )
//! .expect("valid sizes");
//!
//! assert_eq!(viewport.zoom(), 1.0);
//! viewport.zoom_in();
//! assert!(viewport.zoom() > 1.0);
//!
//! viewport.fit();
//! viewport.center();
//! assert_eq!(viewport.scale(), 2.0);
//! ```

use log::{debug, trace};
use serde::Deserialize;
use thiserror::Error;

use crate::geometry::{Bounds, Point, Size};

/// Errors raised while constructing or resizing a viewport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewportError {
    #[error("diagram content has no usable size ({width}x{height})")]
    DegenerateContent { width: f32, height: f32 },

    #[error("container has no usable size ({width}x{height})")]
    DegenerateContainer { width: f32, height: f32 },

    #[error("invalid zoom range [{min}, {max}]")]
    InvalidZoomRange { min: f32, max: f32 },

    #[error("zoom sensitivity must be a positive number, got {0}")]
    InvalidSensitivity(f32),
}

/// Which element receives pointer input for the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerScope {
    /// Only events aimed at the rendered image (or its descendants) are handled.
    #[default]
    Image,
    /// Events anywhere inside the container are handled.
    Container,
}

/// Construction options for a [`PanZoom`].
///
/// The defaults are the settings used when enhancing documentation diagrams:
/// zoom and pan enabled, initial fit and center, a `[0.1, 10]` zoom range and
/// a zoom step of 30%.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewportOptions {
    zoom_enabled: bool,
    pan_enabled: bool,
    control_icons_enabled: bool,
    fit: bool,
    center: bool,
    min_zoom: f32,
    max_zoom: f32,
    zoom_scale_sensitivity: f32,
    dbl_click_zoom_enabled: bool,
    mouse_wheel_zoom_enabled: bool,
    prevent_mouse_events_default: bool,
    contain: bool,
    events_listener: ListenerScope,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            zoom_enabled: true,
            pan_enabled: true,
            control_icons_enabled: true,
            fit: true,
            center: true,
            min_zoom: 0.1,
            max_zoom: 10.0,
            zoom_scale_sensitivity: 0.3,
            dbl_click_zoom_enabled: true,
            mouse_wheel_zoom_enabled: true,
            prevent_mouse_events_default: true,
            contain: false,
            events_listener: ListenerScope::Image,
        }
    }
}

impl ViewportOptions {
    /// Returns a copy with the zoom range replaced.
    pub fn with_zoom_range(mut self, min_zoom: f32, max_zoom: f32) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    /// Returns a copy with the zoom step sensitivity replaced.
    pub fn with_zoom_scale_sensitivity(mut self, sensitivity: f32) -> Self {
        self.zoom_scale_sensitivity = sensitivity;
        self
    }

    /// Returns a copy with bounds containment switched on or off.
    pub fn with_contain(mut self, contain: bool) -> Self {
        self.contain = contain;
        self
    }

    /// Returns a copy with pointer-driven panning switched on or off.
    pub fn with_pan_enabled(mut self, pan_enabled: bool) -> Self {
        self.pan_enabled = pan_enabled;
        self
    }

    pub fn zoom_enabled(&self) -> bool {
        self.zoom_enabled
    }

    pub fn pan_enabled(&self) -> bool {
        self.pan_enabled
    }

    pub fn control_icons_enabled(&self) -> bool {
        self.control_icons_enabled
    }

    pub fn min_zoom(&self) -> f32 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    pub fn zoom_scale_sensitivity(&self) -> f32 {
        self.zoom_scale_sensitivity
    }

    pub fn dbl_click_zoom_enabled(&self) -> bool {
        self.dbl_click_zoom_enabled
    }

    pub fn mouse_wheel_zoom_enabled(&self) -> bool {
        self.mouse_wheel_zoom_enabled
    }

    /// Whether handled pointer events suppress the page's default behavior.
    pub fn prevent_mouse_events_default(&self) -> bool {
        self.prevent_mouse_events_default
    }

    pub fn contain(&self) -> bool {
        self.contain
    }

    pub fn events_listener(&self) -> ListenerScope {
        self.events_listener
    }

    /// Checks that the zoom range and sensitivity are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError::InvalidZoomRange`] or
    /// [`ViewportError::InvalidSensitivity`].
    pub fn validate(&self) -> Result<(), ViewportError> {
        let range_ok = self.min_zoom.is_finite()
            && self.max_zoom.is_finite()
            && self.min_zoom > 0.0
            && self.min_zoom <= self.max_zoom;
        if !range_ok {
            return Err(ViewportError::InvalidZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }

        if !(self.zoom_scale_sensitivity.is_finite() && self.zoom_scale_sensitivity > 0.0) {
            return Err(ViewportError::InvalidSensitivity(
                self.zoom_scale_sensitivity,
            ));
        }

        Ok(())
    }
}

/// Interactive pan/zoom state for one diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct PanZoom {
    options: ViewportOptions,
    content: Size,
    container: Size,
    scale: f32,
    pan: Point,
    initial_scale: f32,
}

impl PanZoom {
    /// Creates a viewport over `content` displayed inside `container`.
    ///
    /// When the options request it, the content is fitted to the container
    /// and centered; that framing becomes the 1× reference for
    /// [`zoom`](Self::zoom) and [`reset_zoom`](Self::reset_zoom).
    ///
    /// # Errors
    ///
    /// Returns a [`ViewportError`] if either size is not strictly positive
    /// or the options describe an unusable zoom configuration.
    pub fn new(
        options: ViewportOptions,
        content: Size,
        container: Size,
    ) -> Result<Self, ViewportError> {
        options.validate()?;

        if !content.is_positive() {
            return Err(ViewportError::DegenerateContent {
                width: content.width(),
                height: content.height(),
            });
        }
        check_container(container)?;

        let mut viewport = Self {
            options,
            content,
            container,
            scale: 1.0,
            pan: Point::default(),
            initial_scale: 1.0,
        };

        if viewport.options.fit {
            viewport.fit();
        }
        if viewport.options.center {
            viewport.center();
        }

        viewport.initial_scale = viewport.scale;

        debug!(
            scale = viewport.scale,
            container_width = container.width(),
            container_height = container.height();
            "Viewport created"
        );

        Ok(viewport)
    }

    /// Returns the options this viewport was built with.
    pub fn options(&self) -> &ViewportOptions {
        &self.options
    }

    /// Returns the zoom level relative to the initial framing.
    pub fn zoom(&self) -> f32 {
        self.scale / self.initial_scale
    }

    /// Returns the absolute content-to-screen scale.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Returns the current pan offset.
    pub fn pan(&self) -> Point {
        self.pan
    }

    /// Returns the container size the viewport currently frames into.
    pub fn container(&self) -> Size {
        self.container
    }

    /// Returns the on-screen box covered by the content.
    pub fn content_bounds(&self) -> Bounds {
        Bounds::new_from_top_left(self.pan, self.content.scale(self.scale))
    }

    /// Zooms by `factor` keeping the container point `focus` stationary.
    ///
    /// The resulting relative zoom is clamped to the configured range.
    /// Returns `true` if the scale changed.
    pub fn zoom_at(&mut self, focus: Point, factor: f32) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }

        let min_scale = self.initial_scale * self.options.min_zoom;
        let max_scale = self.initial_scale * self.options.max_zoom;
        let target = (self.scale * factor).clamp(min_scale, max_scale);
        if target == self.scale {
            return false;
        }

        let applied = target / self.scale;
        self.pan = focus.sub_point(focus.sub_point(self.pan).scale(applied));
        self.scale = target;
        self.apply_containment();

        trace!(scale = self.scale, zoom = self.zoom(); "Viewport zoomed");
        true
    }

    /// Zooms in one step around the container center.
    pub fn zoom_in(&mut self) -> bool {
        let step = self.step();
        self.zoom_at(self.container.center(), step)
    }

    /// Zooms out one step around the container center.
    pub fn zoom_out(&mut self) -> bool {
        let step = self.step();
        self.zoom_at(self.container.center(), 1.0 / step)
    }

    /// Restores the initial (1×) zoom level around the container center.
    pub fn reset_zoom(&mut self) {
        let focus = self.container.center();
        let applied = self.initial_scale / self.scale;
        self.pan = focus.sub_point(focus.sub_point(self.pan).scale(applied));
        self.scale = self.initial_scale;
        self.apply_containment();
    }

    /// Scales the content to fit the container, anchored at the top-left.
    pub fn fit(&mut self) {
        self.scale = self.container.fit_scale(self.content);
        self.pan = Point::default();
        self.apply_containment();
    }

    /// Moves the content so its center sits at the container center.
    pub fn center(&mut self) {
        let displayed = self.content.scale(self.scale);
        self.pan = Point::new(
            (self.container.width() - displayed.width()) / 2.0,
            (self.container.height() - displayed.height()) / 2.0,
        );
    }

    /// Translates the content by `delta`.
    pub fn pan_by(&mut self, delta: Point) {
        if !delta.is_finite() {
            return;
        }
        self.pan = self.pan.add_point(delta);
        self.apply_containment();
    }

    /// Records a new container size.
    ///
    /// The current scale and pan are kept; callers usually follow up with
    /// [`fit`](Self::fit) and [`center`](Self::center).
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError::DegenerateContainer`] if the size is not
    /// strictly positive; the previous size is kept in that case.
    pub fn resize(&mut self, container: Size) -> Result<(), ViewportError> {
        check_container(container)?;
        self.container = container;
        Ok(())
    }

    /// Handles a mouse-wheel gesture at `focus`.
    ///
    /// A negative `delta_y` (wheel away from the user) zooms in. Returns
    /// `true` if the gesture was handled by the viewport.
    pub fn handle_wheel(&mut self, focus: Point, delta_y: f32) -> bool {
        if !(self.options.zoom_enabled && self.options.mouse_wheel_zoom_enabled) {
            return false;
        }
        if delta_y == 0.0 || !delta_y.is_finite() {
            return false;
        }

        let step = self.step();
        let factor = if delta_y < 0.0 { step } else { 1.0 / step };
        self.zoom_at(focus, factor);
        true
    }

    /// Handles a double click at `focus`. Returns `true` if handled.
    pub fn handle_double_click(&mut self, focus: Point) -> bool {
        if !(self.options.zoom_enabled && self.options.dbl_click_zoom_enabled) {
            return false;
        }

        let step = self.step();
        self.zoom_at(focus, step);
        true
    }

    /// Handles a pointer drag by `delta`. Returns `true` if handled.
    pub fn handle_drag(&mut self, delta: Point) -> bool {
        if !self.options.pan_enabled {
            return false;
        }

        self.pan_by(delta);
        true
    }

    fn step(&self) -> f32 {
        1.0 + self.options.zoom_scale_sensitivity
    }

    /// Keeps the content inside the container when containment is on.
    ///
    /// Content larger than the container may move until its edge meets the
    /// container edge; smaller content stays fully visible.
    fn apply_containment(&mut self) {
        if !self.options.contain {
            return;
        }

        let displayed = self.content.scale(self.scale);
        let clamp_axis = |offset: f32, content: f32, container: f32| {
            let slack = container - content;
            if slack >= 0.0 {
                offset.clamp(0.0, slack)
            } else {
                offset.clamp(slack, 0.0)
            }
        };

        self.pan = Point::new(
            clamp_axis(self.pan.x(), displayed.width(), self.container.width()),
            clamp_axis(self.pan.y(), displayed.height(), self.container.height()),
        );
    }
}

fn check_container(container: Size) -> Result<(), ViewportError> {
    if container.is_positive() {
        Ok(())
    } else {
        Err(ViewportError::DegenerateContainer {
            width: container.width(),
            height: container.height(),
        })
    }
}
