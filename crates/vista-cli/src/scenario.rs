//! Page scenario files.
//!
//! A scenario describes a host page and a timeline of things that happen to
//! it: diagram containers appearing, the rendering engine producing images,
//! key presses, clicks, navigation. Steps refer to diagrams by a free-form
//! `id` chosen in the scenario; the id of an `insert_container` step names
//! the container for all later steps.
//!
//! ```toml
//! run_until_ms = 6000
//!
//! [page]
//! ready_signal = "parse_state"
//! ready_state = "complete"
//! capability = { preloaded = false, load_after_ms = 400 }
//!
//! [[step]]
//! at_ms = 0
//! action = "insert_container"
//! id = "flow"
//! width = 400.0
//! height = 300.0
//!
//! [[step]]
//! at_ms = 0
//! action = "render_image"
//! id = "flow"
//! width = 200.0
//! height = 100.0
//! ```

use serde::Deserialize;

use vista::{Shortcut, VistaError};

/// A parsed scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    page: PageSetup,

    /// Virtual time at which the replay stops.
    run_until_ms: u64,

    #[serde(default, rename = "step")]
    steps: Vec<Step>,
}

impl Scenario {
    /// Parses a scenario from TOML source.
    ///
    /// # Errors
    ///
    /// Returns [`VistaError::Parse`] with the byte span of the offending
    /// input, or [`VistaError::Scenario`] if a step lies after
    /// `run_until_ms`.
    pub fn from_toml(src: &str) -> Result<Self, VistaError> {
        let scenario: Scenario = toml::from_str(src)
            .map_err(|e| VistaError::new_parse_error(e.message(), e.span(), src))?;

        if let Some(late) = scenario
            .steps
            .iter()
            .find(|step| step.at_ms > scenario.run_until_ms)
        {
            return Err(VistaError::Scenario(format!(
                "step at {}ms lies after run_until_ms ({}ms)",
                late.at_ms, scenario.run_until_ms
            )));
        }

        Ok(scenario)
    }

    pub fn page(&self) -> &PageSetup {
        &self.page
    }

    pub fn run_until_ms(&self) -> u64 {
        self.run_until_ms
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// Initial state of the simulated page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageSetup {
    ready_signal: SignalKind,
    ready_state: StateKind,
    capability: CapabilitySetup,
    body_overflow: String,
    /// Size a container takes while it carries the fullscreen marker.
    fullscreen_width: f32,
    fullscreen_height: f32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            ready_signal: SignalKind::ParseState,
            ready_state: StateKind::Complete,
            capability: CapabilitySetup::default(),
            body_overflow: String::new(),
            fullscreen_width: 1280.0,
            fullscreen_height: 720.0,
        }
    }
}

impl PageSetup {
    pub fn ready_signal(&self) -> SignalKind {
        self.ready_signal
    }

    pub fn ready_state(&self) -> StateKind {
        self.ready_state
    }

    pub fn capability(&self) -> &CapabilitySetup {
        &self.capability
    }

    pub fn body_overflow(&self) -> &str {
        &self.body_overflow
    }

    pub fn fullscreen_size(&self) -> (f32, f32) {
        (self.fullscreen_width, self.fullscreen_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Navigation,
    ParseState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Loading,
    Interactive,
    Complete,
}

/// How the viewport capability script behaves.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapabilitySetup {
    /// The capability is already present when the enhancer starts.
    preloaded: bool,
    /// Time at which a requested script finishes loading; never when absent.
    load_after_ms: Option<u64>,
}

impl CapabilitySetup {
    pub fn preloaded(&self) -> bool {
        self.preloaded
    }

    pub fn load_after_ms(&self) -> Option<u64> {
        self.load_after_ms
    }
}

/// One timeline entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    at_ms: u64,
    #[serde(flatten)]
    action: Action,
}

impl Step {
    pub fn at_ms(&self) -> u64 {
        self.at_ms
    }

    pub fn action(&self) -> &Action {
        &self.action
    }
}

/// What happens at a step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// A diagram container appears, inside `parent` or the body.
    InsertContainer {
        id: String,
        width: f32,
        height: f32,
        #[serde(default)]
        parent: Option<String>,
    },
    /// The rendering engine produces the image of `id`.
    RenderImage { id: String, width: f32, height: f32 },
    /// The container `id` leaves the document.
    Remove { id: String },
    /// A key press while the image of `target` (or the document) has focus.
    Key {
        #[serde(default)]
        target: Option<String>,
        key: String,
    },
    /// A click on the image of `target`.
    Click { target: String },
    /// A click on the fullscreen button of `target`.
    ClickFullscreenButton { target: String },
    /// A click on one of the zoom icons of `target`.
    ClickZoomControl {
        target: String,
        control: ZoomControl,
    },
    /// A wheel gesture over the image of `target`.
    Wheel {
        target: String,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
        delta_y: f32,
    },
    /// A double click on the image of `target`.
    DoubleClick {
        target: String,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
    },
    /// A drag over the image of `target`.
    Drag { target: String, dx: f32, dy: f32 },
    /// The host displays a document (navigation hosts).
    Navigate,
    /// The host finished parsing the document.
    DomContentLoaded,
    /// The container `id` gets a new laid-out size.
    ResizeContainer { id: String, width: f32, height: f32 },
    /// Fullscreen is toggled programmatically for `target`.
    ToggleFullscreen { target: String },
}

/// The zoom icons a viewport shows when control icons are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomControl {
    ZoomIn,
    Reset,
    ZoomOut,
}

impl From<ZoomControl> for Shortcut {
    fn from(control: ZoomControl) -> Self {
        match control {
            ZoomControl::ZoomIn => Shortcut::ZoomIn,
            ZoomControl::Reset => Shortcut::Reset,
            ZoomControl::ZoomOut => Shortcut::ZoomOut,
        }
    }
}

impl Action {
    /// Short name used in the report.
    pub fn name(&self) -> &'static str {
        match self {
            Action::InsertContainer { .. } => "insert_container",
            Action::RenderImage { .. } => "render_image",
            Action::Remove { .. } => "remove",
            Action::Key { .. } => "key",
            Action::Click { .. } => "click",
            Action::ClickFullscreenButton { .. } => "click_fullscreen_button",
            Action::ClickZoomControl { .. } => "click_zoom_control",
            Action::Wheel { .. } => "wheel",
            Action::DoubleClick { .. } => "double_click",
            Action::Drag { .. } => "drag",
            Action::Navigate => "navigate",
            Action::DomContentLoaded => "dom_content_loaded",
            Action::ResizeContainer { .. } => "resize_container",
            Action::ToggleFullscreen { .. } => "toggle_fullscreen",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_scenario_uses_page_defaults() {
        let scenario = Scenario::from_toml("run_until_ms = 1000").expect("parses");

        assert_eq!(scenario.run_until_ms(), 1000);
        assert!(scenario.steps().is_empty());
        assert_eq!(scenario.page().ready_signal(), SignalKind::ParseState);
        assert_eq!(scenario.page().ready_state(), StateKind::Complete);
        assert!(!scenario.page().capability().preloaded());
        assert_eq!(scenario.page().capability().load_after_ms(), None);
    }

    #[test]
    fn test_steps_are_tagged_by_action() {
        let source = r#"
            run_until_ms = 3000

            [page]
            ready_signal = "navigation"
            capability = { preloaded = true }

            [[step]]
            at_ms = 0
            action = "insert_container"
            id = "flow"
            width = 400
            height = 300

            [[step]]
            at_ms = 1500
            action = "key"
            target = "flow"
            key = "+"

            [[step]]
            at_ms = 1600
            action = "navigate"
        "#;

        let scenario = Scenario::from_toml(source).expect("parses");

        assert_eq!(scenario.page().ready_signal(), SignalKind::Navigation);
        assert_eq!(scenario.steps().len(), 3);
        assert_eq!(
            scenario.steps()[0].action(),
            &Action::InsertContainer {
                id: "flow".to_string(),
                width: 400.0,
                height: 300.0,
                parent: None,
            }
        );
        assert_eq!(
            scenario.steps()[1].action(),
            &Action::Key {
                target: Some("flow".to_string()),
                key: "+".to_string(),
            }
        );
        assert_eq!(scenario.steps()[2].action().name(), "navigate");
    }

    #[test]
    fn test_unknown_action_is_a_parse_error() {
        let source = "run_until_ms = 10\n\n[[step]]\nat_ms = 0\naction = \"teleport\"\n";

        let err = Scenario::from_toml(source).expect_err("unknown action");

        assert!(matches!(err, VistaError::Parse { src, .. } if src == source));
    }

    #[test]
    fn test_wrong_field_type_reports_span() {
        let source = "run_until_ms = \"later\"\n";

        let err = Scenario::from_toml(source).expect_err("wrong type");

        match err {
            VistaError::Parse { span, .. } => assert!(span.is_some()),
            other => panic!("Expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_step_after_end_is_rejected() {
        let source = "run_until_ms = 10\n\n[[step]]\nat_ms = 20\naction = \"navigate\"\n";

        let err = Scenario::from_toml(source).expect_err("late step");

        assert!(matches!(err, VistaError::Scenario(_)));
    }
}
