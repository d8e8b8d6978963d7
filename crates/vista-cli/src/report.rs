//! The TOML report written after a replay.

use serde::Serialize;

use vista::VistaError;

/// Final state of a replayed page.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub(crate) finished_at_ms: u64,
    pub(crate) body_overflow: String,
    pub(crate) scroll_locked: bool,
    pub(crate) observing: bool,
    pub(crate) scripts_requested: Vec<String>,
    pub(crate) failures: Vec<String>,
    pub(crate) diagrams: Vec<DiagramReport>,
    pub(crate) events: Vec<EventReport>,
}

impl Report {
    pub fn finished_at_ms(&self) -> u64 {
        self.finished_at_ms
    }

    /// Inline `overflow` of the body at the end of the replay.
    pub fn body_overflow(&self) -> &str {
        &self.body_overflow
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn scripts_requested(&self) -> &[String] {
        &self.scripts_requested
    }

    /// Recorded enhancer failures, rendered as messages.
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Diagrams in the order the scenario inserted them.
    pub fn diagrams(&self) -> &[DiagramReport] {
        &self.diagrams
    }

    /// Returns the diagram inserted under `id`.
    pub fn diagram(&self, id: &str) -> Option<&DiagramReport> {
        self.diagrams.iter().find(|diagram| diagram.id == id)
    }

    pub fn events(&self) -> &[EventReport] {
        &self.events
    }

    /// Renders the report as a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`VistaError::Scenario`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, VistaError> {
        toml::to_string_pretty(self)
            .map_err(|e| VistaError::Scenario(format!("Failed to serialize report: {e}")))
    }
}

/// State of one diagram container.
#[derive(Debug, Clone, Serialize)]
pub struct DiagramReport {
    pub(crate) id: String,
    pub(crate) connected: bool,
    pub(crate) rendered: bool,
    pub(crate) initialized: bool,
    pub(crate) fullscreen: bool,
    pub(crate) buttons: usize,
    pub(crate) zoom_controls: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) zoom: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) pan: Option<[f32; 2]>,
}

impl DiagramReport {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the container was still in the document.
    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn rendered(&self) -> bool {
        self.rendered
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Number of fullscreen buttons inside the container.
    pub fn buttons(&self) -> usize {
        self.buttons
    }

    /// Number of zoom icons inside the container.
    pub fn zoom_controls(&self) -> usize {
        self.zoom_controls
    }

    /// Zoom relative to the initial framing, for enhanced diagrams.
    pub fn zoom(&self) -> Option<f32> {
        self.zoom
    }

    pub fn scale(&self) -> Option<f32> {
        self.scale
    }

    pub fn pan(&self) -> Option<[f32; 2]> {
        self.pan
    }
}

/// How the enhancer reacted to one scenario step.
#[derive(Debug, Clone, Serialize)]
pub struct EventReport {
    pub(crate) at_ms: u64,
    pub(crate) action: String,
    pub(crate) outcome: String,
}

impl EventReport {
    pub fn at_ms(&self) -> u64 {
        self.at_ms
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// `consumed`, `handled`, `ignored`, `applied` or `missing`.
    pub fn outcome(&self) -> &str {
        &self.outcome
    }
}
