//! Configuration types for the diagram enhancer.
//!
//! This module provides configuration structures that control which page
//! elements are enhanced, how long the enhancer waits at each step, where
//! the viewport capability is loaded from, and how viewports behave. All
//! types implement [`serde::Deserialize`] for loading from external sources,
//! and every field falls back to its default when omitted.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`SelectorConfig`] - Class and attribute names shared with the page styling.
//! - [`TimingConfig`] - Settle, retry, debounce and observer delays.
//! - [`CapabilityConfig`] - Script location and availability polling.
//! - [`FullscreenConfig`] - Fullscreen exclusivity policy.
//! - [`ViewportOptions`] - Pan/zoom behavior of each attached viewport.
//!
//! # Example
//!
//! ```
//! # use vista::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.selectors().diagram_class(), "mermaid");
//! assert_eq!(config.capability().max_attempts(), 20);
//! ```

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub use vista_core::viewport::ViewportOptions;

/// Top-level configuration for the enhancer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Selector configuration section.
    #[serde(default)]
    selectors: SelectorConfig,

    /// Timing configuration section.
    #[serde(default)]
    timing: TimingConfig,

    /// Capability loading section.
    #[serde(default)]
    capability: CapabilityConfig,

    /// Viewport behavior section.
    #[serde(default)]
    viewport: ViewportOptions,

    /// Fullscreen policy section.
    #[serde(default)]
    fullscreen: FullscreenConfig,
}

impl AppConfig {
    /// Returns the selector configuration.
    pub fn selectors(&self) -> &SelectorConfig {
        &self.selectors
    }

    /// Returns the timing configuration.
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Returns the capability configuration.
    pub fn capability(&self) -> &CapabilityConfig {
        &self.capability
    }

    /// Returns the options every viewport is constructed with.
    pub fn viewport(&self) -> &ViewportOptions {
        &self.viewport
    }

    /// Returns the fullscreen configuration.
    pub fn fullscreen(&self) -> &FullscreenConfig {
        &self.fullscreen
    }

    /// Returns a copy with the fullscreen section replaced.
    pub fn with_fullscreen(mut self, fullscreen: FullscreenConfig) -> Self {
        self.fullscreen = fullscreen;
        self
    }
}

/// Class and attribute names that couple the enhancer to the page markup
/// and stylesheet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    diagram_class: String,
    image_tag: String,
    fullscreen_class: String,
    button_class: String,
    zoom_control_class: String,
    initialized_attribute: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            diagram_class: "mermaid".to_string(),
            image_tag: "svg".to_string(),
            fullscreen_class: "mermaid-fullscreen".to_string(),
            button_class: "mermaid-fullscreen-btn".to_string(),
            zoom_control_class: "svg-pan-zoom-control".to_string(),
            initialized_attribute: "data-pan-zoom-initialized".to_string(),
        }
    }
}

impl SelectorConfig {
    /// Class carried by every diagram container.
    pub fn diagram_class(&self) -> &str {
        &self.diagram_class
    }

    /// Tag name of the rendered image inside a container.
    pub fn image_tag(&self) -> &str {
        &self.image_tag
    }

    /// Marker class of a container shown fullscreen.
    pub fn fullscreen_class(&self) -> &str {
        &self.fullscreen_class
    }

    /// Class of the injected fullscreen toggle button.
    pub fn button_class(&self) -> &str {
        &self.button_class
    }

    /// Class of the zoom icons added when control icons are enabled.
    pub fn zoom_control_class(&self) -> &str {
        &self.zoom_control_class
    }

    /// Attribute written on containers once enhanced.
    pub fn initialized_attribute(&self) -> &str {
        &self.initialized_attribute
    }
}

/// A timing section the enhancer cannot run with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimingError {
    #[error("timing.{field} must be greater than zero")]
    ZeroDelay { field: &'static str },
}

/// Fixed delays, all in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    ready_settle_ms: u64,
    empty_retry_ms: u64,
    fullscreen_settle_ms: u64,
    mutation_debounce_ms: u64,
    observer_start_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            ready_settle_ms: 1000,
            empty_retry_ms: 1000,
            fullscreen_settle_ms: 300,
            mutation_debounce_ms: 1000,
            observer_start_ms: 2000,
        }
    }
}

impl TimingConfig {
    /// Checks the delays that re-arm themselves.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::ZeroDelay`] when `empty_retry_ms` is zero. On a
    /// page without containers the retry would run again at the same instant,
    /// and virtual time would never move past it.
    pub fn validate(&self) -> Result<(), TimingError> {
        if self.empty_retry_ms == 0 {
            return Err(TimingError::ZeroDelay {
                field: "empty_retry_ms",
            });
        }
        Ok(())
    }

    /// Wait between the ready signal and the first discovery pass.
    pub fn ready_settle(&self) -> Duration {
        Duration::from_millis(self.ready_settle_ms)
    }

    /// Wait before re-running a discovery pass that found no containers.
    pub fn empty_retry(&self) -> Duration {
        Duration::from_millis(self.empty_retry_ms)
    }

    /// Wait between a fullscreen transition and the viewport refit.
    pub fn fullscreen_settle(&self) -> Duration {
        Duration::from_millis(self.fullscreen_settle_ms)
    }

    /// Quiet period required after new containers appear.
    pub fn mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.mutation_debounce_ms)
    }

    /// Wait between startup and the start of mutation observation.
    pub fn observer_start(&self) -> Duration {
        Duration::from_millis(self.observer_start_ms)
    }
}

/// Where the viewport capability comes from and how long to wait for it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    url: String,
    max_attempts: u32,
    poll_interval_ms: u64,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            url: "https://cdn.jsdelivr.net/npm/svg-pan-zoom@3.6.1/dist/svg-pan-zoom.min.js"
                .to_string(),
            max_attempts: 20,
            poll_interval_ms: 250,
        }
    }
}

impl CapabilityConfig {
    /// Versioned script location.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of re-checks after the first availability check.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Fullscreen policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FullscreenConfig {
    /// Exit the active fullscreen diagram before another one enters.
    exclusive: bool,
}

impl Default for FullscreenConfig {
    fn default() -> Self {
        Self { exclusive: false }
    }
}

impl FullscreenConfig {
    pub fn new(exclusive: bool) -> Self {
        Self { exclusive }
    }

    pub fn exclusive(&self) -> bool {
        self.exclusive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_delays() {
        let timing = TimingConfig::default();
        assert_eq!(timing.ready_settle(), Duration::from_millis(1000));
        assert_eq!(timing.empty_retry(), Duration::from_millis(1000));
        assert_eq!(timing.fullscreen_settle(), Duration::from_millis(300));
        assert_eq!(timing.mutation_debounce(), Duration::from_millis(1000));
        assert_eq!(timing.observer_start(), Duration::from_millis(2000));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").expect("empty config parses");

        assert_eq!(config.selectors().fullscreen_class(), "mermaid-fullscreen");
        assert_eq!(config.capability().poll_interval(), Duration::from_millis(250));
        assert!(!config.fullscreen().exclusive());
        assert_eq!(config.viewport(), &ViewportOptions::default());
        assert!(config.timing().validate().is_ok());
    }

    #[test]
    fn test_partial_sections_override_only_given_fields() {
        let source = r#"
            [selectors]
            diagram_class = "diagram"

            [timing]
            mutation_debounce_ms = 250

            [viewport]
            max_zoom = 4.0
            contain = true

            [fullscreen]
            exclusive = true
        "#;
        let config: AppConfig = toml::from_str(source).expect("config parses");

        assert_eq!(config.selectors().diagram_class(), "diagram");
        assert_eq!(config.selectors().image_tag(), "svg");
        assert_eq!(
            config.timing().mutation_debounce(),
            Duration::from_millis(250)
        );
        assert_eq!(config.timing().ready_settle(), Duration::from_millis(1000));
        assert_eq!(config.viewport().max_zoom(), 4.0);
        assert_eq!(config.viewport().min_zoom(), 0.1);
        assert!(config.viewport().contain());
        assert!(config.fullscreen().exclusive());
    }

    #[test]
    fn test_zero_empty_retry_is_rejected() {
        let config: AppConfig =
            toml::from_str("[timing]\nempty_retry_ms = 0\n").expect("config parses");

        assert_eq!(
            config.timing().validate(),
            Err(TimingError::ZeroDelay {
                field: "empty_retry_ms"
            })
        );
    }

    #[test]
    fn test_other_zero_delays_are_accepted() {
        let source = r#"
            [timing]
            ready_settle_ms = 0
            fullscreen_settle_ms = 0
            mutation_debounce_ms = 0
            observer_start_ms = 0
        "#;
        let config: AppConfig = toml::from_str(source).expect("config parses");

        assert!(config.timing().validate().is_ok());
    }

    #[test]
    fn test_unknown_listener_scope_is_rejected() {
        let source = r#"
            [viewport]
            events_listener = "window"
        "#;
        assert!(toml::from_str::<AppConfig>(source).is_err());
    }
}
