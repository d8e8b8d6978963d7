//! Error types for Vista operations.
//!
//! This module provides the main error type [`VistaError`]. Runtime failures
//! of the enhancer (capability never available, a diagram that could not be
//! attached) are logged and recorded rather than returned, so the page keeps
//! working with static diagrams; the remaining variants are produced by the
//! embedding tools while loading configuration and scenarios.

use std::{io, ops::Range};

use thiserror::Error;

use vista_core::{identifier::NodeId, viewport::ViewportError};

/// The main error type for Vista operations.
#[derive(Debug, Error)]
pub enum VistaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A source document (configuration or scenario) failed to parse.
    ///
    /// Carries the source text and, when known, the byte span of the
    /// offending input for rich reporting.
    #[error("{message}")]
    Parse {
        message: String,
        span: Option<Range<usize>>,
        src: String,
    },

    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("viewport capability unavailable after {attempts} checks ({waited_ms}ms)")]
    CapabilityUnavailable { attempts: u32, waited_ms: u64 },

    #[error("diagram {index} ({container}) could not be enhanced: {source}")]
    Attach {
        index: usize,
        container: NodeId,
        #[source]
        source: ViewportError,
    },
}

impl VistaError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(
        message: impl Into<String>,
        span: Option<Range<usize>>,
        src: impl Into<String>,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            span,
            src: src.into(),
        }
    }
}
