//! Vista - pan, zoom and fullscreen for rendered diagrams.
//!
//! Finds diagram containers on a host page, waits until their images are
//! rendered and the viewport capability is loaded, then attaches an
//! interactive [`PanZoom`](viewport::PanZoom) viewport, a fullscreen toggle
//! and keyboard shortcuts to each of them. Diagrams added later are picked
//! up by watching the document.
//!
//! The crate performs no I/O of its own. The page is reached through the
//! [`host::Host`] trait and time only moves when the embedder calls
//! [`Enhancer::advance_to`]. [`page::Page`] is an in-memory host used for
//! replaying scenarios and in tests.

pub mod config;
pub mod host;
pub mod page;
pub mod scheduler;

mod capability;
mod controller;
mod discovery;
mod enhancer;
mod error;
mod fullscreen;
mod readiness;
mod registry;
mod watcher;

pub use vista_core::{geometry, identifier, viewport};

pub use capability::{CapabilityWait, WaitStep};
pub use controller::Shortcut;
pub use discovery::PassSummary;
pub use enhancer::{DiscoveryOutcome, Enhancer, EventOutcome, HostEvent};
pub use error::VistaError;
pub use registry::{DiagramRecord, DiagramRegistry};
