//! Deferral of startup until the host content is ready.
//!
//! A host offers exactly one readiness mechanism (see [`ReadySignal`]):
//!
//! - **Navigation**: the gate is subscribed to the navigation stream and
//!   fires on every navigation event, so client-side page transitions
//!   re-run initialization.
//! - **Parse state**: the gate fires once, immediately at startup if the
//!   document is already parsed, otherwise on the content-loaded event.
//!
//! Events that belong to the other mechanism are ignored.

use crate::host::ReadySignal;

/// Lifecycle notifications the gate reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadyTrigger {
    DomContentLoaded,
    Navigated,
}

#[derive(Debug)]
pub(crate) struct ReadinessGate {
    signal: ReadySignal,
    fired: bool,
}

impl ReadinessGate {
    pub(crate) fn new(signal: ReadySignal) -> Self {
        Self {
            signal,
            fired: false,
        }
    }

    /// Called once at startup. Returns `true` if the gate fires right away.
    pub(crate) fn on_start(&mut self) -> bool {
        match self.signal {
            ReadySignal::Navigation => false,
            ReadySignal::ParseState(state) if state.is_parsed() => {
                self.fired = true;
                true
            }
            ReadySignal::ParseState(_) => false,
        }
    }

    /// Returns `true` if `trigger` fires the gate.
    pub(crate) fn on_trigger(&mut self, trigger: ReadyTrigger) -> bool {
        match (self.signal, trigger) {
            (ReadySignal::Navigation, ReadyTrigger::Navigated) => {
                self.fired = true;
                true
            }
            (ReadySignal::ParseState(_), ReadyTrigger::DomContentLoaded) if !self.fired => {
                self.fired = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ReadyState;

    #[test]
    fn test_navigation_fires_on_every_event() {
        let mut gate = ReadinessGate::new(ReadySignal::Navigation);

        assert!(!gate.on_start());
        assert!(gate.on_trigger(ReadyTrigger::Navigated));
        assert!(gate.on_trigger(ReadyTrigger::Navigated));
        assert!(!gate.on_trigger(ReadyTrigger::DomContentLoaded));
    }

    #[test]
    fn test_parsed_document_fires_immediately_once() {
        let mut gate = ReadinessGate::new(ReadySignal::ParseState(ReadyState::Interactive));

        assert!(gate.on_start());
        assert!(!gate.on_trigger(ReadyTrigger::DomContentLoaded));
    }

    #[test]
    fn test_loading_document_waits_for_content_loaded() {
        let mut gate = ReadinessGate::new(ReadySignal::ParseState(ReadyState::Loading));

        assert!(!gate.on_start());
        assert!(!gate.on_trigger(ReadyTrigger::Navigated));
        assert!(gate.on_trigger(ReadyTrigger::DomContentLoaded));
        assert!(!gate.on_trigger(ReadyTrigger::DomContentLoaded));
    }
}
