//! Watching the document for diagrams added after startup.
//!
//! Observation starts after a fixed delay so the page's own construction is
//! not mistaken for new content. Each mutation batch that adds a diagram
//! container (or an element holding one) re-arms a single debounce timer;
//! only the discovery pass of the last batch in a quiet window runs.

use std::time::Duration;

use log::debug;

use crate::{
    config::SelectorConfig,
    discovery,
    host::{Host, MutationRecord},
    scheduler::{Scheduler, TimerId},
};

#[derive(Debug, Default)]
pub(crate) struct MutationWatcher {
    observing: bool,
    pending: Option<TimerId>,
}

impl MutationWatcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_observing(&self) -> bool {
        self.observing
    }

    /// Attaches the document observer.
    pub(crate) fn start<H: Host>(&mut self, host: &mut H) {
        if !self.observing {
            host.observe_mutations();
            self.observing = true;
            debug!("Observing document for new diagrams");
        }
    }

    /// Returns `true` if any batch added a node that is or holds a diagram
    /// container still present in the document.
    pub(crate) fn batch_adds_diagram<H: Host>(
        host: &H,
        selectors: &SelectorConfig,
        records: &[MutationRecord],
    ) -> bool {
        records
            .iter()
            .flat_map(|record| record.added())
            .any(|&node| host.is_connected(node) && discovery::holds_diagram(host, selectors, node))
    }

    /// Returns `true` if any batch removed nodes.
    pub(crate) fn batch_removes(records: &[MutationRecord]) -> bool {
        records.iter().any(|record| !record.removed().is_empty())
    }

    /// Schedules `task` after `delay`, replacing a still pending one.
    pub(crate) fn arm<T>(&mut self, scheduler: &mut Scheduler<T>, delay: Duration, task: T) {
        let superseded = self
            .pending
            .take()
            .is_some_and(|previous| scheduler.cancel(previous));
        if superseded {
            debug!("Superseded pending discovery");
        }
        self.pending = Some(scheduler.schedule(delay, task));
    }

    /// Forgets the pending timer once it has fired.
    pub(crate) fn fired(&mut self, timer: TimerId) {
        if self.pending == Some(timer) {
            self.pending = None;
        }
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use vista_core::geometry::Size;

    use super::*;
    use crate::{
        host::{ReadySignal, ReadyState},
        page::Page,
        scheduler::Timestamp,
    };

    #[test]
    fn test_start_is_idempotent() {
        let mut page = Page::new(ReadySignal::ParseState(ReadyState::Complete));
        let mut watcher = MutationWatcher::new();

        watcher.start(&mut page);
        watcher.start(&mut page);

        assert!(watcher.is_observing());
        assert!(page.is_observing());
    }

    #[test]
    fn test_batch_detection() {
        let mut page = Page::new(ReadySignal::ParseState(ReadyState::Complete));
        page.observe_mutations();
        let body = page.body();
        let paragraph = page.add_element(body, "p", &[], Size::default());
        let section = page.create_element("section");
        page.add_element(section, "div", &["mermaid"], Size::default());
        page.append_child(body, section);
        let selectors = SelectorConfig::default();

        let records = page.take_mutations();
        assert!(MutationWatcher::batch_adds_diagram(&page, &selectors, &records));
        assert!(!MutationWatcher::batch_adds_diagram(&page, &selectors, &records[..1]));
        assert!(!MutationWatcher::batch_removes(&records));

        page.remove(paragraph);
        assert!(MutationWatcher::batch_removes(&page.take_mutations()));
    }

    #[test]
    fn test_arm_keeps_only_latest_timer() {
        let mut scheduler = Scheduler::new();
        let mut watcher = MutationWatcher::new();
        let delay = Duration::from_millis(1000);

        watcher.arm(&mut scheduler, delay, "first");
        scheduler.set_now(Timestamp::from_millis(400));
        watcher.arm(&mut scheduler, delay, "second");

        assert_eq!(scheduler.pending(), 1);
        assert!(scheduler.pop_due(Timestamp::from_millis(1000)).is_none());
        let (timer, task) = scheduler
            .pop_due(Timestamp::from_millis(1400))
            .expect("debounced task due");
        assert_eq!(task, "second");

        watcher.fired(timer);
        assert!(!watcher.has_pending());
    }
}
