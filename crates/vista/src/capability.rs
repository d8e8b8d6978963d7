//! Loading of, and waiting for, the viewport capability.
//!
//! The capability is requested once at startup without waiting for it
//! ([`CapabilityLoader::ensure_loaded`]). Each discovery pass that needs it
//! then runs a bounded [`CapabilityWait`]: one immediate check followed by at
//! most `max_attempts` re-checks spaced `poll_interval` apart. A wait that
//! runs out is reported once and never retries the load itself.

use std::time::Duration;

use log::{debug, info};

use crate::{config::CapabilityConfig, host::Host};

/// Issues the one script request for the viewport capability.
#[derive(Debug)]
pub(crate) struct CapabilityLoader {
    url: String,
    requested: bool,
}

impl CapabilityLoader {
    pub(crate) fn new(config: &CapabilityConfig) -> Self {
        Self {
            url: config.url().to_string(),
            requested: false,
        }
    }

    /// Requests the capability script unless it is already present or was
    /// already requested. Returns `true` if a request was issued.
    pub(crate) fn ensure_loaded<H: Host>(&mut self, host: &mut H) -> bool {
        if self.requested || host.capability_available() {
            debug!("Viewport capability already present or requested");
            return false;
        }

        info!(url = self.url.as_str(); "Requesting viewport capability");
        host.request_script(&self.url);
        self.requested = true;
        true
    }
}

/// Result of one availability check of a [`CapabilityWait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStep {
    /// The capability is available; the waiting work may proceed.
    Ready,
    /// Not yet available; check again after the given delay.
    Retry(Duration),
    /// The wait gave up after `attempts` checks spanning `waited`.
    TimedOut { attempts: u32, waited: Duration },
}

/// Bounded polling state for one piece of work waiting on the capability.
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// # use vista::{CapabilityWait, WaitStep};
/// let mut wait = CapabilityWait::new(2, Duration::from_millis(250));
///
/// assert_eq!(wait.check(false), WaitStep::Retry(Duration::from_millis(250)));
/// assert_eq!(wait.check(false), WaitStep::Retry(Duration::from_millis(250)));
/// assert_eq!(
///     wait.check(false),
///     WaitStep::TimedOut { attempts: 3, waited: Duration::from_millis(500) }
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CapabilityWait {
    retries: u32,
    max_attempts: u32,
    interval: Duration,
    finished: bool,
}

impl CapabilityWait {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            retries: 0,
            max_attempts,
            interval,
            finished: false,
        }
    }

    pub(crate) fn from_config(config: &CapabilityConfig) -> Self {
        Self::new(config.max_attempts(), config.poll_interval())
    }

    /// Records one availability check and decides what happens next.
    ///
    /// Once the wait reported [`WaitStep::Ready`] or
    /// [`WaitStep::TimedOut`] it is finished, and further checks repeat the
    /// final verdict without counting.
    pub fn check(&mut self, available: bool) -> WaitStep {
        if available {
            self.finished = true;
            return WaitStep::Ready;
        }

        if !self.finished && self.retries < self.max_attempts {
            self.retries += 1;
            return WaitStep::Retry(self.interval);
        }

        self.finished = true;
        WaitStep::TimedOut {
            attempts: self.retries + 1,
            waited: self.interval * self.retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        host::{ReadySignal, ReadyState},
        page::Page,
    };

    fn page() -> Page {
        Page::new(ReadySignal::ParseState(ReadyState::Complete))
    }

    #[test]
    fn test_ensure_loaded_requests_once() {
        let mut page = page();
        let mut loader = CapabilityLoader::new(&CapabilityConfig::default());

        assert!(loader.ensure_loaded(&mut page));
        assert!(!loader.ensure_loaded(&mut page));

        assert_eq!(page.scripts().requested().len(), 1);
        assert!(page.scripts().requested()[0].contains("svg-pan-zoom@3.6.1"));
    }

    #[test]
    fn test_ensure_loaded_skips_present_capability() {
        let mut page = page();
        page.set_capability_available(true);
        let mut loader = CapabilityLoader::new(&CapabilityConfig::default());

        assert!(!loader.ensure_loaded(&mut page));
        assert!(page.scripts().requested().is_empty());
    }

    #[test]
    fn test_wait_ready_immediately() {
        let mut wait = CapabilityWait::from_config(&CapabilityConfig::default());
        assert_eq!(wait.check(true), WaitStep::Ready);
        assert!(!matches!(wait.check(false), WaitStep::Retry(_)));
    }

    #[test]
    fn test_wait_times_out_after_default_budget() {
        let mut wait = CapabilityWait::from_config(&CapabilityConfig::default());

        let mut retries = 0;
        let verdict = loop {
            match wait.check(false) {
                WaitStep::Retry(interval) => {
                    assert_eq!(interval, Duration::from_millis(250));
                    retries += 1;
                }
                other => break other,
            }
        };

        assert_eq!(retries, 20);
        assert_eq!(
            verdict,
            WaitStep::TimedOut {
                attempts: 21,
                waited: Duration::from_millis(5000)
            }
        );
    }

    #[test]
    fn test_wait_succeeds_on_late_check() {
        let mut wait = CapabilityWait::new(3, Duration::from_millis(100));
        assert!(matches!(wait.check(false), WaitStep::Retry(_)));
        assert!(matches!(wait.check(false), WaitStep::Retry(_)));
        assert_eq!(wait.check(true), WaitStep::Ready);
    }

    #[test]
    fn test_timed_out_wait_stays_timed_out() {
        let mut wait = CapabilityWait::new(0, Duration::from_millis(100));
        let first = wait.check(false);
        let second = wait.check(false);

        assert_eq!(first, second);
        assert!(matches!(first, WaitStep::TimedOut { attempts: 1, .. }));
    }
}
