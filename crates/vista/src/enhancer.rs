//! The diagram-enhancement lifecycle.
//!
//! [`Enhancer`] owns every piece of enhancer state and drives it from two
//! inputs supplied by the embedding host: [`HostEvent`]s, delivered through
//! [`Enhancer::dispatch`], and the passage of time, delivered through
//! [`Enhancer::advance_to`]. Nothing runs in the background; all delayed
//! work sits in a [`Scheduler`] until the host advances past its deadline.
//!
//! Control flow:
//!
//! 1. [`Enhancer::start`] requests the viewport capability, subscribes to
//!    the readiness signal and schedules the start of mutation observation.
//! 2. When the readiness gate fires, the first discovery pass is scheduled
//!    after the ready settle delay.
//! 3. A pass that finds no containers retries on its own; otherwise it waits
//!    for the capability and attaches a viewport to every rendered,
//!    not yet enhanced container.
//! 4. Newly added containers trigger a debounced pass.
//!
//! Delayed callbacks re-check that their container is still in the document
//! before touching it.

use log::{debug, error, info, warn};

use indexmap::IndexMap;
use vista_core::{
    geometry::Point,
    identifier::NodeId,
    viewport::{ListenerScope, PanZoom},
};

use crate::{
    capability::{CapabilityLoader, CapabilityWait, WaitStep},
    config::AppConfig,
    controller::{self, Shortcut},
    discovery::{self, Candidate, PassSummary},
    error::VistaError,
    fullscreen::FullscreenCoordinator,
    host::Host,
    readiness::{ReadinessGate, ReadyTrigger},
    registry::{DiagramRecord, DiagramRegistry},
    scheduler::{Scheduler, TimerId, Timestamp},
    watcher::MutationWatcher,
};

/// Input delivered by the host page.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The document finished parsing (parse-state hosts).
    DomContentLoaded,
    /// A document was displayed (navigation hosts, including the first one).
    Navigated,
    /// A key was pressed while `target` had focus (`None`: the document).
    KeyDown { target: Option<NodeId>, key: String },
    /// A primary click on `target`.
    Click { target: NodeId },
    /// A double click on `target` at container coordinates `at`.
    DoubleClick { target: NodeId, at: Point },
    /// A wheel gesture over `target` at container coordinates `at`.
    Wheel {
        target: NodeId,
        at: Point,
        delta_y: f32,
    },
    /// A pointer drag starting on `target`.
    Drag { target: NodeId, delta: Point },
    /// The host recorded new mutation batches.
    Mutations,
}

impl HostEvent {
    /// Convenience constructor for a key press.
    pub fn key(target: Option<NodeId>, key: impl Into<String>) -> Self {
        Self::KeyDown {
            target,
            key: key.into(),
        }
    }
}

/// How the enhancer reacted to a [`HostEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Handled, and the host's default action must be suppressed.
    Consumed,
    /// Handled; the default action may proceed.
    Handled,
    /// Not relevant to any enhanced diagram.
    Ignored,
}

/// Result of one [`Enhancer::discover_and_enhance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// No container exists yet; a retry is scheduled.
    NoContainers,
    /// Containers were found but the capability is not available yet.
    AwaitingCapability { containers: usize },
    /// The pass ran to completion.
    Processed(PassSummary),
    /// The capability wait gave up without any re-check.
    CapabilityUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PassId(u64);

#[derive(Debug)]
enum Task {
    Initialize,
    RetryDiscovery,
    PollCapability(PassId),
    Refit(NodeId),
    StartObserver,
    DebouncedDiscovery,
}

/// A discovery pass waiting for the capability.
#[derive(Debug)]
struct PendingPass {
    containers: Vec<NodeId>,
    wait: CapabilityWait,
    timer: TimerId,
}

/// Attaches pan/zoom viewports to diagrams of a host page.
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// # use vista::{Enhancer, config::AppConfig, host::{ReadySignal, ReadyState}, page::Page};
/// # use vista_core::geometry::Size;
/// let mut page = Page::new(ReadySignal::ParseState(ReadyState::Complete));
/// page.set_capability_available(true);
/// let body = page.body();
/// let container = page.add_element(body, "div", &["mermaid"], Size::new(400.0, 300.0));
/// page.add_element(container, "svg", &[], Size::new(200.0, 100.0));
///
/// let mut enhancer = Enhancer::new(page, AppConfig::default());
/// enhancer.start();
/// enhancer.advance_by(Duration::from_millis(1000));
///
/// assert!(enhancer.viewport(container).is_some());
/// ```
#[derive(Debug)]
pub struct Enhancer<H: Host> {
    host: H,
    config: AppConfig,
    scheduler: Scheduler<Task>,
    gate: ReadinessGate,
    loader: CapabilityLoader,
    registry: DiagramRegistry,
    fullscreen: FullscreenCoordinator,
    watcher: MutationWatcher,
    passes: IndexMap<PassId, PendingPass>,
    next_pass: u64,
    retry: Option<TimerId>,
    failures: Vec<VistaError>,
    started: bool,
}

impl<H: Host> Enhancer<H> {
    /// Creates an enhancer for `host`. Nothing happens until [`start`](Self::start).
    pub fn new(host: H, config: AppConfig) -> Self {
        let gate = ReadinessGate::new(host.ready_signal());
        let loader = CapabilityLoader::new(config.capability());
        let fullscreen = FullscreenCoordinator::new(config.fullscreen().exclusive());

        Self {
            host,
            config,
            scheduler: Scheduler::new(),
            gate,
            loader,
            registry: DiagramRegistry::new(),
            fullscreen,
            watcher: MutationWatcher::new(),
            passes: IndexMap::new(),
            next_pass: 0,
            retry: None,
            failures: Vec::new(),
            started: false,
        }
    }

    /// Starts the lifecycle. Calling it again has no effect.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!("Diagram enhancer loaded");

        self.loader.ensure_loaded(&mut self.host);
        if self.gate.on_start() {
            self.schedule_initialize();
        }
        self.scheduler
            .schedule(self.config.timing().observer_start(), Task::StartObserver);
    }

    /// Delivers one host event.
    pub fn dispatch(&mut self, event: HostEvent) -> EventOutcome {
        match event {
            HostEvent::DomContentLoaded => self.ready(ReadyTrigger::DomContentLoaded),
            HostEvent::Navigated => self.ready(ReadyTrigger::Navigated),
            HostEvent::KeyDown { target, key } => self.key_down(target, &key),
            HostEvent::Click { target } => self.click(target),
            HostEvent::DoubleClick { target, at } => {
                self.pointer(target, |viewport| viewport.handle_double_click(at))
            }
            HostEvent::Wheel {
                target,
                at,
                delta_y,
            } => self.pointer(target, |viewport| viewport.handle_wheel(at, delta_y)),
            HostEvent::Drag { target, delta } => {
                self.pointer(target, |viewport| viewport.handle_drag(delta))
            }
            HostEvent::Mutations => self.mutations(),
        }
    }

    /// Runs every task due at or before `at`, then moves the clock to `at`.
    pub fn advance_to(&mut self, at: Timestamp) {
        while let Some((timer, task)) = self.scheduler.pop_due(at) {
            self.run(timer, task);
        }
        self.scheduler.set_now(at);
    }

    /// Advances the clock by `delay`.
    pub fn advance_by(&mut self, delay: std::time::Duration) {
        let at = self.now().after(delay);
        self.advance_to(at);
    }

    /// Runs one discovery pass now.
    ///
    /// Containers without a rendered image and containers already enhanced
    /// are skipped; the rest get a viewport once the capability is
    /// available.
    pub fn discover_and_enhance(&mut self) -> DiscoveryOutcome {
        self.registry.prune(&self.host);

        let containers = discovery::find_containers(&self.host, self.config.selectors());
        info!(count = containers.len(); "Found diagram containers");

        if containers.is_empty() {
            let delay = self.config.timing().empty_retry();
            if delay.is_zero() {
                warn!("Empty-page retry delay is zero, not rescheduling discovery");
            } else if self.retry.is_none() {
                let timer = self.scheduler.schedule(delay, Task::RetryDiscovery);
                self.retry = Some(timer);
            }
            return DiscoveryOutcome::NoContainers;
        }

        for &container in &containers {
            self.registry.observe(container);
        }

        let mut wait = CapabilityWait::from_config(self.config.capability());
        match wait.check(self.host.capability_available()) {
            WaitStep::Ready => DiscoveryOutcome::Processed(self.process(&containers)),
            WaitStep::Retry(delay) => {
                let pass = PassId(self.next_pass);
                self.next_pass += 1;
                let timer = self.scheduler.schedule(delay, Task::PollCapability(pass));
                let count = containers.len();
                self.passes.insert(
                    pass,
                    PendingPass {
                        containers,
                        wait,
                        timer,
                    },
                );
                debug!(containers = count; "Waiting for viewport capability");
                DiscoveryOutcome::AwaitingCapability { containers: count }
            }
            WaitStep::TimedOut { attempts, waited } => {
                self.capability_timed_out(attempts, waited);
                DiscoveryOutcome::CapabilityUnavailable
            }
        }
    }

    /// Enters or leaves fullscreen for `container`. Returns `false` if the
    /// container is no longer in the document.
    pub fn toggle_fullscreen(&mut self, container: NodeId) -> bool {
        if !self.host.is_connected(container) {
            return false;
        }

        let changed = self
            .fullscreen
            .toggle(&mut self.host, self.config.selectors(), container);
        self.schedule_refits(changed);
        true
    }

    /// Leaves fullscreen on every container. Returns how many were cleared.
    pub fn exit_fullscreen(&mut self) -> usize {
        let cleared = self
            .fullscreen
            .exit_all(&mut self.host, self.config.selectors());
        let count = cleared.len();
        self.schedule_refits(cleared);
        count
    }

    /// Cancels every capability wait still in flight. Returns how many were
    /// cancelled; their passes never run.
    pub fn cancel_capability_waits(&mut self) -> usize {
        let passes = std::mem::take(&mut self.passes);
        for pending in passes.values() {
            self.scheduler.cancel(pending.timer);
        }
        passes.len()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host, e.g. to change the simulated document.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current virtual time.
    pub fn now(&self) -> Timestamp {
        self.scheduler.now()
    }

    /// When the next scheduled task is due.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.scheduler.next_deadline()
    }

    /// Number of scheduled tasks.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    /// Number of discovery passes waiting for the capability.
    pub fn pending_capability_waits(&self) -> usize {
        self.passes.len()
    }

    pub fn registry(&self) -> &DiagramRegistry {
        &self.registry
    }

    pub fn diagram(&self, container: NodeId) -> Option<&DiagramRecord> {
        self.registry.get(container)
    }

    /// Returns the viewport attached to `container`.
    pub fn viewport(&self, container: NodeId) -> Option<&PanZoom> {
        self.registry.get(container).and_then(DiagramRecord::viewport)
    }

    /// Failures recorded so far (capability timeouts, attach failures).
    pub fn failures(&self) -> &[VistaError] {
        &self.failures
    }

    /// Returns whether document observation has started.
    pub fn is_observing(&self) -> bool {
        self.watcher.is_observing()
    }

    /// Returns whether a debounced discovery pass is waiting to run.
    pub fn is_discovery_pending(&self) -> bool {
        self.watcher.has_pending()
    }

    /// Returns whether page scroll is suppressed for fullscreen.
    pub fn is_scroll_locked(&self) -> bool {
        self.fullscreen.is_scroll_locked()
    }

    fn schedule_initialize(&mut self) {
        info!("Page ready, waiting for diagrams");
        self.scheduler
            .schedule(self.config.timing().ready_settle(), Task::Initialize);
    }

    fn ready(&mut self, trigger: ReadyTrigger) -> EventOutcome {
        if self.started && self.gate.on_trigger(trigger) {
            self.schedule_initialize();
            EventOutcome::Handled
        } else {
            EventOutcome::Ignored
        }
    }

    fn run(&mut self, timer: TimerId, task: Task) {
        match task {
            Task::Initialize => {
                info!("Starting diagram initialization");
                self.discover_and_enhance();
            }
            Task::RetryDiscovery => {
                self.retry = None;
                self.discover_and_enhance();
            }
            Task::PollCapability(pass) => self.poll_capability(pass),
            Task::Refit(container) => self.refit(container),
            Task::StartObserver => self.watcher.start(&mut self.host),
            Task::DebouncedDiscovery => {
                self.watcher.fired(timer);
                info!("New diagram content detected, reinitializing");
                self.discover_and_enhance();
            }
        }
    }

    fn poll_capability(&mut self, pass: PassId) {
        let Some(mut pending) = self.passes.shift_remove(&pass) else {
            return;
        };

        match pending.wait.check(self.host.capability_available()) {
            WaitStep::Ready => {
                self.process(&pending.containers);
            }
            WaitStep::Retry(delay) => {
                pending.timer = self.scheduler.schedule(delay, Task::PollCapability(pass));
                self.passes.insert(pass, pending);
            }
            WaitStep::TimedOut { attempts, waited } => {
                self.capability_timed_out(attempts, waited);
            }
        }
    }

    fn capability_timed_out(&mut self, attempts: u32, waited: std::time::Duration) {
        let waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX);
        error!(attempts = attempts, waited_ms = waited_ms; "Viewport capability failed to load");
        self.failures.push(VistaError::CapabilityUnavailable {
            attempts,
            waited_ms,
        });
    }

    fn process(&mut self, containers: &[NodeId]) -> PassSummary {
        debug!("Viewport capability available");
        let mut summary = PassSummary {
            found: containers.len(),
            ..PassSummary::default()
        };

        for (position, &container) in containers.iter().enumerate() {
            let index = position + 1;

            if !self.host.is_connected(container) {
                debug!(diagram = index; "Diagram left the page before enhancement");
                summary.detached += 1;
                continue;
            }

            let candidate =
                discovery::classify(&self.host, &self.registry, self.config.selectors(), container);
            match candidate {
                Candidate::NotRendered => {
                    info!(diagram = index; "No rendered image inside container yet");
                    summary.not_rendered += 1;
                }
                Candidate::AlreadyEnhanced => {
                    debug!(diagram = index; "Already initialized");
                    summary.already_enhanced += 1;
                }
                Candidate::Ready { image } => {
                    match controller::attach(&mut self.host, &self.config, container, image) {
                        Ok(attachment) => {
                            self.registry.attach(container, image, attachment);
                            info!(diagram = index; "Pan-zoom initialized");
                            summary.enhanced += 1;
                        }
                        Err(source) => {
                            error!(diagram = index, error:% = source; "Initialization failed");
                            self.failures.push(VistaError::Attach {
                                index,
                                container,
                                source,
                            });
                            summary.failed += 1;
                        }
                    }
                }
            }
        }

        info!("Pan-zoom controls: drag to pan, scroll to zoom, R to reset, F for fullscreen");
        summary
    }

    fn key_down(&mut self, target: Option<NodeId>, key: &str) -> EventOutcome {
        let mut outcome = EventOutcome::Ignored;

        let container =
            target.and_then(|target| self.registry.container_for_image_target(&self.host, target));
        if let (Some(container), Some(shortcut)) = (container, Shortcut::from_key(key)) {
            debug!(container:% = container, shortcut:? = shortcut; "Shortcut");
            self.apply_shortcut(container, shortcut);
            outcome = EventOutcome::Consumed;
        }

        if key == "Escape" && self.exit_fullscreen() > 0 && outcome == EventOutcome::Ignored {
            outcome = EventOutcome::Handled;
        }

        outcome
    }

    fn apply_shortcut(&mut self, container: NodeId, shortcut: Shortcut) {
        if shortcut == Shortcut::ToggleFullscreen {
            self.toggle_fullscreen(container);
            return;
        }

        if let Some(viewport) = self
            .registry
            .get_mut(container)
            .and_then(DiagramRecord::viewport_mut)
        {
            shortcut.apply(viewport);
        }
    }

    fn click(&mut self, target: NodeId) -> EventOutcome {
        if let Some(container) = self.registry.container_for_button(target) {
            self.toggle_fullscreen(container);
            return EventOutcome::Handled;
        }

        if let Some((container, shortcut)) = self.registry.zoom_control_target(target) {
            debug!(container:% = container, shortcut:? = shortcut; "Zoom control clicked");
            self.apply_shortcut(container, shortcut);
            return EventOutcome::Handled;
        }

        let image = self
            .registry
            .container_for_image_target(&self.host, target)
            .and_then(|container| self.registry.get(container))
            .and_then(DiagramRecord::image);
        match image {
            Some(image) => {
                self.host.focus(image);
                EventOutcome::Handled
            }
            None => EventOutcome::Ignored,
        }
    }

    fn pointer<F>(&mut self, target: NodeId, gesture: F) -> EventOutcome
    where
        F: FnOnce(&mut PanZoom) -> bool,
    {
        let container = match self.config.viewport().events_listener() {
            ListenerScope::Image => self.registry.container_for_image_target(&self.host, target),
            ListenerScope::Container => self.registry.container_for_target(&self.host, target),
        };
        let Some(viewport) = container
            .and_then(|container| self.registry.get_mut(container))
            .and_then(DiagramRecord::viewport_mut)
        else {
            return EventOutcome::Ignored;
        };

        if !gesture(viewport) {
            EventOutcome::Ignored
        } else if self.config.viewport().prevent_mouse_events_default() {
            EventOutcome::Consumed
        } else {
            EventOutcome::Handled
        }
    }

    fn mutations(&mut self) -> EventOutcome {
        let records = self.host.take_mutations();
        if records.is_empty() || !self.watcher.is_observing() {
            return EventOutcome::Ignored;
        }

        if MutationWatcher::batch_removes(&records) {
            self.registry.prune(&self.host);
            self.fullscreen
                .release_if_idle(&mut self.host, self.config.selectors());
        }

        if MutationWatcher::batch_adds_diagram(&self.host, self.config.selectors(), &records) {
            debug!("Diagram container added, scheduling discovery");
            self.watcher.arm(
                &mut self.scheduler,
                self.config.timing().mutation_debounce(),
                Task::DebouncedDiscovery,
            );
            return EventOutcome::Handled;
        }

        EventOutcome::Ignored
    }

    fn schedule_refits(&mut self, containers: Vec<NodeId>) {
        let delay = self.config.timing().fullscreen_settle();
        for container in containers {
            if self.viewport(container).is_some() {
                self.scheduler.schedule(delay, Task::Refit(container));
            }
        }
    }

    fn refit(&mut self, container: NodeId) {
        if !self.host.is_connected(container) {
            debug!(container:% = container; "Refit target left the page");
            return;
        }

        let size = self.host.client_size(container);
        let Some(viewport) = self
            .registry
            .get_mut(container)
            .and_then(DiagramRecord::viewport_mut)
        else {
            return;
        };

        if let Err(err) = viewport.resize(size) {
            warn!(container:% = container, error:% = err; "Skipping refit");
            return;
        }
        viewport.fit();
        viewport.center();
    }
}
