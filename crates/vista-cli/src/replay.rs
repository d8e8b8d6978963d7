//! Replaying a [`Scenario`] through the enhancer.
//!
//! The page is an in-memory [`Page`]; every step first advances virtual time
//! to its `at_ms`, so timers due before the step run first. Steps that change
//! the document are followed by a mutation notification, the way a browser
//! delivers observer records after the script that caused them.

use indexmap::IndexMap;
use log::{debug, info, warn};

use vista::{
    Enhancer, EventOutcome, HostEvent, Shortcut, VistaError,
    config::AppConfig,
    geometry::{Point, Size},
    host::{Host, ReadySignal, ReadyState},
    identifier::NodeId,
    page::Page,
    scheduler::Timestamp,
};

use crate::{
    report::{DiagramReport, EventReport, Report},
    scenario::{Action, PageSetup, Scenario, SignalKind, StateKind},
};

/// A diagram inserted by the scenario.
#[derive(Debug, Clone, Copy)]
struct Inserted {
    container: NodeId,
    image: Option<NodeId>,
}

enum Entry<'a> {
    CapabilityLoaded,
    Action(&'a Action),
}

/// Runs `scenario` to its end and reports the final page state.
///
/// # Errors
///
/// Returns [`VistaError::Scenario`] if a step names an unknown diagram or
/// inserts a diagram id twice.
pub fn replay(scenario: &Scenario, config: AppConfig) -> Result<Report, VistaError> {
    let page = build_page(scenario.page(), &config);
    let mut replay = Replay {
        enhancer: Enhancer::new(page, config),
        diagrams: IndexMap::new(),
        events: Vec::new(),
    };

    info!(
        steps = scenario.steps().len(),
        run_until_ms = scenario.run_until_ms();
        "Replaying scenario"
    );
    replay.enhancer.start();

    let mut timeline = Vec::with_capacity(scenario.steps().len() + 1);
    let capability = scenario.page().capability();
    if let (false, Some(at_ms)) = (capability.preloaded(), capability.load_after_ms()) {
        timeline.push((at_ms.min(scenario.run_until_ms()), Entry::CapabilityLoaded));
    }
    timeline.extend(
        scenario
            .steps()
            .iter()
            .map(|step| (step.at_ms(), Entry::Action(step.action()))),
    );
    timeline.sort_by_key(|(at_ms, _)| *at_ms);

    for (at_ms, entry) in timeline {
        replay.enhancer.advance_to(Timestamp::from_millis(at_ms));
        match entry {
            Entry::CapabilityLoaded => replay.load_capability(),
            Entry::Action(action) => {
                let outcome = replay.apply(action)?;
                debug!(at_ms = at_ms, action = action.name(), outcome = outcome; "Step applied");
                replay.events.push(EventReport {
                    at_ms,
                    action: action.name().to_string(),
                    outcome: outcome.to_string(),
                });
            }
        }
    }

    replay
        .enhancer
        .advance_to(Timestamp::from_millis(scenario.run_until_ms()));

    Ok(replay.into_report())
}

fn build_page(setup: &PageSetup, config: &AppConfig) -> Page {
    let ready_state = match setup.ready_state() {
        StateKind::Loading => ReadyState::Loading,
        StateKind::Interactive => ReadyState::Interactive,
        StateKind::Complete => ReadyState::Complete,
    };
    let signal = match setup.ready_signal() {
        SignalKind::Navigation => ReadySignal::Navigation,
        SignalKind::ParseState => ReadySignal::ParseState(ready_state),
    };

    let mut page = Page::new(signal);
    page.set_capability_available(setup.capability().preloaded());
    if !setup.body_overflow().is_empty() {
        page.set_body_overflow(setup.body_overflow());
    }
    let (width, height) = setup.fullscreen_size();
    page.set_class_layout(
        config.selectors().fullscreen_class(),
        Size::new(width, height),
    );
    page
}

struct Replay {
    enhancer: Enhancer<Page>,
    diagrams: IndexMap<String, Inserted>,
    events: Vec<EventReport>,
}

impl Replay {
    fn load_capability(&mut self) {
        let page = self.enhancer.host_mut();
        if page.scripts().requested().is_empty() {
            warn!("Capability load scheduled but the script was never requested");
            return;
        }
        page.set_capability_available(true);
        info!("Viewport capability script loaded");
    }

    fn apply(&mut self, action: &Action) -> Result<&'static str, VistaError> {
        let outcome = match action {
            Action::InsertContainer {
                id,
                width,
                height,
                parent,
            } => {
                if self.diagrams.contains_key(id) {
                    return Err(VistaError::Scenario(format!("duplicate diagram id '{id}'")));
                }
                let parent = match parent {
                    Some(parent) => self.lookup(parent)?.container,
                    None => self.enhancer.host().body(),
                };
                let class = self.enhancer.config().selectors().diagram_class().to_string();
                let container = self.enhancer.host_mut().add_element(
                    parent,
                    "div",
                    &[class.as_str()],
                    Size::new(*width, *height),
                );
                self.diagrams.insert(
                    id.clone(),
                    Inserted {
                        container,
                        image: None,
                    },
                );
                self.notify_mutations()
            }
            Action::RenderImage { id, width, height } => {
                let container = self.lookup(id)?.container;
                let tag = self.enhancer.config().selectors().image_tag().to_string();
                let image = self.enhancer.host_mut().add_element(
                    container,
                    &tag,
                    &[],
                    Size::new(*width, *height),
                );
                if let Some(inserted) = self.diagrams.get_mut(id) {
                    inserted.image = Some(image);
                }
                self.notify_mutations()
            }
            Action::Remove { id } => {
                let container = self.lookup(id)?.container;
                self.enhancer.host_mut().remove(container);
                self.notify_mutations()
            }
            Action::Key { target, key } => {
                let target = match target {
                    Some(target) => Some(self.pointer_target(target)?),
                    None => None,
                };
                outcome_name(self.enhancer.dispatch(HostEvent::key(target, key.as_str())))
            }
            Action::Click { target } => {
                let target = self.pointer_target(target)?;
                outcome_name(self.enhancer.dispatch(HostEvent::Click { target }))
            }
            Action::ClickFullscreenButton { target } => {
                let container = self.lookup(target)?.container;
                match self.enhancer.diagram(container).and_then(|record| record.button()) {
                    Some(button) => {
                        outcome_name(self.enhancer.dispatch(HostEvent::Click { target: button }))
                    }
                    None => {
                        warn!(diagram = target.as_str(); "Diagram has no fullscreen button");
                        "missing"
                    }
                }
            }
            Action::ClickZoomControl { target, control } => {
                let container = self.lookup(target)?.container;
                let shortcut = Shortcut::from(*control);
                match self
                    .enhancer
                    .diagram(container)
                    .and_then(|record| record.zoom_control(shortcut))
                {
                    Some(icon) => {
                        outcome_name(self.enhancer.dispatch(HostEvent::Click { target: icon }))
                    }
                    None => {
                        warn!(diagram = target.as_str(), control:? = control; "Diagram has no such zoom control");
                        "missing"
                    }
                }
            }
            Action::Wheel {
                target,
                x,
                y,
                delta_y,
            } => {
                let target = self.pointer_target(target)?;
                outcome_name(self.enhancer.dispatch(HostEvent::Wheel {
                    target,
                    at: Point::new(*x, *y),
                    delta_y: *delta_y,
                }))
            }
            Action::DoubleClick { target, x, y } => {
                let target = self.pointer_target(target)?;
                outcome_name(self.enhancer.dispatch(HostEvent::DoubleClick {
                    target,
                    at: Point::new(*x, *y),
                }))
            }
            Action::Drag { target, dx, dy } => {
                let target = self.pointer_target(target)?;
                outcome_name(self.enhancer.dispatch(HostEvent::Drag {
                    target,
                    delta: Point::new(*dx, *dy),
                }))
            }
            Action::Navigate => outcome_name(self.enhancer.dispatch(HostEvent::Navigated)),
            Action::DomContentLoaded => {
                self.enhancer
                    .host_mut()
                    .set_ready_state(ReadyState::Interactive);
                outcome_name(self.enhancer.dispatch(HostEvent::DomContentLoaded))
            }
            Action::ResizeContainer { id, width, height } => {
                let container = self.lookup(id)?.container;
                self.enhancer
                    .host_mut()
                    .set_size(container, Size::new(*width, *height));
                "applied"
            }
            Action::ToggleFullscreen { target } => {
                let container = self.lookup(target)?.container;
                if self.enhancer.toggle_fullscreen(container) {
                    "handled"
                } else {
                    "ignored"
                }
            }
        };

        Ok(outcome)
    }

    fn lookup(&self, id: &str) -> Result<Inserted, VistaError> {
        self.diagrams
            .get(id)
            .copied()
            .ok_or_else(|| VistaError::Scenario(format!("unknown diagram id '{id}'")))
    }

    /// Pointer and key input lands on the rendered image, or on the container
    /// while nothing is rendered.
    fn pointer_target(&self, id: &str) -> Result<NodeId, VistaError> {
        let inserted = self.lookup(id)?;
        Ok(inserted.image.unwrap_or(inserted.container))
    }

    fn notify_mutations(&mut self) -> &'static str {
        outcome_name(self.enhancer.dispatch(HostEvent::Mutations))
    }

    fn into_report(self) -> Report {
        let enhancer = &self.enhancer;
        let page = enhancer.host();
        let selectors = enhancer.config().selectors();

        let diagrams = self
            .diagrams
            .iter()
            .map(|(id, inserted)| {
                let container = inserted.container;
                let viewport = enhancer.viewport(container);
                DiagramReport {
                    id: id.clone(),
                    connected: page.is_connected(container),
                    rendered: inserted.image.is_some(),
                    initialized: enhancer
                        .diagram(container)
                        .is_some_and(|record| record.is_initialized()),
                    fullscreen: page.has_class(container, selectors.fullscreen_class()),
                    buttons: page
                        .element(container)
                        .children()
                        .iter()
                        .filter(|&&child| page.has_class(child, selectors.button_class()))
                        .count(),
                    zoom_controls: page
                        .element(container)
                        .children()
                        .iter()
                        .filter(|&&child| page.has_class(child, selectors.zoom_control_class()))
                        .count(),
                    zoom: viewport.map(|viewport| viewport.zoom()),
                    scale: viewport.map(|viewport| viewport.scale()),
                    pan: viewport.map(|viewport| [viewport.pan().x(), viewport.pan().y()]),
                }
            })
            .collect();

        Report {
            finished_at_ms: enhancer.now().as_millis(),
            body_overflow: page.body_overflow(),
            scroll_locked: enhancer.is_scroll_locked(),
            observing: enhancer.is_observing(),
            scripts_requested: page.scripts().requested().to_vec(),
            failures: enhancer.failures().iter().map(ToString::to_string).collect(),
            diagrams,
            events: self.events,
        }
    }
}

fn outcome_name(outcome: EventOutcome) -> &'static str {
    match outcome {
        EventOutcome::Consumed => "consumed",
        EventOutcome::Handled => "handled",
        EventOutcome::Ignored => "ignored",
    }
}
