//! In-memory page used as a [`Host`].
//!
//! [`Page`] is a small arena document: every node is an element with a tag,
//! classes, attributes, inline style, a laid-out size and an ordered child
//! list. Detached elements stay in the arena so stale handles never alias a
//! different element. A simulated stylesheet maps classes to sizes, which is
//! how a fullscreen marker class makes a container fill the window.
//!
//! The page also simulates the script environment (load requests and
//! whether the viewport capability has been evaluated) and records
//! child-list mutations once an observer is attached.
//!
//! # Example
//!
//! ```
//! # use vista::{host::{Host, ReadySignal, ReadyState}, page::Page};
//! # use vista_core::geometry::Size;
//! let mut page = Page::new(ReadySignal::ParseState(ReadyState::Complete));
//! let body = page.body();
//! let container = page.add_element(body, "div", &["mermaid"], Size::new(600.0, 400.0));
//!
//! assert_eq!(page.elements_by_class("mermaid"), vec![container]);
//! assert!(page.first_descendant_by_tag(container, "svg").is_none());
//! ```

use indexmap::IndexMap;
use log::trace;

use vista_core::{geometry::Size, identifier::NodeId};

use crate::host::{Host, MutationRecord, ReadySignal, ReadyState};

/// One element of a [`Page`].
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
    attributes: IndexMap<String, String>,
    style: IndexMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    size: Size,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns an inline style property, if set.
    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn size(&self) -> Size {
        self.size
    }
}

/// Simulated script loading.
#[derive(Debug, Clone, Default)]
pub struct ScriptEnvironment {
    requested: Vec<String>,
    available: bool,
}

impl ScriptEnvironment {
    /// URLs requested so far, in request order.
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// Whether the viewport capability has been evaluated.
    pub fn is_available(&self) -> bool {
        self.available
    }
}

/// In-memory document implementing [`Host`].
#[derive(Debug, Clone)]
pub struct Page {
    nodes: Vec<Element>,
    body: NodeId,
    ready_signal: ReadySignal,
    class_layout: IndexMap<String, Size>,
    focused: Option<NodeId>,
    scripts: ScriptEnvironment,
    observing: bool,
    mutations: Vec<MutationRecord>,
    body_overflow_writes: usize,
}

impl Page {
    /// Creates an empty page whose only element is the body.
    pub fn new(ready_signal: ReadySignal) -> Self {
        Self {
            nodes: vec![Element::new("body")],
            body: NodeId::new(0),
            ready_signal,
            class_layout: IndexMap::new(),
            focused: None,
            scripts: ScriptEnvironment::default(),
            observing: false,
            mutations: Vec::new(),
            body_overflow_writes: 0,
        }
    }

    /// Returns the body element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Returns the element behind `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` was not allocated by this page.
    pub fn element(&self, node: NodeId) -> &Element {
        &self.nodes[node.index()]
    }

    fn element_mut(&mut self, node: NodeId) -> &mut Element {
        &mut self.nodes[node.index()]
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Element::new(tag));
        id
    }

    /// Creates an element with classes and a size, and appends it to `parent`.
    pub fn add_element(&mut self, parent: NodeId, tag: &str, classes: &[&str], size: Size) -> NodeId {
        let node = self.create_element(tag);
        {
            let element = self.element_mut(node);
            element.classes = classes.iter().map(|c| c.to_string()).collect();
            element.size = size;
        }
        self.append_child(parent, node);
        node
    }

    /// Appends `child` to `parent`, moving it if it is already attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.element(child).parent.is_some() {
            self.remove(child);
        }

        self.element_mut(child).parent = Some(parent);
        self.element_mut(parent).children.push(child);

        if self.observing && self.is_connected(child) {
            self.mutations
                .push(MutationRecord::new(vec![child], Vec::new()));
        }
        trace!(parent:% = parent, child:% = child; "Element appended");
    }

    /// Detaches `node` (and its subtree) from its parent.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.element(node).parent else {
            return;
        };
        let was_connected = self.is_connected(node);

        self.element_mut(parent).children.retain(|&c| c != node);
        self.element_mut(node).parent = None;
        if self.focused.is_some_and(|f| self.contains(node, f)) {
            self.focused = None;
        }

        if self.observing && was_connected {
            self.mutations
                .push(MutationRecord::new(Vec::new(), vec![node]));
        }
    }

    /// Sets the laid-out size of `node`.
    pub fn set_size(&mut self, node: NodeId, size: Size) {
        self.element_mut(node).size = size;
    }

    /// Makes elements carrying `class` lay out at `size`, overriding their own size.
    pub fn set_class_layout(&mut self, class: &str, size: Size) {
        self.class_layout.insert(class.to_string(), size);
    }

    /// Changes the parse state reported by a parse-state host.
    pub fn set_ready_state(&mut self, state: ReadyState) {
        if let ReadySignal::ParseState(_) = self.ready_signal {
            self.ready_signal = ReadySignal::ParseState(state);
        }
    }

    /// Returns the element holding keyboard focus.
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn scripts(&self) -> &ScriptEnvironment {
        &self.scripts
    }

    /// Marks the viewport capability as evaluated (or unloaded again).
    pub fn set_capability_available(&mut self, available: bool) {
        self.scripts.available = available;
    }

    /// Returns how many times the body overflow style was written.
    pub fn body_overflow_writes(&self) -> usize {
        self.body_overflow_writes
    }

    /// Returns whether mutation recording is active.
    pub fn is_observing(&self) -> bool {
        self.observing
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.element(node).children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.element(next).children.iter().rev().copied());
        }
        out
    }
}

impl Host for Page {
    fn ready_signal(&self) -> ReadySignal {
        self.ready_signal
    }

    fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .filter(|&node| self.element(node).has_class(class))
            .collect()
    }

    fn first_descendant_by_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(node)
            .into_iter()
            .find(|&n| self.element(n).tag.eq_ignore_ascii_case(tag))
    }

    fn first_descendant_by_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(node)
            .into_iter()
            .find(|&n| self.element(n).has_class(class))
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.body, node)
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.element(n).parent;
        }
        false
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).has_class(class)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        let element = self.element_mut(node);
        if !element.has_class(class) {
            element.classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        self.element_mut(node).classes.retain(|c| c != class);
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let style = &mut self.element_mut(node).style;
        if value.is_empty() {
            style.shift_remove(property);
        } else {
            style.insert(property.to_string(), value.to_string());
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.element_mut(node)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn body_overflow(&self) -> String {
        self.element(self.body)
            .style("overflow")
            .unwrap_or_default()
            .to_string()
    }

    fn set_body_overflow(&mut self, value: &str) {
        self.body_overflow_writes += 1;
        let body = self.body;
        self.set_style(body, "overflow", value);
    }

    fn append_button(&mut self, parent: NodeId, class: &str, title: &str, label: &str) -> NodeId {
        let button = self.create_element("button");
        {
            let element = self.element_mut(button);
            element.classes.push(class.to_string());
            element
                .attributes
                .insert("title".to_string(), title.to_string());
            element.text = label.to_string();
        }
        self.append_child(parent, button);
        button
    }

    fn focus(&mut self, node: NodeId) {
        if self.is_connected(node) {
            self.focused = Some(node);
        }
    }

    fn client_size(&self, node: NodeId) -> Size {
        let element = self.element(node);
        self.class_layout
            .iter()
            .rev()
            .find(|(class, _)| element.has_class(class))
            .map(|(_, size)| *size)
            .unwrap_or(element.size)
    }

    fn intrinsic_size(&self, image: NodeId) -> Size {
        self.element(image).size
    }

    fn capability_available(&self) -> bool {
        self.scripts.available
    }

    fn request_script(&mut self, url: &str) {
        self.scripts.requested.push(url.to_string());
    }

    fn observe_mutations(&mut self) {
        self.observing = true;
    }

    fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Page {
        Page::new(ReadySignal::ParseState(ReadyState::Complete))
    }

    #[test]
    fn test_elements_by_class_in_document_order() {
        let mut page = page();
        let body = page.body();
        let section = page.add_element(body, "section", &[], Size::default());
        let first = page.add_element(section, "div", &["mermaid"], Size::default());
        let second = page.add_element(body, "div", &["mermaid"], Size::default());
        let nested = page.add_element(first, "div", &["mermaid"], Size::default());

        assert_eq!(
            page.elements_by_class("mermaid"),
            vec![first, nested, second]
        );
    }

    #[test]
    fn test_detached_elements_are_not_found() {
        let mut page = page();
        let body = page.body();
        let container = page.add_element(body, "div", &["mermaid"], Size::default());

        page.remove(container);

        assert!(page.elements_by_class("mermaid").is_empty());
        assert!(!page.is_connected(container));
        assert_eq!(page.element(container).tag(), "div");
    }

    #[test]
    fn test_mutations_only_recorded_while_observing() {
        let mut page = page();
        let body = page.body();
        page.add_element(body, "div", &[], Size::default());
        assert!(page.take_mutations().is_empty());

        page.observe_mutations();
        let added = page.add_element(body, "div", &[], Size::default());
        page.remove(added);

        let records = page.take_mutations();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].added(), &[added]);
        assert_eq!(records[1].removed(), &[added]);
        assert!(page.take_mutations().is_empty());
    }

    #[test]
    fn test_detached_subtree_changes_are_not_recorded() {
        let mut page = page();
        page.observe_mutations();
        let detached = page.create_element("div");
        let child = page.create_element("svg");

        page.append_child(detached, child);

        assert!(page.take_mutations().is_empty());
    }

    #[test]
    fn test_class_layout_overrides_size() {
        let mut page = page();
        let body = page.body();
        let container = page.add_element(body, "div", &["mermaid"], Size::new(300.0, 200.0));
        page.set_class_layout("mermaid-fullscreen", Size::new(1280.0, 720.0));

        assert_eq!(page.client_size(container), Size::new(300.0, 200.0));
        page.add_class(container, "mermaid-fullscreen");
        assert_eq!(page.client_size(container), Size::new(1280.0, 720.0));
    }

    #[test]
    fn test_body_overflow_round_trip() {
        let mut page = page();
        assert_eq!(page.body_overflow(), "");

        page.set_body_overflow("hidden");
        assert_eq!(page.body_overflow(), "hidden");
        page.set_body_overflow("");
        assert_eq!(page.body_overflow(), "");
        assert_eq!(page.body_overflow_writes(), 2);
    }

    #[test]
    fn test_removing_focused_subtree_clears_focus() {
        let mut page = page();
        let body = page.body();
        let container = page.add_element(body, "div", &[], Size::default());
        let image = page.add_element(container, "svg", &[], Size::default());

        page.focus(image);
        assert_eq!(page.focused(), Some(image));
        page.remove(container);
        assert_eq!(page.focused(), None);
    }

    #[test]
    fn test_append_button_sets_title_and_label() {
        let mut page = page();
        let body = page.body();

        let button = page.append_button(body, "btn", "Toggle", "⛶");

        let element = page.element(button);
        assert_eq!(element.tag(), "button");
        assert!(element.has_class("btn"));
        assert_eq!(element.attribute("title"), Some("Toggle"));
        assert_eq!(element.text(), "⛶");
    }
}
