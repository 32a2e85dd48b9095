//! Element handles: shared, cheaply cloneable references into the tree.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Unique identity of an element within its document.
pub type NodeId = u64;

/// Callback invoked when an element is clicked.
pub type ClickHandler = Rc<dyn Fn(&Element)>;

struct ElementData {
    id: NodeId,
    tag: String,
    is_root: bool,
    attrs: RefCell<BTreeMap<String, String>>,
    classes: RefCell<Vec<String>>,
    text: RefCell<String>,
    children: RefCell<Vec<Element>>,
    parent: RefCell<Weak<ElementData>>,
    click_handlers: RefCell<Vec<ClickHandler>>,
    clicks: Cell<u32>,
}

/// A handle to one element of a [`Document`](super::Document).
///
/// Cloning the handle does not clone the element. Two handles are equal when
/// they refer to the same element.
#[derive(Clone)]
pub struct Element(Rc<ElementData>);

/// A non-owning handle that does not keep the element alive.
#[derive(Clone)]
pub struct WeakElement {
    id: NodeId,
    inner: Weak<ElementData>,
}

impl Element {
    pub(crate) fn new(id: NodeId, tag: &str, is_root: bool) -> Self {
        Self(Rc::new(ElementData {
            id,
            tag: tag.to_lowercase(),
            is_root,
            attrs: RefCell::new(BTreeMap::new()),
            classes: RefCell::new(Vec::new()),
            text: RefCell::new(String::new()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            click_handlers: RefCell::new(Vec::new()),
            clicks: Cell::new(0),
        }))
    }

    /// Document-unique identity.
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    /// Lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.0.attrs.borrow().get(name).cloned()
    }

    pub fn set_attr(&self, name: &str, value: &str) {
        self.0
            .attrs
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attr(&self, name: &str) {
        self.0.attrs.borrow_mut().remove(name);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.0.classes.borrow().iter().any(|c| c == class)
    }

    /// Add a class. Adding a class that is already present does nothing.
    pub fn add_class(&self, class: &str) {
        if !self.has_class(class) {
            self.0.classes.borrow_mut().push(class.to_string());
        }
    }

    /// Remove a class. Removing an absent class does nothing.
    pub fn remove_class(&self, class: &str) {
        self.0.classes.borrow_mut().retain(|c| c != class);
    }

    pub fn classes(&self) -> Vec<String> {
        self.0.classes.borrow().clone()
    }

    pub fn text(&self) -> String {
        self.0.text.borrow().clone()
    }

    pub fn set_text(&self, text: &str) {
        *self.0.text.borrow_mut() = text.to_string();
    }

    /// Builder-style attribute setter for detached construction.
    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style class setter for detached construction.
    pub fn with_class(self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// Builder-style text setter for detached construction.
    pub fn with_text(self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    /// Builder-style child insertion. Does not notify observers; use
    /// [`Document::append_child`](super::Document::append_child) to insert
    /// into a live tree.
    pub fn with_child(self, child: Element) -> Self {
        attach(&self, &child);
        self
    }

    pub fn children(&self) -> Vec<Element> {
        self.0.children.borrow().clone()
    }

    pub fn parent(&self) -> Option<Element> {
        self.0.parent.borrow().upgrade().map(Element)
    }

    /// Whether the element is reachable from its document's root.
    pub fn is_connected(&self) -> bool {
        let mut current = self.clone();
        loop {
            if current.0.is_root {
                return true;
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// All descendants in document (pre-)order, excluding `self`.
    pub fn descendants(&self) -> Vec<Element> {
        let mut out = Vec::new();
        let mut stack: Vec<Element> = self.children().into_iter().rev().collect();
        while let Some(el) = stack.pop() {
            stack.extend(el.children().into_iter().rev());
            out.push(el);
        }
        out
    }

    /// Descendants matching a predicate, in document order.
    pub fn find_all(&self, pred: impl Fn(&Element) -> bool) -> Vec<Element> {
        self.descendants().into_iter().filter(|el| pred(el)).collect()
    }

    /// First descendant matching a predicate.
    pub fn find_first(&self, pred: impl Fn(&Element) -> bool) -> Option<Element> {
        self.descendants().into_iter().find(|el| pred(el))
    }

    /// Nearest inclusive ancestor matching a predicate.
    pub fn closest(&self, pred: impl Fn(&Element) -> bool) -> Option<Element> {
        let mut current = Some(self.clone());
        while let Some(el) = current {
            if pred(&el) {
                return Some(el);
            }
            current = el.parent();
        }
        None
    }

    /// Register a click handler.
    pub fn on_click(&self, handler: ClickHandler) {
        self.0.click_handlers.borrow_mut().push(handler);
    }

    /// Dispatch a click to every registered handler.
    pub fn click(&self) {
        self.0.clicks.set(self.0.clicks.get() + 1);
        let handlers = self.0.click_handlers.borrow().clone();
        for handler in handlers {
            handler(self);
        }
    }

    /// Number of clicks dispatched to this element.
    pub fn click_count(&self) -> u32 {
        self.0.clicks.get()
    }

    pub fn downgrade(&self) -> WeakElement {
        WeakElement {
            id: self.0.id,
            inner: Rc::downgrade(&self.0),
        }
    }

    pub(crate) fn detach(&self) -> Option<Element> {
        let parent = self.parent()?;
        parent
            .0
            .children
            .borrow_mut()
            .retain(|c| !Rc::ptr_eq(&c.0, &self.0));
        *self.0.parent.borrow_mut() = Weak::new();
        Some(parent)
    }
}

pub(crate) fn attach(parent: &Element, child: &Element) {
    child.detach();
    *child.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
    parent.0.children.borrow_mut().push(child.clone());
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} #{}", self.0.tag, self.0.id)?;
        for (name, value) in self.0.attrs.borrow().iter() {
            write!(f, " {name}=\"{value}\"")?;
        }
        let classes = self.0.classes.borrow();
        if !classes.is_empty() {
            write!(f, " class=\"{}\"", classes.join(" "))?;
        }
        write!(f, ">")
    }
}

impl WeakElement {
    /// Identity of the referenced element, valid even after it is dropped.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn upgrade(&self) -> Option<Element> {
        self.inner.upgrade().map(Element)
    }

    /// Whether the referenced element is still alive.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for WeakElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakElement(#{})", self.id)
    }
}
