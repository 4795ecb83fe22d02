// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element tree.

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use log::{debug, trace};
use smallvec::SmallVec;
use trellis_schema::{ListenerId, Schema, SchemaError};

use crate::error::ElementError;
use crate::events::{self, ChildEvent, ChildHandler, Listeners, RemovedHandler};
use crate::guid::Guid;
use crate::query::Query;

struct ElementState {
    id: String,
    guid: Guid,
    schema: Schema,
    children: RefCell<Vec<Element>>,
    /// Event relay only; ownership flows from parent to child.
    parent: RefCell<Weak<ElementState>>,
    listeners: RefCell<Listeners>,
    destroyed: Cell<bool>,
}

/// A node in the element tree.
///
/// `Element` is a cheap handle; clones refer to the same node and compare
/// equal. Each element owns one [`Schema`] and an ordered list of children.
/// Attaching a child wraps the child's schema with the parent's, so the child
/// inherits every property it has not set itself.
///
/// # Example
///
/// ```rust
/// use trellis_element::Element;
///
/// let root = Element::new("root");
/// root.schema().set("Theme", String::from("dark"));
///
/// let panel = Element::new("panel");
/// root.add_child(&panel).unwrap();
/// assert_eq!(panel.schema().get::<String>("Theme").value(), "dark");
///
/// let found = root.find_one("panel").unwrap();
/// assert_eq!(found, panel);
/// ```
#[derive(Clone)]
pub struct Element {
    state: Rc<ElementState>,
}

impl Element {
    /// Creates a detached element with an empty schema.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            state: Rc::new(ElementState {
                id: id.into(),
                guid: Guid::next(),
                schema: Schema::new(),
                children: RefCell::new(Vec::new()),
                parent: RefCell::new(Weak::new()),
                listeners: RefCell::new(Listeners::default()),
                destroyed: Cell::new(false),
            }),
        }
    }

    /// Returns the element's id.
    ///
    /// Ids need not be unique; every instance of a template shares its id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.state.id
    }

    /// Returns the element's process-unique identity.
    #[must_use]
    pub fn guid(&self) -> Guid {
        self.state.guid
    }

    /// Returns the element's property container.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.state.schema
    }

    /// Returns `true` if both handles refer to the same element.
    #[must_use]
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Returns the children, in order.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.state.children.borrow().clone()
    }

    /// Returns the number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.state.children.borrow().len()
    }

    /// Returns the child at `index`.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<Self> {
        self.state.children.borrow().get(index).cloned()
    }

    /// Returns the first child whose id is `id`.
    #[must_use]
    pub fn child_by_id(&self, id: &str) -> Option<Self> {
        self.state
            .children
            .borrow()
            .iter()
            .find(|child| child.id() == id)
            .cloned()
    }

    /// Returns the parent, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.state
            .parent
            .borrow()
            .upgrade()
            .map(|state| Self { state })
    }

    /// Returns the top of the tree this element is attached to.
    #[must_use]
    pub fn root(&self) -> Self {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Returns the number of ancestors.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(parent) = current {
            depth += 1;
            current = parent.parent();
        }
        depth
    }

    /// Returns `true` if `self` is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        let mut current = other.parent();
        while let Some(element) = current {
            if element.ptr_eq(self) {
                return true;
            }
            current = element.parent();
        }
        false
    }

    /// Iterates over all descendants in pre-order, excluding `self`.
    ///
    /// The iterator snapshots each child list as it descends, so mutating the
    /// tree while iterating is allowed but may not be reflected.
    #[must_use]
    pub fn descendants(&self) -> Descendants {
        let mut stack = self.children();
        stack.reverse();
        Descendants { stack }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Attaches `child` as the last child of this element.
    ///
    /// If `child` already belongs to this element it is moved to the end. If it
    /// belongs to another element it is removed from there first (firing that
    /// parent's events). The child's schema is wrapped with this element's
    /// schema, then `child_added(self, child)` fires here and bubbles up.
    /// Descendants of `child` come along without events of their own.
    ///
    /// # Errors
    ///
    /// - [`ElementError::Cycle`] if `child` is `self` or one of its ancestors.
    /// - [`ElementError::Destroyed`] if either element was destroyed.
    /// - [`ElementError::Schema`] if this element's schema already forwards
    ///   from the child's schema.
    ///
    /// On error the tree is left unchanged.
    pub fn add_child(&self, child: &Self) -> Result<(), ElementError> {
        self.ensure_alive()?;
        child.ensure_alive()?;
        if child.ptr_eq(self) || child.is_ancestor_of(self) {
            return Err(ElementError::Cycle {
                parent: self.state.id.clone(),
                child: child.state.id.clone(),
            });
        }
        // A failed add must leave the tree untouched.
        let (parent_schema, child_schema) = (&self.state.schema, &child.state.schema);
        if parent_schema.ptr_eq(child_schema) || parent_schema.has_ancestor(child_schema) {
            return Err(SchemaError::CyclicWrap.into());
        }

        match child.parent() {
            Some(parent) if parent.ptr_eq(self) => {
                self.state.children.borrow_mut().retain(|c| !c.ptr_eq(child));
            }
            Some(parent) => {
                parent.remove_child(child);
            }
            None => {}
        }

        child.state.schema.wrap(&self.state.schema)?;
        *child.state.parent.borrow_mut() = Rc::downgrade(&self.state);
        self.state.children.borrow_mut().push(child.clone());
        trace!(parent = self.id(), child = child.id(); "child added");

        events::bubble(self, ChildEvent::Added, child);
        Ok(())
    }

    /// Detaches `child` from this element.
    ///
    /// Returns `false` (and does nothing) if `child` is not a child of this
    /// element. Otherwise unwraps the child's schema, fires `removed(child)` on
    /// the child, then `child_removed(self, child)` here, bubbling up.
    pub fn remove_child(&self, child: &Self) -> bool {
        let removed = {
            let mut children = self.state.children.borrow_mut();
            match children.iter().position(|c| c.ptr_eq(child)) {
                Some(index) => {
                    children.remove(index);
                    true
                }
                None => false,
            }
        };
        if !removed {
            return false;
        }

        *child.state.parent.borrow_mut() = Weak::new();
        child.state.schema.unwrap();
        trace!(parent = self.id(), child = child.id(); "child removed");

        for handler in child.removed_handlers() {
            handler(child);
        }
        events::bubble(self, ChildEvent::Removed, child);
        true
    }

    /// Detaches every child, in order, as if by [`remove_child`](Self::remove_child).
    pub fn clear_children(&self) {
        for child in self.children() {
            self.remove_child(&child);
        }
    }

    /// Destroys this element and its subtree.
    ///
    /// Detaches the element from its parent (firing the usual removal events),
    /// then destroys each descendant, unloads every schema and drops every
    /// listener. Descendants do not receive `removed`. Calling it twice is a
    /// no-op.
    pub fn destroy(&self) {
        if self.state.destroyed.get() {
            return;
        }
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
        self.teardown();
    }

    fn teardown(&self) {
        self.state.destroyed.set(true);
        let children = core::mem::take(&mut *self.state.children.borrow_mut());
        for child in &children {
            *child.state.parent.borrow_mut() = Weak::new();
            child.teardown();
        }
        self.state.schema.unload();
        self.state.listeners.borrow_mut().clear();
        trace!(id = self.id(), descendants = children.len(); "element destroyed");
    }

    /// Returns `true` once [`destroy`](Self::destroy) has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.destroyed.get()
    }

    fn ensure_alive(&self) -> Result<(), ElementError> {
        if self.state.destroyed.get() {
            Err(ElementError::Destroyed {
                id: self.state.id.clone(),
            })
        } else {
            Ok(())
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Subscribes to this element being removed from its parent.
    pub fn on_removed(&self, f: impl Fn(&Self) + 'static) -> ListenerId {
        let handler: RemovedHandler = Rc::new(f);
        self.state.listeners.borrow_mut().add_removed(handler)
    }

    /// Subscribes to children being added anywhere in this subtree.
    ///
    /// The handler receives `(root, child)` where `root` is this element.
    pub fn on_child_added(&self, f: impl Fn(&Self, &Self) + 'static) -> ListenerId {
        let handler: ChildHandler = Rc::new(f);
        self.state
            .listeners
            .borrow_mut()
            .add_child(ChildEvent::Added, handler)
    }

    /// Subscribes to children being removed anywhere in this subtree.
    ///
    /// The handler receives `(root, child)` where `root` is this element.
    pub fn on_child_removed(&self, f: impl Fn(&Self, &Self) + 'static) -> ListenerId {
        let handler: ChildHandler = Rc::new(f);
        self.state
            .listeners
            .borrow_mut()
            .add_child(ChildEvent::Removed, handler)
    }

    /// Removes a listener registered on this element.
    ///
    /// Returns `true` if a listener was removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.state.listeners.borrow_mut().remove(id)
    }

    /// Returns the number of listeners registered on this element.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.listeners.borrow().len()
    }

    fn removed_handlers(&self) -> SmallVec<[RemovedHandler; 1]> {
        self.state.listeners.borrow().removed_handlers()
    }

    pub(crate) fn child_handlers(&self, event: ChildEvent) -> SmallVec<[ChildHandler; 1]> {
        self.state.listeners.borrow().child_handlers(event)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns every element matching `query`, in discovery order.
    ///
    /// An empty or malformed query yields an empty result.
    #[must_use]
    pub fn find(&self, query: &str) -> Vec<Self> {
        match Query::parse(query) {
            Ok(query) => query.evaluate(self),
            Err(err) => {
                debug!(query = query, error:% = err; "query rejected");
                Vec::new()
            }
        }
    }

    /// Returns the first element matching `query`.
    #[must_use]
    pub fn find_one(&self, query: &str) -> Option<Self> {
        self.find(query).into_iter().next()
    }

    /// Evaluates an already parsed query from this element.
    #[must_use]
    pub fn find_query(&self, query: &Query) -> Vec<Self> {
        query.evaluate(self)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.state.id)
            .field("guid", &self.state.guid)
            .field("children", &self.child_count())
            .field("destroyed", &self.state.destroyed.get())
            .finish_non_exhaustive()
    }
}

/// Pre-order iterator over an element's descendants.
///
/// Created by [`Element::descendants`].
#[derive(Debug)]
pub struct Descendants {
    stack: Vec<Element>,
}

impl Iterator for Descendants {
    type Item = Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        let children = element.state.children.borrow();
        self.stack.extend(children.iter().rev().cloned());
        drop(children);
        Some(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn ids(elements: &[Element]) -> Vec<&str> {
        elements.iter().map(Element::id).collect()
    }

    #[test]
    fn new_element_is_detached() {
        let e = Element::new("e");
        assert_eq!(e.id(), "e");
        assert!(e.parent().is_none());
        assert_eq!(e.child_count(), 0);
        assert_eq!(e.root(), e);
        assert_eq!(e.depth(), 0);
        assert_ne!(e.guid(), Element::new("e").guid());
    }

    #[test]
    fn add_child_appends_and_links() {
        let root = Element::new("root");
        let a = Element::new("a");
        let b = Element::new("b");
        root.add_child(&a).unwrap();
        root.add_child(&b).unwrap();

        assert_eq!(ids(&root.children()), vec!["a", "b"]);
        assert_eq!(a.parent(), Some(root.clone()));
        assert!(a.schema().is_wrapping(root.schema()));
        assert_eq!(root.child(1), Some(b));
        assert_eq!(root.child_by_id("a"), Some(a));
    }

    #[test]
    fn readding_moves_to_end() {
        let root = Element::new("root");
        let a = Element::new("a");
        let b = Element::new("b");
        root.add_child(&a).unwrap();
        root.add_child(&b).unwrap();
        root.add_child(&a).unwrap();
        assert_eq!(ids(&root.children()), vec!["b", "a"]);
    }

    #[test]
    fn adding_elsewhere_reparents() {
        let first = Element::new("first");
        let second = Element::new("second");
        let child = Element::new("child");
        first.add_child(&child).unwrap();
        second.add_child(&child).unwrap();

        assert_eq!(first.child_count(), 0);
        assert_eq!(child.parent(), Some(second.clone()));
        assert!(child.schema().is_wrapping(second.schema()));
    }

    #[test]
    fn cycles_are_rejected() {
        let root = Element::new("root");
        let child = Element::new("child");
        root.add_child(&child).unwrap();

        assert!(matches!(root.add_child(&root), Err(ElementError::Cycle { .. })));
        assert!(matches!(child.add_child(&root), Err(ElementError::Cycle { .. })));
        assert_eq!(child.child_count(), 0);
    }

    #[test]
    fn remove_child_reports_membership() {
        let root = Element::new("root");
        let child = Element::new("child");
        let stranger = Element::new("stranger");
        root.add_child(&child).unwrap();

        assert!(!root.remove_child(&stranger));
        assert!(root.remove_child(&child));
        assert!(!root.remove_child(&child));
        assert!(child.parent().is_none());
        assert!(child.schema().parent().is_none());
    }

    #[test]
    fn descendants_are_preorder() {
        let root = Element::new("root");
        let a = Element::new("a");
        let a1 = Element::new("a1");
        let a2 = Element::new("a2");
        let b = Element::new("b");
        a.add_child(&a1).unwrap();
        a.add_child(&a2).unwrap();
        root.add_child(&a).unwrap();
        root.add_child(&b).unwrap();

        let order: Vec<Element> = root.descendants().collect();
        assert_eq!(ids(&order), vec!["a", "a1", "a2", "b"]);
        assert!(root.is_ancestor_of(&a2));
        assert!(!a2.is_ancestor_of(&root));
        assert_eq!(a2.root(), root);
        assert_eq!(a2.depth(), 2);
    }

    #[test]
    fn clear_children_detaches_all() {
        let root = Element::new("root");
        for id in ["a", "b", "c"] {
            root.add_child(&Element::new(id)).unwrap();
        }
        root.clear_children();
        assert_eq!(root.child_count(), 0);
    }

    #[test]
    fn destroy_tears_down_subtree() {
        let root = Element::new("root");
        let mid = Element::new("mid");
        let leaf = Element::new("leaf");
        root.add_child(&mid).unwrap();
        mid.add_child(&leaf).unwrap();
        leaf.schema().set("n", 1_i32);
        mid.on_child_added(|_, _| {});

        mid.destroy();
        assert!(mid.is_destroyed());
        assert!(leaf.is_destroyed());
        assert_eq!(root.child_count(), 0);
        assert_eq!(mid.child_count(), 0);
        assert!(leaf.parent().is_none());
        assert!(leaf.schema().is_empty());
        assert_eq!(mid.listener_count(), 0);

        assert!(matches!(
            root.add_child(&mid),
            Err(ElementError::Destroyed { .. })
        ));
        mid.destroy();
    }

    #[test]
    fn listener_removal() {
        let e = Element::new("e");
        let id = e.on_removed(|_| {});
        assert_eq!(e.listener_count(), 1);
        assert!(e.remove_listener(id));
        assert_eq!(e.listener_count(), 0);
    }
}
