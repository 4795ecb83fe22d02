// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property containers with inheritance by wrapping.
//!
//! A [`Schema`] maps names to typed [`PropertyCell`]s. A schema may **wrap** one
//! parent schema: every name that has not been set locally then forwards, live,
//! from the parent's cell of the same name, which may itself forward from its
//! own parent.
//!
//! # Scope
//!
//! The wrapped parent is not owned; the schema only keeps a weak link to it.
//! Ownership of containers belongs to whatever embeds them (usually an
//! element in a tree).

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashMap;
use log::{debug, trace, warn};
use peniko::Color;

use crate::cell::{ErasedCell, PropertyCell};
use crate::data::SchemaData;
use crate::value::{PropertyValue, Vec3};

/// Errors reported by [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The requested parent is this schema, or already forwards from it.
    #[error("wrapping would make a schema forward from itself")]
    CyclicWrap,
}

#[derive(Default)]
struct SchemaState {
    cells: RefCell<HashMap<String, Rc<dyn ErasedCell>>>,
    /// One default-valued cell per type, handed out on type mismatches.
    mismatched: RefCell<HashMap<TypeId, Box<dyn Any>>>,
    parent: RefCell<Weak<SchemaState>>,
}

enum Lookup<T: PropertyValue> {
    Found(PropertyCell<T>),
    Mismatch(&'static str),
    Missing,
}

/// A typed property container.
///
/// `Schema` is a cheap handle; clones refer to the same container.
///
/// # Type pinning
///
/// The first `get` or `set` of a name pins the type of that name for this
/// container. Later `set` calls with another type are ignored, and `get`
/// with another type returns a shared default-valued cell.
///
/// # Example
///
/// ```rust
/// use trellis_schema::Schema;
///
/// let theme = Schema::new();
/// theme.set("FontSize", 12.0_f32);
///
/// let button = Schema::new();
/// button.wrap(&theme).unwrap();
/// assert_eq!(button.get::<f32>("FontSize").value(), 12.0);
///
/// // Changes flow down live.
/// theme.set("FontSize", 14.0_f32);
/// assert_eq!(button.get::<f32>("FontSize").value(), 14.0);
///
/// // A local set breaks the link for that name only.
/// button.set("FontSize", 20.0_f32);
/// theme.set("FontSize", 16.0_f32);
/// assert_eq!(button.get::<f32>("FontSize").value(), 20.0);
/// ```
#[derive(Clone, Default)]
pub struct Schema {
    state: Rc<SchemaState>,
}

impl Schema {
    /// Creates an empty, unwrapped schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup<T: PropertyValue>(&self, name: &str) -> Lookup<T> {
        let cells = self.state.cells.borrow();
        match cells.get(name) {
            None => Lookup::Missing,
            Some(cell) => match cell.as_any().downcast_ref::<PropertyCell<T>>() {
                Some(cell) => Lookup::Found(cell.clone()),
                None => Lookup::Mismatch(cell.type_name()),
            },
        }
    }

    fn insert<T: PropertyValue>(&self, name: &str, cell: &PropertyCell<T>) {
        self.state
            .cells
            .borrow_mut()
            .insert(String::from(name), Rc::new(cell.clone()));
    }

    fn mismatch_cell<T: PropertyValue>(&self) -> PropertyCell<T> {
        let mut shared = self.state.mismatched.borrow_mut();
        let slot = shared
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(PropertyCell::<T>::detached()));
        (**slot)
            .downcast_ref::<PropertyCell<T>>()
            .cloned()
            .unwrap_or_else(PropertyCell::detached)
    }

    // =========================================================================
    // Cell access
    // =========================================================================

    /// Returns the cell for `name`, creating it on first access.
    ///
    /// A newly created cell forwards from the wrapped parent (if any) until it
    /// is set locally. If `name` is already pinned to a different type, a
    /// default-valued cell shared by all such mismatches is returned instead.
    pub fn get<T: PropertyValue>(&self, name: &str) -> PropertyCell<T> {
        match self.lookup::<T>(name) {
            Lookup::Found(cell) => cell,
            Lookup::Mismatch(pinned) => {
                debug!(
                    name = name,
                    pinned = pinned,
                    requested = core::any::type_name::<T>();
                    "property type mismatch on get"
                );
                self.mismatch_cell()
            }
            Lookup::Missing => {
                let cell = PropertyCell::new(name, T::default_value(), false);
                if let Some(parent) = self.parent()
                    && let Some(source) = parent.source_cell::<T>(name)
                {
                    cell.bind(&source);
                }
                self.insert(name, &cell);
                cell
            }
        }
    }

    /// The cell a child schema forwards from, or `None` on a type mismatch.
    pub(crate) fn source_cell<T: PropertyValue>(&self, name: &str) -> Option<PropertyCell<T>> {
        match self.lookup::<T>(name) {
            Lookup::Found(cell) => Some(cell),
            Lookup::Mismatch(_) => None,
            Lookup::Missing => Some(self.get(name)),
        }
    }

    /// Sets `name` locally.
    ///
    /// Creates a local cell if none exists. If the cell forwards from a parent,
    /// the link is severed first. Listeners are notified only when the value
    /// changes. A `set` whose type differs from the pinned type is ignored.
    pub fn set<T: PropertyValue>(&self, name: &str, value: T) {
        match self.lookup::<T>(name) {
            Lookup::Found(cell) => {
                cell.make_local();
                cell.replace(value);
            }
            Lookup::Mismatch(pinned) => {
                debug!(
                    name = name,
                    pinned = pinned,
                    requested = core::any::type_name::<T>();
                    "ignoring set with mismatched property type"
                );
            }
            Lookup::Missing => {
                let cell = PropertyCell::new(name, value, true);
                self.insert(name, &cell);
            }
        }
    }

    /// Sets every entry of every typed map in `data`.
    pub fn load(&self, data: &SchemaData) {
        for (name, value) in &data.strings {
            self.set(name, value.clone());
        }
        for (name, value) in &data.ints {
            self.set(name, *value);
        }
        for (name, value) in &data.floats {
            self.set(name, *value);
        }
        for (name, value) in &data.bools {
            self.set(name, *value);
        }
        for (name, value) in &data.vectors {
            self.set::<Vec3>(name, *value);
        }
        for (name, value) in &data.colors {
            self.set(name, Color::new(*value));
        }
    }

    // =========================================================================
    // Wrapping
    // =========================================================================

    /// Makes this schema inherit from `parent`.
    ///
    /// Every cell not set locally re-resolves against `parent` and starts
    /// forwarding from it; local cells are untouched. Wrapping the current
    /// parent again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::CyclicWrap`] if `parent` is this schema or
    /// already (transitively) wraps it.
    pub fn wrap(&self, parent: &Self) -> Result<(), SchemaError> {
        if self.is_wrapping(parent) {
            return Ok(());
        }
        if parent.ptr_eq(self) || parent.has_ancestor(self) {
            warn!("refusing to wrap a schema with itself or one of its descendants");
            return Err(SchemaError::CyclicWrap);
        }
        *self.state.parent.borrow_mut() = Rc::downgrade(&parent.state);
        trace!(cells = self.len(); "schema wrapped");
        self.rebind_forwarded(Some(parent));
        Ok(())
    }

    /// Drops the wrapped parent.
    ///
    /// Cells that were forwarding keep their last value and stop tracking.
    pub fn unwrap(&self) {
        let previous = core::mem::take(&mut *self.state.parent.borrow_mut());
        if previous.strong_count() == 0 {
            return;
        }
        trace!(cells = self.len(); "schema unwrapped");
        self.rebind_forwarded(None);
    }

    fn rebind_forwarded(&self, parent: Option<&Self>) {
        let forwarded: Vec<Rc<dyn ErasedCell>> = self
            .state
            .cells
            .borrow()
            .values()
            .filter(|cell| !cell.is_local())
            .cloned()
            .collect();
        for cell in forwarded {
            cell.rebind(parent);
        }
    }

    /// Returns the wrapped parent, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.state
            .parent
            .borrow()
            .upgrade()
            .map(|state| Self { state })
    }

    /// Returns `true` if this schema currently wraps `other`.
    #[must_use]
    pub fn is_wrapping(&self, other: &Self) -> bool {
        core::ptr::eq(self.state.parent.borrow().as_ptr(), Rc::as_ptr(&other.state))
    }

    /// Returns `true` if `other` appears anywhere in the wrapped parent chain.
    #[must_use]
    pub fn has_ancestor(&self, other: &Self) -> bool {
        let mut current = self.parent();
        while let Some(schema) = current {
            if schema.ptr_eq(other) {
                return true;
            }
            current = schema.parent();
        }
        false
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Returns `true` if a cell exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.state.cells.borrow().contains_key(name)
    }

    /// Returns `true` if `name` was set locally on this schema.
    #[must_use]
    pub fn is_local(&self, name: &str) -> bool {
        self.state
            .cells
            .borrow()
            .get(name)
            .is_some_and(|cell| cell.is_local())
    }

    /// Returns the [`TypeId`] pinned for `name`, if a cell exists.
    #[must_use]
    pub fn value_type(&self, name: &str) -> Option<TypeId> {
        self.state
            .cells
            .borrow()
            .get(name)
            .map(|cell| cell.value_type())
    }

    /// Returns the names of all materialized cells, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.cells.borrow().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of materialized cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.cells.borrow().len()
    }

    /// Returns `true` if no cell has been materialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.cells.borrow().is_empty()
    }

    /// Returns the query text of `name`, whatever its type.
    ///
    /// Reads this schema's cell if one exists, otherwise walks the wrapped
    /// parent chain. Never creates a cell.
    #[must_use]
    pub fn query_text(&self, name: &str) -> Option<String> {
        let own = self
            .state
            .cells
            .borrow()
            .get(name)
            .map(|cell| cell.query_text());
        match own {
            Some(text) => Some(text),
            None => self.parent().and_then(|parent| parent.query_text(name)),
        }
    }

    /// Returns `true` if both handles refer to the same schema.
    #[must_use]
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Tears the schema down.
    ///
    /// Unwraps, cuts loose every cell that forwards from this schema (they keep
    /// their last value), drops all listeners and forgets every cell.
    pub fn unload(&self) {
        *self.state.parent.borrow_mut() = Weak::new();
        let cells: Vec<Rc<dyn ErasedCell>> = self
            .state
            .cells
            .borrow_mut()
            .drain()
            .map(|(_, cell)| cell)
            .collect();
        trace!(cells = cells.len(); "schema unloaded");
        for cell in cells {
            cell.sever();
        }
        self.state.mismatched.borrow_mut().clear();
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("names", &self.names())
            .field("wrapped", &self.parent().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;
    use core::cell::Cell;

    fn counter<T: PropertyValue>(cell: &PropertyCell<T>) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        cell.on_changed(move |_, _, _| sink.set(sink.get() + 1));
        count
    }

    #[test]
    fn get_returns_same_cell() {
        let schema = Schema::new();
        let a = schema.get::<i32>("Count");
        let b = schema.get::<i32>("Count");
        assert!(a.ptr_eq(&b));
        assert!(!a.is_local());
        assert_eq!(a.value(), 0);
    }

    #[test]
    fn set_then_get() {
        let schema = Schema::new();
        schema.set("Title", "hello".to_string());
        let cell = schema.get::<String>("Title");
        assert!(cell.is_local());
        assert_eq!(cell.value(), "hello");
        assert!(schema.is_local("Title"));
        assert!(schema.contains("Title"));
        assert_eq!(schema.value_type("Title"), Some(TypeId::of::<String>()));
    }

    #[test]
    fn set_notifies_once_per_change() {
        let schema = Schema::new();
        let cell = schema.get::<i32>("Count");
        let count = counter(&cell);

        schema.set("Count", 1);
        schema.set("Count", 1);
        schema.set("Count", 2);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn type_is_pinned_at_first_set() {
        let schema = Schema::new();
        schema.set("x", 5_i32);

        let wrong = schema.get::<bool>("x");
        assert!(!wrong.value());

        schema.set("x", true);
        assert!(!schema.get::<bool>("x").value());
        assert_eq!(schema.get::<i32>("x").value(), 5);
    }

    #[test]
    fn mismatch_cells_are_shared_per_type() {
        let schema = Schema::new();
        schema.set("a", 1_i32);
        schema.set("b", 2_i32);
        let a = schema.get::<bool>("a");
        let b = schema.get::<bool>("b");
        assert!(a.ptr_eq(&b));
        assert!(!a.is_forwarding());
    }

    #[test]
    fn get_pins_type_too() {
        let schema = Schema::new();
        let _ = schema.get::<f32>("Width");
        schema.set("Width", 10_i32);
        assert_eq!(schema.get::<f32>("Width").value(), 0.0);
    }

    #[test]
    fn wrap_forwards_unset_names() {
        let parent = Schema::new();
        parent.set("Color", "red".to_string());
        let child = Schema::new();
        child.wrap(&parent).unwrap();

        let cell = child.get::<String>("Color");
        assert!(cell.is_forwarding());
        assert_eq!(cell.value(), "red");

        parent.set("Color", "blue".to_string());
        assert_eq!(cell.value(), "blue");
    }

    #[test]
    fn wrap_rebinds_already_materialized_cells() {
        let child = Schema::new();
        let cell = child.get::<i32>("Depth");
        let count = counter(&cell);

        let parent = Schema::new();
        parent.set("Depth", 4);
        child.wrap(&parent).unwrap();

        assert_eq!(cell.value(), 4);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn parent_cells_materialize_lazily() {
        let parent = Schema::new();
        let child = Schema::new();
        child.wrap(&parent).unwrap();
        let cell = child.get::<i32>("Late");
        assert!(parent.contains("Late"));
        assert!(!parent.is_local("Late"));

        parent.set("Late", 3);
        assert_eq!(cell.value(), 3);
    }

    #[test]
    fn parent_type_mismatch_leaves_cell_unbound() {
        let parent = Schema::new();
        parent.set("x", 5_i32);
        let child = Schema::new();
        child.wrap(&parent).unwrap();

        let cell = child.get::<bool>("x");
        assert!(!cell.is_forwarding());
        assert!(!cell.value());
    }

    #[test]
    fn local_set_breaks_forwarding() {
        let parent = Schema::new();
        parent.set("n", 1_i32);
        let child = Schema::new();
        child.wrap(&parent).unwrap();
        let cell = child.get::<i32>("n");

        child.set("n", 10);
        parent.set("n", 2);
        assert_eq!(cell.value(), 10);
        assert_eq!(parent.get::<i32>("n").value(), 2);
    }

    #[test]
    fn unwrap_keeps_last_value() {
        let parent = Schema::new();
        parent.set("n", 1_i32);
        let child = Schema::new();
        child.wrap(&parent).unwrap();
        let cell = child.get::<i32>("n");

        child.unwrap();
        assert!(child.parent().is_none());
        parent.set("n", 2);
        assert!(!cell.is_forwarding());
        assert_eq!(cell.value(), 1);
    }

    #[test]
    fn rewrap_switches_source() {
        let a = Schema::new();
        a.set("k", 1_i32);
        let b = Schema::new();
        b.set("k", 2_i32);
        let schema = Schema::new();

        schema.wrap(&a).unwrap();
        let cell = schema.get::<i32>("k");
        assert_eq!(cell.value(), 1);

        schema.wrap(&b).unwrap();
        assert_eq!(cell.value(), 2);
        a.set("k", 11);
        assert_eq!(cell.value(), 2);

        schema.wrap(&a).unwrap();
        assert_eq!(cell.value(), 11);
    }

    #[test]
    fn wrap_same_parent_is_noop() {
        let parent = Schema::new();
        parent.set("n", 1_i32);
        let child = Schema::new();
        child.wrap(&parent).unwrap();
        let cell = child.get::<i32>("n");
        let count = counter(&cell);
        child.wrap(&parent).unwrap();
        assert!(child.is_wrapping(&parent));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn cyclic_wrap_is_rejected() {
        let a = Schema::new();
        let b = Schema::new();
        let c = Schema::new();
        b.wrap(&a).unwrap();
        c.wrap(&b).unwrap();

        assert_eq!(a.wrap(&a), Err(SchemaError::CyclicWrap));
        assert_eq!(a.wrap(&c), Err(SchemaError::CyclicWrap));
        assert!(a.parent().is_none());
        assert!(c.has_ancestor(&a));
    }

    #[test]
    fn query_text_walks_parents_without_materializing() {
        let parent = Schema::new();
        parent.set("Foo", 3_i32);
        let child = Schema::new();
        child.wrap(&parent).unwrap();

        assert_eq!(child.query_text("Foo").as_deref(), Some("3"));
        assert!(!child.contains("Foo"));
        assert_eq!(child.query_text("Missing"), None);
    }

    #[test]
    fn load_sets_every_map() {
        let data = SchemaData::new()
            .with_string("Title", "Hi")
            .with_int("Count", 3)
            .with_float("Scale", 1.5)
            .with_bool("Visible", true)
            .with_vector("Position", Vec3::new(1.0, 2.0, 3.0))
            .with_color("Tint", [1.0, 0.0, 0.0, 1.0]);
        let schema = Schema::new();
        schema.load(&data);

        assert_eq!(schema.get::<String>("Title").value(), "Hi");
        assert_eq!(schema.get::<i32>("Count").value(), 3);
        assert_eq!(schema.get::<f32>("Scale").value(), 1.5);
        assert!(schema.get::<bool>("Visible").value());
        assert_eq!(schema.get::<Vec3>("Position").value(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            schema.get::<Color>("Tint").value().components,
            [1.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(
            schema.names(),
            vec!["Count", "Position", "Scale", "Tint", "Title", "Visible"]
        );
    }

    #[test]
    fn unload_orphans_dependents() {
        let parent = Schema::new();
        parent.set("n", 1_i32);
        let parent_cell = parent.get::<i32>("n");
        let _count = counter(&parent_cell);
        let child = Schema::new();
        child.wrap(&parent).unwrap();
        let cell = child.get::<i32>("n");

        parent.unload();
        assert!(parent.is_empty());
        assert_eq!(parent_cell.listener_count(), 0);
        assert!(!cell.is_forwarding());
        assert_eq!(cell.value(), 1);
    }
}
