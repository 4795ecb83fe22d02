// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named, typed property cells.
//!
//! A [`PropertyCell`] is a shared handle to one value slot. Cells are either
//! **local** (set explicitly on their container) or **forwarding** (mirroring a
//! cell of the same name in the wrapped parent container).
//!
//! # Forwarding graph
//!
//! A forwarding cell holds a weak `source` link to the cell it mirrors, and the
//! source keeps a weak list of its `dependents`. Neither direction owns the
//! other; containers own their cells. When a cell's value changes it notifies
//! its own listeners first and then pushes the value into every dependent,
//! depth first, each of which notifies its own listeners in turn.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use core::any::{Any, TypeId};
use core::cell::{Cell, RefCell};
use core::fmt;

use smallvec::SmallVec;

use crate::id::ListenerId;
use crate::schema::Schema;
use crate::value::PropertyValue;

/// Callback invoked when a cell's value changes.
///
/// Receives the cell, the old value and the new value.
pub type ChangedCallback<T> = Box<dyn Fn(&PropertyCell<T>, &T, &T)>;

type SharedCallback<T> = Rc<dyn Fn(&PropertyCell<T>, &T, &T)>;

struct CellState<T: PropertyValue> {
    name: Rc<str>,
    value: RefCell<T>,
    local: Cell<bool>,
    source: RefCell<Weak<CellState<T>>>,
    dependents: RefCell<SmallVec<[Weak<CellState<T>>; 2]>>,
    listeners: RefCell<SmallVec<[(ListenerId, SharedCallback<T>); 2]>>,
    next_listener: Cell<ListenerId>,
}

/// A named, typed value holder with change notification.
///
/// Cells are handed out by [`Schema::get`]; the same `(container, name)` pair
/// always yields a handle to the same cell. Cloning the handle does not copy
/// the cell.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use trellis_schema::Schema;
///
/// let schema = Schema::new();
/// let width = schema.get::<f32>("Width");
///
/// let seen = Rc::new(Cell::new(0.0));
/// let sink = seen.clone();
/// width.on_changed(move |_, _old, new| sink.set(*new));
///
/// schema.set("Width", 120.0_f32);
/// assert_eq!(width.value(), 120.0);
/// assert_eq!(seen.get(), 120.0);
/// ```
pub struct PropertyCell<T: PropertyValue> {
    state: Rc<CellState<T>>,
}

impl<T: PropertyValue> PropertyCell<T> {
    pub(crate) fn new(name: &str, value: T, local: bool) -> Self {
        Self {
            state: Rc::new(CellState {
                name: Rc::from(name),
                value: RefCell::new(value),
                local: Cell::new(local),
                source: RefCell::new(Weak::new()),
                dependents: RefCell::new(SmallVec::new()),
                listeners: RefCell::new(SmallVec::new()),
                next_listener: Cell::new(ListenerId::new(0)),
            }),
        }
    }

    /// A default-valued cell that belongs to no name and never forwards.
    pub(crate) fn detached() -> Self {
        Self::new("", T::default_value(), false)
    }

    fn from_state(state: Rc<CellState<T>>) -> Self {
        Self { state }
    }

    /// Returns the property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Returns a copy of the current value.
    #[must_use]
    pub fn value(&self) -> T {
        self.state.value.borrow().clone()
    }

    /// Calls `f` with a reference to the current value.
    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.value.borrow())
    }

    /// Returns `true` if the value was set explicitly on the owning container.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.state.local.get()
    }

    /// Returns `true` if this cell currently mirrors a cell in a wrapped parent.
    #[must_use]
    pub fn is_forwarding(&self) -> bool {
        self.state.source.borrow().strong_count() > 0
    }

    /// Registers a change listener.
    ///
    /// The listener runs synchronously on the stack of the `set` (or `wrap`)
    /// that changed the value, after the value has been stored. It may call
    /// back into any container.
    pub fn on_changed(&self, f: impl Fn(&Self, &T, &T) + 'static) -> ListenerId {
        let id = self.state.next_listener.get();
        self.state.next_listener.set(id.next());
        self.state.listeners.borrow_mut().push((id, Rc::new(f)));
        id
    }

    /// Registers a boxed change listener.
    pub fn on_changed_boxed(&self, f: ChangedCallback<T>) -> ListenerId {
        self.on_changed(move |cell, old, new| f(cell, old, new))
    }

    /// Removes a listener.
    ///
    /// Returns `true` if a listener was removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.state.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.listeners.borrow().len()
    }

    /// Returns `true` if both handles refer to the same cell.
    #[must_use]
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    // =========================================================================
    // Forwarding links
    // =========================================================================

    /// Starts mirroring `source`, taking its current value.
    pub(crate) fn bind(&self, source: &Self) {
        self.detach();
        *self.state.source.borrow_mut() = Rc::downgrade(&source.state);
        source
            .state
            .dependents
            .borrow_mut()
            .push(Rc::downgrade(&self.state));
        self.replace(source.value());
    }

    /// Stops mirroring the current source, keeping the last value.
    pub(crate) fn detach(&self) {
        let source = core::mem::take(&mut *self.state.source.borrow_mut());
        if let Some(source) = source.upgrade() {
            let me = Rc::as_ptr(&self.state);
            source
                .dependents
                .borrow_mut()
                .retain(|d| d.strong_count() > 0 && !core::ptr::eq(d.as_ptr(), me));
        }
    }

    /// Severs forwarding and pins the cell as local.
    pub(crate) fn make_local(&self) {
        self.detach();
        self.state.local.set(true);
    }

    /// Stores `value`, notifying listeners and dependents if it differs.
    pub(crate) fn replace(&self, value: T) {
        let old = {
            let mut slot = self.state.value.borrow_mut();
            if slot.value_eq(&value) {
                return;
            }
            core::mem::replace(&mut *slot, value.clone())
        };
        self.notify(&old, &value);

        // A listener may have set this cell again; forward whatever is current.
        let current = self.value();
        for dependent in self.dependents() {
            dependent.replace(current.clone());
        }
    }

    fn notify(&self, old: &T, new: &T) {
        let listeners: SmallVec<[SharedCallback<T>; 2]> = self
            .state
            .listeners
            .borrow()
            .iter()
            .map(|(_, f)| f.clone())
            .collect();
        for listener in listeners {
            listener(self, old, new);
        }
    }

    /// Live dependents that still forward from this cell.
    fn dependents(&self) -> SmallVec<[Self; 2]> {
        let mut dependents = self.state.dependents.borrow_mut();
        dependents.retain(|d| d.strong_count() > 0);
        dependents
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|d| core::ptr::eq(d.source.borrow().as_ptr(), Rc::as_ptr(&self.state)))
            .map(Self::from_state)
            .collect()
    }

    /// Cuts every dependent loose; they keep their last value.
    pub(crate) fn orphan_dependents(&self) {
        let dependents = core::mem::take(&mut *self.state.dependents.borrow_mut());
        for dependent in dependents.iter().filter_map(Weak::upgrade) {
            *dependent.source.borrow_mut() = Weak::new();
        }
    }

    pub(crate) fn clear_listeners(&self) {
        self.state.listeners.borrow_mut().clear();
    }
}

impl<T: PropertyValue> Clone for PropertyCell<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: PropertyValue> fmt::Debug for PropertyCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyCell")
            .field("name", &self.name())
            .field("value", &*self.state.value.borrow())
            .field("local", &self.is_local())
            .field("forwarding", &self.is_forwarding())
            .finish_non_exhaustive()
    }
}

/// Type-erased view of a cell, as stored in a [`Schema`].
pub(crate) trait ErasedCell {
    fn value_type(&self) -> TypeId;

    fn type_name(&self) -> &'static str;

    fn is_local(&self) -> bool;

    /// Re-resolves the forwarding source against `parent` (or drops it).
    fn rebind(&self, parent: Option<&Schema>);

    /// Drops every link and listener; used when the container unloads.
    fn sever(&self);

    fn query_text(&self) -> String;

    fn as_any(&self) -> &dyn Any;
}

impl<T: PropertyValue> ErasedCell for PropertyCell<T> {
    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }

    fn is_local(&self) -> bool {
        Self::is_local(self)
    }

    fn rebind(&self, parent: Option<&Schema>) {
        self.detach();
        if let Some(parent) = parent
            && let Some(source) = parent.source_cell::<T>(&self.state.name)
        {
            self.bind(&source);
        }
    }

    fn sever(&self) {
        self.detach();
        self.orphan_dependents();
        self.clear_listeners();
    }

    fn query_text(&self) -> String {
        self.with_value(T::to_query_text)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn recorder<T: PropertyValue>(cell: &PropertyCell<T>) -> Rc<RefCell<Vec<(T, T)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        cell.on_changed(move |_, old, new| sink.borrow_mut().push((old.clone(), new.clone())));
        log
    }

    #[test]
    fn replace_notifies_only_on_change() {
        let cell = PropertyCell::new("Count", 1_i32, true);
        let log = recorder(&cell);

        cell.replace(1);
        assert!(log.borrow().is_empty());

        cell.replace(2);
        assert_eq!(*log.borrow(), [(1, 2)]);
    }

    #[test]
    fn bound_cell_mirrors_source() {
        let source = PropertyCell::new("Count", 5_i32, true);
        let mirror = PropertyCell::new("Count", 0_i32, false);
        mirror.bind(&source);
        assert!(mirror.is_forwarding());
        assert_eq!(mirror.value(), 5);

        let log = recorder(&mirror);
        source.replace(6);
        assert_eq!(mirror.value(), 6);
        assert_eq!(*log.borrow(), [(5, 6)]);
    }

    #[test]
    fn detach_keeps_last_value() {
        let source = PropertyCell::new("Count", 5_i32, true);
        let mirror = PropertyCell::new("Count", 0_i32, false);
        mirror.bind(&source);
        mirror.detach();

        source.replace(9);
        assert!(!mirror.is_forwarding());
        assert_eq!(mirror.value(), 5);
        assert_eq!(source.state.dependents.borrow().len(), 0);
    }

    #[test]
    fn make_local_severs_link() {
        let source = PropertyCell::new("Count", 5_i32, true);
        let mirror = PropertyCell::new("Count", 0_i32, false);
        mirror.bind(&source);
        mirror.make_local();
        assert!(mirror.is_local());
        assert!(!mirror.is_forwarding());

        source.replace(7);
        assert_eq!(mirror.value(), 5);
    }

    #[test]
    fn listener_removal() {
        let cell = PropertyCell::new("Flag", false, true);
        let first = cell.on_changed(|_, _, _| {});
        let _second = cell.on_changed(|_, _, _| {});
        assert_eq!(cell.listener_count(), 2);
        assert!(cell.remove_listener(first));
        assert!(!cell.remove_listener(first));
        assert_eq!(cell.listener_count(), 1);
    }

    #[test]
    fn listener_may_set_again() {
        let source = PropertyCell::new("Count", 0_i32, true);
        let mirror = PropertyCell::new("Count", 0_i32, false);
        mirror.bind(&source);

        let reentrant = source.clone();
        source.on_changed(move |_, _, new| {
            if *new == 1 {
                reentrant.replace(2);
            }
        });

        source.replace(1);
        assert_eq!(source.value(), 2);
        assert_eq!(mirror.value(), 2);
    }

    #[test]
    fn orphaned_dependents_stop_forwarding() {
        let source = PropertyCell::new("Name", String::from("a"), true);
        let mirror = PropertyCell::new("Name", String::new(), false);
        mirror.bind(&source);
        source.orphan_dependents();
        assert!(!mirror.is_forwarding());
        source.replace(String::from("b"));
        assert_eq!(mirror.value(), "a");
    }

    #[test]
    fn dropped_source_ends_forwarding() {
        let mirror = PropertyCell::new("Count", 0_i32, false);
        {
            let source = PropertyCell::new("Count", 3_i32, true);
            mirror.bind(&source);
        }
        assert!(!mirror.is_forwarding());
        assert_eq!(mirror.value(), 3);
    }
}
