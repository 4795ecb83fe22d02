// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree mutation events.
//!
//! Every element carries three listener lists:
//!
//! - `removed(element)` - fired once, on the element that was removed
//! - `child_added(root, child)` - fired on the parent, then bubbled
//! - `child_removed(root, child)` - fired on the parent, then bubbled
//!
//! Bubbling walks from the element where the mutation happened up to the top
//! of the attached subtree. At each level `root` is rebound to that ancestor
//! while `child` stays the element that was actually added or removed.
//!
//! The bubble path is collected before any handler runs, so handlers that
//! re-parent elements do not change who receives the current event.

use alloc::rc::Rc;
use alloc::vec::Vec;

use smallvec::SmallVec;
use trellis_schema::ListenerId;

use crate::element::Element;

/// Handler for `removed` events.
pub type RemovedHandler = Rc<dyn Fn(&Element)>;

/// Handler for `child_added` and `child_removed` events: `(root, child)`.
pub type ChildHandler = Rc<dyn Fn(&Element, &Element)>;

/// Which bubbling event is being dispatched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ChildEvent {
    Added,
    Removed,
}

#[derive(Default)]
pub(crate) struct Listeners {
    next: u32,
    removed: SmallVec<[(ListenerId, RemovedHandler); 1]>,
    child_added: SmallVec<[(ListenerId, ChildHandler); 1]>,
    child_removed: SmallVec<[(ListenerId, ChildHandler); 1]>,
}

impl Listeners {
    fn next_id(&mut self) -> ListenerId {
        let id = ListenerId::new(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    pub(crate) fn add_removed(&mut self, handler: RemovedHandler) -> ListenerId {
        let id = self.next_id();
        self.removed.push((id, handler));
        id
    }

    pub(crate) fn add_child(&mut self, event: ChildEvent, handler: ChildHandler) -> ListenerId {
        let id = self.next_id();
        match event {
            ChildEvent::Added => self.child_added.push((id, handler)),
            ChildEvent::Removed => self.child_removed.push((id, handler)),
        }
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.len();
        self.removed.retain(|(lid, _)| *lid != id);
        self.child_added.retain(|(lid, _)| *lid != id);
        self.child_removed.retain(|(lid, _)| *lid != id);
        self.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.removed.len() + self.child_added.len() + self.child_removed.len()
    }

    pub(crate) fn clear(&mut self) {
        self.removed.clear();
        self.child_added.clear();
        self.child_removed.clear();
    }

    pub(crate) fn removed_handlers(&self) -> SmallVec<[RemovedHandler; 1]> {
        self.removed.iter().map(|(_, h)| h.clone()).collect()
    }

    pub(crate) fn child_handlers(&self, event: ChildEvent) -> SmallVec<[ChildHandler; 1]> {
        let list = match event {
            ChildEvent::Added => &self.child_added,
            ChildEvent::Removed => &self.child_removed,
        };
        list.iter().map(|(_, h)| h.clone()).collect()
    }
}

/// Fires `event` on `origin` and every ancestor of it, innermost first.
pub(crate) fn bubble(origin: &Element, event: ChildEvent, child: &Element) {
    let mut path: Vec<Element> = Vec::new();
    let mut current = Some(origin.clone());
    while let Some(element) = current {
        current = element.parent();
        path.push(element);
    }
    for root in &path {
        for handler in root.child_handlers(event) {
            handler(root, child);
        }
    }
}
