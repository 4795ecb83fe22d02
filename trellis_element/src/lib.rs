// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Element: addressable element trees with inherited properties.
//!
//! An [`Element`] is one node of a tree. It owns a [`Schema`](trellis_schema::Schema)
//! and an ordered list of children. Attaching a child wraps its schema with
//! the parent's, so property values flow down the tree live until an element
//! overrides them locally.
//!
//! - [`Element::add_child`] / [`Element::remove_child`] mutate the tree and
//!   fire bubbling events.
//! - [`Element::find`] / [`Element::find_one`] evaluate path queries
//!   (see [`Query`]).
//! - [`Element::destroy`] tears a subtree down.
//!
//! ## Events
//!
//! - `removed(element)` fires on the element that was directly removed.
//! - `child_added(root, child)` and `child_removed(root, child)` fire on the
//!   parent and then on every ancestor, with `root` rebound at each level.
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use trellis_element::Element;
//!
//! let root = Element::new("root");
//! let list = Element::new("list");
//! root.add_child(&list).unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! root.on_child_added(move |root, child| {
//!     sink.borrow_mut().push((root.id().to_owned(), child.id().to_owned()));
//! });
//!
//! list.add_child(&Element::new("item")).unwrap();
//! assert_eq!(*seen.borrow(), [("root".to_owned(), "item".to_owned())]);
//! ```
//!
//! ## Queries
//!
//! ```rust
//! use trellis_element::Element;
//!
//! let root = Element::new("root");
//! let menu = Element::new("menu");
//! let save = Element::new("save");
//! save.schema().set("Shortcut", String::from("ctrl+s"));
//! root.add_child(&menu).unwrap();
//! menu.add_child(&save).unwrap();
//!
//! assert_eq!(root.find_one("menu.save"), Some(save.clone()));
//! assert_eq!(root.find_one("..save"), Some(save.clone()));
//! assert_eq!(root.find_one("..(@Shortcut=ctrl+s)"), Some(save));
//! assert!(root.find("menu..menu").is_empty());
//! ```
//!
//! ## Threading
//!
//! Trees are single-threaded (`!Send`, `!Sync`) and every operation is
//! synchronous.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod element;
mod error;
mod events;
mod guid;
mod query;

pub use element::{Descendants, Element};
pub use error::ElementError;
pub use events::{ChildHandler, RemovedHandler};
pub use guid::Guid;
pub use query::{Axis, Query, QueryError, Segment, Step};
