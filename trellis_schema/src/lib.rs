// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Schema: typed property containers with live inheritance.
//!
//! This crate provides the property layer of Trellis: named, typed cells with
//! change notification, grouped into containers that can inherit from one
//! another. Trees of elements (`trellis_element`) give each element one
//! container and wrap it with the parent element's container.
//!
//! ## Core Concepts
//!
//! ### Cells
//!
//! A [`PropertyCell<T>`] holds one value and notifies listeners when it
//! changes. A cell is either:
//!
//! - **Local** - set explicitly on its container
//! - **Forwarding** - mirroring the cell of the same name in the wrapped parent
//!
//! ### Containers
//!
//! [`Schema`] maps names to cells. Cells are created lazily on first `get` or
//! `set`, and the first access pins the type of a name.
//!
//! - `get::<T>(name)` - the cell for `name`, always the same instance
//! - `set::<T>(name, value)` - set locally, severing any forwarding
//! - `wrap(parent)` - forward every non-local name from `parent`
//! - `load(data)` - batch `set` from [`SchemaData`]
//!
//! ## Quick Start
//!
//! ```rust
//! use trellis_schema::Schema;
//!
//! let a = Schema::new();
//! let b = Schema::new();
//! let c = Schema::new();
//! b.wrap(&a).unwrap();
//! c.wrap(&b).unwrap();
//!
//! a.set("Opacity", 0.5_f32);
//! let opacity = c.get::<f32>("Opacity");
//! assert_eq!(opacity.value(), 0.5);
//!
//! // Propagation is push-based and synchronous.
//! a.set("Opacity", 1.0_f32);
//! assert_eq!(opacity.value(), 1.0);
//!
//! // A local set on `c` only affects `c`.
//! c.set("Opacity", 0.25_f32);
//! a.set("Opacity", 0.75_f32);
//! assert_eq!(opacity.value(), 0.25);
//! assert_eq!(b.get::<f32>("Opacity").value(), 0.75);
//! ```
//!
//! ## Type mismatches
//!
//! Reading a name with a type other than the pinned one yields a shared
//! default-valued cell; writing it with another type is ignored. Neither
//! is an error.
//!
//! ## Threading
//!
//! Containers are single-threaded (`!Send`, `!Sync`). Notification runs
//! synchronously on the stack of the `set` that caused it.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod cell;
mod data;
mod id;
mod schema;
mod value;

pub use cell::{ChangedCallback, PropertyCell};
pub use data::SchemaData;
pub use id::ListenerId;
pub use peniko::Color;
pub use schema::{Schema, SchemaError};
pub use value::{PropertyValue, Vec3};
