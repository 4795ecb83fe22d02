// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for live forwarding through chains of wrapped schemas.
//!
//! These exercise propagation across several wrap levels, how local sets and
//! re-wrapping sever or restore links, and the order notifications arrive in.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use trellis_schema::{PropertyCell, PropertyValue, Schema};

fn count_changes<T: PropertyValue>(cell: &PropertyCell<T>) -> Rc<Cell<usize>> {
    let count = Rc::new(Cell::new(0));
    let sink = count.clone();
    cell.on_changed(move |_, _, _| sink.set(sink.get() + 1));
    count
}

fn chain() -> (Schema, Schema, Schema) {
    let a = Schema::new();
    let b = Schema::new();
    let c = Schema::new();
    b.wrap(&a).unwrap();
    c.wrap(&b).unwrap();
    (a, b, c)
}

#[test]
fn forwarding_is_transitive_and_notifies_each_level_once() {
    let (a, b, c) = chain();
    let ca = count_changes(&a.get::<String>("n"));
    let cb = count_changes(&b.get::<String>("n"));
    let cc = count_changes(&c.get::<String>("n"));

    a.set("n", String::from("v1"));

    assert_eq!(c.get::<String>("n").value(), "v1");
    assert_eq!((ca.get(), cb.get(), cc.get()), (1, 1, 1));
}

#[test]
fn local_set_on_leaf_breaks_only_the_leaf() {
    let (a, b, c) = chain();
    a.set("n", 1_i32);
    assert_eq!(c.get::<i32>("n").value(), 1);

    c.set("n", 2);
    a.set("n", 3);

    assert_eq!(c.get::<i32>("n").value(), 2);
    assert_eq!(b.get::<i32>("n").value(), 3);
    assert!(c.get::<i32>("n").is_local());
    assert!(b.get::<i32>("n").is_forwarding());
}

#[test]
fn local_set_in_the_middle_feeds_descendants() {
    let (a, b, c) = chain();
    a.set("n", 1_i32);
    let leaf = c.get::<i32>("n");

    b.set("n", 5);
    assert_eq!(leaf.value(), 5);

    a.set("n", 9);
    assert_eq!(leaf.value(), 5);

    b.set("n", 6);
    assert_eq!(leaf.value(), 6);
}

#[test]
fn rewrap_restores_forwarding_for_never_set_names() {
    let a = Schema::new();
    let b = Schema::new();
    a.set("k", String::from("a1"));
    b.set("k", String::from("b1"));
    a.set("pinned", 1_i32);

    let schema = Schema::new();
    schema.wrap(&a).unwrap();
    schema.set("pinned", 100_i32);
    let k = schema.get::<String>("k");

    schema.wrap(&b).unwrap();
    assert_eq!(k.value(), "b1");

    a.set("k", String::from("a2"));
    schema.wrap(&a).unwrap();
    assert_eq!(schema.get::<String>("k").value(), "a2");
    assert!(k.ptr_eq(&schema.get::<String>("k")));
    assert_eq!(schema.get::<i32>("pinned").value(), 100);

    a.set("k", String::from("a3"));
    assert_eq!(k.value(), "a3");
}

#[test]
fn type_pinning_ignores_later_sets_of_other_types() {
    let schema = Schema::new();
    schema.set("x", 5_i32);
    assert!(!schema.get::<bool>("x").value());

    schema.set("x", true);
    assert!(!schema.get::<bool>("x").value());
    assert_eq!(schema.get::<i32>("x").value(), 5);
}

#[test]
fn notifications_are_depth_first() {
    let a = Schema::new();
    let b1 = Schema::new();
    let b2 = Schema::new();
    let c1 = Schema::new();
    b1.wrap(&a).unwrap();
    b2.wrap(&a).unwrap();
    c1.wrap(&b1).unwrap();

    let order = Rc::new(RefCell::new(Vec::new()));
    for (label, schema) in [("a", &a), ("b1", &b1), ("c1", &c1), ("b2", &b2)] {
        let sink = order.clone();
        schema
            .get::<i32>("n")
            .on_changed(move |_, _, _| sink.borrow_mut().push(label));
    }

    a.set("n", 1);
    assert_eq!(*order.borrow(), ["a", "b1", "c1", "b2"]);
}

#[test]
fn listener_can_set_another_container() {
    let a = Schema::new();
    let mirror = Schema::new();
    let target = mirror.clone();
    a.get::<i32>("n")
        .on_changed(move |_, _, new| target.set("doubled", new * 2));

    a.set("n", 21);
    assert_eq!(mirror.get::<i32>("doubled").value(), 42);
}

#[test]
fn dropping_a_parent_ends_forwarding() {
    let child = Schema::new();
    let cell = {
        let parent = Schema::new();
        parent.set("n", 7_i32);
        child.wrap(&parent).unwrap();
        child.get::<i32>("n")
    };
    assert!(child.parent().is_none());
    assert!(!cell.is_forwarding());
    assert_eq!(cell.value(), 7);
}
