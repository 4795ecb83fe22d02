// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value types that can live in a property cell.
//!
//! This module provides [`PropertyValue`], the bound every cell value type
//! satisfies, and [`Vec3`], the vector type used by [`SchemaData`](crate::SchemaData).

use alloc::format;
use alloc::string::{String, ToString};
use core::fmt;

use peniko::Color;
use serde::{Deserialize, Serialize};

/// A type that can be stored in a [`PropertyCell`](crate::PropertyCell).
///
/// A container keys cells by name and pins each name to the type it was first
/// used with. Implementations decide what the "zero" value is, how two values compare for
/// change notification, and which text a query predicate compares against.
///
/// # Example
///
/// ```rust
/// use trellis_schema::PropertyValue;
///
/// assert_eq!(i32::default_value(), 0);
/// assert!(3.5_f32.value_eq(&3.5));
/// assert_eq!(42_i32.to_query_text(), "42");
/// ```
pub trait PropertyValue: Clone + fmt::Debug + 'static {
    /// The value a cell holds before anything sets it.
    fn default_value() -> Self;

    /// Returns `true` if `self` and `other` are the same value.
    ///
    /// A `set` with an equal value does not notify listeners.
    fn value_eq(&self, other: &Self) -> bool;

    /// The text form compared by `(@name=value)` query predicates.
    fn to_query_text(&self) -> String;
}

macro_rules! impl_property_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PropertyValue for $ty {
                #[inline]
                fn default_value() -> Self {
                    <$ty>::default()
                }

                #[inline]
                fn value_eq(&self, other: &Self) -> bool {
                    self == other
                }

                fn to_query_text(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_property_value!(String, bool, i32, i64, u32, f32, f64);

/// A three component vector, serialized as `[x, y, z]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a vector from its components.
    #[must_use]
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3> for [f32; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl PropertyValue for Vec3 {
    fn default_value() -> Self {
        Self::ZERO
    }

    fn value_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn to_query_text(&self) -> String {
        self.to_string()
    }
}

impl PropertyValue for Color {
    fn default_value() -> Self {
        Self::new([0.0; 4])
    }

    fn value_eq(&self, other: &Self) -> bool {
        self.components == other.components
    }

    fn to_query_text(&self) -> String {
        let [r, g, b, a] = self.components;
        format!("{r},{g},{b},{a}")
    }
}
