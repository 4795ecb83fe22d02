// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative property data.
//!
//! [`SchemaData`] is the typed-map form properties take inside documents. It is
//! applied to a live container with [`Schema::load`](crate::Schema::load).

use alloc::collections::BTreeMap;
use alloc::string::String;

use serde::{Deserialize, Serialize};

use crate::value::Vec3;

/// Typed property maps, one per recognized value type.
///
/// Serialized with camelCase keys; every map may be omitted.
///
/// ```json
/// { "strings": { "Letter": "a" }, "ints": { "Foo": 0 }, "colors": { "Tint": [1, 0, 0, 1] } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaData {
    /// String properties.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub strings: BTreeMap<String, String>,
    /// Integer properties.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub ints: BTreeMap<String, i32>,
    /// Floating point properties.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub floats: BTreeMap<String, f32>,
    /// Boolean properties.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bools: BTreeMap<String, bool>,
    /// Vector properties, `[x, y, z]`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub vectors: BTreeMap<String, Vec3>,
    /// Color properties, `[r, g, b, a]` in sRGB.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub colors: BTreeMap<String, [f32; 4]>,
}

impl SchemaData {
    /// Creates empty data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if every map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the total number of entries across all maps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
            + self.ints.len()
            + self.floats.len()
            + self.bools.len()
            + self.vectors.len()
            + self.colors.len()
    }

    /// Writes every entry of `overrides` over `self`.
    ///
    /// Keys are compared per map: an override in `ints` replaces an entry in
    /// `ints` only.
    pub fn compose(&mut self, overrides: &Self) {
        fn merge<V: Clone>(into: &mut BTreeMap<String, V>, from: &BTreeMap<String, V>) {
            into.extend(from.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merge(&mut self.strings, &overrides.strings);
        merge(&mut self.ints, &overrides.ints);
        merge(&mut self.floats, &overrides.floats);
        merge(&mut self.bools, &overrides.bools);
        merge(&mut self.vectors, &overrides.vectors);
        merge(&mut self.colors, &overrides.colors);
    }

    /// Returns a copy of `self` with `overrides` composed on top.
    #[must_use]
    pub fn composed(&self, overrides: &Self) -> Self {
        let mut out = self.clone();
        out.compose(overrides);
        out
    }

    /// Adds a string entry.
    #[must_use]
    pub fn with_string(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.strings.insert(name.into(), value.into());
        self
    }

    /// Adds an integer entry.
    #[must_use]
    pub fn with_int(mut self, name: impl Into<String>, value: i32) -> Self {
        self.ints.insert(name.into(), value);
        self
    }

    /// Adds a float entry.
    #[must_use]
    pub fn with_float(mut self, name: impl Into<String>, value: f32) -> Self {
        self.floats.insert(name.into(), value);
        self
    }

    /// Adds a boolean entry.
    #[must_use]
    pub fn with_bool(mut self, name: impl Into<String>, value: bool) -> Self {
        self.bools.insert(name.into(), value);
        self
    }

    /// Adds a vector entry.
    #[must_use]
    pub fn with_vector(mut self, name: impl Into<String>, value: Vec3) -> Self {
        self.vectors.insert(name.into(), value);
        self
    }

    /// Adds a color entry.
    #[must_use]
    pub fn with_color(mut self, name: impl Into<String>, rgba: [f32; 4]) -> Self {
        self.colors.insert(name.into(), rgba);
        self
    }
}
