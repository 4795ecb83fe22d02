// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The declarative document model.
//!
//! A document has two parts:
//!
//! - a flat table of [`ElementDefinition`]s: what things *are*;
//! - a tree of [`ElementReference`]s rooted at
//!   [`ElementDescription::root`]: which definitions to instantiate, in what
//!   shape, with which per-instance overrides.
//!
//! ```json
//! {
//!   "root": { "id": "dialog", "children": [{ "id": "button", "schemaOverrides": { "strings": { "Label": "OK" } } }] },
//!   "definitions": [
//!     { "id": "dialog", "children": [{ "id": "button", "schemaData": { "strings": { "Label": "?" } } }] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use trellis_schema::SchemaData;

use crate::error::FactoryError;

/// What an element is: its id, its own children and its properties.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinition {
    /// Id the definition is looked up by.
    pub id: String,
    /// Nested definitions, instantiated as children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
    /// Properties loaded into the element's schema.
    #[serde(default, skip_serializing_if = "SchemaData::is_empty")]
    pub schema_data: SchemaData,
}

impl ElementDefinition {
    /// Creates a definition with no children or properties.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Appends a nested definition.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Replaces the properties.
    #[must_use]
    pub fn with_schema(mut self, data: SchemaData) -> Self {
        self.schema_data = data;
        self
    }

    /// Returns the first direct child definition with `id`.
    #[must_use]
    pub fn child(&self, id: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.id == id)
    }

    /// Returns the number of definitions in this subtree, including `self`.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

/// Which definition to instantiate, and in what shape.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementReference {
    /// Id of the definition to instantiate.
    pub id: String,
    /// Child references, resolved against the definition's own children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
    /// Properties composed over the definition's, winning on collision.
    #[serde(default, skip_serializing_if = "SchemaData::is_empty")]
    pub schema_overrides: SchemaData,
}

impl ElementReference {
    /// Creates a reference with no children or overrides.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Appends a child reference.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Replaces the overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: SchemaData) -> Self {
        self.schema_overrides = overrides;
        self
    }
}

/// A complete document: a reference tree and the definition table it uses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDescription {
    /// Root of the reference tree.
    pub root: ElementReference,
    /// Top-level definitions, looked up by id.
    #[serde(default)]
    pub definitions: Vec<ElementDefinition>,
}

impl ElementDescription {
    /// Creates a description.
    #[must_use]
    pub fn new(root: ElementReference, definitions: Vec<ElementDefinition>) -> Self {
        Self { root, definitions }
    }

    /// Returns the first top-level definition with `id`.
    #[must_use]
    pub fn definition(&self, id: &str) -> Option<&ElementDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::Json`] if the text is not a valid document.
    pub fn from_json(text: &str) -> Result<Self, FactoryError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes the document as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, FactoryError> {
        Ok(serde_json::to_string(self)?)
    }
}
