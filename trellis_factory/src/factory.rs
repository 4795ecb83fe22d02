// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning documents into live element trees.

use log::debug;
use trellis_element::Element;

use crate::document::{ElementDefinition, ElementDescription};
use crate::error::FactoryError;
use crate::resolve::Resolver;

/// Default limit on reference nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Settings for an [`ElementFactory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FactoryConfig {
    max_depth: usize,
}

impl FactoryConfig {
    /// Starts a builder from the defaults.
    #[must_use]
    pub fn builder() -> FactoryConfigBuilder {
        FactoryConfigBuilder::new()
    }

    /// Deepest reference nesting accepted before resolution fails with
    /// [`FactoryError::TooDeep`]. The root counts as depth 1.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Builder for [`FactoryConfig`].
#[derive(Clone, Debug, Default)]
pub struct FactoryConfigBuilder {
    config: FactoryConfig,
}

impl FactoryConfigBuilder {
    /// Creates a builder holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reference nesting limit. Values below 1 are raised to 1.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth.max(1);
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> FactoryConfig {
        self.config
    }
}

/// Builds element trees from [`ElementDescription`]s.
///
/// Building happens in two passes. The reference tree is first resolved into
/// one self-contained [`ElementDefinition`] tree; nothing is instantiated
/// until that succeeds, so a failing document never produces a partial tree.
/// The resolved tree is then instantiated bottom-up.
///
/// # Example
///
/// ```rust
/// use trellis_factory::{ElementDefinition, ElementDescription, ElementFactory, ElementReference};
/// use trellis_schema::SchemaData;
///
/// let button = ElementDefinition::new("button")
///     .with_schema(SchemaData::new().with_string("Label", "?"));
/// let dialog = ElementDefinition::new("dialog").with_child(button);
/// let root = ElementReference::new("dialog").with_child(
///     ElementReference::new("button").with_overrides(SchemaData::new().with_string("Label", "OK")),
/// );
///
/// let tree = ElementFactory::new()
///     .build(&ElementDescription::new(root, vec![dialog]))
///     .unwrap();
/// let ok = tree.find_one("button").unwrap();
/// assert_eq!(ok.schema().get::<String>("Label").value(), "OK");
/// ```
#[derive(Clone, Debug, Default)]
pub struct ElementFactory {
    config: FactoryConfig,
}

impl ElementFactory {
    /// Creates a factory with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory with `config`.
    #[must_use]
    pub fn with_config(config: FactoryConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Resolves the description's reference tree into a definition tree.
    ///
    /// # Errors
    ///
    /// - [`FactoryError::MissingDefinition`] when a reference has no matching
    ///   definition in scope.
    /// - [`FactoryError::TooDeep`] when the reference tree nests past
    ///   [`FactoryConfig::max_depth`].
    pub fn resolve(&self, description: &ElementDescription) -> Result<ElementDefinition, FactoryError> {
        Resolver::new(self.config.max_depth).resolve(&description.root, &description.definitions)
    }

    /// Resolves and instantiates a description.
    ///
    /// # Errors
    ///
    /// See [`ElementFactory::resolve`].
    pub fn build(&self, description: &ElementDescription) -> Result<Element, FactoryError> {
        let resolved = self.resolve(description)?;
        let element = self.instantiate(&resolved)?;
        debug!(root = resolved.id.as_str(), elements = resolved.count(); "element tree built");
        Ok(element)
    }

    /// Parses a JSON document and builds it.
    ///
    /// # Errors
    ///
    /// [`FactoryError::Json`] for malformed documents, otherwise see
    /// [`ElementFactory::resolve`].
    pub fn build_json(&self, text: &str) -> Result<Element, FactoryError> {
        self.build(&ElementDescription::from_json(text)?)
    }

    /// Instantiates an already resolved definition tree.
    ///
    /// Children are created first, then the element loads its own properties
    /// and adopts them in order.
    ///
    /// # Errors
    ///
    /// [`FactoryError::Element`] if the tree cannot be assembled. Fresh
    /// elements cannot form cycles, so this does not happen in practice.
    pub fn instantiate(&self, definition: &ElementDefinition) -> Result<Element, FactoryError> {
        let children = definition
            .children
            .iter()
            .map(|child| self.instantiate(child))
            .collect::<Result<Vec<_>, _>>()?;
        let element = Element::new(definition.id.clone());
        element.schema().load(&definition.schema_data);
        for child in &children {
            element.add_child(child)?;
        }
        Ok(element)
    }
}
