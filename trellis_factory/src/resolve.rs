// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference resolution.
//!
//! Resolving turns a reference tree into a single self-contained definition
//! tree. Each reference is matched by id against a scope: the top-level
//! definition table for the root, and the matched definition's own children
//! for everything below it. Children are merged by id. Every reference child
//! is kept in order, followed by the first definition child of each id that
//! no reference child mentions. Later definition siblings with an id already
//! emitted are dropped.

use hashbrown::HashSet;
use log::trace;

use crate::document::{ElementDefinition, ElementReference};
use crate::error::FactoryError;

pub(crate) struct Resolver {
    max_depth: usize,
    path: Vec<String>,
}

impl Resolver {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            path: Vec::new(),
        }
    }

    pub(crate) fn resolve(
        &mut self,
        reference: &ElementReference,
        scope: &[ElementDefinition],
    ) -> Result<ElementDefinition, FactoryError> {
        self.path.push(reference.id.clone());
        let resolved = self.resolve_in(reference, scope);
        self.path.pop();
        resolved
    }

    fn resolve_in(
        &mut self,
        reference: &ElementReference,
        scope: &[ElementDefinition],
    ) -> Result<ElementDefinition, FactoryError> {
        if self.path.len() > self.max_depth {
            return Err(FactoryError::TooDeep {
                limit: self.max_depth,
            });
        }
        let Some(definition) = scope.iter().find(|d| d.id == reference.id) else {
            return Err(FactoryError::MissingDefinition {
                id: reference.id.clone(),
                path: self.path.join("."),
            });
        };
        trace!(id = reference.id.as_str(), depth = self.path.len(); "resolving reference");

        let mut children = Vec::with_capacity(reference.children.len() + definition.children.len());
        for child in &reference.children {
            children.push(self.resolve(child, &definition.children)?);
        }
        let mut seen: HashSet<&str> = reference.children.iter().map(|c| c.id.as_str()).collect();
        children.extend(
            definition
                .children
                .iter()
                .filter(|c| seen.insert(c.id.as_str()))
                .map(unique_children),
        );

        Ok(ElementDefinition {
            id: definition.id.clone(),
            children,
            schema_data: definition.schema_data.composed(&reference.schema_overrides),
        })
    }
}

/// Copies an unreferenced definition subtree, keeping only the first child
/// of each id at every level.
fn unique_children(definition: &ElementDefinition) -> ElementDefinition {
    let mut seen = HashSet::new();
    ElementDefinition {
        id: definition.id.clone(),
        children: definition
            .children
            .iter()
            .filter(|c| seen.insert(c.id.as_str()))
            .map(unique_children)
            .collect(),
        schema_data: definition.schema_data.clone(),
    }
}
