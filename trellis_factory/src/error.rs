// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use trellis_element::ElementError;

/// Errors produced while reading, resolving or building a document.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// A reference named an id with no definition in scope.
    ///
    /// `path` is the dotted chain of reference ids from the root down to and
    /// including the failing one.
    #[error("no definition `{id}` in scope for reference `{path}`")]
    MissingDefinition {
        /// The unresolved id.
        id: String,
        /// Reference path from the root.
        path: String,
    },
    /// The reference tree nests deeper than the configured limit.
    #[error("reference tree exceeds the depth limit of {limit}")]
    TooDeep {
        /// The configured limit.
        limit: usize,
    },
    /// The document text is not valid JSON for the document model.
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),
    /// Assembling the element tree failed.
    #[error(transparent)]
    Element(#[from] ElementError),
}
