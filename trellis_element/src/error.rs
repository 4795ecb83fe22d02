// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by tree operations.

use alloc::string::String;

use trellis_schema::SchemaError;

/// A caller error in a tree mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElementError {
    /// The child is the parent itself or one of its ancestors.
    #[error("cannot add `{child}` under `{parent}`: it is that element or one of its ancestors")]
    Cycle {
        /// Id of the element the child was being added to.
        parent: String,
        /// Id of the rejected child.
        child: String,
    },
    /// The operation involved an element that was destroyed.
    #[error("element `{id}` has been destroyed")]
    Destroyed {
        /// Id of the destroyed element.
        id: String,
    },
    /// Wrapping the child's schema failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
