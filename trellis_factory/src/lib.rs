// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Factory: build element trees from declarative documents.
//!
//! A document ([`ElementDescription`]) pairs a table of reusable
//! [`ElementDefinition`]s with a tree of [`ElementReference`]s. The
//! [`ElementFactory`] resolves each reference against its definition, applies
//! the reference's property overrides, merges children by id and then
//! instantiates the result as a live [`Element`](trellis_element::Element)
//! tree.
//!
//! ```rust
//! use trellis_factory::ElementFactory;
//!
//! let tree = ElementFactory::new()
//!     .build_json(
//!         r#"{
//!             "root": { "id": "toolbar", "children": [{ "id": "save" }] },
//!             "definitions": [{
//!                 "id": "toolbar",
//!                 "schemaData": { "floats": { "Height": 24.0 } },
//!                 "children": [{ "id": "save" }, { "id": "open" }]
//!             }]
//!         }"#,
//!     )
//!     .unwrap();
//!
//! let ids: Vec<String> = tree.children().iter().map(|c| c.id().to_owned()).collect();
//! assert_eq!(ids, ["save", "open"]);
//!
//! // Properties are inherited live from the parent.
//! let save = tree.find_one("save").unwrap();
//! assert_eq!(save.schema().get::<f32>("Height").value(), 24.0);
//! ```

mod document;
mod error;
mod factory;
mod resolve;

pub use document::{ElementDefinition, ElementDescription, ElementReference};
pub use error::FactoryError;
pub use factory::{DEFAULT_MAX_DEPTH, ElementFactory, FactoryConfig, FactoryConfigBuilder};
