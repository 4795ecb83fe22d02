// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path queries over element trees.
//!
//! A query is a sequence of segments joined by `.` (direct child) or `..`
//! (any descendant). A leading `..` makes the first segment search the whole
//! subtree instead of the direct children. A segment is either:
//!
//! - an id, matching elements whose id is exactly that text;
//! - a predicate `(@Name=value)`, matching elements whose property `Name`
//!   reads as `value` (see [`Schema::query_text`](trellis_schema::Schema::query_text)).
//!
//! ```text
//! query     := ['..'] segment (('.' | '..') segment)*
//! segment   := ident | '(' '@' ident ('=' | '==') value ')'
//! ```
//!
//! The relational comparisons `<`, `>`, `<=`, `>=` and index slices
//! `[start:end]` are recognized and rejected.
//!
//! # Evaluation
//!
//! Evaluation keeps a frontier, starting as `{origin}`. Each step replaces the
//! frontier with the matches found among the children (or all descendants) of
//! the current frontier, left to right with no backtracking. An empty frontier
//! ends evaluation with an empty result.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::element::Element;

/// Errors produced while parsing a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The query has no segments.
    #[error("query is empty")]
    Empty,
    /// The query stops in the middle of a segment or after a separator.
    #[error("query ends unexpectedly")]
    UnexpectedEnd,
    /// A character that cannot appear at this position.
    #[error("unexpected `{found}` at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        found: char,
        /// Byte offset into the query.
        offset: usize,
    },
    /// More than two dots in a row.
    #[error("empty path segment at offset {offset}")]
    EmptySegment {
        /// Byte offset into the query.
        offset: usize,
    },
    /// A relational comparison; only equality is evaluated.
    #[error("comparison `{op}` at offset {offset} is not supported")]
    UnsupportedOperator {
        /// The operator as written.
        op: &'static str,
        /// Byte offset into the query.
        offset: usize,
    },
    /// An index slice such as `[0:2]`.
    #[error("index slice at offset {offset} is not supported")]
    UnsupportedSlice {
        /// Byte offset into the query.
        offset: usize,
    },
}

/// How a step relates to the current frontier.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Direct children of frontier elements.
    Child,
    /// Descendants at any depth of frontier elements.
    Descendant,
}

/// What a step matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Elements whose id equals this text.
    Id(String),
    /// Elements whose property `name` reads as `value`.
    Property {
        /// Property name, without the `@`.
        name: String,
        /// Expected text.
        value: String,
    },
}

impl Segment {
    /// Returns `true` if `element` satisfies this segment.
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Id(id) => element.id() == id,
            Self::Property { name, value } => element
                .schema()
                .query_text(name)
                .is_some_and(|text| text == *value),
        }
    }
}

/// One segment together with its axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    /// Where to look.
    pub axis: Axis,
    /// What to match.
    pub segment: Segment,
}

/// A parsed path query.
///
/// # Example
///
/// ```rust
/// use trellis_element::{Axis, Element, Query};
///
/// let query = Query::parse("..panel.(@Kind=button)").unwrap();
/// assert_eq!(query.steps().len(), 2);
/// assert_eq!(query.steps()[0].axis, Axis::Descendant);
/// assert_eq!(query.to_string(), "..panel.(@Kind=button)");
///
/// let root = Element::new("root");
/// let panel = Element::new("panel");
/// let ok = Element::new("ok");
/// ok.schema().set("Kind", String::from("button"));
/// root.add_child(&panel).unwrap();
/// panel.add_child(&ok).unwrap();
/// assert_eq!(query.evaluate(&root), vec![ok]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    steps: Vec<Step>,
}

impl Query {
    /// Parses query text.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] describing the first problem found.
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        Parser::new(text).query()
    }

    /// Returns the parsed steps.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Evaluates the query starting from `origin`.
    ///
    /// Results are in discovery order without duplicates.
    #[must_use]
    pub fn evaluate(&self, origin: &Element) -> Vec<Element> {
        let mut frontier = Vec::from([origin.clone()]);
        for step in &self.steps {
            let mut seen = BTreeSet::new();
            let mut next = Vec::new();
            for element in &frontier {
                let mut visit = |candidate: Element| {
                    if step.segment.matches(&candidate) && seen.insert(candidate.guid()) {
                        next.push(candidate);
                    }
                };
                match step.axis {
                    Axis::Child => element.children().into_iter().for_each(&mut visit),
                    Axis::Descendant => element.descendants().for_each(&mut visit),
                }
            }
            if next.is_empty() {
                return next;
            }
            frontier = next;
        }
        frontier
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match (i, step.axis) {
                (_, Axis::Descendant) => f.write_str("..")?,
                (0, Axis::Child) => {}
                (_, Axis::Child) => f.write_str(".")?,
            }
            match &step.segment {
                Segment::Id(id) => f.write_str(id)?,
                Segment::Property { name, value } => write!(f, "(@{name}={value})")?,
            }
        }
        Ok(())
    }
}

fn is_reserved(c: char) -> bool {
    matches!(c, '.' | '(' | ')' | '[' | ']' | '@' | '=' | '<' | '>') || c.is_whitespace()
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn unexpected(&self) -> QueryError {
        match self.peek() {
            Some(found) => QueryError::UnexpectedChar {
                found,
                offset: self.pos,
            },
            None => QueryError::UnexpectedEnd,
        }
    }

    fn query(mut self) -> Result<Query, QueryError> {
        self.skip_whitespace();
        if self.src[self.pos..].trim_end().is_empty() {
            return Err(QueryError::Empty);
        }
        self.src = self.src.trim_end();

        let mut steps = Vec::new();
        let mut axis = if self.eat("..") {
            Axis::Descendant
        } else {
            Axis::Child
        };
        loop {
            let segment = self.segment()?;
            steps.push(Step { axis, segment });
            if self.pos == self.src.len() {
                break;
            }
            axis = if self.eat("..") {
                Axis::Descendant
            } else if self.eat(".") {
                Axis::Child
            } else if self.peek() == Some('[') {
                return Err(QueryError::UnsupportedSlice { offset: self.pos });
            } else {
                return Err(self.unexpected());
            };
        }
        Ok(Query { steps })
    }

    fn segment(&mut self) -> Result<Segment, QueryError> {
        match self.peek() {
            None => Err(QueryError::UnexpectedEnd),
            Some('.') => Err(QueryError::EmptySegment { offset: self.pos }),
            Some('[') => Err(QueryError::UnsupportedSlice { offset: self.pos }),
            Some('(') => self.predicate(),
            Some(_) => self.ident().map(|id| Segment::Id(String::from(id))),
        }
    }

    fn ident(&mut self) -> Result<&'a str, QueryError> {
        let rest = self.rest();
        let len = rest.find(is_reserved).unwrap_or(rest.len());
        if len == 0 {
            return Err(self.unexpected());
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn predicate(&mut self) -> Result<Segment, QueryError> {
        self.eat("(");
        self.skip_whitespace();
        if !self.eat("@") {
            return Err(self.unexpected());
        }
        let name = String::from(self.ident()?);
        self.skip_whitespace();

        let offset = self.pos;
        for op in ["<=", ">=", "<", ">"] {
            if self.rest().starts_with(op) {
                return Err(QueryError::UnsupportedOperator { op, offset });
            }
        }
        if !(self.eat("==") || self.eat("=")) {
            return Err(self.unexpected());
        }

        let rest = self.rest();
        let Some(close) = rest.find(')') else {
            return Err(QueryError::UnexpectedEnd);
        };
        let value = unquote(rest[..close].trim());
        self.pos += close + 1;
        Ok(Segment::Property {
            name,
            value: String::from(value),
        })
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
