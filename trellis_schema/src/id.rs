// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener identification.

use core::fmt;

/// Identifies one listener registered on a [`PropertyCell`](crate::PropertyCell).
///
/// Returned by [`PropertyCell::on_changed`](crate::PropertyCell::on_changed) and
/// accepted by [`PropertyCell::remove_listener`](crate::PropertyCell::remove_listener).
/// Identifiers are only unique within the cell that issued them.
///
/// # Example
///
/// ```rust
/// use trellis_schema::ListenerId;
///
/// let id = ListenerId::new(7);
/// assert_eq!(id.index(), 7);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u32);

impl ListenerId {
    /// Creates a listener ID from a raw index.
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns the ID following this one.
    #[must_use]
    #[inline]
    pub(crate) const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListenerId").field(&self.0).finish()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}
