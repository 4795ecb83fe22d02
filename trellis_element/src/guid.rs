// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Process-unique element identity.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

// Pointer-width: not every `alloc` target has 64-bit atomics.
static NEXT_GUID: AtomicUsize = AtomicUsize::new(1);

/// A process-unique element identity.
///
/// Unlike an element's `id`, which repeats whenever a template is instantiated
/// more than once, a `Guid` is never shared by two elements.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Guid(usize);

impl Guid {
    /// Allocates a fresh identity.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_GUID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[must_use]
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Guid").field(&self.0).finish()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn guids_are_unique_and_increasing() {
        let a = Guid::next();
        let b = Guid::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn guids_are_unique_across_threads() {
        extern crate std;
        use alloc::vec::Vec;

        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..100).map(|_| Guid::next()).collect::<Vec<_>>()))
            .collect();
        let mut all: Vec<Guid> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 400);
    }

    #[test]
    fn guid_display_is_hex() {
        let text = format!("{}", Guid(255));
        assert_eq!(text, "00000000000000ff");
    }
}
