// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handler identity: generational keys issued at registration time.

use core::fmt;

/// Identifier for a registered event handler.
///
/// This is a small, copyable handle issued by [`EventQueue::register`](crate::EventQueue::register).
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On register, a fresh slot is allocated with generation `1`.
/// - On unregister, the slot is freed; any existing `HandlerKey` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `HandlerKey`.
///
/// Equality and hashing cover both the slot and the generation, so two
/// registrations never compare equal even when they share a slot.
/// Copies of a key are the same identity; there is no other way to obtain
/// a key that compares equal to it.
///
/// ### Liveness
///
/// Use [`EventQueue::is_registered`](crate::EventQueue::is_registered) to check whether a key still refers to a live registration.
/// Stale keys never alias a different live registration because the generation must match.
///
/// ### Notes
///
/// - The generation increments on slot reuse and never decreases.
/// - A slot whose generation would overflow is retired rather than reused.
/// - Keys are only meaningful to the queue that issued them. Presenting a key
///   to a different queue is not detected and may address an unrelated handler.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct HandlerKey(u32, u32);

impl HandlerKey {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Returns the slot index of this key.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns the generation of this key.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.1
    }
}

impl fmt::Debug for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerKey({}v{})", self.0, self.1)
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use hashbrown::HashSet;

    #[test]
    fn equality_covers_generation() {
        let a = HandlerKey::new(3, 1);
        let b = HandlerKey::new(3, 2);
        assert_ne!(a, b);
        assert_eq!(a, HandlerKey::new(3, 1));
    }

    #[test]
    fn hashing_distinguishes_generations() {
        let mut set = HashSet::new();
        set.insert(HandlerKey::new(0, 1));
        set.insert(HandlerKey::new(0, 2));
        set.insert(HandlerKey::new(0, 1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn debug_and_display() {
        let key = HandlerKey::new(7, 2);
        assert_eq!(format!("{key:?}"), "HandlerKey(7v2)");
        assert_eq!(format!("{key}"), "7v2");
        assert_eq!(key.index(), 7);
        assert_eq!(key.generation(), 2);
        assert_eq!(key.idx(), 7);
    }
}
