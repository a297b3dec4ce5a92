// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delivery outcomes and registration errors.

use crate::key::HandlerKey;

/// Error returned by registration management on an [`EventQueue`](crate::EventQueue).
///
/// Retrieval and enqueue never produce this; see [`Delivery`] for enqueue outcomes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The key was never issued by this queue, or its registration has ended.
    #[error("handler key {key} is not registered")]
    StaleKey {
        /// The offending key.
        key: HandlerKey,
    },
    /// Every slot index has been issued and none can be reused.
    #[error("no handler slots left to register")]
    SlotsExhausted,
}

/// Why an event was not queued.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// The target key is unknown, stale, or unregistered.
    Unregistered,
    /// The target's pending queue is full and the policy is
    /// [`OverflowPolicy::DropNewest`](crate::OverflowPolicy::DropNewest).
    Full,
}

/// Outcome of enqueueing a single event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[must_use = "a dropped event is only reported through the returned `Delivery`"]
pub enum Delivery {
    /// The event was appended to the target's pending queue.
    Queued,
    /// The event was queued after discarding the target's oldest pending event.
    Displaced,
    /// The event was discarded.
    Dropped(DropReason),
}

impl Delivery {
    /// Returns `true` if the event is now pending for its target.
    #[must_use]
    pub const fn is_queued(self) -> bool {
        matches!(self, Self::Queued | Self::Displaced)
    }
}
