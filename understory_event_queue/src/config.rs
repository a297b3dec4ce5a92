// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Queue configuration: pass visibility and per-handler capacity.

use core::num::NonZeroUsize;

/// Whether events enqueued during a pass are visible to that same pass.
///
/// Events enqueued before [`EventQueue::begin_pass`](crate::EventQueue::begin_pass)
/// are always visible in the pass that follows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Events enqueued during a pass are held back until the next pass.
    ///
    /// Each pass works on the snapshot taken when it began.
    #[default]
    Deferred,
    /// Events enqueued during a pass are visible to any later retrieval in
    /// the same pass.
    Immediate,
}

/// What to do when a handler's pending queue is at capacity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum OverflowPolicy {
    /// Discard the oldest pending event to make room for the new one.
    ///
    /// While a pass is open, events enqueued before it began are never
    /// discarded. If every pending event for the handler predates the pass,
    /// the new event is rejected instead.
    #[default]
    DropOldest,
    /// Reject the new event.
    DropNewest,
}

/// Configuration for an [`EventQueue`](crate::EventQueue).
///
/// ```
/// use core::num::NonZeroUsize;
/// use understory_event_queue::{OverflowPolicy, QueueConfig, Visibility};
///
/// let config = QueueConfig::new()
///     .with_visibility(Visibility::Immediate)
///     .with_capacity(NonZeroUsize::new(64).unwrap())
///     .with_overflow(OverflowPolicy::DropNewest);
/// assert_eq!(config.visibility, Visibility::Immediate);
/// assert_eq!(config.capacity.map(NonZeroUsize::get), Some(64));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct QueueConfig {
    /// Mid-pass visibility of newly enqueued events.
    pub visibility: Visibility,
    /// Maximum number of pending events per handler; `None` is unbounded.
    pub capacity: Option<NonZeroUsize>,
    /// Applied when `capacity` is reached. Ignored when unbounded.
    pub overflow: OverflowPolicy,
}

impl QueueConfig {
    /// Creates the default configuration: deferred visibility, unbounded.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            visibility: Visibility::Deferred,
            capacity: None,
            overflow: OverflowPolicy::DropOldest,
        }
    }

    /// Sets the mid-pass visibility.
    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Bounds the number of pending events per handler.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the overflow policy used once a capacity is set.
    #[must_use]
    pub const fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }
}
