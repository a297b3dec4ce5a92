// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The retrieval capability and the draining iterator it returns.

use alloc::collections::vec_deque;
use core::fmt;
use core::iter::FusedIterator;

use crate::key::HandlerKey;

/// A queued event stamped with its queue-wide enqueue sequence number.
pub(crate) struct Entry<E> {
    pub(crate) seq: u64,
    pub(crate) event: E,
}

/// Something that hands out the events addressed to a handler.
///
/// This is the capability consumers (typically a UI tree during its update
/// pass) are written against. It is implemented by [`Pass`](crate::Pass),
/// which honors the queue's [`Visibility`](crate::Visibility), and by
/// [`EventQueue`](crate::EventQueue) itself, which hands out everything that
/// is pending.
///
/// ```
/// use understory_event_queue::{EventQueue, HandlerKey, Queue};
///
/// fn count_clicks(queue: &mut impl Queue<&'static str>, key: HandlerKey) -> usize {
///     queue.events(key).filter(|e| *e == "click").count()
/// }
///
/// let mut queue = EventQueue::new();
/// let button = queue.register();
/// let _ = queue.enqueue(button, "hover");
/// let _ = queue.enqueue(button, "click");
///
/// let mut pass = queue.begin_pass();
/// assert_eq!(count_clicks(&mut pass, button), 1);
/// ```
pub trait Queue<E> {
    /// Returns the events available for `key`, in enqueue order.
    ///
    /// The returned events are removed from the pending set as part of this
    /// call, whether or not the iterator is consumed. Unknown, stale, or
    /// unregistered keys yield an empty iterator. Calling again without new
    /// events in between yields an empty iterator.
    fn events(&mut self, key: HandlerKey) -> Events<'_, E>;
}

/// Ordered, finite, non-restartable sequence of events for one handler.
///
/// Returned by [`Queue::events`]. The events it covers have already left the
/// pending set; dropping the iterator early discards whatever was not read.
pub struct Events<'a, E> {
    drain: Option<vec_deque::Drain<'a, Entry<E>>>,
}

impl<'a, E> Events<'a, E> {
    pub(crate) fn new(drain: vec_deque::Drain<'a, Entry<E>>) -> Self {
        Self { drain: Some(drain) }
    }

    /// An iterator yielding nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self { drain: None }
    }

    /// Returns `true` if no events remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Iterator for Events<'_, E> {
    type Item = E;

    fn next(&mut self) -> Option<Self::Item> {
        self.drain.as_mut()?.next().map(|entry| entry.event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.drain {
            Some(drain) => drain.size_hint(),
            None => (0, Some(0)),
        }
    }
}

impl<E> ExactSizeIterator for Events<'_, E> {}

impl<E> FusedIterator for Events<'_, E> {}

impl<E> fmt::Debug for Events<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Events")
            .field("remaining", &self.len())
            .finish_non_exhaustive()
    }
}
