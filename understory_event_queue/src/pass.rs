// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Processing passes: the explicit scope in which events are retrieved.
//!
//! ## Usage
//!
//! 1) Producers enqueue events on the [`EventQueue`] between passes.
//! 2) The UI tree opens a pass with [`EventQueue::begin_pass`].
//! 3) For every handler it currently manages, it calls [`Pass::events`] and
//!    consumes the returned iterator.
//! 4) Events produced while handling (for example by a gesture recognizer)
//!    go through [`Pass::enqueue`].
//! 5) The pass ends with [`Pass::finish`] or when it is dropped.
//!
//! ## Visibility
//!
//! With [`Visibility::Deferred`](crate::Visibility::Deferred) a pass only sees
//! events enqueued before it began; anything enqueued through the pass waits
//! for the next one. With [`Visibility::Immediate`](crate::Visibility::Immediate)
//! later retrievals in the same pass see them too.
//!
//! ```
//! use understory_event_queue::EventQueue;
//!
//! let mut queue = EventQueue::new();
//! let recognizer = queue.register();
//! let _ = queue.enqueue(recognizer, "down");
//!
//! let mut pass = queue.begin_pass();
//! assert_eq!(pass.events(recognizer).collect::<Vec<_>>(), ["down"]);
//! let _ = pass.enqueue(recognizer, "long-press");
//! assert_eq!(pass.events(recognizer).count(), 0);
//! let summary = pass.finish();
//! assert_eq!(summary.delivered, 1);
//! assert_eq!(summary.remaining, 1);
//!
//! let mut pass = queue.begin_pass();
//! assert_eq!(pass.events(recognizer).collect::<Vec<_>>(), ["long-press"]);
//! ```

use core::fmt;

use hashbrown::HashSet;
use log::{debug, trace};

use crate::config::Visibility;
use crate::error::{Delivery, DropReason};
use crate::events::{Events, Queue};
use crate::key::HandlerKey;
use crate::queue::EventQueue;

/// Identifies a processing pass of one [`EventQueue`].
///
/// Passes are numbered from `0` in the order they begin.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassId(u64);

impl PassId {
    /// Returns the pass number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Counters collected over one pass, returned by [`Pass::finish`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PassSummary {
    /// The pass these counters belong to.
    pub id: PassId,
    /// Events handed out by [`Pass::events`].
    pub delivered: usize,
    /// Distinct keys [`Pass::events`] was called with.
    pub handlers_visited: usize,
    /// Events still pending in the queue when the pass ended.
    pub remaining: usize,
    /// Events lost to enqueues through the pass: new events that were
    /// rejected plus older events displaced to make room.
    pub dropped: usize,
}

/// One processing pass over an [`EventQueue`].
///
/// The pass borrows the queue mutably, so while it is open all enqueues and
/// retrievals go through it. See the [module docs](self) for the workflow.
pub struct Pass<'q, E> {
    queue: &'q mut EventQueue<E>,
    id: PassId,
    /// Sequence number of the first event enqueued after the pass began.
    start: u64,
    /// Entries with a sequence number below this are visible.
    cutoff: u64,
    visited: HashSet<HandlerKey>,
    delivered: usize,
    dropped: usize,
}

impl<'q, E> Pass<'q, E> {
    pub(crate) fn new(queue: &'q mut EventQueue<E>) -> Self {
        let id = PassId(queue.passes());
        let start = queue.next_seq();
        let cutoff = match queue.config().visibility {
            Visibility::Deferred => start,
            Visibility::Immediate => u64::MAX,
        };
        trace!("begin pass {id} with {} pending events", queue.total_pending());
        Self {
            queue,
            id,
            start,
            cutoff,
            visited: HashSet::new(),
            delivered: 0,
            dropped: 0,
        }
    }

    /// Returns the id of this pass.
    #[must_use]
    pub fn id(&self) -> PassId {
        self.id
    }

    /// Returns the queue this pass runs over, for inspection.
    #[must_use]
    pub fn queue(&self) -> &EventQueue<E> {
        self.queue
    }

    /// Returns `true` if `key` refers to a live registration.
    #[must_use]
    pub fn is_registered(&self, key: HandlerKey) -> bool {
        self.queue.is_registered(key)
    }

    /// Returns the events visible to this pass for `key`, in enqueue order.
    ///
    /// See [`Queue::events`]. Retrieving the same key more than once per pass
    /// is allowed; later calls only see events that became visible since.
    pub fn events(&mut self, key: HandlerKey) -> Events<'_, E> {
        if !self.visited.insert(key) {
            debug!("handler {key} retrieved events more than once in pass {}", self.id);
        }
        let events = self.queue.take(key, self.cutoff);
        self.delivered += events.len();
        events
    }

    /// Enqueues `event` for `key` from within the pass.
    ///
    /// Whether the event is visible to the rest of this pass depends on the
    /// queue's [`Visibility`]. Events pending since before the pass began are
    /// never displaced by a bounded queue; when nothing newer can make room,
    /// the new event is rejected.
    pub fn enqueue(&mut self, key: HandlerKey, event: E) -> Delivery {
        let delivery = self.queue.push(key, event, self.start);
        match delivery {
            Delivery::Queued => {}
            Delivery::Displaced => self.dropped += 1,
            Delivery::Dropped(reason) => {
                self.dropped += 1;
                if reason == DropReason::Unregistered {
                    trace!("pass {} dropped event for unregistered handler {key}", self.id);
                }
            }
        }
        delivery
    }

    /// Returns the counters collected so far.
    #[must_use]
    pub fn summary(&self) -> PassSummary {
        PassSummary {
            id: self.id,
            delivered: self.delivered,
            handlers_visited: self.visited.len(),
            remaining: self.queue.total_pending(),
            dropped: self.dropped,
        }
    }

    /// Ends the pass and returns its counters.
    pub fn finish(self) -> PassSummary {
        self.summary()
    }
}

impl<E> Queue<E> for Pass<'_, E> {
    fn events(&mut self, key: HandlerKey) -> Events<'_, E> {
        Self::events(self, key)
    }
}

impl<E> Drop for Pass<'_, E> {
    fn drop(&mut self) {
        let summary = self.summary();
        debug!(
            "end pass {}: delivered {} events to {} handlers, {} remaining, {} dropped",
            summary.id,
            summary.delivered,
            summary.handlers_visited,
            summary.remaining,
            summary.dropped
        );
        self.queue.end_pass();
    }
}

impl<E> fmt::Debug for Pass<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pass")
            .field("id", &self.id)
            .field("cutoff", &self.cutoff)
            .field("delivered", &self.delivered)
            .field("handlers_visited", &self.visited.len())
            .field("dropped", &self.dropped)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OverflowPolicy, QueueConfig};
    use alloc::vec;
    use core::num::NonZeroUsize;
    use alloc::vec::Vec;

    #[test]
    fn pass_ids_increase() {
        let mut queue = EventQueue::<u32>::new();
        assert_eq!(queue.begin_pass().id(), PassId(0));
        assert_eq!(queue.begin_pass().finish().id, PassId(1));
        assert_eq!(queue.passes(), 2);
        assert_eq!(queue.begin_pass().id().get(), 2);
    }

    #[test]
    fn deferred_holds_back_mid_pass_events() {
        let mut queue = EventQueue::new();
        let a = queue.register();
        let b = queue.register();
        let _ = queue.enqueue(b, 1);

        let mut pass = queue.begin_pass();
        assert_eq!(pass.enqueue(b, 2), Delivery::Queued);
        assert_eq!(pass.events(a).count(), 0);
        assert_eq!(pass.events(b).collect::<Vec<_>>(), vec![1]);
        assert_eq!(pass.queue().pending(b), 1);
        drop(pass);

        let mut pass = queue.begin_pass();
        assert_eq!(pass.events(b).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn immediate_shows_mid_pass_events() {
        let mut queue =
            EventQueue::with_config(QueueConfig::new().with_visibility(Visibility::Immediate));
        let a = queue.register();
        let b = queue.register();

        let mut pass = queue.begin_pass();
        let _ = pass.enqueue(b, 7);
        assert_eq!(pass.events(a).count(), 0);
        assert_eq!(pass.events(b).collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn repeated_retrieval_sees_only_new_events() {
        let mut queue =
            EventQueue::with_config(QueueConfig::new().with_visibility(Visibility::Immediate));
        let key = queue.register();
        let _ = queue.enqueue(key, 1);

        let mut pass = queue.begin_pass();
        assert_eq!(pass.events(key).collect::<Vec<_>>(), vec![1]);
        assert_eq!(pass.events(key).count(), 0);
        let _ = pass.enqueue(key, 2);
        assert_eq!(pass.events(key).collect::<Vec<_>>(), vec![2]);
        assert_eq!(pass.summary().handlers_visited, 1);
    }

    #[test]
    fn summary_counts() {
        let mut queue = EventQueue::new();
        let a = queue.register();
        let b = queue.register();
        let gone = queue.register();
        queue.unregister(gone).unwrap();
        let _ = queue.extend(a, [1, 2, 3]);
        let _ = queue.enqueue(b, 4);

        let mut pass = queue.begin_pass();
        let _ = pass.events(a).next();
        let _ = pass.enqueue(gone, 5);
        let _ = pass.enqueue(a, 6);
        let summary = pass.finish();

        assert_eq!(
            summary,
            PassSummary {
                id: PassId(0),
                delivered: 3,
                handlers_visited: 1,
                remaining: 2,
                dropped: 1,
            }
        );
        assert_eq!(queue.passes(), 1);
    }

    #[test]
    fn unregistered_handler_sees_nothing() {
        let mut queue = EventQueue::new();
        let key = queue.register();
        let _ = queue.enqueue(key, 1);

        let mut pass = queue.begin_pass();
        let stranger = HandlerKey::new(42, 1);
        assert!(!pass.is_registered(stranger));
        assert!(pass.events(stranger).is_empty());
        assert_eq!(pass.summary().delivered, 0);
    }

    fn bounded(visibility: Visibility) -> EventQueue<u32> {
        EventQueue::with_config(
            QueueConfig::new()
                .with_visibility(visibility)
                .with_capacity(NonZeroUsize::new(2).unwrap()),
        )
    }

    #[test]
    fn bounded_queue_keeps_events_from_before_the_pass() {
        for visibility in [Visibility::Deferred, Visibility::Immediate] {
            let mut queue = bounded(visibility);
            let key = queue.register();
            let _ = queue.enqueue(key, 1);
            let _ = queue.enqueue(key, 2);

            let mut pass = queue.begin_pass();
            assert_eq!(pass.enqueue(key, 3), Delivery::Dropped(DropReason::Full));
            assert_eq!(pass.events(key).collect::<Vec<_>>(), vec![1, 2]);
            assert_eq!(pass.summary().dropped, 1);
            drop(pass);

            let mut pass = queue.begin_pass();
            assert!(pass.events(key).is_empty());
        }
    }

    #[test]
    fn bounded_queue_displaces_events_from_within_the_pass() {
        let mut queue = bounded(Visibility::Deferred);
        let key = queue.register();
        let _ = queue.enqueue(key, 1);

        let mut pass = queue.begin_pass();
        assert_eq!(pass.enqueue(key, 2), Delivery::Queued);
        assert_eq!(pass.enqueue(key, 3), Delivery::Displaced);
        assert_eq!(pass.events(key).collect::<Vec<_>>(), vec![1]);
        let summary = pass.finish();
        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.remaining, 1);

        let mut pass = queue.begin_pass();
        assert_eq!(pass.events(key).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn rejected_events_count_as_dropped() {
        let mut queue = EventQueue::with_config(
            QueueConfig::new()
                .with_capacity(NonZeroUsize::new(1).unwrap())
                .with_overflow(OverflowPolicy::DropNewest),
        );
        let key = queue.register();

        let mut pass = queue.begin_pass();
        assert_eq!(pass.enqueue(key, 1), Delivery::Queued);
        assert_eq!(pass.enqueue(key, 2), Delivery::Dropped(DropReason::Full));
        assert_eq!(pass.enqueue(key, 3), Delivery::Dropped(DropReason::Full));
        assert_eq!(pass.finish().dropped, 2);
    }
}
