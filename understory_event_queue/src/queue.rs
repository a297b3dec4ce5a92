// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The event queue: handler registration slots and per-handler pending queues.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use log::{debug, trace, warn};

use crate::config::{OverflowPolicy, QueueConfig};
use crate::error::{Delivery, DropReason, QueueError};
use crate::events::{Entry, Events, Queue};
use crate::key::HandlerKey;
use crate::pass::Pass;

struct Slot<E> {
    generation: u32,
    live: bool,
    /// Set once the pending queue overflows; cleared when it drains.
    full: bool,
    pending: VecDeque<Entry<E>>,
}

impl<E> Slot<E> {
    fn matches(&self, key: HandlerKey) -> bool {
        self.live && self.generation == key.generation()
    }
}

/// Per-handler event queues addressed by [`HandlerKey`].
///
/// Handlers obtain a key with [`register`](Self::register). Producers address
/// events to that key with [`enqueue`](Self::enqueue); each handler's events
/// are kept in enqueue order. Consumers open a [`Pass`] with
/// [`begin_pass`](Self::begin_pass) and retrieve each handler's events through
/// it, which removes them from the queue.
///
/// Lookup by key is a slot index plus a generation check, so it is O(1) and
/// never confuses a stale key with the registration that reused its slot.
///
/// # Example
///
/// ```
/// use understory_event_queue::EventQueue;
///
/// #[derive(Debug, PartialEq)]
/// enum Input {
///     Press(u32),
///     Release(u32),
/// }
///
/// let mut queue = EventQueue::new();
/// let k1 = queue.register();
/// let k2 = queue.register();
///
/// let _ = queue.enqueue(k1, Input::Press(1));
/// let _ = queue.enqueue(k2, Input::Press(2));
/// let _ = queue.enqueue(k1, Input::Release(1));
///
/// let mut pass = queue.begin_pass();
/// assert_eq!(
///     pass.events(k1).collect::<Vec<_>>(),
///     [Input::Press(1), Input::Release(1)]
/// );
/// assert_eq!(pass.events(k2).collect::<Vec<_>>(), [Input::Press(2)]);
/// assert_eq!(pass.events(k1).count(), 0);
/// ```
pub struct EventQueue<E> {
    slots: Vec<Slot<E>>,
    /// Freed slot indices available for reuse.
    free: Vec<u32>,
    live: usize,
    /// Sequence number for the next enqueued event.
    next_seq: u64,
    /// Number of completed passes.
    passes: u64,
    config: QueueConfig,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventQueue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("handlers", &self.live)
            .field("pending", &self.total_pending())
            .field("passes", &self.passes)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E> EventQueue<E> {
    /// Creates an empty queue with the default [`QueueConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(QueueConfig::new())
    }

    /// Creates an empty queue with the given configuration.
    #[must_use]
    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            next_seq: 0,
            passes: 0,
            config,
        }
    }

    /// Returns the configuration this queue was created with.
    #[must_use]
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Returns the number of completed passes.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Returns the number of live registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // -------------------------------------------------------------------------
    // Registration

    /// Registers a new handler and returns its key.
    ///
    /// # Panics
    ///
    /// Panics if every one of the `2^32` slot indices is in use or retired.
    /// Use [`try_register`](Self::try_register) to handle that case.
    pub fn register(&mut self) -> HandlerKey {
        self.try_register()
            .expect("too many handler registrations for HandlerKey (u32)")
    }

    /// Registers a new handler and returns its key.
    ///
    /// Freed slots are reused with a bumped generation, so the new key never
    /// equals any key issued before.
    pub fn try_register(&mut self) -> Result<HandlerKey, QueueError> {
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation += 1;
            slot.live = true;
            self.live += 1;
            return Ok(HandlerKey::new(idx, slot.generation));
        }

        let idx = u32::try_from(self.slots.len()).map_err(|_| QueueError::SlotsExhausted)?;
        self.slots.push(Slot {
            generation: 1,
            live: true,
            full: false,
            pending: VecDeque::new(),
        });
        self.live += 1;
        Ok(HandlerKey::new(idx, 1))
    }

    /// Ends the registration for `key`.
    ///
    /// Pending events for the handler are discarded and their count returned.
    /// Afterwards the key is inert: enqueues to it are dropped and retrieval
    /// yields nothing.
    pub fn unregister(&mut self, key: HandlerKey) -> Result<usize, QueueError> {
        let slot = self
            .slots
            .get_mut(key.idx())
            .filter(|slot| slot.matches(key))
            .ok_or(QueueError::StaleKey { key })?;

        slot.live = false;
        slot.full = false;
        let discarded = slot.pending.len();
        slot.pending = VecDeque::new();
        let retire = slot.generation == u32::MAX;

        self.live -= 1;
        if retire {
            warn!("retiring handler slot {}: generation exhausted", key.index());
        } else {
            self.free.push(key.index());
        }
        if discarded > 0 {
            debug!("discarded {discarded} pending events for unregistered handler {key}");
        }
        Ok(discarded)
    }

    /// Returns `true` if `key` refers to a live registration.
    #[must_use]
    pub fn is_registered(&self, key: HandlerKey) -> bool {
        self.slots.get(key.idx()).is_some_and(|slot| slot.matches(key))
    }

    /// Returns an iterator over the keys of all live registrations.
    ///
    /// Keys are yielded in slot order, which is not registration order once
    /// slots are reused.
    pub fn keys(&self) -> impl Iterator<Item = HandlerKey> + '_ {
        self.slots
            .iter()
            .zip(0_u32..)
            .filter(|(slot, _)| slot.live)
            .map(|(slot, idx)| HandlerKey::new(idx, slot.generation))
    }

    // -------------------------------------------------------------------------
    // Enqueue

    /// Appends `event` to the pending events of `key`.
    ///
    /// Events for keys that are not registered are dropped. When a capacity is
    /// configured and reached, the [`OverflowPolicy`] decides which event is
    /// lost.
    pub fn enqueue(&mut self, key: HandlerKey, event: E) -> Delivery {
        self.push(key, event, 0)
    }

    /// Appends `event` for `key`, never evicting entries with a sequence
    /// number below `protected`.
    pub(crate) fn push(&mut self, key: HandlerKey, event: E, protected: u64) -> Delivery {
        let Some(slot) = self
            .slots
            .get_mut(key.idx())
            .filter(|slot| slot.matches(key))
        else {
            trace!("dropping event for unregistered handler {key}");
            return Delivery::Dropped(DropReason::Unregistered);
        };

        let mut delivery = Delivery::Queued;
        if let Some(capacity) = self.config.capacity
            && slot.pending.len() >= capacity.get()
        {
            if slot.full {
                trace!("pending queue for handler {key} is still full");
            } else {
                warn!("pending queue for handler {key} is full ({capacity} events)");
                slot.full = true;
            }
            let evictable = slot.pending.partition_point(|entry| entry.seq < protected);
            match self.config.overflow {
                OverflowPolicy::DropOldest if evictable < slot.pending.len() => {
                    slot.pending.remove(evictable);
                    delivery = Delivery::Displaced;
                }
                _ => return Delivery::Dropped(DropReason::Full),
            }
        }

        slot.pending.push_back(Entry {
            seq: self.next_seq,
            event,
        });
        self.next_seq += 1;
        delivery
    }

    /// Enqueues every event from `events` for `key`, in iteration order.
    ///
    /// Returns how many events are now pending as a result (displacing
    /// enqueues count, dropped ones do not).
    pub fn extend<I>(&mut self, key: HandlerKey, events: I) -> usize
    where
        I: IntoIterator<Item = E>,
    {
        events
            .into_iter()
            .map(|event| self.enqueue(key, event))
            .filter(|delivery| delivery.is_queued())
            .count()
    }

    /// Enqueues a copy of `event` for each key in `keys`.
    ///
    /// Returns how many keys the event was queued for.
    pub fn broadcast<I>(&mut self, keys: I, event: E) -> usize
    where
        I: IntoIterator<Item = HandlerKey>,
        E: Clone,
    {
        keys.into_iter()
            .map(|key| self.enqueue(key, event.clone()))
            .filter(|delivery| delivery.is_queued())
            .count()
    }

    // -------------------------------------------------------------------------
    // Inspection

    /// Returns the number of events pending for `key`.
    ///
    /// This counts every pending event, including ones a running pass with
    /// [`Visibility::Deferred`](crate::Visibility::Deferred) would hold back.
    #[must_use]
    pub fn pending(&self, key: HandlerKey) -> usize {
        self.slots
            .get(key.idx())
            .filter(|slot| slot.matches(key))
            .map_or(0, |slot| slot.pending.len())
    }

    /// Returns `true` if any event is pending for `key`.
    #[must_use]
    pub fn has_pending(&self, key: HandlerKey) -> bool {
        self.pending(key) > 0
    }

    /// Returns the number of events pending across all handlers.
    #[must_use]
    pub fn total_pending(&self) -> usize {
        self.slots.iter().map(|slot| slot.pending.len()).sum()
    }

    /// Discards the pending events of `key` without delivering them.
    ///
    /// Returns how many events were discarded; `0` for unknown keys.
    pub fn clear(&mut self, key: HandlerKey) -> usize {
        let Some(slot) = self
            .slots
            .get_mut(key.idx())
            .filter(|slot| slot.matches(key))
        else {
            return 0;
        };
        let discarded = slot.pending.len();
        slot.pending.clear();
        slot.full = false;
        if discarded > 0 {
            debug!("cleared {discarded} pending events for handler {key}");
        }
        discarded
    }

    // -------------------------------------------------------------------------
    // Passes

    /// Opens a processing pass.
    ///
    /// Every event enqueued before this call is visible to the pass. Events
    /// enqueued through the pass follow the configured
    /// [`Visibility`](crate::Visibility). The pass ends when it is finished or
    /// dropped.
    pub fn begin_pass(&mut self) -> Pass<'_, E> {
        Pass::new(self)
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub(crate) fn end_pass(&mut self) {
        self.passes += 1;
    }

    /// Removes and returns the pending events of `key` enqueued before `cutoff`.
    pub(crate) fn take(&mut self, key: HandlerKey, cutoff: u64) -> Events<'_, E> {
        match self
            .slots
            .get_mut(key.idx())
            .filter(|slot| slot.matches(key))
        {
            Some(slot) => {
                let visible = slot.pending.partition_point(|entry| entry.seq < cutoff);
                if visible > 0 {
                    slot.full = false;
                }
                Events::new(slot.pending.drain(..visible))
            }
            None => Events::empty(),
        }
    }
}

/// Retrieval outside of a pass hands out everything currently pending.
impl<E> Queue<E> for EventQueue<E> {
    fn events(&mut self, key: HandlerKey) -> Events<'_, E> {
        self.take(key, u64::MAX)
    }
}
