// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_event_queue --heading-base-level=0

//! Understory Event Queue: per-handler event delivery for UI trees.
//!
//! ## Overview
//!
//! Handlers inside a retained UI tree (widgets, gesture recognizers, focus
//! managers) should not need to know about each other or about the code that
//! produces input. This crate decouples them: each handler holds a
//! [`HandlerKey`], producers address events to keys, and during its update
//! pass the tree asks, once per handler, "what events are waiting for this
//! key?".
//!
//! It does not interpret events, hit test, or transform coordinates. Events
//! are a type parameter; use an `enum` of your input kinds so handlers keep
//! exhaustive matching.
//!
//! ## Handler keys
//!
//! [`EventQueue::register`] issues a [`HandlerKey`]: a slot index plus a
//! generation. Keys are compared by identity, never by the handler's
//! configuration, and a key whose registration ended never aliases the
//! registration that reuses its slot. Events for keys that are not registered
//! are dropped, not errored.
//!
//! ## Delivery
//!
//! - Events for one key are delivered in enqueue order. Order across keys is
//!   unspecified.
//! - Retrieval is consumption: [`Queue::events`] removes what it returns, so a
//!   second call with nothing new in between yields nothing.
//! - Unknown keys yield an empty [`Events`] iterator.
//!
//! ## Passes
//!
//! The pass boundary is explicit. [`EventQueue::begin_pass`] returns a
//! [`Pass`] through which the tree retrieves events and through which
//! handlers may enqueue follow-up events. [`Visibility`] decides whether
//! events enqueued during a pass show up in that pass or the next one.
//!
//! ## Example
//!
//! ```rust
//! use understory_event_queue::EventQueue;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum Input {
//!     Key(char),
//!     FocusLost,
//! }
//!
//! let mut queue = EventQueue::new();
//! let k1 = queue.register();
//! let k2 = queue.register();
//!
//! let _ = queue.enqueue(k1, Input::Key('a'));
//! let _ = queue.enqueue(k2, Input::Key('b'));
//! let _ = queue.enqueue(k1, Input::FocusLost);
//!
//! let mut pass = queue.begin_pass();
//! assert_eq!(
//!     pass.events(k1).collect::<Vec<_>>(),
//!     [Input::Key('a'), Input::FocusLost]
//! );
//! assert_eq!(pass.events(k2).collect::<Vec<_>>(), [Input::Key('b')]);
//! assert!(pass.events(k1).is_empty());
//! ```
//!
//! ## Configuration
//!
//! [`QueueConfig`] selects the [`Visibility`] and an optional per-handler
//! capacity with an [`OverflowPolicy`].
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and installs no logger. Drops
//! for unregistered keys are logged at `trace`, pass summaries and discarded
//! events at `debug`, and capacity overflow at `warn`.
//!
//! ## Features
//!
//! - `std` (enabled by default): Forward `std` to `log` and `thiserror`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod error;
mod events;
mod key;
pub mod pass;
mod queue;

pub use config::{OverflowPolicy, QueueConfig, Visibility};
pub use error::{Delivery, DropReason, QueueError};
pub use events::{Events, Queue};
pub use key::HandlerKey;
pub use pass::{Pass, PassId, PassSummary};
pub use queue::EventQueue;
