//! Test utilities for action-relay applications
//!
//! - [`RecordingDispatch`]: a cloneable dispatch that records every message
//! - [`TestHarness`]: generic test harness with a message channel and state
//! - Assertion macros for verifying dispatched messages
//!
//! # Example
//!
//! ```
//! use action_relay_core::testing::RecordingDispatch;
//! use action_relay_core::{assert_dispatched, Dispatch, Message};
//!
//! let dispatch = RecordingDispatch::new();
//! dispatch.dispatch(Message::new("PING", ()));
//!
//! let messages = dispatch.messages();
//! assert_dispatched!(messages, "PING");
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::action::Message;
use crate::dispatch::Dispatch;
use crate::types::ActionType;

/// Dispatch that records messages in order
///
/// Clones share the same record. Each dispatch returns the index of the
/// recorded message.
#[derive(Clone, Debug, Default)]
pub struct RecordingDispatch {
    messages: Arc<Mutex<Vec<Message>>>,
}

impl RecordingDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Message>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of recorded messages.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().clone()
    }

    /// Recorded message types, in order.
    pub fn types(&self) -> Vec<ActionType> {
        self.lock().iter().map(|m| m.action_type.clone()).collect()
    }

    /// The most recent message.
    pub fn last(&self) -> Option<Message> {
        self.lock().last().cloned()
    }

    /// Remove and return all recorded messages.
    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Dispatch for RecordingDispatch {
    type Output = usize;

    fn dispatch(&self, message: Message) -> usize {
        let mut messages = self.lock();
        messages.push(message);
        messages.len() - 1
    }
}

/// Generic test harness for action-relay applications.
///
/// Provides:
/// - State management with a simple `state` field
/// - Message channel for capturing dispatched messages
/// - Helper methods for draining messages
///
/// # Example
///
/// ```ignore
/// use action_relay::testing::TestHarness;
///
/// let mut harness = TestHarness::new(MyState::default());
///
/// fetch_car.create(json!({"id": 1})).run(harness.sender(), ())?.await?;
///
/// let messages = harness.drain_dispatched();
/// assert_eq!(messages.len(), 2);
/// ```
pub struct TestHarness<S> {
    /// The application state under test
    pub state: S,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl<S> TestHarness<S> {
    /// Create a new test harness with the given initial state.
    pub fn new(state: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { state, tx, rx }
    }

    /// Get a clone of the message sender to use as a dispatch.
    pub fn sender(&self) -> mpsc::UnboundedSender<Message> {
        self.tx.clone()
    }

    /// Drain all dispatched messages from the channel.
    pub fn drain_dispatched(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Drain the messages of one type.
    ///
    /// Messages of other types remain in the channel for later draining.
    pub fn drain_type(&mut self, action_type: &str) -> Vec<Message> {
        let (matching, rest): (Vec<_>, Vec<_>) = self
            .drain_dispatched()
            .into_iter()
            .partition(|m| m.action_type == action_type);

        for message in rest {
            let _ = self.tx.send(message);
        }

        matching
    }

    /// Check if any messages were dispatched.
    pub fn has_dispatched(&mut self) -> bool {
        !self.drain_dispatched().is_empty()
    }

    /// Apply a reducer to every pending message.
    ///
    /// Returns how many calls reported a state change.
    pub fn reduce(&mut self, reducer: impl Fn(&mut S, &Message) -> bool) -> usize {
        let messages = self.drain_dispatched();
        messages
            .iter()
            .filter(|message| reducer(&mut self.state, message))
            .count()
    }
}

impl<S: Default> Default for TestHarness<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

/// Assert that a message of the given type was dispatched.
///
/// An optional predicate narrows the match.
///
/// # Example
///
/// ```ignore
/// let messages = dispatch.messages();
/// assert_dispatched!(messages, "FETCH_CAR");
/// assert_dispatched!(messages, "FETCH_CAR_FAIL", |m| m.error().is_some());
/// ```
#[macro_export]
macro_rules! assert_dispatched {
    ($messages:expr, $type:expr) => {
        assert!(
            $messages.iter().any(|m| m.action_type == $type),
            "Expected message of type `{}` to be dispatched, but got: {:?}",
            $type,
            $messages.iter().map(|m| m.action_type.as_str()).collect::<Vec<_>>()
        );
    };
    ($messages:expr, $type:expr, $pred:expr) => {
        assert!(
            $messages.iter().any(|m| m.action_type == $type && ($pred)(m)),
            "Expected message of type `{}` matching predicate to be dispatched, but got: {:?}",
            $type,
            $messages
        );
    };
}

/// Assert that NO message of the given type was dispatched.
#[macro_export]
macro_rules! assert_not_dispatched {
    ($messages:expr, $type:expr) => {
        assert!(
            !$messages.iter().any(|m| m.action_type == $type),
            "Expected NO message of type `{}` to be dispatched, but found: {:?}",
            $type,
            $messages
                .iter()
                .filter(|m| m.action_type == $type)
                .collect::<Vec<_>>()
        );
    };
}

/// Find the first dispatched message of the given type.
#[macro_export]
macro_rules! find_dispatched {
    ($messages:expr, $type:expr) => {
        $messages.iter().find(|m| m.action_type == $type)
    };
}

/// Count dispatched messages of the given type.
#[macro_export]
macro_rules! count_dispatched {
    ($messages:expr, $type:expr) => {
        $messages.iter().filter(|m| m.action_type == $type).count()
    };
}

/// Collect dispatched message types as string slices.
#[macro_export]
macro_rules! dispatched_types {
    ($messages:expr) => {
        $messages
            .iter()
            .map(|m| m.action_type.as_str())
            .collect::<Vec<&str>>()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recording_dispatch() {
        let dispatch = RecordingDispatch::new();
        let shared = dispatch.clone();

        assert_eq!(dispatch.dispatch(Message::new("A", ())), 0);
        assert_eq!(shared.dispatch(Message::new("B", ())), 1);

        assert_eq!(dispatch.types(), vec!["A", "B"]);
        assert_eq!(dispatch.last().unwrap().action_type, "B");

        let taken = dispatch.take();
        assert_eq!(taken.len(), 2);
        assert!(shared.is_empty());
    }

    #[test]
    fn test_harness_drain_and_type() {
        let mut harness = TestHarness::new(0_i32);
        let tx = harness.sender();

        tx.dispatch(Message::new("FOO", ()));
        tx.dispatch(Message::new("BAR", ()));
        tx.dispatch(Message::new("FOO", ()));

        let foos = harness.drain_type("FOO");
        assert_eq!(foos.len(), 2);

        let rest = harness.drain_dispatched();
        assert_eq!(dispatched_types!(rest), vec!["BAR"]);
        assert!(!harness.has_dispatched());
    }

    #[test]
    fn test_harness_reduce() {
        let mut harness = TestHarness::new(Vec::<String>::new());
        let tx = harness.sender();
        tx.dispatch(Message::new("ADD", [("name", "a")].into_iter().collect::<crate::Payload>()));
        tx.dispatch(Message::new("NOOP", ()));

        let changed = harness.reduce(|state, message| {
            if message.action_type == "ADD" {
                state.push(message.payload.get("name").unwrap().to_string());
                true
            } else {
                false
            }
        });

        assert_eq!(changed, 1);
        assert_eq!(harness.state, vec![json!("a").to_string()]);
    }

    #[test]
    fn test_assert_macros() {
        let messages = vec![Message::new("FOO", ()), Message::new("BAR", ())];

        assert_dispatched!(messages, "FOO");
        assert_dispatched!(messages, "BAR", |m: &Message| m.payload.is_empty());
        assert_not_dispatched!(messages, "BAZ");

        let found = find_dispatched!(messages, "BAR");
        assert!(found.is_some());

        assert_eq!(count_dispatched!(messages, "FOO"), 1);
        assert_eq!(dispatched_types!(messages), vec!["FOO", "BAR"]);
    }
}
