//! Dispatch targets and dispatch middleware
//!
//! A [`Dispatch`] is whatever the caller hands the orchestrator to deliver
//! messages: a closure, an action channel, or either wrapped in middleware.
//! Its output is passed straight back to the caller.
//!
//! # Example
//!
//! ```
//! use action_relay_core::dispatch::{Dispatch, LoggingMiddleware, WithMiddleware};
//! use action_relay_core::Message;
//!
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Message>();
//! let dispatch = WithMiddleware::new(tx, LoggingMiddleware::new());
//!
//! assert!(dispatch.dispatch(Message::new("PING", ())));
//! assert_eq!(rx.try_recv().unwrap().action_type, "PING");
//! ```

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::action::{Action, Message, Outcome};

/// Receives dispatched messages
pub trait Dispatch: Send + Sync + 'static {
    /// Value handed back to the caller for each dispatch
    type Output: Send + 'static;

    /// Deliver a message.
    fn dispatch(&self, message: Message) -> Self::Output;
}

impl<F, R> Dispatch for F
where
    F: Fn(Message) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    type Output = R;

    fn dispatch(&self, message: Message) -> R {
        self(message)
    }
}

/// Sends into the action channel; returns `false` once the receiver is gone.
impl Dispatch for mpsc::UnboundedSender<Message> {
    type Output = bool;

    fn dispatch(&self, message: Message) -> bool {
        self.send(message).is_ok()
    }
}

/// Type-erased, cloneable dispatch handed to operations
///
/// Operations use it to emit their own intermediate messages. The underlying
/// dispatch output is discarded.
#[derive(Clone)]
pub struct DispatchHandle(Arc<dyn Fn(Message) + Send + Sync>);

impl DispatchHandle {
    /// Wrap a shared dispatch.
    pub fn new<D: Dispatch>(dispatch: Arc<D>) -> Self {
        Self(Arc::new(move |message| {
            let _ = dispatch.dispatch(message);
        }))
    }

    /// Deliver a message.
    pub fn dispatch(&self, message: Message) {
        (self.0)(message)
    }
}

impl fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchHandle").finish_non_exhaustive()
    }
}

/// Hook run around each message a [`WithMiddleware`] target delivers
///
/// Both methods default to doing nothing. A plain `Fn(&Message)` closure is a
/// middleware that runs before delivery.
pub trait Middleware: Send + Sync + 'static {
    /// Runs before the message reaches the wrapped target.
    fn before(&self, _message: &Message) {}

    /// Runs once the wrapped target has taken the message.
    fn after(&self, _message: &Message) {}
}

impl<F> Middleware for F
where
    F: Fn(&Message) + Send + Sync + 'static,
{
    fn before(&self, message: &Message) {
        self(message)
    }
}

/// Logs messages with `tracing` as they pass through
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    /// Log each message before delivery
    pub log_before: bool,
    /// Log each message after delivery, with its outcome
    pub log_after: bool,
}

impl LoggingMiddleware {
    /// Log after delivery only.
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
        }
    }

    /// Log before and after delivery.
    pub fn verbose() -> Self {
        Self {
            log_before: true,
            log_after: true,
        }
    }
}

impl Middleware for LoggingMiddleware {
    fn before(&self, message: &Message) {
        if self.log_before {
            tracing::debug!(action = %message.name(), "Dispatching message");
        }
    }

    fn after(&self, message: &Message) {
        if !self.log_after {
            return;
        }
        match &message.outcome {
            Some(Outcome::Success(_)) => {
                tracing::debug!(action = %message.name(), "Dispatched success")
            }
            Some(Outcome::Failure(error)) => {
                tracing::debug!(action = %message.name(), %error, "Dispatched failure")
            }
            None => tracing::debug!(action = %message.name(), "Dispatched message"),
        }
    }
}

/// A dispatch target wrapped with middleware
#[derive(Debug, Clone)]
pub struct WithMiddleware<D, M> {
    inner: D,
    middleware: M,
}

impl<D, M> WithMiddleware<D, M> {
    pub fn new(inner: D, middleware: M) -> Self {
        Self { inner, middleware }
    }

    pub fn middleware(&self) -> &M {
        &self.middleware
    }

    /// The wrapped target.
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: Dispatch, M: Middleware> Dispatch for WithMiddleware<D, M> {
    type Output = D::Output;

    fn dispatch(&self, message: Message) -> D::Output {
        self.middleware.before(&message);
        let output = self.inner.dispatch(message.clone());
        self.middleware.after(&message);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingMiddleware {
        before_count: AtomicUsize,
        after_count: AtomicUsize,
    }

    impl Middleware for CountingMiddleware {
        fn before(&self, _message: &Message) {
            self.before_count.fetch_add(1, Ordering::SeqCst);
        }

        fn after(&self, _message: &Message) {
            self.after_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_closure_dispatch_passes_output_through() {
        let dispatch = |message: Message| message.action_type.to_string();
        assert_eq!(dispatch.dispatch(Message::new("FOO", ())), "FOO");
    }

    #[test]
    fn test_channel_dispatch() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        assert!(tx.dispatch(Message::new("FOO", ())));
        assert_eq!(rx.try_recv().unwrap().action_type, "FOO");

        drop(rx);
        assert!(!tx.dispatch(Message::new("BAR", ())));
    }

    #[test]
    fn test_with_middleware() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            move |message: Message| seen.lock().unwrap().push(message.action_type)
        };
        let dispatch = WithMiddleware::new(sink, CountingMiddleware::default());

        dispatch.dispatch(Message::new("A", ()));
        dispatch.dispatch(Message::new("B", ()));

        assert_eq!(dispatch.middleware().before_count.load(Ordering::SeqCst), 2);
        assert_eq!(dispatch.middleware().after_count.load(Ordering::SeqCst), 2);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_closure_middleware_sees_message_first() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let observer = {
            let order = order.clone();
            move |message: &Message| order.lock().unwrap().push(format!("saw {}", message.action_type))
        };
        let sink = {
            let order = order.clone();
            move |message: Message| order.lock().unwrap().push(format!("got {}", message.action_type))
        };

        WithMiddleware::new(sink, observer).dispatch(Message::new("A", ()));

        assert_eq!(*order.lock().unwrap(), vec!["saw A", "got A"]);
    }

    #[test]
    fn test_logging_middleware_passes_output_through() {
        let dispatch = WithMiddleware::new(|_message: Message| 7, LoggingMiddleware::verbose());
        let failed = Message::new("A_FAIL", ())
            .with_outcome(Outcome::Failure(crate::ActionError::new("boom")));

        assert_eq!(dispatch.dispatch(Message::new("A", ())), 7);
        assert_eq!(dispatch.dispatch(failed), 7);
        assert!(dispatch.middleware().log_before);
    }

    #[test]
    fn test_dispatch_handle() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let handle = DispatchHandle::new(Arc::new(tx));
        let cloned = handle.clone();

        handle.dispatch(Message::new("ONE", ()));
        cloned.dispatch(Message::new("TWO", ()));

        assert_eq!(rx.try_recv().unwrap().action_type, "ONE");
        assert_eq!(rx.try_recv().unwrap().action_type, "TWO");
    }
}
