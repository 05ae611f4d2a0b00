//! Async operations and their configuration
//!
//! An [`Operation`] is externally-defined async work: it receives an
//! [`OperationCall`] and settles once with either a response or an
//! [`ActionError`].
//!
//! An async action is configured either with a single operation or with an
//! [`EnvironmentAwareConfig`] that picks between an explicit override, a
//! server operation and a client operation:
//!
//! ```
//! use action_relay_core::operation::{EnvironmentAwareConfig, OperationConfig};
//! use serde_json::json;
//!
//! let config: OperationConfig = EnvironmentAwareConfig::new()
//!     .server(|call| async move { Ok(json!({"from": "db", "id": call.payload.get("id")})) })
//!     .client(|_call| async { Ok(json!({"from": "http"})) })
//!     .extra("cache", true)
//!     .into();
//! # let _ = config;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::action::{ActionError, Fields, Payload};
use crate::dispatch::DispatchHandle;
use crate::normalize::Normalize;

/// Settled value of an operation
pub type OperationResult = Result<Value, ActionError>;

/// Boxed single-resolution future returned by an operation
pub type OperationFuture = BoxFuture<'static, OperationResult>;

/// Values shared with every operation call, plus the caller's dispatch
#[derive(Clone, Debug, Default)]
pub struct Helpers {
    values: Fields,
    dispatch: Option<DispatchHandle>,
}

impl Helpers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a helper value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Get a helper value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// All helper values in order.
    pub fn values(&self) -> &Fields {
        &self.values
    }

    /// The dispatch of the current call.
    ///
    /// Always set for helpers handed to an operation.
    pub fn dispatch(&self) -> Option<&DispatchHandle> {
        self.dispatch.as_ref()
    }

    pub(crate) fn with_dispatch(mut self, dispatch: DispatchHandle) -> Self {
        self.dispatch = Some(dispatch);
        self
    }
}

impl From<Fields> for Helpers {
    fn from(values: Fields) -> Self {
        Self {
            values,
            dispatch: None,
        }
    }
}

/// Arguments an operation is invoked with
#[derive(Debug)]
pub struct OperationCall<C = ()> {
    /// The effective (possibly filtered) payload
    pub payload: Payload,
    /// Caller helpers with the call's dispatch attached
    pub helpers: Helpers,
    /// Extra context passed alongside dispatch, e.g. a state accessor
    pub context: C,
}

impl<C> OperationCall<C> {
    /// Dispatch a message through the caller's dispatch.
    pub fn dispatch(&self, message: crate::Message) {
        if let Some(dispatch) = self.helpers.dispatch() {
            dispatch.dispatch(message);
        }
    }
}

/// Shared handle to an async operation
pub struct Operation<C = ()>(Arc<dyn Fn(OperationCall<C>) -> OperationFuture + Send + Sync>);

impl<C: 'static> Operation<C> {
    /// Wrap an async function.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(OperationCall<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        Self(Arc::new(move |call| f(call).boxed()))
    }

    /// Start the operation.
    pub fn call(&self, call: OperationCall<C>) -> OperationFuture {
        (self.0)(call)
    }
}

impl<C> Clone for Operation<C> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C> fmt::Debug for Operation<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation").finish_non_exhaustive()
    }
}

/// Response schema and the normalizer it is applied with
#[derive(Clone)]
pub struct SchemaConfig {
    pub(crate) schema: Value,
    pub(crate) normalizer: Arc<dyn Normalize>,
}

impl SchemaConfig {
    pub fn new(normalizer: impl Normalize + 'static, schema: Value) -> Self {
        Self {
            schema,
            normalizer: Arc::new(normalizer),
        }
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }
}

impl fmt::Debug for SchemaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaConfig")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Record form of an async action configuration
///
/// Selection priority at call time: `explicit`, then `server` when the
/// environment is the server, otherwise `client`.
pub struct EnvironmentAwareConfig<C = ()> {
    pub(crate) explicit: Option<Operation<C>>,
    pub(crate) server: Option<Operation<C>>,
    pub(crate) client: Option<Operation<C>>,
    pub(crate) schema: Option<SchemaConfig>,
    pub(crate) extra: Fields,
}

impl<C> Default for EnvironmentAwareConfig<C> {
    fn default() -> Self {
        Self {
            explicit: None,
            server: None,
            client: None,
            schema: None,
            extra: Fields::new(),
        }
    }
}

impl<C> Clone for EnvironmentAwareConfig<C> {
    fn clone(&self) -> Self {
        Self {
            explicit: self.explicit.clone(),
            server: self.server.clone(),
            client: self.client.clone(),
            schema: self.schema.clone(),
            extra: self.extra.clone(),
        }
    }
}

impl<C> fmt::Debug for EnvironmentAwareConfig<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentAwareConfig")
            .field("explicit", &self.explicit.is_some())
            .field("server", &self.server.is_some())
            .field("client", &self.client.is_some())
            .field("schema", &self.schema)
            .field("extra", &self.extra)
            .finish()
    }
}

impl<C: 'static> EnvironmentAwareConfig<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operation that runs regardless of environment.
    pub fn explicit<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(OperationCall<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        self.explicit = Some(Operation::new(f));
        self
    }

    /// Operation for the server environment.
    pub fn server<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(OperationCall<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        self.server = Some(Operation::new(f));
        self
    }

    /// Operation for the client environment.
    pub fn client<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(OperationCall<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        self.client = Some(Operation::new(f));
        self
    }

    /// Normalize successful responses against `schema`.
    pub fn normalize_with(mut self, normalizer: impl Normalize + 'static, schema: Value) -> Self {
        self.schema = Some(SchemaConfig::new(normalizer, schema));
        self
    }

    /// Add a field merged into every dispatched message.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Add several extra fields, in order.
    pub fn extend_extra(mut self, fields: Fields) -> Self {
        self.extra.extend(fields);
        self
    }
}

/// Configuration accepted by an async action creator
pub enum OperationConfig<C = ()> {
    /// A single operation, run in every environment
    Direct(Operation<C>),
    /// Explicit/server/client operations with schema and extra fields
    EnvironmentAware(EnvironmentAwareConfig<C>),
}

impl<C: 'static> OperationConfig<C> {
    /// Configure a single operation.
    pub fn direct<F, Fut>(f: F) -> Self
    where
        F: Fn(OperationCall<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OperationResult> + Send + 'static,
    {
        OperationConfig::Direct(Operation::new(f))
    }
}

impl<C> Clone for OperationConfig<C> {
    fn clone(&self) -> Self {
        match self {
            OperationConfig::Direct(op) => OperationConfig::Direct(op.clone()),
            OperationConfig::EnvironmentAware(config) => {
                OperationConfig::EnvironmentAware(config.clone())
            }
        }
    }
}

impl<C> fmt::Debug for OperationConfig<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationConfig::Direct(op) => f.debug_tuple("Direct").field(op).finish(),
            OperationConfig::EnvironmentAware(config) => {
                f.debug_tuple("EnvironmentAware").field(config).finish()
            }
        }
    }
}

impl<C> From<Operation<C>> for OperationConfig<C> {
    fn from(op: Operation<C>) -> Self {
        OperationConfig::Direct(op)
    }
}

impl<C> From<EnvironmentAwareConfig<C>> for OperationConfig<C> {
    fn from(config: EnvironmentAwareConfig<C>) -> Self {
        OperationConfig::EnvironmentAware(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_operation_call() {
        let op: Operation = Operation::new(|call: OperationCall| async move {
            match call.payload.get("id") {
                Some(id) => Ok(json!({ "id": id })),
                None => Err(ActionError::new("missing id").with_code(400_i64)),
            }
        });

        let payload: Payload = [("id", 7)].into_iter().collect();
        let ok = op
            .call(OperationCall {
                payload,
                helpers: Helpers::new(),
                context: (),
            })
            .await;
        assert_eq!(ok, Ok(json!({"id": 7})));

        let err = op
            .clone()
            .call(OperationCall {
                payload: Payload::new(),
                helpers: Helpers::new(),
                context: (),
            })
            .await
            .unwrap_err();
        assert_eq!(err.message, "missing id");
    }

    #[test]
    fn test_helpers() {
        let helpers = Helpers::new().with("api", "https://example.test");
        assert_eq!(helpers.get("api"), Some(&json!("https://example.test")));
        assert!(helpers.dispatch().is_none());
    }

    #[test]
    fn test_builder_collects_extra_in_order() {
        let config: EnvironmentAwareConfig = EnvironmentAwareConfig::new()
            .extra("b", 1)
            .extra("a", 2)
            .client(|_call| async { Ok(Value::Null) });

        let keys: Vec<_> = config.extra.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(config.client.is_some());
        assert!(config.server.is_none());
    }
}
