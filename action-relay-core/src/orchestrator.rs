//! Async action orchestration
//!
//! An [`AsyncActionCreator`] turns an operation into the three-message
//! protocol used for async work:
//!
//! 1. `TYPE` is dispatched as soon as the call is run
//! 2. the selected operation executes
//! 3. exactly one of `TYPE_SUCCESS` (with `response`) or `TYPE_FAIL`
//!    (with `error`) is dispatched when it settles
//!
//! # Example
//!
//! ```
//! use action_relay_core::orchestrator::AsyncActionCreator;
//! use action_relay_core::operation::OperationConfig;
//! use action_relay_core::testing::RecordingDispatch;
//! use serde_json::json;
//!
//! # tokio_test_block(async {
//! let fetch_car = AsyncActionCreator::new(
//!     "FETCH_CAR",
//!     OperationConfig::direct(|call| async move { Ok(json!({ "id": call.payload.get("id") })) }),
//! );
//!
//! let dispatch = RecordingDispatch::new();
//! fetch_car
//!     .create(json!({ "id": 3 }))
//!     .run(dispatch.clone(), ())
//!     .unwrap()
//!     .await
//!     .unwrap();
//!
//! assert_eq!(dispatch.types(), vec!["FETCH_CAR", "FETCH_CAR_SUCCESS"]);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! Payloads are JSON objects. Without a declared field list the payload is
//! passed through unmodified; any other JSON value is refused with
//! [`DispatchError::InvalidPayload`] before anything is dispatched.
//! With one ([`AsyncActionCreator::with_fields`]) only the declared fields are
//! kept, in declared order, and missing ones are `null`.

use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::action::{Fields, Message, Outcome, Payload, RESERVED_KEYS};
use crate::dispatch::{Dispatch, DispatchHandle};
use crate::environment::{Environment, EnvironmentProbe};
use crate::normalize::NormalizeError;
use crate::operation::{Helpers, Operation, OperationCall, OperationConfig, SchemaConfig};
use crate::types::ActionType;

/// Hard failures of an async action call
///
/// Operation failures are not errors here: they become `_FAIL` messages.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No operation resolves for the current environment
    #[error("no {environment} operation configured for `{action_type}`")]
    NoOperation {
        action_type: ActionType,
        environment: Environment,
    },
    /// The call payload is not a JSON object (or `null`)
    #[error("payload for `{action_type}` must be a JSON object, got {value}")]
    InvalidPayload {
        action_type: ActionType,
        value: Value,
    },
    /// The normalizer rejected a successful response
    ///
    /// No terminal message is dispatched in this case.
    #[error("failed to normalize `{action_type}` response: {source}")]
    Normalize {
        action_type: ActionType,
        #[source]
        source: NormalizeError,
    },
}

struct Inner<C> {
    action_type: ActionType,
    explicit: Option<Operation<C>>,
    server: Option<Operation<C>>,
    client: Option<Operation<C>>,
    schema: Option<SchemaConfig>,
    extra: Fields,
    fields: Option<Vec<String>>,
    environment: Arc<dyn EnvironmentProbe>,
}

impl<C> Clone for Inner<C> {
    fn clone(&self) -> Self {
        Self {
            action_type: self.action_type.clone(),
            explicit: self.explicit.clone(),
            server: self.server.clone(),
            client: self.client.clone(),
            schema: self.schema.clone(),
            extra: self.extra.clone(),
            fields: self.fields.clone(),
            environment: Arc::clone(&self.environment),
        }
    }
}

impl<C> Inner<C> {
    fn select(&self) -> Result<&Operation<C>, DispatchError> {
        if let Some(op) = &self.explicit {
            tracing::trace!(action = %self.action_type, "Selected explicit operation");
            return Ok(op);
        }

        let environment = self.environment.environment();
        let op = match environment {
            Environment::Server => self.server.as_ref(),
            Environment::Client => self.client.as_ref(),
        };
        match op {
            Some(op) => {
                tracing::trace!(action = %self.action_type, %environment, "Selected operation");
                Ok(op)
            }
            None => Err(DispatchError::NoOperation {
                action_type: self.action_type.clone(),
                environment,
            }),
        }
    }

    fn normalize(&self, response: Value) -> Result<Value, DispatchError> {
        match &self.schema {
            Some(schema) => schema
                .normalizer
                .normalize(response, &schema.schema)
                .map_err(|source| DispatchError::Normalize {
                    action_type: self.action_type.clone(),
                    source,
                }),
            None => Ok(response),
        }
    }

    fn message(&self, action_type: ActionType, payload: Payload, outcome: Option<Outcome>) -> Message {
        Message {
            action_type,
            payload,
            outcome,
            extra: self.extra.clone(),
        }
    }
}

/// Factory for async actions
///
/// Cheap to clone; the configuration is shared and never mutated after
/// construction.
pub struct AsyncActionCreator<C = ()> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for AsyncActionCreator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> fmt::Debug for AsyncActionCreator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncActionCreator")
            .field("action_type", &self.inner.action_type)
            .field("explicit", &self.inner.explicit.is_some())
            .field("server", &self.inner.server.is_some())
            .field("client", &self.inner.client.is_some())
            .field("schema", &self.inner.schema)
            .field("extra", &self.inner.extra)
            .field("fields", &self.inner.fields)
            .finish()
    }
}

impl<C: Send + 'static> AsyncActionCreator<C> {
    /// Create an async action for `action_type`.
    ///
    /// The environment is detected with [`Environment::detect`]; override it
    /// with [`with_environment`](Self::with_environment).
    pub fn new(action_type: impl Into<ActionType>, config: impl Into<OperationConfig<C>>) -> Self {
        let action_type = action_type.into();
        let inner = match config.into() {
            OperationConfig::Direct(op) => Inner {
                action_type,
                explicit: Some(op),
                server: None,
                client: None,
                schema: None,
                extra: Fields::new(),
                fields: None,
                environment: Arc::new(Environment::detect()),
            },
            OperationConfig::EnvironmentAware(config) => {
                let extra = config
                    .extra
                    .into_iter()
                    .filter(|(key, _)| {
                        let reserved = RESERVED_KEYS.contains(&key.as_str());
                        if reserved {
                            tracing::warn!(action = %action_type, key = %key, "Dropping reserved extra field");
                        }
                        !reserved
                    })
                    .collect();
                Inner {
                    action_type,
                    explicit: config.explicit,
                    server: config.server,
                    client: config.client,
                    schema: config.schema,
                    extra,
                    fields: None,
                    environment: Arc::new(Environment::detect()),
                }
            }
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Decide server vs client with `probe` instead of process detection.
    pub fn with_environment(mut self, probe: impl EnvironmentProbe + 'static) -> Self {
        Arc::make_mut(&mut self.inner).environment = Arc::new(probe);
        self
    }

    /// Keep only these payload fields, in this order.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::make_mut(&mut self.inner).fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// The base action type.
    pub fn action_type(&self) -> &ActionType {
        &self.inner.action_type
    }

    /// `[TYPE, TYPE_SUCCESS, TYPE_FAIL]`
    pub fn types(&self) -> [ActionType; 3] {
        self.inner.action_type.triple()
    }

    /// Extra fields merged into every dispatched message.
    pub fn extra(&self) -> &Fields {
        &self.inner.extra
    }

    /// Prepare a call with the given payload.
    pub fn create(&self, payload: impl Into<PayloadSource>) -> PendingAction<C> {
        PendingAction {
            creator: self.clone(),
            payload: payload.into().0,
            helpers: Helpers::new(),
            announce: true,
        }
    }
}

/// Anything accepted as a call payload
///
/// Objects become fields and `null` is an empty payload. Any other JSON value
/// is kept as-is and rejected by [`PendingAction::run`].
#[derive(Debug, Clone)]
pub struct PayloadSource(Result<Payload, Value>);

impl Default for PayloadSource {
    fn default() -> Self {
        Self(Ok(Payload::default()))
    }
}

impl From<Payload> for PayloadSource {
    fn from(payload: Payload) -> Self {
        Self(Ok(payload))
    }
}

impl From<()> for PayloadSource {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Fields> for PayloadSource {
    fn from(fields: Fields) -> Self {
        Self(Ok(Payload::from(fields)))
    }
}

impl From<Value> for PayloadSource {
    fn from(value: Value) -> Self {
        Self(Payload::try_from(value))
    }
}

/// A prepared async action call, not yet run
pub struct PendingAction<C = ()> {
    creator: AsyncActionCreator<C>,
    payload: Result<Payload, Value>,
    helpers: Helpers,
    announce: bool,
}

impl<C> fmt::Debug for PendingAction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAction")
            .field("action_type", &self.creator.inner.action_type)
            .field("payload", &self.payload)
            .field("helpers", &self.helpers)
            .finish()
    }
}

impl<C: Send + 'static> PendingAction<C> {
    /// Values handed to the operation alongside dispatch.
    pub fn with_helpers(mut self, helpers: impl Into<Helpers>) -> Self {
        self.helpers = helpers.into();
        self
    }

    /// Skip the started message; the caller has already announced the call.
    pub(crate) fn without_started(mut self) -> Self {
        self.announce = false;
        self
    }

    /// Run the call.
    ///
    /// Selects the operation, dispatches the started message, and starts the
    /// operation. The returned [`InFlight`] must be awaited (or
    /// [spawned](InFlight::spawn)) for the terminal message to be dispatched.
    ///
    /// Nothing is dispatched when an error is returned.
    #[must_use = "the terminal message is only dispatched when this is awaited or spawned"]
    pub fn run<D: Dispatch>(self, dispatch: D, context: C) -> Result<InFlight<D::Output>, DispatchError> {
        let inner = Arc::clone(&self.creator.inner);
        let operation = inner.select()?.clone();

        let payload = self.payload.map_err(|value| DispatchError::InvalidPayload {
            action_type: inner.action_type.clone(),
            value,
        })?;
        let payload = match &inner.fields {
            Some(fields) => payload.select(fields),
            None => payload,
        };

        let dispatch = Arc::new(dispatch);
        let started = if self.announce {
            tracing::debug!(action = %inner.action_type, "Async action started");
            let message = inner.message(inner.action_type.clone(), payload.clone(), None);
            Some(dispatch.dispatch(message))
        } else {
            None
        };

        let call = OperationCall {
            payload: payload.clone(),
            helpers: self.helpers.with_dispatch(DispatchHandle::new(Arc::clone(&dispatch))),
            context,
        };
        let settled = operation.call(call);

        let completion = async move {
            let message = match settled.await {
                Ok(response) => {
                    let response = inner.normalize(response)?;
                    tracing::debug!(action = %inner.action_type, "Async action succeeded");
                    inner.message(inner.action_type.success(), payload, Some(Outcome::Success(response)))
                }
                Err(error) => {
                    tracing::warn!(action = %inner.action_type, %error, "Async action failed");
                    inner.message(inner.action_type.fail(), payload, Some(Outcome::Failure(error)))
                }
            };
            Ok::<_, DispatchError>(dispatch.dispatch(message))
        }
        .boxed();

        Ok(InFlight { started, completion })
    }
}

/// A running async action call
///
/// Await it to get the terminal dispatch's output. The operation does not
/// run and no terminal message is dispatched until then.
#[must_use = "the terminal message is only dispatched when this is awaited or spawned"]
pub struct InFlight<R> {
    started: Option<R>,
    completion: BoxFuture<'static, Result<R, DispatchError>>,
}

impl<R> fmt::Debug for InFlight<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlight")
            .field("announced", &self.started.is_some())
            .finish_non_exhaustive()
    }
}

impl<R: Send + 'static> InFlight<R> {
    /// Output of the started dispatch, if one was made.
    pub fn started(&self) -> Option<&R> {
        self.started.as_ref()
    }

    /// Split into the started output and the completion future.
    pub fn into_parts(self) -> (Option<R>, BoxFuture<'static, Result<R, DispatchError>>) {
        (self.started, self.completion)
    }

    /// Drive the call to completion on the tokio runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<R, DispatchError>> {
        tokio::spawn(self.completion)
    }
}

impl<R: Send + 'static> IntoFuture for InFlight<R> {
    type Output = Result<R, DispatchError>;
    type IntoFuture = BoxFuture<'static, Result<R, DispatchError>>;

    fn into_future(self) -> Self::IntoFuture {
        self.completion
    }
}
