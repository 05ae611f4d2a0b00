//! Core types for action-relay
//!
//! This crate provides the message-construction and async-orchestration glue
//! that plugs into a Redux-style dispatch loop. It does not implement the
//! store, the reducer loop or the router.
//!
//! # Core Concepts
//!
//! - **Message**: A dispatched record identified by an [`ActionType`]
//! - **ActionCreator**: Builds synchronous messages from positional arguments
//! - **AsyncActionCreator**: Runs an operation and dispatches
//!   `TYPE` / `TYPE_SUCCESS` / `TYPE_FAIL`
//! - **Route**: Router record whose thunk runs an async action on navigation
//! - **Naming helpers**: [`async_types`], [`create_types`], [`create_route_types`]
//!
//! # Basic Example
//!
//! ```ignore
//! use action_relay_core::prelude::*;
//! use serde_json::json;
//!
//! let types = create_types(["FETCH_CAR"], Some("CAR"));
//!
//! let fetch_car = AsyncActionCreator::new(
//!     types["FETCH_CAR"].clone(),
//!     EnvironmentAwareConfig::new()
//!         .server(|call| async move { db::load_car(&call.payload).await })
//!         .client(|call| async move { api::get_car(&call.payload).await }),
//! );
//!
//! // Dispatches CAR_FETCH_CAR now, then CAR_FETCH_CAR_SUCCESS or
//! // CAR_FETCH_CAR_FAIL when the operation settles.
//! fetch_car
//!     .create(json!({ "id": 42 }))
//!     .run(action_tx.clone(), ())?
//!     .await?;
//! ```
//!
//! # Reducing the Results
//!
//! A reducer matches on the derived types:
//!
//! ```ignore
//! fn reducer(state: &mut CarState, message: Message) -> bool {
//!     let [fetch, fetched, failed] = async_types("CAR_FETCH_CAR");
//!     match &message.action_type {
//!         t if *t == fetch => { state.loading = true; true }
//!         t if *t == fetched => { state.car = message.response().cloned(); true }
//!         t if *t == failed => { state.error = message.error().cloned(); true }
//!         _ => false,
//!     }
//! }
//! ```

pub mod action;
pub mod dispatch;
pub mod environment;
pub mod normalize;
pub mod operation;
pub mod orchestrator;
pub mod route;
pub mod testing;
pub mod types;

// Message exports
pub use action::{
    Action, ActionCreator, ActionError, ErrorCode, Fields, Message, Outcome, Payload,
};

// Naming exports
pub use types::{
    async_types, create_route_types, create_types, ActionType, ActionTypes, TypeMap,
};

// Dispatch exports
pub use dispatch::{Dispatch, DispatchHandle, LoggingMiddleware, Middleware, WithMiddleware};

// Async exports
pub use environment::{Environment, EnvironmentProbe};
pub use normalize::{Normalize, NormalizeError};
pub use operation::{
    EnvironmentAwareConfig, Helpers, Operation, OperationCall, OperationConfig, OperationFuture,
    OperationResult,
};
pub use orchestrator::{AsyncActionCreator, DispatchError, InFlight, PayloadSource, PendingAction};

// Route exports
pub use route::{async_route, Route, RouteMap, StateAccessor};

// Testing exports
pub use testing::{RecordingDispatch, TestHarness};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{Action, ActionCreator, ActionError, Fields, Message, Outcome, Payload};
    pub use crate::dispatch::{Dispatch, LoggingMiddleware, Middleware, WithMiddleware};
    pub use crate::environment::{Environment, EnvironmentProbe};
    pub use crate::normalize::{Normalize, NormalizeError};
    pub use crate::operation::{EnvironmentAwareConfig, Helpers, OperationCall, OperationConfig};
    pub use crate::orchestrator::{AsyncActionCreator, DispatchError};
    pub use crate::route::{async_route, RouteMap, StateAccessor};
    pub use crate::types::{
        async_types, create_route_types, create_types, ActionType, ActionTypes, TypeMap,
    };
}
