//! action-relay: action creators and async action orchestration
//!
//! Builds the messages a Redux-style store consumes and runs async
//! operations as a `TYPE` / `TYPE_SUCCESS` / `TYPE_FAIL` sequence. The store,
//! reducer loop and router stay yours.
//!
//! # Example
//! ```ignore
//! use action_relay::prelude::*;
//!
//! #[derive(ActionTypes, Clone, Copy, Debug)]
//! #[action_types(namespace = "CAR")]
//! enum CarTypes {
//!     FetchCar,
//!     SetColor,
//! }
//!
//! let set_color = ActionCreator::new(CarTypes::SetColor.action_type(), ["color"]);
//! let fetch_car = AsyncActionCreator::new(
//!     CarTypes::FetchCar.action_type(),
//!     OperationConfig::direct(|call| async move { api::fetch_car(call.payload).await }),
//! );
//! ```

// Re-export everything from core
pub use action_relay_core::*;

// Re-export derive macros
pub use action_relay_macros::ActionTypes;

/// Prelude for convenient imports
pub mod prelude {
    // Messages
    pub use action_relay_core::{
        Action, ActionCreator, ActionError, Fields, Message, Outcome, Payload,
    };

    // Naming
    pub use action_relay_core::{
        async_types, create_route_types, create_types, ActionType, ActionTypes, TypeMap,
    };

    // Dispatch
    pub use action_relay_core::{Dispatch, LoggingMiddleware, Middleware, WithMiddleware};

    // Async
    pub use action_relay_core::{
        AsyncActionCreator, DispatchError, Environment, EnvironmentAwareConfig, EnvironmentProbe,
        Helpers, Normalize, NormalizeError, OperationCall, OperationConfig,
    };

    // Routes
    pub use action_relay_core::{async_route, RouteMap, StateAccessor};

    // Derive macros
    pub use action_relay_macros::ActionTypes;
}
