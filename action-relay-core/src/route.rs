//! Route-table integration
//!
//! Routers that map an action type to `{ path, thunk }` can run async actions
//! on navigation. The router dispatches the route's own action when the
//! location changes, so a route thunk only dispatches the terminal
//! `_SUCCESS`/`_FAIL` message.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use action_relay_core::route::{async_route, StateAccessor};
//! use action_relay_core::operation::{EnvironmentAwareConfig, Helpers};
//! use action_relay_core::testing::RecordingDispatch;
//! use serde_json::json;
//!
//! let routes = async_route(
//!     "CAR",
//!     "/car/:id",
//!     EnvironmentAwareConfig::new()
//!         .explicit(|call| async move { Ok(json!({ "car": call.payload.get("id") })) })
//!         .extra("requires_auth", true),
//!     Helpers::new(),
//! );
//!
//! let route = routes.get("CAR").unwrap();
//! assert_eq!(route.path(), "/car/:id");
//! assert_eq!(route.to_value(), json!({ "path": "/car/:id", "requires_auth": true }));
//!
//! let state: StateAccessor = Arc::new(|| json!({ "location": { "payload": { "id": 9 } } }));
//! let dispatch = RecordingDispatch::new();
//! let done = route.thunk(dispatch.clone(), state);
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(done).unwrap();
//! assert_eq!(dispatch.types(), vec!["CAR_SUCCESS"]);
//! ```

use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::action::Fields;
use crate::dispatch::Dispatch;
use crate::operation::{Helpers, OperationConfig};
use crate::orchestrator::{AsyncActionCreator, DispatchError, PayloadSource};
use crate::types::ActionType;

/// JSON pointer to the route payload inside the router state
pub const LOCATION_PAYLOAD_POINTER: &str = "/location/payload";

/// Returns the current router state
pub type StateAccessor = Arc<dyn Fn() -> Value + Send + Sync>;

/// A route record: path, thunk and extra router fields
#[derive(Clone)]
pub struct Route {
    path: String,
    creator: AsyncActionCreator<StateAccessor>,
    helpers: Helpers,
}

impl Route {
    /// URL path pattern for the router.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Extra config fields attached to the route record.
    pub fn extra(&self) -> &Fields {
        self.creator.extra()
    }

    /// Get an extra field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.creator.extra().get(key)
    }

    /// The async action behind this route.
    pub fn creator(&self) -> &AsyncActionCreator<StateAccessor> {
        &self.creator
    }

    /// Run the route's async action.
    ///
    /// The payload is read from `state().location.payload`; a missing one is
    /// empty and a non-object one fails with
    /// [`DispatchError::InvalidPayload`]. The operation receives the state
    /// accessor as its context.
    pub fn thunk<D: Dispatch>(
        &self,
        dispatch: D,
        state: StateAccessor,
    ) -> BoxFuture<'static, Result<D::Output, DispatchError>> {
        let payload = state()
            .pointer(LOCATION_PAYLOAD_POINTER)
            .cloned()
            .unwrap_or(Value::Null);

        let pending = self
            .creator
            .create(PayloadSource::from(payload))
            .with_helpers(self.helpers.clone())
            .without_started();

        match pending.run(dispatch, state) {
            Ok(in_flight) => in_flight.into_parts().1,
            Err(err) => {
                tracing::error!(action = %self.creator.action_type(), %err, "Route thunk failed");
                future::ready(Err(err)).boxed()
            }
        }
    }

    /// Render the serializable part of the record: `{ path, ...extra }`.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("action_type", self.creator.action_type())
            .field("extra", self.extra())
            .finish_non_exhaustive()
    }
}

impl Serialize for Route {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("path", &self.path)?;
        for (key, value) in self.extra() {
            if key != "path" && key != "thunk" {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// Ordered mapping from action type to route record
#[derive(Clone, Debug, Default)]
pub struct RouteMap {
    routes: Vec<(ActionType, Route)>,
}

impl RouteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route, replacing an existing one for the same type in place.
    pub fn insert(&mut self, action_type: impl Into<ActionType>, route: Route) -> Option<Route> {
        let action_type = action_type.into();
        match self.routes.iter_mut().find(|(t, _)| *t == action_type) {
            Some((_, existing)) => Some(std::mem::replace(existing, route)),
            None => {
                self.routes.push((action_type, route));
                None
            }
        }
    }

    /// Look up a route by action type.
    pub fn get(&self, action_type: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|(t, _)| t.as_str() == action_type)
            .map(|(_, route)| route)
    }

    /// Merge another map into this one; later routes win.
    pub fn merge(mut self, other: RouteMap) -> Self {
        for (action_type, route) in other.routes {
            self.insert(action_type, route);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate routes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ActionType, &Route)> {
        self.routes.iter().map(|(t, route)| (t, route))
    }
}

impl FromIterator<RouteMap> for RouteMap {
    fn from_iter<T: IntoIterator<Item = RouteMap>>(iter: T) -> Self {
        iter.into_iter().fold(RouteMap::new(), RouteMap::merge)
    }
}

impl Serialize for RouteMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.routes.len()))?;
        for (action_type, route) in &self.routes {
            map.serialize_entry(action_type, route)?;
        }
        map.end()
    }
}

/// Build a single-entry route map for an async action.
///
/// Extra config fields end up both on the route record and on every
/// dispatched message. `helpers` are handed to the operation on each run.
pub fn async_route(
    action_type: impl Into<ActionType>,
    path: impl Into<String>,
    config: impl Into<OperationConfig<StateAccessor>>,
    helpers: impl Into<Helpers>,
) -> RouteMap {
    let action_type = action_type.into();
    let route = Route {
        path: path.into(),
        creator: AsyncActionCreator::new(action_type.clone(), config),
        helpers: helpers.into(),
    };
    let mut routes = RouteMap::new();
    routes.insert(action_type, route);
    routes
}
