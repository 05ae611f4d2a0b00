//! Action type identifiers and naming helpers
//!
//! Every async action uses three type identifiers that are always derived by
//! suffixing a base type: `TYPE`, `TYPE_SUCCESS` and `TYPE_FAIL`. Groups of
//! types can share a namespace prefix to avoid collisions.
//!
//! # Example
//!
//! ```
//! use action_relay_core::types::{async_types, create_types};
//!
//! let [started, success, fail] = async_types("FETCH_CAR");
//! assert_eq!(success, "FETCH_CAR_SUCCESS");
//! assert_eq!(fail, "FETCH_CAR_FAIL");
//! assert_eq!(started, "FETCH_CAR");
//!
//! let types = create_types(["CREATE_CAR", "EDIT_CAR"], Some("CAR"));
//! assert_eq!(types["CREATE_CAR"], "CAR_CREATE_CAR");
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::ops::Index;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Suffix appended to a type for its success variant
pub const SUCCESS_SUFFIX: &str = "SUCCESS";
/// Suffix appended to a type for its fail variant
pub const FAIL_SUFFIX: &str = "FAIL";
/// Namespace used by [`create_route_types`]
pub const ROUTES_NAMESPACE: &str = "ROUTES";

/// Opaque message type identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionType(String);

impl ActionType {
    /// Create a new action type.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the type as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `TYPE_SUCCESS` variant of this type.
    pub fn success(&self) -> ActionType {
        self.suffixed(SUCCESS_SUFFIX)
    }

    /// The `TYPE_FAIL` variant of this type.
    pub fn fail(&self) -> ActionType {
        self.suffixed(FAIL_SUFFIX)
    }

    /// Prefix this type with `namespace_`.
    pub fn namespaced(&self, namespace: &str) -> ActionType {
        Self(format!("{namespace}_{}", self.0))
    }

    /// `[TYPE, TYPE_SUCCESS, TYPE_FAIL]`
    pub fn triple(&self) -> [ActionType; 3] {
        [self.clone(), self.success(), self.fail()]
    }

    fn suffixed(&self, suffix: &str) -> ActionType {
        Self(format!("{}_{suffix}", self.0))
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ActionType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&ActionType> for ActionType {
    fn from(t: &ActionType) -> Self {
        t.clone()
    }
}

impl AsRef<str> for ActionType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ActionType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ActionType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ActionType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<ActionType> for &str {
    fn eq(&self, other: &ActionType) -> bool {
        *self == other.0
    }
}

/// Derive the `[TYPE, TYPE_SUCCESS, TYPE_FAIL]` triple for an async action.
pub fn async_types(action_type: impl Into<ActionType>) -> [ActionType; 3] {
    action_type.into().triple()
}

/// Build a map from each name to its (optionally namespaced) action type.
///
/// Keys keep their first insertion position. A repeated name overwrites the
/// earlier value.
pub fn create_types<I, S>(names: I, namespace: Option<&str>) -> TypeMap
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names
        .into_iter()
        .map(|name| {
            let name = name.into();
            let action_type = match namespace {
                Some(ns) => ActionType(format!("{ns}_{name}")),
                None => ActionType(name.clone()),
            };
            (name, action_type)
        })
        .collect()
}

/// [`create_types`] under the `ROUTES` namespace.
pub fn create_route_types<I, S>(names: I) -> TypeMap
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    create_types(names, Some(ROUTES_NAMESPACE))
}

/// Insertion-ordered mapping from name to action type
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeMap {
    entries: Vec<(String, ActionType)>,
}

impl TypeMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name, replacing the value of an existing entry in place.
    ///
    /// Returns the previous value if the name was already present.
    pub fn insert(&mut self, name: impl Into<String>, action_type: ActionType) -> Option<ActionType> {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, action_type)),
            None => {
                self.entries.push((name, action_type));
                None
            }
        }
    }

    /// Look up the action type for a name.
    pub fn get(&self, name: &str) -> Option<&ActionType> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, action_type)| action_type)
    }

    /// Whether the name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionType)> {
        self.entries
            .iter()
            .map(|(name, action_type)| (name.as_str(), action_type))
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, ActionType)> for TypeMap {
    fn from_iter<T: IntoIterator<Item = (K, ActionType)>>(iter: T) -> Self {
        let mut map = TypeMap::new();
        for (name, action_type) in iter {
            map.insert(name, action_type);
        }
        map
    }
}

impl Index<&str> for TypeMap {
    type Output = ActionType;

    fn index(&self, name: &str) -> &ActionType {
        self.get(name)
            .unwrap_or_else(|| panic!("no action type named {name:?}"))
    }
}

impl Serialize for TypeMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, action_type) in &self.entries {
            map.serialize_entry(name, action_type)?;
        }
        map.end()
    }
}

/// Trait for enums whose variants name action types
///
/// Use `#[derive(ActionTypes)]` from `action-relay-macros` to implement this.
///
/// # Example
///
/// ```
/// use action_relay_core::types::{ActionType, ActionTypes};
///
/// #[derive(Clone, Copy, Debug)]
/// enum CarTypes {
///     CreateCar,
/// }
///
/// impl ActionTypes for CarTypes {
///     fn name(&self) -> &'static str {
///         "CREATE_CAR"
///     }
///
///     fn action_type(&self) -> ActionType {
///         ActionType::new("CAR_CREATE_CAR")
///     }
///
///     fn all() -> &'static [Self] {
///         &[CarTypes::CreateCar]
///     }
/// }
///
/// assert_eq!(CarTypes::type_map()["CREATE_CAR"], "CAR_CREATE_CAR");
/// ```
pub trait ActionTypes: Sized + 'static {
    /// The un-namespaced name of this type (the type map key).
    fn name(&self) -> &'static str;

    /// The full, possibly namespaced, action type.
    fn action_type(&self) -> ActionType;

    /// All variants in declaration order.
    fn all() -> &'static [Self];

    /// Build the type map for every variant.
    fn type_map() -> TypeMap {
        Self::all()
            .iter()
            .map(|t| (t.name(), t.action_type()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_types() {
        let [started, success, fail] = async_types("FOOBAR");
        assert_eq!(started, "FOOBAR");
        assert_eq!(success, "FOOBAR_SUCCESS");
        assert_eq!(fail, "FOOBAR_FAIL");
    }

    #[test]
    fn test_async_types_is_pure() {
        assert_eq!(async_types("FOO"), async_types("FOO"));
        assert_eq!(async_types(""), async_types(""));
        assert_eq!(async_types("")[1], "_SUCCESS");
    }

    #[test]
    fn test_create_types() {
        let types = create_types(["CREATE_CAR", "EDIT_CAR", "EDIT_WHEELS"], None);
        assert_eq!(types.len(), 3);
        assert_eq!(types["CREATE_CAR"], "CREATE_CAR");
        assert_eq!(types["EDIT_CAR"], "EDIT_CAR");
        assert_eq!(types["EDIT_WHEELS"], "EDIT_WHEELS");
    }

    #[test]
    fn test_create_types_namespaced() {
        let types = create_types(["CREATE_CAR", "EDIT_CAR", "EDIT_WHEELS"], Some("CAR"));
        assert_eq!(types.len(), 3);
        assert_eq!(types["CREATE_CAR"], "CAR_CREATE_CAR");
        assert_eq!(types["EDIT_CAR"], "CAR_EDIT_CAR");
        assert_eq!(types["EDIT_WHEELS"], "CAR_EDIT_WHEELS");
    }

    #[test]
    fn test_create_types_order_and_duplicates() {
        let mut types = create_types(["B", "A", "B"], Some("X"));
        assert_eq!(types.names().collect::<Vec<_>>(), vec!["B", "A"]);

        let previous = types.insert("A", ActionType::new("OTHER"));
        assert_eq!(previous, Some(ActionType::new("X_A")));
        assert_eq!(types["A"], "OTHER");
        assert_eq!(types.names().collect::<Vec<_>>(), vec!["B", "A"]);
    }

    #[test]
    fn test_create_types_empty() {
        let types = create_types(Vec::<String>::new(), Some("CAR"));
        assert!(types.is_empty());
        assert!(types.get("CAR").is_none());
    }

    #[test]
    fn test_create_route_types() {
        let types = create_route_types(["CREATE", "EDIT"]);
        assert_eq!(types.len(), 2);
        assert_eq!(types["CREATE"], "ROUTES_CREATE");
        assert_eq!(types["EDIT"], "ROUTES_EDIT");
    }

    #[test]
    fn test_type_map_serializes_in_order() {
        let types = create_types(["Z", "A"], Some("NS"));
        let json = serde_json::to_string(&types).unwrap();
        assert_eq!(json, r#"{"Z":"NS_Z","A":"NS_A"}"#);
    }

    #[test]
    fn test_namespaced() {
        let t = ActionType::new("FETCH").namespaced("CAR");
        assert_eq!(t, "CAR_FETCH");
        assert_eq!(t.success(), "CAR_FETCH_SUCCESS");
    }
}
