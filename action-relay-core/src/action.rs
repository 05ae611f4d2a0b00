//! Dispatched messages and synchronous action creators

use std::fmt::{self, Debug};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::types::ActionType;

/// Ordered string-keyed JSON fields
pub type Fields = serde_json::Map<String, Value>;

/// Keys owned by the message itself; extra fields never override them.
pub const RESERVED_KEYS: &[&str] = &["type", "payload", "response", "error"];

/// Marker trait for actions that can be dispatched
///
/// Actions represent intents to change state. They should be:
/// - Clone: Actions may be logged, replayed, or sent to multiple handlers
/// - Debug: For debugging and logging
/// - Send + 'static: For async dispatch across threads
pub trait Action: Clone + Debug + Send + 'static {
    /// Get the action name for logging and filtering
    fn name(&self) -> &str;
}

/// Mapping from declared field names to values
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Fields);

impl Payload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy only the declared field names out of this payload, in declared order.
    ///
    /// Declared fields that are missing here are present in the result as `null`.
    pub fn select<S: AsRef<str>>(&self, declared: &[S]) -> Payload {
        declared
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let value = self.0.get(name).cloned().unwrap_or(Value::Null);
                (name.to_owned(), value)
            })
            .collect()
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Set a field value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrow the underlying fields.
    pub fn as_fields(&self) -> &Fields {
        &self.0
    }

    /// Consume into the underlying fields.
    pub fn into_fields(self) -> Fields {
        self.0
    }
}

impl From<Fields> for Payload {
    fn from(fields: Fields) -> Self {
        Self(fields)
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

/// Accepts JSON objects and `null`; any other value is handed back.
impl TryFrom<Value> for Payload {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            Value::Null => Ok(Self::default()),
            other => Err(other),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Payload {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Error code attached to a failed operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(n) => write!(f, "{n}"),
            ErrorCode::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(n: i64) -> Self {
        ErrorCode::Number(n)
    }
}

impl From<&str> for ErrorCode {
    fn from(s: &str) -> Self {
        ErrorCode::Text(s.to_owned())
    }
}

impl From<String> for ErrorCode {
    fn from(s: String) -> Self {
        ErrorCode::Text(s)
    }
}

/// Failure value produced by an operation
///
/// Carried in the `error` field of a `_FAIL` message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ActionError {
    /// Human-readable failure description
    pub message: String,
    /// Optional machine-readable code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl ActionError {
    /// Create an error without a code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Attach a code.
    pub fn with_code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Build from any error, keeping only its display text.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        Self::new(error.to_string())
    }
}

/// Terminal result carried by a `_SUCCESS` or `_FAIL` message
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The operation's (possibly normalized) response
    Success(Value),
    /// The operation's failure
    Failure(ActionError),
}

/// A dispatched message
///
/// Serializes flat: `{"type", "payload", "response" | "error", ...extra}`.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Message type identifier
    pub action_type: ActionType,
    /// Call payload
    pub payload: Payload,
    /// Present only on terminal async messages
    pub outcome: Option<Outcome>,
    /// Extra fields merged into the message, in order
    pub extra: Fields,
}

impl Message {
    /// Create a message with no outcome and no extra fields.
    pub fn new(action_type: impl Into<ActionType>, payload: impl Into<Payload>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: payload.into(),
            outcome: None,
            extra: Fields::new(),
        }
    }

    /// Set the outcome.
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Merge extra fields (shallow, later keys win).
    pub fn with_extra(mut self, extra: &Fields) -> Self {
        for (key, value) in extra {
            self.extra.insert(key.clone(), value.clone());
        }
        self
    }

    /// The success response, if any.
    pub fn response(&self) -> Option<&Value> {
        match &self.outcome {
            Some(Outcome::Success(response)) => Some(response),
            _ => None,
        }
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&ActionError> {
        match &self.outcome {
            Some(Outcome::Failure(error)) => Some(error),
            _ => None,
        }
    }

    /// Get an extra field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Render as a flat JSON object.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Action for Message {
    fn name(&self) -> &str {
        self.action_type.as_str()
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.action_type)?;
        map.serialize_entry("payload", &self.payload)?;
        match &self.outcome {
            Some(Outcome::Success(response)) => map.serialize_entry("response", response)?,
            Some(Outcome::Failure(error)) => map.serialize_entry("error", error)?,
            None => {}
        }
        for (key, value) in &self.extra {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// Factory for synchronous messages
///
/// Each positional argument is stored under the param name at the same index.
///
/// # Example
///
/// ```
/// use action_relay_core::ActionCreator;
///
/// let set_name = ActionCreator::new("SET_NAME", ["first", "last"]);
/// let message = set_name.create(["Ada", "Lovelace"]);
/// assert_eq!(message.action_type, "SET_NAME");
/// assert_eq!(message.payload.get("last").unwrap(), "Lovelace");
/// ```
#[derive(Clone, Debug)]
pub struct ActionCreator {
    action_type: ActionType,
    params: Vec<String>,
}

impl ActionCreator {
    /// Create a factory for `action_type` with the given param names.
    pub fn new<I, S>(action_type: impl Into<ActionType>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action_type: action_type.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a factory with no params (always an empty payload).
    pub fn unit(action_type: impl Into<ActionType>) -> Self {
        Self::new(action_type, Vec::<String>::new())
    }

    /// The action type this factory produces.
    pub fn action_type(&self) -> &ActionType {
        &self.action_type
    }

    /// Declared param names.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Build a message from positional arguments.
    ///
    /// Missing arguments become `null`; surplus arguments are ignored.
    pub fn create<I>(&self, args: I) -> Message
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut args = args.into_iter();
        let payload: Payload = self
            .params
            .iter()
            .map(|param| (param.clone(), args.next().map_or(Value::Null, Into::into)))
            .collect();
        Message::new(self.action_type.clone(), payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_creator_unit() {
        let create = ActionCreator::unit("FOOBAR");
        let message = create.create(Vec::<Value>::new());
        assert_eq!(message.action_type, "FOOBAR");
        assert!(message.payload.is_empty());
        assert_eq!(message.to_value(), json!({"type": "FOOBAR", "payload": {}}));
    }

    #[test]
    fn test_action_creator_params() {
        let create = ActionCreator::new("FOO", ["bar", "baz", "qux"]);
        let message = create.create(["bar", "baz", "qux"]);
        assert_eq!(message.payload.len(), 3);
        assert_eq!(message.payload.get("bar"), Some(&json!("bar")));
        assert_eq!(message.payload.get("baz"), Some(&json!("baz")));
        assert_eq!(message.payload.get("qux"), Some(&json!("qux")));
    }

    #[test]
    fn test_action_creator_missing_and_surplus_args() {
        let create = ActionCreator::new("FOO", ["a", "b"]);

        let message = create.create([json!(1)]);
        assert_eq!(message.payload.get("a"), Some(&json!(1)));
        assert_eq!(message.payload.get("b"), Some(&Value::Null));

        let message = create.create([json!(1), json!(2), json!(3)]);
        assert_eq!(message.payload.len(), 2);
    }

    #[test]
    fn test_payload_select() {
        let source: Payload = [("foo", "baz"), ("bar", "qux")].into_iter().collect();

        let selected = source.select(&["bar"]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.get("bar"), Some(&json!("qux")));

        let selected = source.select(&["missing", "foo"]);
        let keys: Vec<_> = selected.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["missing", "foo"]);
        assert_eq!(selected.get("missing"), Some(&Value::Null));
    }

    #[test]
    fn test_payload_try_from_value() {
        assert!(Payload::try_from(json!({"a": 1})).is_ok());
        assert_eq!(Payload::try_from(Value::Null), Ok(Payload::new()));
        assert_eq!(Payload::try_from(json!(3)), Err(json!(3)));
    }

    #[test]
    fn test_message_serializes_flat() {
        let mut extra = Fields::new();
        extra.insert("foo".into(), json!("baz"));
        extra.insert("type".into(), json!("IGNORED"));

        let message = Message::new("FOO_FAIL", ())
            .with_outcome(Outcome::Failure(
                ActionError::new("error message").with_code(500_i64),
            ))
            .with_extra(&extra);

        assert_eq!(
            message.to_value(),
            json!({
                "type": "FOO_FAIL",
                "payload": {},
                "error": {"message": "error message", "code": 500},
                "foo": "baz",
            })
        );
    }

    #[test]
    fn test_action_error_without_code() {
        let error = ActionError::new("boom");
        assert_eq!(error.to_string(), "boom");
        assert_eq!(serde_json::to_value(&error).unwrap(), json!({"message": "boom"}));

        let parsed: ActionError =
            serde_json::from_value(json!({"message": "x", "code": "ENOENT"})).unwrap();
        assert_eq!(parsed.code, Some(ErrorCode::Text("ENOENT".into())));
    }

    #[test]
    fn test_message_accessors() {
        let message = Message::new("T", ()).with_outcome(Outcome::Success(json!(1)));
        assert_eq!(message.response(), Some(&json!(1)));
        assert!(message.error().is_none());
        assert_eq!(message.name(), "T");
    }
}
