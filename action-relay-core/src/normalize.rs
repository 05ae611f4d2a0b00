//! Response normalization hook

use serde_json::Value;

/// Returned by a [`Normalize`] implementation that cannot shape a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct NormalizeError(String);

impl NormalizeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<serde_json::Error> for NormalizeError {
    fn from(err: serde_json::Error) -> Self {
        Self(err.to_string())
    }
}

/// Pure transform from `(response, schema)` to a normalized response
///
/// Only invoked for async actions configured with a schema, once per
/// successful call.
pub trait Normalize: Send + Sync {
    fn normalize(&self, response: Value, schema: &Value) -> Result<Value, NormalizeError>;
}

impl<F> Normalize for F
where
    F: Fn(Value, &Value) -> Result<Value, NormalizeError> + Send + Sync,
{
    fn normalize(&self, response: Value, schema: &Value) -> Result<Value, NormalizeError> {
        self(response, schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_closure_normalizer() {
        let by_id = |response: Value, schema: &Value| -> Result<Value, NormalizeError> {
            let key = schema["idAttribute"].as_str().unwrap_or("id");
            let id = response
                .get(key)
                .cloned()
                .ok_or_else(|| NormalizeError::new(format!("missing `{key}`")))?;
            Ok(json!({ "result": id, "entities": [response] }))
        };

        let normalized = by_id
            .normalize(json!({"id": 4, "name": "car"}), &json!({}))
            .unwrap();
        assert_eq!(normalized["result"], 4);

        let err = by_id.normalize(json!({}), &json!({})).unwrap_err();
        assert_eq!(err.message(), "missing `id`");
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<Value>("{").unwrap_err();
        let err = NormalizeError::from(err);
        assert!(!err.message().is_empty());
    }
}
