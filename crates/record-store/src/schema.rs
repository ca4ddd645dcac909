//! # Record Schemas
//!
//! A schema can be registered per [`KeyKind`](crate::KeyKind). When schemas are enforced
//! (see [`StoreConfig`](crate::StoreConfig)) every write is checked against the schema of
//! its kind *after* merging, so a patch can't leave a record in a shape the rest of the
//! app can't read.

use crate::key::RecordKey;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// Checks the committed shape of a record.
pub trait RecordSchema: Send + Sync {
    fn validate(&self, key: &RecordKey, value: &Value) -> Result<(), String>;
}

impl<F> RecordSchema for F
where
    F: Fn(&RecordKey, &Value) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, key: &RecordKey, value: &Value) -> Result<(), String> {
        self(key, value)
    }
}

/// Accepts any value that deserializes into `T`.
pub struct TypedSchema<T>(PhantomData<fn() -> T>);

impl<T> TypedSchema<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> RecordSchema for TypedSchema<T> {
    fn validate(&self, _key: &RecordKey, value: &Value) -> Result<(), String> {
        T::deserialize(value).map(|_| ()).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyKind;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    #[allow(dead_code)]
    struct Rate {
        rate: f64,
    }

    #[test]
    fn test_typed_schema_accepts_matching_shape() {
        let key = KeyKind::new("rate").member("1");
        let schema = TypedSchema::<Rate>::new();
        assert!(schema.validate(&key, &json!({"rate": 12.5})).is_ok());
        assert!(schema.validate(&key, &json!({"rate": "twelve"})).is_err());
    }

    #[test]
    fn test_closure_schema() {
        let key = KeyKind::new("rate").member("1");
        let positive = |_: &RecordKey, value: &Value| match value["rate"].as_f64() {
            Some(rate) if rate > 0.0 => Ok(()),
            _ => Err("rate must be positive".to_string()),
        };
        assert!(positive.validate(&key, &json!({"rate": 1})).is_ok());
        assert_eq!(
            positive.validate(&key, &json!({"rate": 0})),
            Err("rate must be positive".to_string())
        );
    }
}
