//! # Patches and Drafts
//!
//! Records are JSON values. Writes that touch only some fields go through a [`Patch`]:
//! every field in the patch replaces the stored field, nested objects merge recursively,
//! and `null` removes the field. A [`Draft`] is the uncommitted working copy a form edits.

use serde_json::{Map, Value};

/// Field map of an object record.
pub type Fields = Map<String, Value>;

/// A field-level update, applied to a record as one atomic merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch(Fields);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Marks `field` for removal.
    pub fn remove(&mut self, field: impl Into<String>) {
        self.0.insert(field.into(), Value::Null);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Fields {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Result of applying this patch over `existing` (absent records start empty).
    pub fn apply_to(&self, existing: Option<Value>) -> Value {
        let mut fields = match existing {
            Some(Value::Object(fields)) => fields,
            _ => Fields::new(),
        };
        merge_fields(&mut fields, &self.0);
        Value::Object(fields)
    }
}

impl From<Fields> for Patch {
    fn from(fields: Fields) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Patch {
    type Error = Value;

    /// Only objects are patches; anything else is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(other),
        }
    }
}

fn merge_fields(target: &mut Fields, patch: &Fields) {
    for (field, incoming) in patch {
        match incoming {
            Value::Null => {
                target.remove(field);
            }
            Value::Object(nested) => match target.get_mut(field) {
                Some(Value::Object(existing)) => merge_fields(existing, nested),
                _ => {
                    target.insert(field.clone(), without_nulls(incoming));
                }
            },
            other => {
                target.insert(field.clone(), other.clone());
            }
        }
    }
}

// Fresh objects are stored without their null markers.
fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Working copy of the fields a form edits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft(Fields);

impl Draft {
    pub fn new(fields: Fields) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String view of a field; missing and non-string fields read as `""`.
    pub fn text(&self, field: &str) -> &str {
        self.0.get(field).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn fields(&self) -> &Fields {
        &self.0
    }

    /// Fields that differ from `baseline`, with `null` for fields the draft dropped.
    pub fn changes_from(&self, baseline: &Fields) -> Patch {
        let mut changes: Fields = self
            .0
            .iter()
            .filter(|(field, value)| baseline.get(*field) != Some(*value))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        for field in baseline.keys().filter(|field| !self.0.contains_key(*field)) {
            changes.insert(field.clone(), Value::Null);
        }
        Patch(changes)
    }
}
