//! Store configuration, passed at construction.

/// Settings for a [`RecordStore`](crate::RecordStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Name recorded on every log line (`store = "app"`).
    pub name: String,
    /// Reject writes that fail the schema registered for their kind.
    pub enforce_schemas: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            enforce_schemas: true,
        }
    }
}

impl StoreConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Registered schemas are kept but no longer checked.
    pub fn without_schemas(mut self) -> Self {
        self.enforce_schemas = false;
        self
    }
}
