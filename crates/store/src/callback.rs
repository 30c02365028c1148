use std::sync::Arc;

use guardrule_core::error::CoreError;
use guardrule_core::store::{Entity, EntityCallback};
use guardrule_core::types::Record;
use serde_json::Value;

use crate::memory::MemoryStore;

/// Supplies the `entity_type` row whose identifier is held in the record's
/// `key_field`. A missing or null key supplies nothing.
#[derive(Debug, Clone)]
pub struct RecordLookupCallback {
    store: MemoryStore,
    entity_type: String,
    key_field: String,
}

impl RecordLookupCallback {
    pub fn new(
        store: MemoryStore,
        entity_type: impl Into<String>,
        key_field: impl Into<String>,
    ) -> Self {
        Self {
            store,
            entity_type: entity_type.into(),
            key_field: key_field.into(),
        }
    }
}

impl EntityCallback for RecordLookupCallback {
    fn supply(&self, record: &Record) -> Result<Option<Arc<dyn Entity>>, CoreError> {
        let key = record.get(&self.key_field).unwrap_or(&Value::Null);
        if key.is_null() {
            tracing::debug!(key_field = %self.key_field, "No key in record, nothing supplied");
            return Ok(None);
        }
        let found = self.store.get(&self.entity_type, key)?;
        Ok(found.map(|entity| Arc::new(entity) as Arc<dyn Entity>))
    }
}
