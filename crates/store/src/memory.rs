//! In-memory implementation of the engine's store interfaces.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use guardrule_core::error::CoreError;
use guardrule_core::store::{Entity, EntityCallback, ValueStore};
use guardrule_core::types::{loose_eq, Record};
use serde_json::Value;

use crate::callback::RecordLookupCallback;
use crate::error::StoreError;
use crate::fixture::{CallbackFixture, EntityFixture, Fixture};

/// Read-only entity store loaded from a [`Fixture`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<BTreeMap<String, EntityFixture>>,
    callbacks: BTreeMap<String, CallbackFixture>,
}

impl MemoryStore {
    pub fn from_fixture(fixture: Fixture) -> Result<Self, StoreError> {
        fixture.check()?;
        let rows: usize = fixture.entities.values().map(|e| e.rows.len()).sum();
        tracing::debug!(
            entity_types = fixture.entities.len(),
            rows,
            callbacks = fixture.callbacks.len(),
            "Memory store loaded",
        );
        Ok(Self {
            tables: Arc::new(fixture.entities),
            callbacks: fixture.callbacks,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Self::from_fixture(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Entity types known to the store, sorted.
    pub fn entity_types(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Look up a row by a single identifier value or an object of
    /// identifier fields.
    pub fn get(&self, entity_type: &str, key: &Value) -> Result<Option<StoredEntity>, CoreError> {
        find(&self.tables, entity_type, key)
    }

    /// The callbacks declared in the fixture, ready to hand to the engine.
    pub fn callbacks(&self) -> HashMap<String, Arc<dyn EntityCallback>> {
        self.callbacks
            .iter()
            .map(|(name, declared)| {
                let callback: Arc<dyn EntityCallback> = Arc::new(RecordLookupCallback::new(
                    self.clone(),
                    declared.entity.clone(),
                    declared.key_field.clone(),
                ));
                (name.clone(), callback)
            })
            .collect()
    }
}

fn table<'a>(
    tables: &'a BTreeMap<String, EntityFixture>,
    entity_type: &str,
) -> Result<&'a EntityFixture, CoreError> {
    tables
        .get(entity_type)
        .ok_or_else(|| CoreError::Store(format!("unknown entity type `{entity_type}`")))
}

/// Normalize `key` into identifier fields. Scalars only address single-field
/// identifiers.
fn key_fields(identifier: &[String], key: &Value) -> Option<Record> {
    match (key, identifier) {
        (Value::Null, _) => None,
        (Value::Object(fields), _) => Some(fields.clone()),
        (scalar, [single]) => {
            let mut fields = Record::new();
            fields.insert(single.clone(), scalar.clone());
            Some(fields)
        }
        _ => None,
    }
}

fn find(
    tables: &Arc<BTreeMap<String, EntityFixture>>,
    entity_type: &str,
    key: &Value,
) -> Result<Option<StoredEntity>, CoreError> {
    let table = table(tables, entity_type)?;
    let Some(key) = key_fields(&table.identifier, key) else {
        tracing::debug!(entity_type, %key, "Key cannot address identifier");
        return Ok(None);
    };

    let row = table.rows.iter().find(|row| {
        table.identifier.iter().all(|field| match (row.get(field), key.get(field)) {
            (Some(stored), Some(wanted)) => loose_eq(stored, wanted),
            _ => false,
        })
    });

    Ok(row.map(|row| StoredEntity {
        tables: Arc::clone(tables),
        entity_type: entity_type.to_string(),
        row: row.clone(),
    }))
}

impl ValueStore for MemoryStore {
    fn identifier_fields(&self, entity_type: &str) -> Result<Vec<String>, CoreError> {
        Ok(table(&self.tables, entity_type)?.identifier.clone())
    }

    fn find_by_identifier(
        &self,
        entity_type: &str,
        key: &Record,
    ) -> Result<Option<Arc<dyn Entity>>, CoreError> {
        let found = find(&self.tables, entity_type, &Value::Object(key.clone()))?;
        Ok(found.map(|entity| Arc::new(entity) as Arc<dyn Entity>))
    }

    fn association_target(&self, entity_type: &str, relation: &str) -> Result<String, CoreError> {
        table(&self.tables, entity_type)?
            .associations
            .get(relation)
            .cloned()
            .ok_or_else(|| {
                CoreError::Store(format!("`{entity_type}` has no association `{relation}`"))
            })
    }
}

/// One row of a [`MemoryStore`], able to follow its associations.
#[derive(Debug, Clone)]
pub struct StoredEntity {
    tables: Arc<BTreeMap<String, EntityFixture>>,
    entity_type: String,
    row: Record,
}

impl StoredEntity {
    pub fn row(&self) -> &Record {
        &self.row
    }
}

impl Entity for StoredEntity {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn identifier(&self) -> Value {
        let Some(table) = self.tables.get(&self.entity_type) else {
            return Value::Null;
        };
        match table.identifier.as_slice() {
            [single] => self.row.get(single).cloned().unwrap_or(Value::Null),
            fields => Value::Object(
                fields
                    .iter()
                    .map(|field| {
                        (field.clone(), self.row.get(field).cloned().unwrap_or(Value::Null))
                    })
                    .collect(),
            ),
        }
    }

    fn is_association(&self, field: &str) -> bool {
        self.tables
            .get(&self.entity_type)
            .is_some_and(|table| table.associations.contains_key(field))
    }

    fn get(&self, field: &str) -> Value {
        self.row.get(field).cloned().unwrap_or(Value::Null)
    }

    fn association(&self, relation: &str) -> Result<Option<Arc<dyn Entity>>, CoreError> {
        let target = table(&self.tables, &self.entity_type)?
            .associations
            .get(relation)
            .ok_or_else(|| {
                CoreError::Store(format!(
                    "`{}` has no association `{relation}`",
                    self.entity_type
                ))
            })?;
        let key = self.row.get(relation).cloned().unwrap_or(Value::Null);
        let related = find(&self.tables, target, &key)?;
        Ok(related.map(|entity| Arc::new(entity) as Arc<dyn Entity>))
    }
}
