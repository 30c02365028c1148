//! Collaborator interfaces for persisted entities.
//!
//! The engine never talks to a database. It reads snapshots through
//! [`ValueStore`] and [`Entity`], and callers may supply root entities through
//! an [`EntityCallback`].

use std::sync::Arc;

use serde_json::Value;

use crate::error::CoreError;
use crate::types::Record;

/// Read-only snapshot of one persisted entity.
pub trait Entity: Send + Sync {
    fn entity_type(&self) -> &str;

    /// Identifier value: a scalar for single-field keys, an object otherwise.
    fn identifier(&self) -> Value;

    /// Whether `field` names an association rather than a plain column.
    fn is_association(&self, field: &str) -> bool;

    /// Plain field value, `Null` when unset.
    fn get(&self, field: &str) -> Value;

    /// Related entity across one association hop.
    fn association(&self, relation: &str) -> Result<Option<Arc<dyn Entity>>, CoreError>;
}

/// Lookup side of the entity store.
pub trait ValueStore: Send + Sync {
    /// Names of the fields making up the identifier of `entity_type`.
    fn identifier_fields(&self, entity_type: &str) -> Result<Vec<String>, CoreError>;

    /// Entity whose identifier equals `key`, or `None` if there is none.
    fn find_by_identifier(
        &self,
        entity_type: &str,
        key: &Record,
    ) -> Result<Option<Arc<dyn Entity>>, CoreError>;

    /// Entity type on the far side of `relation`.
    fn association_target(&self, entity_type: &str, relation: &str) -> Result<String, CoreError>;
}

/// Caller-provided supplier of the root entity for relationship paths.
pub trait EntityCallback: Send + Sync {
    fn supply(&self, record: &Record) -> Result<Option<Arc<dyn Entity>>, CoreError>;
}

impl<F> EntityCallback for F
where
    F: Fn(&Record) -> Result<Option<Arc<dyn Entity>>, CoreError> + Send + Sync,
{
    fn supply(&self, record: &Record) -> Result<Option<Arc<dyn Entity>>, CoreError> {
        self(record)
    }
}

/// Find the persisted entity identified by fields present in `record`.
///
/// Returns `None` without querying when any identifier field is missing or
/// null, which is the case for records that were never saved.
pub fn find_persisted(
    store: &dyn ValueStore,
    entity_type: &str,
    record: &Record,
) -> Result<Option<Arc<dyn Entity>>, CoreError> {
    let mut key = Record::new();
    for field in store.identifier_fields(entity_type)? {
        match record.get(&field) {
            Some(value) if !value.is_null() => {
                key.insert(field, value.clone());
            }
            _ => return Ok(None),
        }
    }
    if key.is_empty() {
        return Ok(None);
    }
    store.find_by_identifier(entity_type, &key)
}

/// Read `field` off `entity`. Associations yield the related identifier,
/// or `Null` when the link is empty.
pub fn field_value(entity: &dyn Entity, field: &str) -> Result<Value, CoreError> {
    if entity.is_association(field) {
        Ok(entity
            .association(field)?
            .map(|related| related.identifier())
            .unwrap_or(Value::Null))
    } else {
        Ok(entity.get(field))
    }
}
