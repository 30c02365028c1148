//! Resolution of comparison paths against a record and the value store.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::options::{CallbackOption, DependencyOptions};
use super::spec::ComparisonPath;
use crate::error::CoreError;
use crate::store::{field_value, find_persisted, Entity, EntityCallback, ValueStore};
use crate::types::{Record, Resolved};

/// Anything able to turn a comparison path into a value.
pub trait Resolve {
    fn resolve(&self, path: &ComparisonPath, record: &Record) -> Result<Resolved, CoreError>;
}

/// Default resolver: record first, then persisted entity, then associations.
pub struct PathResolver<'a> {
    options: &'a DependencyOptions,
    store: Option<&'a dyn ValueStore>,
    callbacks: &'a HashMap<String, Arc<dyn EntityCallback>>,
}

impl<'a> PathResolver<'a> {
    pub fn new(
        options: &'a DependencyOptions,
        store: Option<&'a dyn ValueStore>,
        callbacks: &'a HashMap<String, Arc<dyn EntityCallback>>,
    ) -> Self {
        Self {
            options,
            store,
            callbacks,
        }
    }

    fn store(&self) -> Result<&'a dyn ValueStore, CoreError> {
        self.store.ok_or_else(|| {
            CoreError::Configuration("entity lookups need a value store".to_string())
        })
    }

    fn entity_type(&self, path: &ComparisonPath) -> Result<&'a str, CoreError> {
        self.options.entity.as_deref().ok_or_else(|| {
            CoreError::Configuration(format!(
                "path `{path}` crosses associations but `entidade` is not set"
            ))
        })
    }

    fn callback_root(
        &self,
        option: &CallbackOption,
        record: &Record,
    ) -> Result<Option<Arc<dyn Entity>>, CoreError> {
        let name = option.callback.as_deref().ok_or_else(|| {
            CoreError::Callback("`do_callback` has no `callback` entry".to_string())
        })?;
        let callback = self
            .callbacks
            .get(name)
            .ok_or_else(|| CoreError::Callback(format!("callback `{name}` is not registered")))?;
        callback.supply(record)
    }

    /// Root entity for a path whose first relation is a foreign key held in
    /// the record. The key is either an object of identifier fields or a
    /// scalar for single-field identifiers.
    fn related_root(
        &self,
        path: &ComparisonPath,
        relation: &str,
        key: &Value,
    ) -> Result<Option<Arc<dyn Entity>>, CoreError> {
        let store = self.store()?;
        let target = store.association_target(self.entity_type(path)?, relation)?;
        match key {
            Value::Object(fields) => find_persisted(store, &target, fields),
            scalar => {
                let identifier = store.identifier_fields(&target)?;
                match identifier.as_slice() {
                    [single] => {
                        let mut fields = Record::new();
                        fields.insert(single.clone(), scalar.clone());
                        find_persisted(store, &target, &fields)
                    }
                    _ => {
                        tracing::debug!(
                            %path,
                            target = %target,
                            "Scalar key cannot address a composite identifier",
                        );
                        Ok(None)
                    }
                }
            }
        }
    }
}

/// Follow `relations` one association hop at a time.
fn traverse(
    root: Option<Arc<dyn Entity>>,
    relations: &[String],
) -> Result<Option<Arc<dyn Entity>>, CoreError> {
    let mut current = root;
    for relation in relations {
        current = match current {
            Some(entity) => entity.association(relation)?,
            None => return Ok(None),
        };
    }
    Ok(current)
}

impl Resolve for PathResolver<'_> {
    fn resolve(&self, path: &ComparisonPath, record: &Record) -> Result<Resolved, CoreError> {
        let relations = path.relations();

        let Some((first, rest)) = relations.split_first() else {
            // A submitted null defers to the persisted value when there is one.
            let submitted = record.get(path.field());
            if let Some(value) = submitted.filter(|v| !v.is_null()) {
                return Ok(Resolved::Present(value.clone()));
            }
            let Some(entity_type) = self.options.entity.as_deref() else {
                tracing::debug!(%path, "Field not filled in record and no entity configured");
                return Ok(submitted.map_or(Resolved::Absent, |v| Resolved::Present(v.clone())));
            };
            return match find_persisted(self.store()?, entity_type, record)? {
                Some(old) => Ok(Resolved::Present(field_value(old.as_ref(), path.field())?)),
                None => {
                    tracing::debug!(%path, entity_type, "No persisted entity for record");
                    Ok(submitted.map_or(Resolved::Absent, |v| Resolved::Present(v.clone())))
                }
            };
        };

        let entity = if let Some(callback) = &self.options.callback {
            traverse(self.callback_root(callback, record)?, rest)?
        } else if let Some(key) = record.get(first.as_str()) {
            if key.is_null() {
                tracing::debug!(%path, relation = %first, "Null foreign key");
                return Ok(Resolved::Absent);
            }
            traverse(self.related_root(path, first, key)?, rest)?
        } else {
            let root = find_persisted(self.store()?, self.entity_type(path)?, record)?;
            traverse(root, relations)?
        };

        match entity {
            Some(entity) => {
                tracing::trace!(%path, entity_type = entity.entity_type(), "Path resolved");
                Ok(Resolved::Present(field_value(entity.as_ref(), path.field())?))
            }
            None => {
                tracing::debug!(%path, "Association chain broken");
                Ok(Resolved::Absent)
            }
        }
    }
}
