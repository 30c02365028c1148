//! On-disk fixture format.
//!
//! ```json
//! {
//!   "entities": {
//!     "Order": {
//!       "identifier": ["id"],
//!       "associations": {"customer": "Customer"},
//!       "rows": [{"id": 1, "customer": 10, "code": "A-1"}]
//!     }
//!   },
//!   "callbacks": {
//!     "current_customer": {"entity": "Customer", "key_field": "customer_id"}
//!   }
//! }
//! ```
//!
//! An association column holds the related row's identifier: a scalar for
//! single-field identifiers, an object of identifier fields otherwise.

use std::collections::BTreeMap;

use guardrule_core::types::Record;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub entities: BTreeMap<String, EntityFixture>,

    #[serde(default)]
    pub callbacks: BTreeMap<String, CallbackFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityFixture {
    #[serde(default = "default_identifier")]
    pub identifier: Vec<String>,

    /// Relation name to target entity type.
    #[serde(default)]
    pub associations: BTreeMap<String, String>,

    #[serde(default)]
    pub rows: Vec<Record>,
}

/// A named callback supplying an entity of `entity` whose identifier is the
/// record's `key_field`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackFixture {
    pub entity: String,
    pub key_field: String,
}

fn default_identifier() -> Vec<String> {
    vec!["id".to_string()]
}

impl Fixture {
    /// Reject fixtures the store could not answer consistently.
    pub fn check(&self) -> Result<(), StoreError> {
        for (name, entity) in &self.entities {
            if entity.identifier.is_empty() {
                return Err(StoreError::Fixture(format!(
                    "entity `{name}` has an empty identifier"
                )));
            }
            for (relation, target) in &entity.associations {
                if !self.entities.contains_key(target) {
                    return Err(StoreError::Fixture(format!(
                        "association `{name}.{relation}` targets unknown entity `{target}`"
                    )));
                }
            }
            for (index, row) in entity.rows.iter().enumerate() {
                if let Some(field) = entity
                    .identifier
                    .iter()
                    .find(|field| row.get(*field).map_or(true, |v| v.is_null()))
                {
                    return Err(StoreError::Fixture(format!(
                        "row {index} of `{name}` has no `{field}`"
                    )));
                }
            }
        }
        for (name, callback) in &self.callbacks {
            if !self.entities.contains_key(&callback.entity) {
                return Err(StoreError::Fixture(format!(
                    "callback `{name}` supplies unknown entity `{}`",
                    callback.entity
                )));
            }
        }
        Ok(())
    }
}
