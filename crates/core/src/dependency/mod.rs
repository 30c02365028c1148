//! Conditional dependency validation.
//!
//! A dependency validator checks one or more guard fields against expected
//! values and, depending on the result, dispatches a named rule on the field
//! being validated. Guard values come from the submitted record, the
//! persisted version of the same entity, or a chain of associations.

pub mod comparator;
pub mod engine;
pub mod message;
pub mod options;
pub mod resolver;
pub mod rules;
pub mod spec;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::store::{EntityCallback, ValueStore};

pub use engine::DependencyValidator;
pub use options::DependencyOptions;
pub use rules::{BuiltinRule, RuleContext, RuleOutcome, RuleTable};

/// Collaborators injected into dependency validators at construction.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub store: Option<Arc<dyn ValueStore>>,
    pub callbacks: HashMap<String, Arc<dyn EntityCallback>>,
    pub rules: RuleTable,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: Arc<dyn ValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_callback(mut self, name: impl Into<String>, callback: Arc<dyn EntityCallback>) -> Self {
        self.callbacks.insert(name.into(), callback);
        self
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut callbacks: Vec<&str> = self.callbacks.keys().map(String::as_str).collect();
        callbacks.sort_unstable();
        f.debug_struct("Collaborators")
            .field("store", &self.store.is_some())
            .field("callbacks", &callbacks)
            .field("rules", &self.rules)
            .finish()
    }
}
