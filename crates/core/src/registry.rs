//! Named validator lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;

use crate::delegate::ConditionalDelegate;
use crate::dependency::{Collaborators, DependencyValidator};
use crate::error::CoreError;
use crate::pattern::PatternValidator;
use crate::validator::Validator;

/// Resolves a validator name plus options into a fresh validator instance.
pub trait ValidatorRegistry: Send + Sync {
    fn resolve(
        &self,
        name: &str,
        options: &serde_json::Map<String, Value>,
    ) -> Result<Box<dyn Validator>, CoreError>;
}

pub type ValidatorFactory = Arc<
    dyn Fn(&serde_json::Map<String, Value>) -> Result<Box<dyn Validator>, CoreError> + Send + Sync,
>;

/// Registry names of the validators this crate provides.
pub const DEPENDENCY: &str = "dependency";
pub const IF_NOT_NULL: &str = "if_not_null";
pub const PATTERN: &str = "pattern";

/// Registry backed by factory closures.
#[derive(Clone, Default)]
pub struct FactoryRegistry {
    factories: HashMap<String, ValidatorFactory>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&serde_json::Map<String, Value>) -> Result<Box<dyn Validator>, CoreError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registry with `dependency`, `if_not_null` and `pattern`, plus whatever
    /// `extend` adds. Delegates created by `if_not_null` resolve their
    /// sub-validators through the returned registry.
    pub fn with_builtins<F>(collaborators: Collaborators, extend: F) -> Arc<Self>
    where
        F: FnOnce(&mut Self),
    {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let mut registry = Self::new();

            registry.register(DEPENDENCY, move |options| {
                let validator = DependencyValidator::from_value(
                    &Value::Object(options.clone()),
                    collaborators.clone(),
                )?;
                Ok(Box::new(validator) as Box<dyn Validator>)
            });

            let this = this.clone();
            registry.register(IF_NOT_NULL, move |options| {
                let registry: Arc<dyn ValidatorRegistry> = this.upgrade().ok_or_else(|| {
                    CoreError::Configuration("validator registry was dropped".to_string())
                })?;
                let delegate =
                    ConditionalDelegate::from_value(&Value::Object(options.clone()), registry)?;
                Ok(Box::new(delegate) as Box<dyn Validator>)
            });

            registry.register(PATTERN, |options| {
                Ok(Box::new(PatternValidator::from_options(options)?) as Box<dyn Validator>)
            });

            extend(&mut registry);
            registry
        })
    }
}

impl ValidatorRegistry for FactoryRegistry {
    fn resolve(
        &self,
        name: &str,
        options: &serde_json::Map<String, Value>,
    ) -> Result<Box<dyn Validator>, CoreError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| CoreError::UnknownValidator(name.to_string()))?;
        tracing::debug!(validator = name, "Resolving validator");
        factory(options)
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("validators", &self.names())
            .finish()
    }
}
