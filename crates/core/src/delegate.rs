//! Conditional delegation: validate with another validator only when the
//! input is not null.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::registry::ValidatorRegistry;
use crate::types::Record;
use crate::validator::{ValidationResult, Validator};

/// Options of a [`ConditionalDelegate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateOptions {
    /// Registry name of the sub-validator.
    pub validator: String,

    /// Template applied to every message of the sub-validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_message: Option<String>,

    /// Per-key templates applied to the sub-validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_messages: Option<BTreeMap<String, String>>,

    /// Remaining options, passed through to the sub-validator.
    #[serde(flatten)]
    pub passthrough: serde_json::Map<String, Value>,
}

/// Forwards non-null values to a validator obtained from the registry.
pub struct ConditionalDelegate {
    options: DelegateOptions,
    registry: Arc<dyn ValidatorRegistry>,
}

impl ConditionalDelegate {
    pub fn new(options: DelegateOptions, registry: Arc<dyn ValidatorRegistry>) -> Self {
        Self { options, registry }
    }

    pub fn from_value(
        options: &Value,
        registry: Arc<dyn ValidatorRegistry>,
    ) -> Result<Self, CoreError> {
        let options: DelegateOptions = serde_json::from_value(options.clone())?;
        Ok(Self::new(options, registry))
    }

    pub fn options(&self) -> &DelegateOptions {
        &self.options
    }

    /// Null passes without touching the registry. Anything else is
    /// validated by a fresh sub-validator whose messages are copied on
    /// failure.
    pub fn evaluate(&self, value: &Value, record: &Record) -> Result<ValidationResult, CoreError> {
        if value.is_null() {
            tracing::debug!(validator = %self.options.validator, "Null input, delegation skipped");
            return Ok(ValidationResult::valid());
        }

        let mut inner = self
            .registry
            .resolve(&self.options.validator, &self.options.passthrough)?;
        if let Some(template) = &self.options.override_message {
            inner.set_message(template);
        }
        if let Some(templates) = &self.options.override_messages {
            inner.set_messages(templates.clone());
        }

        let result = inner.validate(value, record)?;
        if result.is_valid {
            Ok(ValidationResult::valid())
        } else {
            Ok(ValidationResult::invalid(result.violations))
        }
    }
}

impl std::fmt::Debug for ConditionalDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalDelegate")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Validator for ConditionalDelegate {
    fn validate(&self, value: &Value, record: &Record) -> Result<ValidationResult, CoreError> {
        self.evaluate(value, record)
    }

    fn set_message(&mut self, template: &str) {
        self.options.override_message = Some(template.to_string());
    }

    fn set_messages(&mut self, templates: BTreeMap<String, String>) {
        self.options
            .override_messages
            .get_or_insert_with(BTreeMap::new)
            .extend(templates);
    }
}
