//! Validator trait and result types shared by every validator in the crate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dependency::message::MessageVariables;
use crate::error::CoreError;
use crate::types::Record;

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleViolation {
    /// Rule identifier; also the message template key.
    pub rule: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<MessageVariables>,
}

/// Outcome of validating one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub violations: Vec<RuleViolation>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            violations: Vec::new(),
        }
    }

    pub fn invalid(violations: Vec<RuleViolation>) -> Self {
        Self {
            is_valid: false,
            violations,
        }
    }

    /// Messages keyed by rule identifier.
    pub fn messages(&self) -> BTreeMap<&str, &str> {
        self.violations
            .iter()
            .map(|v| (v.rule.as_str(), v.message.as_str()))
            .collect()
    }
}

/// Message templates keyed by rule identifier, with an optional fallback for
/// keys that have no template of their own.
#[derive(Debug, Clone, Default)]
pub struct MessageTemplates {
    templates: BTreeMap<String, String>,
    fallback: Option<String>,
}

impl MessageTemplates {
    pub fn new(defaults: &[(&str, &str)]) -> Self {
        Self {
            templates: defaults
                .iter()
                .map(|(key, template)| (key.to_string(), template.to_string()))
                .collect(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, template: impl Into<String>) -> Self {
        self.fallback = Some(template.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.templates
            .get(key)
            .or(self.fallback.as_ref())
            .map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(key.into(), template.into());
    }

    /// Replace every template, the fallback included.
    pub fn set_all(&mut self, template: &str) {
        for value in self.templates.values_mut() {
            *value = template.to_string();
        }
        if self.fallback.is_some() {
            self.fallback = Some(template.to_string());
        }
    }

    pub fn extend(&mut self, templates: BTreeMap<String, String>) {
        self.templates.extend(templates);
    }
}

/// A configured validator. Instances are immutable while validating, so a
/// shared instance can serve concurrent calls.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Value, record: &Record) -> Result<ValidationResult, CoreError>;

    /// Use `template` for every message this validator can produce.
    fn set_message(&mut self, template: &str);

    /// Override individual templates by rule identifier.
    fn set_messages(&mut self, templates: BTreeMap<String, String>);
}
