//! Validator setup options.
//!
//! Field names on the wire are the historical option keys (`se_campo`,
//! `tem_valor`, ...); the Rust names describe what each option does.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Options of a conditional dependency validator, set once at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyOptions {
    /// Single guard field name.
    #[serde(rename = "se_campo", default, skip_serializing_if = "Option::is_none")]
    pub guard_field: Option<String>,

    /// Expected value (or list of values) of the single guard field. An
    /// explicit `null` is a valid expectation, so presence is tracked
    /// separately from the value.
    #[serde(
        rename = "tem_valor",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected: Option<Value>,

    /// Multi-field guard mapping, comparison path to expected value(s).
    #[serde(
        rename = "se_campos_tem_valores",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub guards: Option<serde_json::Map<String, Value>>,

    /// Rule dispatched when every guard matches.
    #[serde(rename = "este_campo", default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,

    /// Rule dispatched when a guard does not match.
    #[serde(
        rename = "caso_contrario",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub otherwise: Option<String>,

    /// Dotted relationship path prefixed onto the single guard field.
    #[serde(
        rename = "da_associacao",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub association: Option<String>,

    /// Entity type used for persisted and associated lookups.
    #[serde(rename = "entidade", default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,

    /// Custom supplier of the root entity for relationship paths.
    #[serde(rename = "do_callback", default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<CallbackOption>,

    /// Target field compared by the `immutable` rule.
    #[serde(rename = "campo", default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Message template overrides keyed by rule identifier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub messages: BTreeMap<String, String>,
}

/// The `do_callback` option: `{callback, campo?}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackOption {
    /// Name of a registered entity callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,

    /// Label the callback root is addressed by in comparison paths.
    #[serde(rename = "campo", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Label used for the callback root when `campo` is not given.
pub const DEFAULT_CALLBACK_LABEL: &str = "callback";

impl CallbackOption {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(DEFAULT_CALLBACK_LABEL)
    }
}

impl DependencyOptions {
    /// Parse options from a JSON object.
    pub fn from_value(options: &Value) -> Result<Self, CoreError> {
        if !options.is_object() {
            return Err(CoreError::Configuration(
                "validator options must be a JSON object".to_string(),
            ));
        }
        Ok(serde_json::from_value(options.clone())?)
    }
}

/// Keeps an explicit `null` as `Some(Value::Null)`; a missing key stays `None`
/// through `#[serde(default)]`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
