//! Canonical comparison specification built from validator options.

use std::fmt;

use serde_json::Value;

use super::options::DependencyOptions;
use crate::error::CoreError;
use crate::types::loose_eq;

/// A dot-delimited path: relationship segments followed by a field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonPath {
    raw: String,
    relations: Vec<String>,
    field: String,
}

impl ComparisonPath {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let mut segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(CoreError::Configuration(format!(
                "comparison path `{raw}` has an empty segment"
            )));
        }
        // split() always yields at least one segment.
        let field = segments.pop().unwrap_or_default();
        Ok(Self {
            raw: raw.to_string(),
            relations: segments,
            field,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Relationship segments, outermost first.
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for ComparisonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Non-empty set of acceptable values for one path.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSet(Vec<Value>);

impl ValueSet {
    /// Normalize a configured value: a list becomes its elements, anything
    /// else becomes a one-element set.
    pub fn from_option(value: &Value) -> Result<Self, CoreError> {
        let values = match value {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };
        if values.is_empty() {
            return Err(CoreError::Configuration(
                "acceptable-value set must not be empty".to_string(),
            ));
        }
        Ok(Self(values))
    }

    /// The acceptable value equal to `candidate`, if any.
    pub fn find(&self, candidate: &Value) -> Option<&Value> {
        self.0.iter().find(|accepted| loose_eq(accepted, candidate))
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

/// Ordered mapping from comparison path to acceptable values. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSpec {
    entries: Vec<(ComparisonPath, ValueSet)>,
}

impl ComparisonSpec {
    /// Build the comparison spec from options.
    ///
    /// The multi-field mapping wins when present. Otherwise the single guard
    /// field is used, prefixed with the association path and then with the
    /// callback label when those options are set.
    pub fn from_options(options: &DependencyOptions) -> Result<Self, CoreError> {
        if let Some(guards) = &options.guards {
            let entries = guards
                .iter()
                .map(|(path, value)| Ok((ComparisonPath::parse(path)?, ValueSet::from_option(value)?)))
                .collect::<Result<Vec<_>, CoreError>>()?;
            if entries.is_empty() {
                return Err(CoreError::Configuration(
                    "`se_campos_tem_valores` must contain at least one entry".to_string(),
                ));
            }
            return Ok(Self { entries });
        }

        let Some(guard_field) = &options.guard_field else {
            return Err(CoreError::Configuration(
                "either `se_campos_tem_valores` or `se_campo` with `tem_valor` is required"
                    .to_string(),
            ));
        };
        let Some(expected) = &options.expected else {
            return Err(CoreError::Configuration(format!(
                "`se_campo` = `{guard_field}` has no `tem_valor`"
            )));
        };

        let mut path = guard_field.clone();
        if let Some(association) = &options.association {
            path = format!("{association}.{path}");
        }
        if let Some(callback) = &options.callback {
            path = format!("{}.{path}", callback.label());
        }

        Ok(Self {
            entries: vec![(ComparisonPath::parse(&path)?, ValueSet::from_option(expected)?)],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ComparisonPath, ValueSet)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed spec.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn spec(options: Value) -> Result<ComparisonSpec, CoreError> {
        ComparisonSpec::from_options(&DependencyOptions::from_value(&options)?)
    }

    fn paths(spec: &ComparisonSpec) -> Vec<&str> {
        spec.iter().map(|(p, _)| p.as_str()).collect()
    }

    #[test]
    fn path_splits_relations_and_field() {
        let path = ComparisonPath::parse("customer.plan.tier").unwrap();
        assert_eq!(path.relations(), ["customer", "plan"]);
        assert_eq!(path.field(), "tier");

        let plain = ComparisonPath::parse("status").unwrap();
        assert!(plain.relations().is_empty());
        assert_eq!(plain.field(), "status");
    }

    #[test]
    fn path_rejects_empty_segments() {
        assert!(ComparisonPath::parse("").is_err());
        assert!(ComparisonPath::parse("a..b").is_err());
        assert!(ComparisonPath::parse("a.").is_err());
    }

    #[test]
    fn single_field_scalar_becomes_one_element_set() {
        let spec = spec(json!({"se_campo": "status", "tem_valor": "active"})).unwrap();
        assert_eq!(spec.len(), 1);
        let (path, values) = spec.iter().next().unwrap();
        assert_eq!(path.as_str(), "status");
        assert_eq!(values.values(), [json!("active")]);
    }

    #[test]
    fn single_field_list_keeps_alternatives() {
        let spec = spec(json!({"se_campo": "status", "tem_valor": ["a", "b"]})).unwrap();
        let (_, values) = spec.iter().next().unwrap();
        assert_eq!(values.values(), [json!("a"), json!("b")]);
    }

    #[test]
    fn association_and_callback_prefix_the_guard() {
        let spec = spec(json!({
            "se_campo": "tier",
            "tem_valor": "gold",
            "da_associacao": "customer.plan",
        }))
        .unwrap();
        assert_eq!(paths(&spec), vec!["customer.plan.tier"]);

        let spec = spec_with_callback(Some("owner"));
        assert_eq!(paths(&spec), vec!["owner.plan.tier"]);

        let spec = spec_with_callback(None);
        assert_eq!(paths(&spec), vec!["callback.plan.tier"]);
    }

    fn spec_with_callback(label: Option<&str>) -> ComparisonSpec {
        let mut callback = json!({"callback": "current_owner"});
        if let Some(label) = label {
            callback["campo"] = json!(label);
        }
        spec(json!({
            "se_campo": "tier",
            "tem_valor": "gold",
            "da_associacao": "plan",
            "do_callback": callback,
        }))
        .unwrap()
    }

    #[test]
    fn multi_field_mapping_wins_and_is_used_as_is() {
        let spec = spec(json!({
            "se_campos_tem_valores": {"type": "A", "region": ["east", "west"]},
            "se_campo": "ignored",
            "tem_valor": 1,
            "da_associacao": "not.applied",
        }))
        .unwrap();
        assert_eq!(paths(&spec), vec!["type", "region"]);
    }

    #[test]
    fn missing_guard_options_is_a_configuration_error() {
        assert_matches!(spec(json!({"este_campo": "required"})), Err(CoreError::Configuration(_)));
        assert_matches!(spec(json!({"se_campo": "status"})), Err(CoreError::Configuration(_)));
        assert_matches!(
            spec(json!({"se_campos_tem_valores": {}})),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn empty_value_list_is_rejected() {
        assert_matches!(
            spec(json!({"se_campo": "status", "tem_valor": []})),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn value_set_finds_loosely_equal_member() {
        let set = ValueSet::from_option(&json!(["1", 2, null])).unwrap();
        assert_eq!(set.find(&json!(1)), Some(&json!("1")));
        assert_eq!(set.find(&Value::Null), Some(&Value::Null));
        assert_eq!(set.find(&json!(3)), None);
    }
}
