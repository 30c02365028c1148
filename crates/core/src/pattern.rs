//! Regular-expression validator, mainly used behind `if_not_null`.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;

use crate::error::CoreError;
use crate::types::Record;
use crate::validator::{MessageTemplates, RuleViolation, ValidationResult, Validator};

pub const PATTERN_MISMATCH: &str = "pattern_mismatch";
pub const INVALID_TYPE: &str = "invalid_type";

pub const MSG_PATTERN_MISMATCH: &str = "The input does not match against pattern '%pattern%'";
pub const MSG_INVALID_TYPE: &str = "Invalid type given. String or number expected";

/// Accepts strings (and numbers, compared by their decimal form) matching
/// the configured expression.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    pattern: Regex,
    templates: MessageTemplates,
}

impl PatternValidator {
    pub fn new(pattern: &str) -> Result<Self, CoreError> {
        let pattern = Regex::new(pattern).map_err(|e| {
            CoreError::Configuration(format!("invalid pattern '{pattern}': {e}"))
        })?;
        Ok(Self {
            pattern,
            templates: MessageTemplates::new(&[
                (PATTERN_MISMATCH, MSG_PATTERN_MISMATCH),
                (INVALID_TYPE, MSG_INVALID_TYPE),
            ]),
        })
    }

    /// Reads `pattern` (required) and `messages` (optional) from options.
    pub fn from_options(options: &serde_json::Map<String, Value>) -> Result<Self, CoreError> {
        let pattern = options
            .get("pattern")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::Configuration("`pattern` must be a string".to_string()))?;
        let mut validator = Self::new(pattern)?;
        if let Some(messages) = options.get("messages") {
            let messages: BTreeMap<String, String> = serde_json::from_value(messages.clone())?;
            validator.templates.extend(messages);
        }
        Ok(validator)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn violation(&self, key: &str) -> RuleViolation {
        let message = self
            .templates
            .get(key)
            .unwrap_or_default()
            .replace("%pattern%", self.pattern.as_str());
        RuleViolation {
            rule: key.to_string(),
            message,
            variables: None,
        }
    }
}

impl Validator for PatternValidator {
    fn validate(&self, value: &Value, _record: &Record) -> Result<ValidationResult, CoreError> {
        let subject = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return Ok(ValidationResult::invalid(vec![self.violation(INVALID_TYPE)])),
        };
        if self.pattern.is_match(&subject) {
            Ok(ValidationResult::valid())
        } else {
            Ok(ValidationResult::invalid(vec![self.violation(PATTERN_MISMATCH)]))
        }
    }

    fn set_message(&mut self, template: &str) {
        self.templates.set_all(template);
    }

    fn set_messages(&mut self, templates: BTreeMap<String, String>) {
        self.templates.extend(templates);
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn check(validator: &PatternValidator, value: Value) -> ValidationResult {
        validator.validate(&value, &Record::new()).unwrap()
    }

    #[test]
    fn matches_strings_and_numbers() {
        let validator = PatternValidator::new(r"^\d{3}$").unwrap();
        assert!(check(&validator, json!("123")).is_valid);
        assert!(check(&validator, json!(456)).is_valid);
        assert!(!check(&validator, json!("12")).is_valid);
    }

    #[test]
    fn mismatch_message_names_the_pattern() {
        let validator = PatternValidator::new("^a+$").unwrap();
        let result = check(&validator, json!("b"));
        assert_eq!(
            result.messages().get(PATTERN_MISMATCH),
            Some(&"The input does not match against pattern '^a+$'")
        );
    }

    #[test]
    fn non_scalar_input_is_invalid_type() {
        let validator = PatternValidator::new(".*").unwrap();
        let result = check(&validator, json!(["a"]));
        assert_eq!(result.violations[0].rule, INVALID_TYPE);
        assert_eq!(check(&validator, json!(true)).violations[0].rule, INVALID_TYPE);
    }

    #[test]
    fn bad_expression_is_a_configuration_error() {
        assert_matches!(PatternValidator::new("(unclosed"), Err(CoreError::Configuration(_)));
        let options = json!({"pattern": 5}).as_object().cloned().unwrap();
        assert_matches!(
            PatternValidator::from_options(&options),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn message_overrides() {
        let options = json!({"pattern": "^x$", "messages": {"pattern_mismatch": "nope"}})
            .as_object()
            .cloned()
            .unwrap();
        let mut validator = PatternValidator::from_options(&options).unwrap();
        assert_eq!(check(&validator, json!("y")).violations[0].message, "nope");

        validator.set_message("bad %pattern%");
        assert_eq!(check(&validator, json!("y")).violations[0].message, "bad ^x$");
        assert_eq!(check(&validator, json!({})).violations[0].message, "bad ^x$");
    }
}
