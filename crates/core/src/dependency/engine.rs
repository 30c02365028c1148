//! The conditional dependency validator.

use std::collections::BTreeMap;

use serde_json::Value;

use super::comparator::{self, ComparisonOutcome};
use super::message::{self, Branch};
use super::options::DependencyOptions;
use super::resolver::PathResolver;
use super::rules::{BuiltinRule, Rule, RuleContext, RuleOutcome};
use super::spec::ComparisonSpec;
use super::Collaborators;
use crate::error::CoreError;
use crate::types::Record;
use crate::validator::{MessageTemplates, RuleViolation, ValidationResult, Validator};

pub const MSG_REQUIRED: &str = "This field is required when %field% %relation% %value%";
pub const MSG_MUST_BE_NULL: &str = "This field must not be filled when %field% %relation% %value%";
pub const MSG_IMMUTABLE: &str = "This field must not be changed when %field% %relation% %value%";
pub const MSG_GENERIC: &str = "This field is invalid when %field% %relation% %value%";

fn default_templates() -> MessageTemplates {
    MessageTemplates::new(&[
        ("required", MSG_REQUIRED),
        ("must_be_null", MSG_MUST_BE_NULL),
        ("immutable", MSG_IMMUTABLE),
    ])
    .with_fallback(MSG_GENERIC)
}

fn canonical_keys(templates: BTreeMap<String, String>) -> BTreeMap<String, String> {
    templates
        .into_iter()
        .map(|(key, template)| (BuiltinRule::template_key(&key).to_string(), template))
        .collect()
}

/// Validates a target value by rule, depending on guard field values.
///
/// Options, rules and templates are fixed at construction. Resolved guard
/// values and comparison results are local to each [`Self::is_valid`] call.
#[derive(Debug)]
pub struct DependencyValidator {
    options: DependencyOptions,
    spec: ComparisonSpec,
    positive: Rule,
    otherwise: Option<Rule>,
    templates: MessageTemplates,
    collaborators: Collaborators,
}

impl DependencyValidator {
    /// Validate the option set and resolve every rule name.
    pub fn new(options: DependencyOptions, collaborators: Collaborators) -> Result<Self, CoreError> {
        let spec = ComparisonSpec::from_options(&options)?;

        let positive_name = options.rule.as_deref().ok_or_else(|| {
            CoreError::Configuration("`este_campo` must name the rule applied on match".to_string())
        })?;
        let positive = collaborators.rules.resolve(positive_name)?;
        let otherwise = options
            .otherwise
            .as_deref()
            .map(|name| collaborators.rules.resolve(name))
            .transpose()?;

        if options.entity.is_some() && collaborators.store.is_none() {
            return Err(CoreError::Configuration(
                "`entidade` is set but no value store was provided".to_string(),
            ));
        }
        let has_store = collaborators.store.is_some();
        positive.check_setup(&options, has_store)?;
        if let Some(rule) = &otherwise {
            rule.check_setup(&options, has_store)?;
        }

        let mut templates = default_templates();
        templates.extend(canonical_keys(options.messages.clone()));

        tracing::debug!(
            guards = spec.len(),
            rule = positive.id(),
            otherwise = otherwise.as_ref().map(Rule::id),
            "Dependency validator configured",
        );

        Ok(Self {
            options,
            spec,
            positive,
            otherwise,
            templates,
            collaborators,
        })
    }

    /// Parse options from JSON and construct.
    pub fn from_value(options: &Value, collaborators: Collaborators) -> Result<Self, CoreError> {
        Self::new(DependencyOptions::from_value(options)?, collaborators)
    }

    pub fn options(&self) -> &DependencyOptions {
        &self.options
    }

    pub fn spec(&self) -> &ComparisonSpec {
        &self.spec
    }

    /// Evaluate the guards without dispatching any rule.
    pub fn compare(&self, record: &Record) -> Result<ComparisonOutcome, CoreError> {
        let resolver = PathResolver::new(
            &self.options,
            self.collaborators.store.as_deref(),
            &self.collaborators.callbacks,
        );
        comparator::evaluate(&self.spec, &resolver, record)
    }

    /// Validate `value` (the target field) in the context of `record`.
    pub fn is_valid(&self, value: &Value, record: &Record) -> Result<ValidationResult, CoreError> {
        let outcome = self.compare(record)?;

        let (rule, branch) = match (outcome.matched, &self.otherwise) {
            (true, _) => (&self.positive, Branch::Match),
            (false, Some(rule)) => (rule, Branch::Otherwise),
            (false, None) => {
                tracing::debug!("Guards did not match and no otherwise rule is set");
                return Ok(ValidationResult::valid());
            }
        };

        let ctx = RuleContext {
            value,
            record,
            options: &self.options,
            store: self.collaborators.store.as_deref(),
        };
        if rule.apply(&ctx)? == RuleOutcome::Pass {
            return Ok(ValidationResult::valid());
        }

        let variables = message::compose(&outcome, branch);
        let message = self
            .templates
            .get(rule.id())
            .map(|template| message::render(template, &variables))
            .unwrap_or_default();
        Ok(ValidationResult::invalid(vec![RuleViolation {
            rule: rule.id().to_string(),
            message,
            variables: Some(variables),
        }]))
    }
}

impl Validator for DependencyValidator {
    fn validate(&self, value: &Value, record: &Record) -> Result<ValidationResult, CoreError> {
        self.is_valid(value, record)
    }

    fn set_message(&mut self, template: &str) {
        self.templates.set_all(template);
    }

    fn set_messages(&mut self, templates: BTreeMap<String, String>) {
        self.templates.extend(canonical_keys(templates));
    }
}
