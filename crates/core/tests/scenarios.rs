//! End-to-end validation scenarios that need no value store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use guardrule_core::delegate::ConditionalDelegate;
use guardrule_core::dependency::{Collaborators, DependencyValidator, RuleOutcome, RuleTable};
use guardrule_core::error::CoreError;
use guardrule_core::registry::{FactoryRegistry, ValidatorRegistry};
use guardrule_core::store::{Entity, EntityCallback};
use guardrule_core::types::Record;
use guardrule_core::validator::Validator;
use serde_json::{json, Value};

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

fn dependency(options: Value) -> DependencyValidator {
    DependencyValidator::from_value(&options, Collaborators::new()).unwrap()
}

// ---------------------------------------------------------------------------
// Single guard
// ---------------------------------------------------------------------------

#[test]
fn required_email_for_active_status() {
    let validator = dependency(json!({
        "se_campo": "status",
        "tem_valor": "active",
        "este_campo": "required",
    }));

    let result = validator
        .validate(&Value::Null, &record(json!({"status": "active", "email": null})))
        .unwrap();

    assert!(!result.is_valid);
    assert_eq!(
        result.messages().get("required"),
        Some(&"This field is required when status is equal to active")
    );
    let variables = result.violations[0].variables.clone().unwrap();
    assert_eq!(variables.field, "status");
    assert_eq!(variables.value, "active");
    assert_eq!(variables.relation, "is equal to");
}

#[test]
fn unmatched_guard_without_otherwise_passes() {
    let validator = dependency(json!({
        "se_campo": "status",
        "tem_valor": "active",
        "este_campo": "required",
    }));

    let result = validator
        .validate(&Value::Null, &record(json!({"status": "inactive", "email": null})))
        .unwrap();
    assert!(result.is_valid);
    assert!(result.violations.is_empty());
}

#[test]
fn numeric_guard_matches_numeric_string() {
    let validator = dependency(json!({
        "se_campo": "tier",
        "tem_valor": [1, 2],
        "este_campo": "must_be_null",
    }));

    let result = validator
        .validate(&json!("filled"), &record(json!({"tier": "2"})))
        .unwrap();
    assert!(!result.is_valid);
    let variables = result.violations[0].variables.clone().unwrap();
    assert_eq!(variables.value, "2");
}

// ---------------------------------------------------------------------------
// Multiple guards
// ---------------------------------------------------------------------------

#[test]
fn second_guard_mismatch_dispatches_otherwise_rule() {
    let validator = dependency(json!({
        "se_campos_tem_valores": {"type": "A", "region": "east"},
        "este_campo": "must_be_null",
        "caso_contrario": "optional",
    }));
    let submitted = record(json!({"type": "A", "region": "west"}));

    let outcome = validator.compare(&submitted).unwrap();
    assert!(!outcome.matched);
    let paths: Vec<&str> = outcome.compared.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["type", "region"]);
    assert_eq!(outcome.compared[1].values, vec![json!("east")]);

    let result = validator.validate(&json!("filled"), &submitted).unwrap();
    assert!(result.is_valid);
}

#[test]
fn multiple_guards_fail_with_respective_labels() {
    let validator = dependency(json!({
        "se_campos_tem_valores": {"type": "A", "region": ["east", "north"]},
        "este_campo": "must_be_null",
    }));

    let result = validator
        .validate(&json!("filled"), &record(json!({"type": "A", "region": "north"})))
        .unwrap();
    assert_eq!(
        result.messages().get("must_be_null"),
        Some(&"This field must not be filled when type, region are respectively equal to A, north respectively")
    );
}

#[test]
fn otherwise_failure_lists_all_alternatives() {
    let validator = dependency(json!({
        "se_campo": "status",
        "tem_valor": ["active", "pending", "trial"],
        "este_campo": "optional",
        "caso_contrario": "required",
    }));

    let result = validator
        .validate(&Value::Null, &record(json!({"status": "closed"})))
        .unwrap();
    assert_eq!(
        result.messages().get("required"),
        Some(&"This field is required when status is different from active,pending e trial")
    );
}

// ---------------------------------------------------------------------------
// Custom rules and callbacks
// ---------------------------------------------------------------------------

#[test]
fn custom_rule_sees_value_and_record() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut rules = RuleTable::new();
    let counter = Arc::clone(&calls);
    rules.register("longer_than_reference", move |ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        let reference = ctx.record.get("reference").and_then(Value::as_str).unwrap_or("");
        let value = ctx.value.as_str().unwrap_or("");
        Ok(RuleOutcome::from_pass(value.len() > reference.len()))
    });

    let validator = DependencyValidator::from_value(
        &json!({
            "se_campo": "kind",
            "tem_valor": "strict",
            "este_campo": "longer_than_reference",
            "messages": {"longer_than_reference": "Too short for %campo% %valor%"},
        }),
        Collaborators::new().with_rules(rules),
    )
    .unwrap();

    let submitted = record(json!({"kind": "strict", "reference": "abcd"}));
    assert!(validator.validate(&json!("abcdef"), &submitted).unwrap().is_valid);
    let result = validator.validate(&json!("ab"), &submitted).unwrap();
    assert_eq!(result.violations[0].message, "Too short for kind strict");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn unknown_rule_name_fails_at_construction() {
    let err = DependencyValidator::from_value(
        &json!({"se_campo": "a", "tem_valor": 1, "este_campo": "ehVerde"}),
        Collaborators::new(),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::UnknownRule(ref name) if name == "ehVerde"));
    assert!(err.is_configuration());
}

/// Minimal in-test entity graph.
struct Node {
    kind: &'static str,
    id: Value,
    fields: Record,
    links: HashMap<&'static str, Arc<dyn Entity>>,
}

impl Entity for Node {
    fn entity_type(&self) -> &str {
        self.kind
    }

    fn identifier(&self) -> Value {
        self.id.clone()
    }

    fn is_association(&self, field: &str) -> bool {
        self.links.contains_key(field)
    }

    fn get(&self, field: &str) -> Value {
        self.fields.get(field).cloned().unwrap_or(Value::Null)
    }

    fn association(&self, relation: &str) -> Result<Option<Arc<dyn Entity>>, CoreError> {
        Ok(self.links.get(relation).cloned())
    }
}

#[test]
fn callback_supplies_root_entity() {
    let plan: Arc<dyn Entity> = Arc::new(Node {
        kind: "Plan",
        id: json!(100),
        fields: record(json!({"tier": "gold"})),
        links: HashMap::new(),
    });
    let customer: Arc<dyn Entity> = Arc::new(Node {
        kind: "Customer",
        id: json!(10),
        fields: Record::new(),
        links: HashMap::from([("plan", plan)]),
    });
    let supplied = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&supplied);
    let callback: Arc<dyn EntityCallback> = Arc::new(
        move |_record: &Record| -> Result<Option<Arc<dyn Entity>>, CoreError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Arc::clone(&customer)))
        },
    );

    let validator = DependencyValidator::from_value(
        &json!({
            "se_campo": "plan.tier",
            "tem_valor": "gold",
            "este_campo": "required",
            "do_callback": {"callback": "current_customer", "campo": "customer"},
        }),
        Collaborators::new().with_callback("current_customer", callback),
    )
    .unwrap();

    let result = validator.validate(&Value::Null, &Record::new()).unwrap();
    assert!(!result.is_valid);
    assert_eq!(
        result.violations[0].message,
        "This field is required when customer.plan.tier is equal to gold"
    );
    assert_eq!(supplied.load(Ordering::SeqCst), 1);
}

#[test]
fn unregistered_callback_is_a_callback_error() {
    let validator = dependency(json!({
        "se_campo": "plan.tier",
        "tem_valor": "gold",
        "este_campo": "required",
        "do_callback": {"callback": "missing"},
    }));
    assert!(matches!(
        validator.validate(&Value::Null, &Record::new()),
        Err(CoreError::Callback(_))
    ));
}

// ---------------------------------------------------------------------------
// Conditional delegation
// ---------------------------------------------------------------------------

/// Wraps the builtin registry and counts lookups.
struct Spy {
    inner: Arc<FactoryRegistry>,
    lookups: AtomicUsize,
}

impl ValidatorRegistry for Spy {
    fn resolve(
        &self,
        name: &str,
        options: &serde_json::Map<String, Value>,
    ) -> Result<Box<dyn Validator>, CoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(name, options)
    }
}

#[test]
fn null_input_skips_the_registry() {
    let spy = Arc::new(Spy {
        inner: FactoryRegistry::with_builtins(Collaborators::new(), |_| {}),
        lookups: AtomicUsize::new(0),
    });
    let delegate = ConditionalDelegate::from_value(
        &json!({"validator": "pattern", "pattern": "^[A-Z]{2}$"}),
        spy.clone(),
    )
    .unwrap();

    assert!(delegate.validate(&Value::Null, &Record::new()).unwrap().is_valid);
    assert_eq!(spy.lookups.load(Ordering::SeqCst), 0);

    let result = delegate.validate(&json!("abc"), &Record::new()).unwrap();
    assert!(!result.is_valid);
    assert_eq!(spy.lookups.load(Ordering::SeqCst), 1);
}

#[test]
fn delegate_can_wrap_a_dependency_validator() {
    let registry = FactoryRegistry::with_builtins(Collaborators::new(), |_| {});
    let options = json!({
        "validator": "dependency",
        "override_message": "Fill in %field% stuff",
        "se_campo": "status",
        "tem_valor": "active",
        "este_campo": "must_be_null",
    });
    let validator = registry
        .resolve("if_not_null", options.as_object().unwrap())
        .unwrap();

    let submitted = record(json!({"status": "active"}));
    assert!(validator.validate(&Value::Null, &submitted).unwrap().is_valid);
    let result = validator.validate(&json!("x"), &submitted).unwrap();
    assert_eq!(result.violations[0].message, "Fill in status stuff");
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn shared_validator_serves_parallel_calls() {
    let validator = Arc::new(dependency(json!({
        "se_campo": "status",
        "tem_valor": "active",
        "este_campo": "required",
    })));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let validator = Arc::clone(&validator);
            std::thread::spawn(move || {
                let status = if i % 2 == 0 { "active" } else { "inactive" };
                validator
                    .validate(&Value::Null, &record(json!({"status": status})))
                    .unwrap()
                    .is_valid
            })
        })
        .collect();

    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![false, true, false, true, false, true, false, true]);
}
