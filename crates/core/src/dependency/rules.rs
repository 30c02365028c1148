//! Rules dispatched on the target field once the guards are evaluated.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::options::DependencyOptions;
use crate::error::CoreError;
use crate::store::{field_value, find_persisted, ValueStore};
use crate::types::{loose_eq, Record};

/// Whether a rule accepted the target value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Pass,
    Fail,
}

impl RuleOutcome {
    pub fn from_pass(pass: bool) -> Self {
        if pass {
            Self::Pass
        } else {
            Self::Fail
        }
    }
}

/// Everything a rule may look at. Built per call, never stored.
pub struct RuleContext<'a> {
    pub value: &'a Value,
    pub record: &'a Record,
    pub options: &'a DependencyOptions,
    pub store: Option<&'a dyn ValueStore>,
}

/// A rule registered by name.
pub trait RuleHandler: Send + Sync {
    fn check(&self, ctx: &RuleContext<'_>) -> Result<RuleOutcome, CoreError>;
}

impl<F> RuleHandler for F
where
    F: Fn(&RuleContext<'_>) -> Result<RuleOutcome, CoreError> + Send + Sync,
{
    fn check(&self, ctx: &RuleContext<'_>) -> Result<RuleOutcome, CoreError> {
        self(ctx)
    }
}

/// The four rules every validator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinRule {
    Required,
    MustBeNull,
    Optional,
    Immutable,
}

impl BuiltinRule {
    pub const ALL: [BuiltinRule; 4] = [
        Self::Required,
        Self::MustBeNull,
        Self::Optional,
        Self::Immutable,
    ];

    /// Canonical identifier, also the message template key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MustBeNull => "must_be_null",
            Self::Optional => "optional",
            Self::Immutable => "immutable",
        }
    }

    /// Accepts canonical identifiers and the legacy camel-case names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "required" | "ehObrigatorio" => Some(Self::Required),
            "must_be_null" | "deveSerNull" => Some(Self::MustBeNull),
            "optional" | "ehOpcional" => Some(Self::Optional),
            "immutable" | "naoEhEditavel" => Some(Self::Immutable),
            _ => None,
        }
    }

    /// Message template key for a configured name. Legacy aliases key the
    /// same template as their canonical rule.
    pub fn template_key(name: &str) -> &str {
        Self::from_name(name).map_or(name, |rule| rule.as_str())
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Result<RuleOutcome, CoreError> {
        match self {
            Self::Required => Ok(RuleOutcome::from_pass(!ctx.value.is_null())),
            Self::MustBeNull => Ok(RuleOutcome::from_pass(ctx.value.is_null())),
            Self::Optional => Ok(RuleOutcome::Pass),
            Self::Immutable => check_immutable(ctx),
        }
    }
}

/// Fails when the persisted value of `campo` differs from the submitted one.
/// New records (nothing persisted yet) always pass.
fn check_immutable(ctx: &RuleContext<'_>) -> Result<RuleOutcome, CoreError> {
    let (Some(entity_type), Some(field)) =
        (ctx.options.entity.as_deref(), ctx.options.field.as_deref())
    else {
        return Err(CoreError::Configuration(
            "`immutable` needs `entidade` and `campo`".to_string(),
        ));
    };
    let store = ctx.store.ok_or_else(|| {
        CoreError::Configuration("`immutable` needs a value store".to_string())
    })?;

    match find_persisted(store, entity_type, ctx.record)? {
        Some(old) => {
            let previous = field_value(old.as_ref(), field)?;
            Ok(RuleOutcome::from_pass(loose_eq(&previous, ctx.value)))
        }
        None => Ok(RuleOutcome::Pass),
    }
}

/// A rule name resolved at setup time.
#[derive(Clone)]
pub enum Rule {
    Builtin(BuiltinRule),
    Custom {
        name: String,
        handler: Arc<dyn RuleHandler>,
    },
}

impl Rule {
    /// Identifier used to key messages and templates.
    pub fn id(&self) -> &str {
        match self {
            Self::Builtin(rule) => rule.as_str(),
            Self::Custom { name, .. } => name,
        }
    }

    pub fn apply(&self, ctx: &RuleContext<'_>) -> Result<RuleOutcome, CoreError> {
        tracing::debug!(rule = self.id(), "Dispatching rule");
        match self {
            Self::Builtin(rule) => rule.check(ctx),
            Self::Custom { handler, .. } => handler.check(ctx),
        }
    }

    /// Reject option sets this rule cannot run with.
    pub fn check_setup(
        &self,
        options: &DependencyOptions,
        has_store: bool,
    ) -> Result<(), CoreError> {
        if let Self::Builtin(BuiltinRule::Immutable) = self {
            if options.entity.is_none() || options.field.is_none() {
                return Err(CoreError::Configuration(
                    "`immutable` needs `entidade` and `campo`".to_string(),
                ));
            }
            if !has_store {
                return Err(CoreError::Configuration(
                    "`immutable` needs a value store".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(rule) => f.debug_tuple("Builtin").field(rule).finish(),
            Self::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

/// Name to handler table for custom rules. Built-in names take precedence.
#[derive(Clone, Default)]
pub struct RuleTable {
    custom: HashMap<String, Arc<dyn RuleHandler>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure as a custom rule.
    pub fn register<F>(&mut self, name: impl Into<String>, check: F)
    where
        F: Fn(&RuleContext<'_>) -> Result<RuleOutcome, CoreError> + Send + Sync + 'static,
    {
        self.custom.insert(name.into(), Arc::new(check));
    }

    pub fn register_handler(&mut self, name: impl Into<String>, handler: Arc<dyn RuleHandler>) {
        self.custom.insert(name.into(), handler);
    }

    /// Resolve a configured rule name; unknown names are setup defects.
    pub fn resolve(&self, name: &str) -> Result<Rule, CoreError> {
        if let Some(rule) = BuiltinRule::from_name(name) {
            return Ok(Rule::Builtin(rule));
        }
        self.custom
            .get(name)
            .map(|handler| Rule::Custom {
                name: name.to_string(),
                handler: Arc::clone(handler),
            })
            .ok_or_else(|| CoreError::UnknownRule(name.to_string()))
    }

    /// Registered custom rule names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.custom.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTable")
            .field("custom", &self.names())
            .finish()
    }
}
