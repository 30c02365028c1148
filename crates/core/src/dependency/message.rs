//! Human-readable labels for failed dependency rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::comparator::{ComparedPath, ComparisonOutcome};

pub const RELATION_EQUAL: &str = "is equal to";
pub const RELATION_RESPECTIVELY_EQUAL: &str = "are respectively equal to";
pub const RELATION_DIFFERENT: &str = "is different from";

/// Separator between list items, and the word joining the last one.
const ITEM_SEPARATOR: &str = ",";
const FINAL_CONJUNCTION: &str = " e ";
const PATH_SEPARATOR: &str = ", ";
const RESPECTIVELY_SUFFIX: &str = " respectively";

/// Which rule branch produced the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Match,
    Otherwise,
}

/// Variables substituted into a rule's message template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageVariables {
    /// `%field%`: the guard path, or all evaluated paths.
    pub field: String,
    /// `%value%`: the expected value(s).
    pub value: String,
    /// `%relation%`: how the guard compared.
    pub relation: String,
}

/// Build the message variables for a failed rule.
pub fn compose(outcome: &ComparisonOutcome, branch: Branch) -> MessageVariables {
    match outcome.compared.as_slice() {
        [single] => MessageVariables {
            field: single.path.clone(),
            value: join_values(&single.values),
            relation: match branch {
                Branch::Match => RELATION_EQUAL,
                Branch::Otherwise => RELATION_DIFFERENT,
            }
            .to_string(),
        },
        many => MessageVariables {
            field: many
                .iter()
                .map(|c| c.path.as_str())
                .collect::<Vec<_>>()
                .join(PATH_SEPARATOR),
            value: format!(
                "{}{RESPECTIVELY_SUFFIX}",
                many.iter()
                    .map(|c: &ComparedPath| join_values(&c.values))
                    .collect::<Vec<_>>()
                    .join(PATH_SEPARATOR)
            ),
            relation: match branch {
                Branch::Match => RELATION_RESPECTIVELY_EQUAL,
                Branch::Otherwise => RELATION_DIFFERENT,
            }
            .to_string(),
        },
    }
}

/// Render a single value for humans: `true`/`false`, `null`, bare strings,
/// and lists joined with the final conjunction.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => join_values(items),
        Value::Object(_) => value.to_string(),
    }
}

/// `[1, 2, 3]` renders as `1,2 e 3`.
pub fn join_values(values: &[Value]) -> String {
    let items: Vec<String> = values.iter().map(stringify).collect();
    match items.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, init)) => format!("{}{FINAL_CONJUNCTION}{last}", init.join(ITEM_SEPARATOR)),
    }
}

/// Substitute message variables into `template`. The legacy placeholder
/// spellings `%campo%`, `%valor%` and `%comparacao%` are accepted too.
pub fn render(template: &str, variables: &MessageVariables) -> String {
    template
        .replace("%field%", &variables.field)
        .replace("%campo%", &variables.field)
        .replace("%value%", &variables.value)
        .replace("%valor%", &variables.value)
        .replace("%relation%", &variables.relation)
        .replace("%comparacao%", &variables.relation)
}
