use serde_json::{Number, Value};

/// One submitted record: field name to value, in submission order.
pub type Record = serde_json::Map<String, Value>;

/// Outcome of following a comparison path.
///
/// `Absent` means the path could not be followed (a broken association link,
/// no persisted entity, no callback entity). It is distinct from a stored
/// `null` and never matches anything.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Present(Value),
    Absent,
}

impl Resolved {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Present(v) => Some(v),
            Self::Absent => None,
        }
    }
}

/// Value equality used for guard matching.
///
/// Same-typed values compare structurally, numbers compare by numeric value,
/// and a number matches a string holding the same number. `null` only
/// equals `null`.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(x), Value::Number(y)) => numbers_eq(x, y),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            parse_number(s).is_some_and(|parsed| numbers_eq(n, &parsed))
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| loose_eq(x, y))
        }
        _ => a == b,
    }
}

/// Integers compare exactly; floats are only involved when either side is one.
fn numbers_eq(x: &Number, y: &Number) -> bool {
    if x.is_f64() || y.is_f64() {
        return matches!((x.as_f64(), y.as_f64()), (Some(a), Some(b)) if a == b);
    }
    match (x.as_i64(), y.as_i64()) {
        (Some(a), Some(b)) => a == b,
        _ => matches!((x.as_u64(), y.as_u64()), (Some(a), Some(b)) if a == b),
    }
}

fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(i.into());
    }
    if let Ok(u) = s.parse::<u64>() {
        return Some(u.into());
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}
