//! Guard matching over a comparison spec.

use serde::Serialize;
use serde_json::Value;

use super::resolver::Resolve;
use super::spec::ComparisonSpec;
use crate::error::CoreError;
use crate::types::Record;

/// One evaluated path and the values reported for it.
///
/// After a match `values` holds the single acceptable value that matched;
/// for the failing path it holds the full acceptable-value set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparedPath {
    pub path: String,
    pub values: Vec<Value>,
}

/// Result of evaluating a spec against one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonOutcome {
    pub matched: bool,
    /// Paths in declaration order, up to and including the first failure.
    pub compared: Vec<ComparedPath>,
}

/// Evaluate every guard in order, stopping at the first non-match.
pub fn evaluate<R: Resolve + ?Sized>(
    spec: &ComparisonSpec,
    resolver: &R,
    record: &Record,
) -> Result<ComparisonOutcome, CoreError> {
    let mut compared = Vec::with_capacity(spec.len());

    for (path, accepted) in spec.iter() {
        let resolved = resolver.resolve(path, record)?;
        match resolved.as_value().and_then(|value| accepted.find(value)) {
            Some(hit) => compared.push(ComparedPath {
                path: path.to_string(),
                values: vec![hit.clone()],
            }),
            None => {
                tracing::debug!(%path, ?resolved, "Guard did not match");
                compared.push(ComparedPath {
                    path: path.to_string(),
                    values: accepted.values().to_vec(),
                });
                return Ok(ComparisonOutcome {
                    matched: false,
                    compared,
                });
            }
        }
    }

    Ok(ComparisonOutcome {
        matched: true,
        compared,
    })
}
