//! Operator reference parsing.
//!
//! # Responsibilities
//! - Parse `partition/name` and `/partition/name` references
//! - Report every malformed entry without dropping the rest of the list
//!
//! # Design Decisions
//! - One `Result` per entry; batches keep the `Ok` values in input order
//! - Malformed entries are logged with `event = "skipping-name"`

use thiserror::Error;

use crate::observability::metrics;
use crate::resources::types::NameRef;

/// Why a reference string was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("expected partition/name, found no separator")]
    MissingSeparator,

    #[error("partition is empty")]
    EmptyPartition,

    #[error("name is empty")]
    EmptyName,

    #[error("expected partition/name, found extra separators")]
    TooManySeparators,
}

/// Parse a single `partition/name` reference.
pub fn parse_reference(raw: &str) -> Result<NameRef, ReferenceError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);

    let (partition, name) = trimmed
        .split_once('/')
        .ok_or(ReferenceError::MissingSeparator)?;

    if partition.is_empty() {
        return Err(ReferenceError::EmptyPartition);
    }
    if name.is_empty() {
        return Err(ReferenceError::EmptyName);
    }
    if name.contains('/') {
        return Err(ReferenceError::TooManySeparators);
    }

    Ok(NameRef::new(partition, name))
}

/// Parse a list of references of one `kind` (e.g. "policy"), skipping and
/// logging the malformed ones.
pub fn parse_references(kind: &'static str, raw: &[String]) -> Vec<NameRef> {
    raw.iter()
        .filter_map(|entry| match parse_reference(entry) {
            Ok(reference) => Some(reference),
            Err(e) => {
                tracing::warn!(
                    event = "skipping-name",
                    kind,
                    reference = %entry,
                    reason = %e,
                    "Skipping malformed reference"
                );
                metrics::record_skipped("malformed-reference");
                None
            }
        })
        .collect()
}
