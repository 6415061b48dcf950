//! Deterministic rule ordering.

use std::cmp::Ordering;

use crate::resources::types::Rule;

/// Byte-wise ascending comparison of the rules' full URIs.
pub fn compare_rules(a: &Rule, b: &Rule) -> Ordering {
    a.full_uri.as_bytes().cmp(b.full_uri.as_bytes())
}

/// Sort rules by full URI, keeping the input order of equal URIs, and
/// renumber ordinals to match the new positions.
pub fn sort_rules(rules: &mut [Rule]) {
    // slice::sort_by is stable.
    rules.sort_by(compare_rules);
    for (ordinal, rule) in rules.iter_mut().enumerate() {
        rule.ordinal = ordinal;
    }
}
