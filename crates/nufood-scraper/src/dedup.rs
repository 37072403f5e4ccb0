use std::collections::HashSet;

use nufood_core::UniqueItemName;

/// Returns the candidates whose names are not in `known`, in first-seen
/// order, with duplicates inside the batch collapsed.
///
/// Matching is exact: `"Pancakes"` and `"pancakes"` are different dishes.
#[must_use]
pub fn net_new_names(candidates: &[UniqueItemName], known: &HashSet<String>) -> Vec<UniqueItemName> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(candidates.len());
    candidates
        .iter()
        .filter(|c| !known.contains(&c.name) && seen.insert(c.name.as_str()))
        .cloned()
        .collect()
}
