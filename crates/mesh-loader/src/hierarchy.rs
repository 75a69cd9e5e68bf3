//! Label pair generation from the parent/child relation graph.
//!
//! The relation graph maps a parent name to the set of its child names.
//! Two kinds of pairs are derived from it:
//!
//! - one `parent_child` pair per edge, and
//! - one `siblings` pair per unordered pair of children sharing a parent.
//!
//! Ordered sets are used throughout, so the output order is lexicographic by
//! parent and then by child, and identical across runs.

use std::collections::{BTreeMap, BTreeSet};

use mesh_types::{LabelPair, RelationKind};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Parent name to child names.
pub type RelationMap = BTreeMap<String, BTreeSet<String>>;

/// Number of sibling pairs among `children` children of one parent.
pub fn sibling_pair_count(children: usize) -> usize {
    children * children.saturating_sub(1) / 2
}

/// Emits one `parent_child` pair per edge.
pub fn parent_child_pairs(relations: &RelationMap) -> Vec<LabelPair> {
    relations
        .iter()
        .flat_map(|(parent, children)| {
            children
                .iter()
                .map(move |child| LabelPair::new(parent.as_str(), child.as_str(), RelationKind::ParentChild))
        })
        .collect()
}

fn siblings_of(children: &BTreeSet<String>) -> Vec<LabelPair> {
    let children: Vec<&String> = children.iter().collect();
    let mut pairs = Vec::with_capacity(sibling_pair_count(children.len()));
    for (i, first) in children.iter().enumerate() {
        for second in &children[i + 1..] {
            pairs.push(LabelPair::new(first.as_str(), second.as_str(), RelationKind::Siblings));
        }
    }
    pairs
}

/// Emits one `siblings` pair for every two children of the same parent.
///
/// Cost is quadratic in the fan-out of each parent. MeSH nodes have tens of
/// children, so this stays small; a parent with `k` children contributes
/// exactly `k * (k - 1) / 2` pairs.
pub fn sibling_pairs(relations: &RelationMap) -> Vec<LabelPair> {
    #[cfg(feature = "parallel")]
    {
        let groups: Vec<&BTreeSet<String>> = relations.values().collect();
        groups
            .par_iter()
            .flat_map_iter(|children| siblings_of(children))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        relations.values().flat_map(siblings_of).collect()
    }
}

/// All parent/child pairs followed by all sibling pairs.
///
/// No deduplication is performed across the two kinds.
pub fn label_pairs(relations: &RelationMap) -> Vec<LabelPair> {
    let mut pairs = parent_child_pairs(relations);
    pairs.extend(sibling_pairs(relations));
    pairs
}
