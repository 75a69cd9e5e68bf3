//! Relation kinds and labeled term pairs.
//!
//! Pairs are the flattened form of the descriptor hierarchy used as
//! label-label similarity signal: every parent/child edge, and every pair of
//! children sharing a parent.

use std::fmt;
use std::str::FromStr;

/// How two terms of a [`LabelPair`] are related.
///
/// # Examples
///
/// ```
/// use mesh_types::RelationKind;
///
/// assert_eq!(RelationKind::ParentChild.as_str(), "parent_child");
/// assert_eq!("siblings".parse::<RelationKind>(), Ok(RelationKind::Siblings));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RelationKind {
    /// First term is the direct parent of the second.
    ParentChild,
    /// Both terms are children of the same parent.
    Siblings,
}

impl RelationKind {
    /// Literal used for parent/child pairs.
    pub const PARENT_CHILD: &'static str = "parent_child";
    /// Literal used for sibling pairs.
    pub const SIBLINGS: &'static str = "siblings";

    /// Returns the literal string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParentChild => Self::PARENT_CHILD,
            Self::Siblings => Self::SIBLINGS,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown relation literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRelationKind(pub String);

impl fmt::Display for UnknownRelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown relation kind: {}", self.0)
    }
}

impl std::error::Error for UnknownRelationKind {}

impl FromStr for RelationKind {
    type Err = UnknownRelationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::PARENT_CHILD => Ok(Self::ParentChild),
            Self::SIBLINGS => Ok(Self::Siblings),
            other => Err(UnknownRelationKind(other.to_string())),
        }
    }
}

/// Two related term names and how they are related.
///
/// Serializes as a three-element array `[term_a, term_b, kind]`.
///
/// # Examples
///
/// ```
/// use mesh_types::{LabelPair, RelationKind};
///
/// let pair = LabelPair::new("Bacterial Infections", "Bacteremia", RelationKind::ParentChild);
/// assert_eq!(pair.to_string(), "Bacterial Infections\tBacteremia\tparent_child");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        into = "(String, String, RelationKind)",
        from = "(String, String, RelationKind)"
    )
)]
pub struct LabelPair {
    /// Parent name for parent/child pairs, first sibling otherwise.
    pub term_a: String,
    /// Child name for parent/child pairs, second sibling otherwise.
    pub term_b: String,
    /// Relation between the two terms.
    pub kind: RelationKind,
}

impl LabelPair {
    /// Creates a pair.
    pub fn new(term_a: impl Into<String>, term_b: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            term_a: term_a.into(),
            term_b: term_b.into(),
            kind,
        }
    }

    /// Returns true for a parent/child pair.
    pub fn is_parent_child(&self) -> bool {
        self.kind == RelationKind::ParentChild
    }

    /// Returns true for a sibling pair.
    pub fn is_siblings(&self) -> bool {
        self.kind == RelationKind::Siblings
    }
}

impl fmt::Display for LabelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.term_a, self.term_b, self.kind)
    }
}

impl From<LabelPair> for (String, String, RelationKind) {
    fn from(pair: LabelPair) -> Self {
        (pair.term_a, pair.term_b, pair.kind)
    }
}

impl From<(String, String, RelationKind)> for LabelPair {
    fn from((term_a, term_b, kind): (String, String, RelationKind)) -> Self {
        Self { term_a, term_b, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_kind_literals() {
        assert_eq!(RelationKind::ParentChild.to_string(), "parent_child");
        assert_eq!(RelationKind::Siblings.to_string(), "siblings");
        assert!("cousins".parse::<RelationKind>().is_err());
    }

    #[test]
    fn test_pair_predicates() {
        let pair = LabelPair::new("A", "B", RelationKind::Siblings);
        assert!(pair.is_siblings());
        assert!(!pair.is_parent_child());
    }
}
