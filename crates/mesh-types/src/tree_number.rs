//! MeSH tree number type.
//!
//! A tree number encodes one position of a descriptor in the MeSH hierarchy
//! as a sequence of segments joined by `.`, e.g. `C01.150.252`. Stripping the
//! last segment yields the position of the parent node.

use std::borrow::Borrow;
use std::fmt;

/// A dot-delimited hierarchy position such as `C01.150.252`.
///
/// Segments are opaque; only their count and order carry meaning.
///
/// # Examples
///
/// ```
/// use mesh_types::TreeNumber;
///
/// let tn = TreeNumber::new("C01.150.252");
/// assert_eq!(tn.depth(), 3);
/// assert_eq!(tn.parent(), Some("C01.150"));
/// assert_eq!(tn.prefix(1), Some("C01"));
/// assert_eq!(tn.ancestors().collect::<Vec<_>>(), vec!["C01", "C01.150"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct TreeNumber(String);

impl TreeNumber {
    /// Separator between segments.
    pub const SEPARATOR: char = '.';

    /// Wraps a raw tree number string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the tree number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.0.matches(Self::SEPARATOR).count() + 1
    }

    /// Iterates over the segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(Self::SEPARATOR)
    }

    /// Returns the first `len` segments joined by `.`.
    ///
    /// Returns `None` when `len` is zero or exceeds [`depth`](Self::depth).
    pub fn prefix(&self, len: usize) -> Option<&str> {
        if len == 0 {
            return None;
        }
        match self.0.match_indices(Self::SEPARATOR).nth(len - 1) {
            Some((idx, _)) => Some(&self.0[..idx]),
            None if len == self.depth() => Some(&self.0),
            None => None,
        }
    }

    /// Returns the parent position, or `None` for a top-level tree number.
    pub fn parent(&self) -> Option<&str> {
        self.0.rfind(Self::SEPARATOR).map(|idx| &self.0[..idx])
    }

    /// Returns true if this tree number has no parent.
    pub fn is_top_level(&self) -> bool {
        !self.0.contains(Self::SEPARATOR)
    }

    /// Iterates over every proper prefix, shortest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        self.0
            .match_indices(Self::SEPARATOR)
            .map(move |(idx, _)| &self.0[..idx])
    }

    /// Iterates over the `(parent, child)` position pairs along this tree
    /// number's own path, from the top level down.
    ///
    /// ```
    /// use mesh_types::TreeNumber;
    ///
    /// let tn = TreeNumber::new("A01.236.500");
    /// let links: Vec<_> = tn.lineage().collect();
    /// assert_eq!(links, vec![("A01", "A01.236"), ("A01.236", "A01.236.500")]);
    /// ```
    pub fn lineage(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut path: Vec<&str> = self.ancestors().collect();
        path.push(self.as_str());
        let links: Vec<(&str, &str)> = path.windows(2).map(|w| (w[0], w[1])).collect();
        links.into_iter()
    }
}

impl fmt::Display for TreeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TreeNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TreeNumber {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TreeNumber {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TreeNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_and_parent() {
        let top = TreeNumber::new("C01");
        assert_eq!(top.depth(), 1);
        assert_eq!(top.parent(), None);
        assert!(top.is_top_level());

        let deep = TreeNumber::new("C01.123.456");
        assert_eq!(deep.depth(), 3);
        assert_eq!(deep.parent(), Some("C01.123"));
        assert!(!deep.is_top_level());
    }

    #[test]
    fn test_prefix_bounds() {
        let tn = TreeNumber::new("C01.123.456");
        assert_eq!(tn.prefix(0), None);
        assert_eq!(tn.prefix(1), Some("C01"));
        assert_eq!(tn.prefix(2), Some("C01.123"));
        assert_eq!(tn.prefix(3), Some("C01.123.456"));
        assert_eq!(tn.prefix(4), None);
    }

    #[test]
    fn test_segments() {
        let tn = TreeNumber::new("D12.776.157");
        assert_eq!(tn.segments().collect::<Vec<_>>(), vec!["D12", "776", "157"]);
    }

    #[test]
    fn test_lineage_of_top_level_is_empty() {
        let tn = TreeNumber::new("C01");
        assert_eq!(tn.lineage().count(), 0);
        assert_eq!(tn.ancestors().count(), 0);
    }

    #[test]
    fn test_lineage_walks_every_level() {
        let tn = TreeNumber::new("C01.123.456.789");
        let links: Vec<_> = tn.lineage().collect();
        assert_eq!(
            links,
            vec![
                ("C01", "C01.123"),
                ("C01.123", "C01.123.456"),
                ("C01.123.456", "C01.123.456.789"),
            ]
        );
    }

    #[test]
    fn test_borrow_lookup() {
        use std::collections::BTreeMap;

        let mut map = BTreeMap::new();
        map.insert(TreeNumber::new("C01.001"), "Child");
        assert_eq!(map.get("C01.001"), Some(&"Child"));
    }
}
