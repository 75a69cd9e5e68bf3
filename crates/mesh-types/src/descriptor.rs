//! MeSH descriptor record type.
//!
//! This module provides the `DescriptorRecord` struct representing one
//! `DescriptorRecord` element of a MeSH descriptor XML file.

use crate::{MeshId, TreeNumber};

/// A MeSH descriptor with the fields used for hierarchy extraction.
///
/// # Examples
///
/// ```
/// use mesh_types::{DescriptorRecord, TreeNumber};
///
/// let record = DescriptorRecord {
///     mesh_id: "D001422".to_string(),
///     name: "Bacterial Capsules".to_string(),
///     definition: String::new(),
///     tree_numbers: vec![TreeNumber::new("A20.150")],
/// };
///
/// assert!(!record.has_definition());
/// assert!(record.is_placed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DescriptorRecord {
    /// Descriptor unique identifier (`DescriptorUI`).
    pub mesh_id: MeshId,
    /// Preferred display name (`DescriptorName/String`). Not guaranteed unique.
    pub name: String,
    /// Annotation or scope note, empty when the catalog has neither.
    pub definition: String,
    /// Positions in the hierarchy, in declaration order.
    pub tree_numbers: Vec<TreeNumber>,
}

impl DescriptorRecord {
    /// Creates a record without definition or tree numbers.
    pub fn new(mesh_id: impl Into<MeshId>, name: impl Into<String>) -> Self {
        Self {
            mesh_id: mesh_id.into(),
            name: name.into(),
            definition: String::new(),
            tree_numbers: Vec::new(),
        }
    }

    /// Returns true if the record carries a non-empty definition.
    pub fn has_definition(&self) -> bool {
        !self.definition.is_empty()
    }

    /// Returns true if the record occupies at least one hierarchy position.
    pub fn is_placed(&self) -> bool {
        !self.tree_numbers.is_empty()
    }
}
