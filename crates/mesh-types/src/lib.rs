//! # mesh-types
//!
//! Type definitions for MeSH (Medical Subject Headings) descriptor
//! hierarchies.
//!
//! This crate provides the plain data types shared by the loader and the
//! command-line tool: descriptor records, tree numbers, and the labeled term
//! pairs derived from the hierarchy.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde.
//!   Disable this feature for zero-dependency usage.
//!
//! ## Usage
//!
//! ```rust
//! use mesh_types::{DescriptorRecord, LabelPair, RelationKind, TreeNumber};
//!
//! let record = DescriptorRecord {
//!     mesh_id: "D016667".to_string(),
//!     name: "Bacterial Capsules".to_string(),
//!     definition: String::new(),
//!     tree_numbers: vec![TreeNumber::new("A20.150")],
//! };
//!
//! assert_eq!(record.tree_numbers[0].parent(), Some("A20"));
//!
//! let pair = LabelPair::new("Bacteria", "Bacterial Capsules", RelationKind::ParentChild);
//! assert!(pair.is_parent_child());
//! ```

#![warn(missing_docs)]

mod descriptor;
mod mesh_id;
mod relation;
mod tree_number;

// Re-export all public types at crate root
pub use descriptor::DescriptorRecord;
pub use mesh_id::MeshId;
pub use relation::{LabelPair, RelationKind, UnknownRelationKind};
pub use tree_number::TreeNumber;
