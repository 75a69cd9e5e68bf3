//! # mesh-loader
//!
//! Parser and hierarchy builder for MeSH descriptor XML files.
//!
//! Loading a catalog produces a [`MeshStore`]: descriptor lookups by
//! identifier, name and tree number, a parent/child relation graph inferred
//! from tree numbers, and the labeled term pairs derived from that graph.
//!
//! ```ignore
//! use mesh_loader::{discover_descriptor_file, MeshConfig, MeshStore};
//!
//! let path = discover_descriptor_file("data/", None)?;
//! let store = MeshStore::load_file(path, MeshConfig::default())?;
//! store.to_export().write_json("mesh_hierarchy_v2.json")?;
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): resolves two-pass edges and enumerates sibling
//!   pairs on the rayon thread pool. Output is identical either way.

#![warn(missing_docs)]

pub mod export;
pub mod hierarchy;
pub mod loader;
pub mod parser;
pub mod store;
pub mod types;

pub use export::{write_pairs_tsv, write_pairs_tsv_file, HierarchyExport};
pub use hierarchy::{label_pairs, RelationMap};
pub use loader::{
    decode_catalog, descriptor_file_name, descriptor_url, discover_descriptor_file,
    download_descriptor_file, format_bytes, read_catalog, MESH_XML_BASE_URL,
};
pub use parser::{DescriptorParser, ParsedCatalog};
pub use store::{DescriptorSummary, HierarchyRelations, MeshStore, RelatedDescriptor};
pub use types::{
    CatalogAnomaly, EdgeDiscovery, MeshConfig, MeshError, MeshResult, MissingField, ParseStats,
};

// Re-export mesh-types for convenience
pub use mesh_types;
