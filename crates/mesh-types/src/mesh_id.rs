//! MeSH descriptor identifier type.
//!
//! Descriptor unique identifiers (`DescriptorUI`) are short opaque strings
//! such as `D016667`. They are stable across releases, unlike display names.

/// A MeSH descriptor unique identifier.
///
/// # Examples
///
/// ```
/// use mesh_types::MeshId;
///
/// let bacterial_capsules: MeshId = "D001422".to_string();
/// assert!(bacterial_capsules.starts_with('D'));
/// ```
pub type MeshId = String;
