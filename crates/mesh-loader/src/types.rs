//! Loader-specific types: errors, configuration, statistics and diagnostics.

use std::fmt;

use mesh_types::{MeshId, TreeNumber};
use thiserror::Error;

/// Errors that can occur while loading or exporting MeSH data.
#[derive(Error, Debug)]
pub enum MeshError {
    /// I/O error reading or writing a file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The descriptor catalog is not well-formed XML.
    #[error("Malformed descriptor XML at byte {position}: {message}")]
    MalformedInput {
        /// Byte offset at which the problem was detected.
        position: u64,
        /// Description of the problem.
        message: String,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV/TSV writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Directory not found.
    #[error("Directory not found: {path}")]
    DirectoryNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Fetching a descriptor file from the MeSH server failed.
    #[error("Download of {url} failed: {message}")]
    Download {
        /// The URL that was requested.
        url: String,
        /// Description of the failure.
        message: String,
    },

    /// No `descYYYY.xml` file in the searched directory.
    #[error("No descriptor file ({pattern}) found in {directory}")]
    DescriptorFileMissing {
        /// File name or pattern that was searched for.
        pattern: String,
        /// The directory that was searched.
        directory: String,
    },
}

impl MeshError {
    pub(crate) fn malformed(position: u64, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            position,
            message: message.into(),
        }
    }

    /// Returns true if the error means the catalog itself could not be parsed.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MalformedInput { .. })
    }
}

/// Result type for MeSH operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// When parent/child edges are resolved against the tree number table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeDiscovery {
    /// Resolve each tree number as soon as it is registered, against the
    /// tree numbers seen so far. A child position declared before its parent
    /// position never produces that edge.
    #[default]
    Streaming,
    /// Register every tree number first, then resolve all of them against
    /// the complete table. Independent of declaration order.
    TwoPass,
}

/// Configuration for building a [`MeshStore`](crate::MeshStore).
#[derive(Debug, Clone)]
pub struct MeshConfig {
    /// Edge resolution strategy.
    pub edge_discovery: EdgeDiscovery,
    /// Whether to scan for display names shared by several descriptors.
    pub detect_name_collisions: bool,
    /// Whether every unresolved lineage link is kept as an
    /// [`CatalogAnomaly::UnresolvedCode`]. The count in
    /// [`ParseStats::unresolved_links`] is kept either way.
    pub record_unresolved_links: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            edge_discovery: EdgeDiscovery::Streaming,
            detect_name_collisions: true,
            record_unresolved_links: false,
        }
    }
}

impl MeshConfig {
    /// Creates a config that resolves edges after all tree numbers are known.
    pub fn two_pass() -> Self {
        Self {
            edge_discovery: EdgeDiscovery::TwoPass,
            ..Default::default()
        }
    }
}

/// Statistics from parsing a descriptor catalog.
#[derive(Debug, Clone, Default)]
pub struct ParseStats {
    /// `DescriptorRecord` elements encountered.
    pub total_records: usize,
    /// Records with both identifier and name.
    pub accepted_records: usize,
    /// Records dropped for lacking identifier or name.
    pub skipped_records: usize,
    /// Tree numbers collected from accepted records.
    pub tree_numbers: usize,
    /// Parent/child position pairs that could not be resolved when checked.
    pub unresolved_links: usize,
    /// Time taken to parse in milliseconds.
    pub parse_time_ms: u64,
}

impl ParseStats {
    /// Returns the percentage of records that were accepted.
    pub fn acceptance_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            (self.accepted_records as f64 / self.total_records as f64) * 100.0
        }
    }
}

/// A required descriptor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    /// `DescriptorUI`.
    Identifier,
    /// `DescriptorName/String`.
    Name,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier => f.write_str("DescriptorUI"),
            Self::Name => f.write_str("DescriptorName/String"),
        }
    }
}

/// Non-fatal data problems found while loading.
///
/// None of these abort a load; they only reduce the completeness of the
/// derived graph and are kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogAnomaly {
    /// A record lacked a required field and was dropped.
    IncompleteRecord {
        /// Byte offset of the end of the record.
        position: u64,
        /// The first missing field.
        missing: MissingField,
        /// Identifier, when only the name was missing.
        mesh_id: Option<MeshId>,
    },
    /// A parent or child position was not in the table when checked.
    UnresolvedCode {
        /// The tree number being resolved.
        tree_number: TreeNumber,
        /// The position that had no owner.
        missing: String,
    },
    /// A tree number was declared by two different descriptors.
    DuplicateTreeNumber {
        /// The contested position.
        tree_number: TreeNumber,
        /// Owner before the redeclaration.
        previous: MeshId,
        /// Owner after the redeclaration.
        current: MeshId,
    },
    /// An identifier was declared twice; the later record replaced the earlier.
    DuplicateIdentifier {
        /// The repeated identifier.
        mesh_id: MeshId,
    },
    /// Several descriptors share one display name.
    NameCollision {
        /// The shared name.
        name: String,
        /// Every identifier using it, sorted.
        mesh_ids: Vec<MeshId>,
    },
}

impl fmt::Display for CatalogAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompleteRecord {
                position,
                missing,
                mesh_id,
            } => match mesh_id {
                Some(id) => write!(f, "record {id} at byte {position} has no {missing}"),
                None => write!(f, "record at byte {position} has no {missing}"),
            },
            Self::UnresolvedCode {
                tree_number,
                missing,
            } => write!(f, "tree number {tree_number}: no descriptor owns {missing}"),
            Self::DuplicateTreeNumber {
                tree_number,
                previous,
                current,
            } => write!(
                f,
                "tree number {tree_number} declared by {previous} and {current}"
            ),
            Self::DuplicateIdentifier { mesh_id } => {
                write!(f, "identifier {mesh_id} declared more than once")
            }
            Self::NameCollision { name, mesh_ids } => {
                write!(f, "name {name:?} shared by {}", mesh_ids.join(", "))
            }
        }
    }
}
