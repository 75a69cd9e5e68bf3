//! Command-line arguments.

use std::path::{Path, PathBuf};

use clap::Parser;
use mesh_loader::{EdgeDiscovery, MeshConfig};

/// Builds a MeSH descriptor hierarchy and label-pair training data
#[derive(Debug, Parser)]
#[command(name = "mesh-hierarchy")]
#[command(version)]
pub struct Cli {
    /// Descriptor XML file, or a directory containing descYYYY.xml files
    #[arg(value_name = "PATH", env = "MESH_DATA_PATH", default_value = "desc2025.xml")]
    pub input: PathBuf,

    /// Release year to pick when PATH is a directory (newest when omitted)
    #[arg(long, value_name = "YEAR")]
    pub year: Option<u16>,

    /// Fetch descYEAR.xml from the MeSH server before loading
    #[arg(long)]
    pub download: bool,

    /// Where to write the JSON hierarchy export
    #[arg(short, long, value_name = "FILE", env = "MESH_OUTPUT", default_value = "mesh_hierarchy_v2.json")]
    pub output: PathBuf,

    /// Also write the label pairs as TSV
    #[arg(long, value_name = "FILE")]
    pub pairs_tsv: Option<PathBuf>,

    /// Resolve edges after all tree numbers are registered instead of in
    /// declaration order
    #[arg(long)]
    pub two_pass: bool,

    /// Number of sample descriptors and relations to log
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub samples: usize,
}

impl Cli {
    /// Directory that receives a downloaded descriptor file: PATH itself, or
    /// the directory containing it when PATH names a file.
    pub fn download_dir(&self) -> &Path {
        if self.input.extension().is_none() {
            return &self.input;
        }
        match self.input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Loader configuration for these arguments.
    pub fn mesh_config(&self) -> MeshConfig {
        MeshConfig {
            edge_discovery: if self.two_pass {
                EdgeDiscovery::TwoPass
            } else {
                EdgeDiscovery::Streaming
            },
            ..Default::default()
        }
    }
}
