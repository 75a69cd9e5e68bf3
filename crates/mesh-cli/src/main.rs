//! MeSH hierarchy extraction binary.

mod cli;

use clap::Parser;
use mesh_loader::{
    descriptor_file_name, discover_descriptor_file, download_descriptor_file, format_bytes,
    read_catalog, write_pairs_tsv_file, MeshError, MeshStore, MESH_XML_BASE_URL,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

const DEFAULT_YEAR: u16 = 2025;
const DEFINITION_PREVIEW_CHARS: usize = 100;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        tracing::error!("{}", e);
        if matches!(
            e,
            MeshError::FileNotFound { .. }
                | MeshError::DirectoryNotFound { .. }
                | MeshError::DescriptorFileMissing { .. }
                | MeshError::Download { .. }
        ) {
            tracing::error!(
                "Download {} from {} and place it at {}, or pass --download",
                descriptor_file_name(cli.year.unwrap_or(DEFAULT_YEAR)),
                MESH_XML_BASE_URL,
                cli.input.display()
            );
        }
        return Err(e.into());
    }

    Ok(())
}

fn run(cli: &Cli) -> Result<(), MeshError> {
    let path = if cli.download {
        download_descriptor_file(cli.year.unwrap_or(DEFAULT_YEAR), cli.download_dir())?
    } else {
        discover_descriptor_file(&cli.input, cli.year)?
    };
    tracing::info!("Parsing MeSH XML from: {}", path.display());

    let size = std::fs::metadata(&path)?.len();
    let xml = read_catalog(&path)?;
    tracing::info!("Read {}", format_bytes(size));

    let config = cli.mesh_config();
    tracing::info!("Edge discovery: {:?}", config.edge_discovery);
    let store = MeshStore::load_str(&xml, config)?;

    let stats = store.stats();
    tracing::info!(
        "Parsed {} descriptor records in {} ms ({} accepted, {} skipped, {:.1}% acceptance)",
        stats.total_records,
        stats.parse_time_ms,
        stats.accepted_records,
        stats.skipped_records,
        stats.acceptance_rate()
    );
    if !store.anomalies().is_empty() {
        tracing::warn!("{} data anomalies recorded", store.anomalies().len());
    }

    tracing::info!("Extracting hierarchy relationships...");
    let export = store.to_export();
    export.write_json(&cli.output)?;
    tracing::info!("Hierarchy data saved to {}", cli.output.display());

    if let Some(ref tsv_path) = cli.pairs_tsv {
        write_pairs_tsv_file(&export.similar_pairs, tsv_path)?;
        tracing::info!(
            "Wrote {} label pairs to {}",
            export.similar_pairs.len(),
            tsv_path.display()
        );
    }

    log_samples(&store, cli.samples);

    tracing::info!("Total tree numbers: {}", store.tree_number_count());
    tracing::info!("Total parent-child relations: {}", store.relation_count());
    tracing::info!("Total similar pairs for training: {}", export.similar_pairs.len());

    Ok(())
}

fn log_samples(store: &MeshStore, limit: usize) {
    if limit == 0 {
        return;
    }

    tracing::info!("Sample MeSH entries with IDs:");
    for record in store.records().take(limit) {
        let trees: Vec<&str> = record.tree_numbers.iter().map(|t| t.as_str()).collect();
        tracing::info!(
            "  {} | {} | [{}]",
            record.mesh_id,
            record.name,
            trees.join(", ")
        );
        if record.has_definition() {
            let preview: String = record
                .definition
                .chars()
                .take(DEFINITION_PREVIEW_CHARS)
                .collect();
            tracing::info!("    Definition: {}...", preview);
        }
    }

    tracing::info!("Example parent-child relationships:");
    for (parent, children) in store.parent_child_relations().iter().take(limit + 2) {
        let shown: Vec<&str> = children.iter().take(3).map(String::as_str).collect();
        tracing::info!("  {} -> [{}]...", parent, shown.join(", "));
    }
}
