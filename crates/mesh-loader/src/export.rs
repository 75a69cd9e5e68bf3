//! Hierarchy export to JSON and TSV.
//!
//! The JSON document carries every lookup table plus the relation graph and
//! the labeled pairs. The TSV file carries only the pairs, one per line,
//! ready to be fed to a training job.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use mesh_types::{DescriptorRecord, LabelPair, MeshId, TreeNumber};
use serde::{Deserialize, Serialize};

use crate::store::MeshStore;
use crate::types::MeshResult;

/// Header row of the pairs TSV file.
pub const PAIRS_TSV_HEADER: [&str; 3] = ["term_a", "term_b", "relation"];

/// Complete hierarchy data set as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyExport {
    /// Identifier to full descriptor.
    pub descriptor_details: BTreeMap<MeshId, DescriptorRecord>,
    /// Name to tree numbers.
    pub descriptor_to_tree: BTreeMap<String, Vec<TreeNumber>>,
    /// Tree number to name.
    pub tree_to_descriptor: BTreeMap<TreeNumber, String>,
    /// Identifier to tree numbers.
    pub ui_to_tree: BTreeMap<MeshId, Vec<TreeNumber>>,
    /// Tree number to identifier.
    pub tree_to_ui: BTreeMap<TreeNumber, MeshId>,
    /// Parent name to sorted child names.
    pub parent_child_relations: BTreeMap<String, Vec<String>>,
    /// Parent/child pairs followed by sibling pairs.
    pub similar_pairs: Vec<LabelPair>,
}

impl HierarchyExport {
    /// Writes the export as pretty-printed JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> MeshResult<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads an export previously written with [`write_json`](Self::write_json).
    pub fn read_json<P: AsRef<Path>>(path: P) -> MeshResult<Self> {
        let file = File::open(path.as_ref())?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

impl MeshStore {
    /// Snapshots every table and the derived pairs.
    pub fn to_export(&self) -> HierarchyExport {
        let descriptor_details = self
            .records()
            .map(|r| (r.mesh_id.clone(), r.clone()))
            .collect();
        let parent_child_relations = self
            .parent_child_relations()
            .iter()
            .map(|(parent, children)| (parent.clone(), children.iter().cloned().collect()))
            .collect();

        HierarchyExport {
            descriptor_details,
            descriptor_to_tree: self.descriptor_to_tree().clone(),
            tree_to_descriptor: self.tree_to_descriptor().clone(),
            ui_to_tree: self.ui_to_tree().clone(),
            tree_to_ui: self.tree_to_ui().clone(),
            parent_child_relations,
            similar_pairs: self.label_pairs(),
        }
    }
}

/// Writes pairs as tab-separated values with a header row.
pub fn write_pairs_tsv<W: Write>(pairs: &[LabelPair], writer: W) -> MeshResult<()> {
    let mut tsv = WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    tsv.write_record(PAIRS_TSV_HEADER)?;
    for pair in pairs {
        tsv.write_record([pair.term_a.as_str(), pair.term_b.as_str(), pair.kind.as_str()])?;
    }
    tsv.flush()?;
    Ok(())
}

/// Writes pairs to a TSV file.
pub fn write_pairs_tsv_file<P: AsRef<Path>>(pairs: &[LabelPair], path: P) -> MeshResult<()> {
    let file = File::create(path.as_ref())?;
    write_pairs_tsv(pairs, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MeshConfig;
    use mesh_types::RelationKind;

    fn sample_store() -> MeshStore {
        let records = vec![
            DescriptorRecord {
                tree_numbers: vec![TreeNumber::new("C01")],
                ..DescriptorRecord::new("D1", "Root")
            },
            DescriptorRecord {
                tree_numbers: vec![TreeNumber::new("C01.001")],
                ..DescriptorRecord::new("D2", "Alpha")
            },
            DescriptorRecord {
                tree_numbers: vec![TreeNumber::new("C01.002")],
                ..DescriptorRecord::new("D3", "Beta")
            },
            DescriptorRecord::new("D4", "Unplaced"),
        ];
        MeshStore::from_records(records, &MeshConfig::default())
    }

    #[test]
    fn test_export_tables() {
        let export = sample_store().to_export();

        assert_eq!(export.descriptor_details.len(), 4);
        assert_eq!(export.ui_to_tree.len(), 3);
        assert!(!export.ui_to_tree.contains_key("D4"));
        assert_eq!(export.tree_to_ui.get("C01.002").map(String::as_str), Some("D3"));
        assert_eq!(
            export.parent_child_relations.get("Root"),
            Some(&vec!["Alpha".to_string(), "Beta".to_string()])
        );
        assert_eq!(export.similar_pairs.len(), 3);
    }

    #[test]
    fn test_export_keeps_codes_of_repeated_identifier() {
        let records = vec![
            DescriptorRecord {
                tree_numbers: vec![TreeNumber::new("C01")],
                ..DescriptorRecord::new("D1", "Old")
            },
            DescriptorRecord {
                tree_numbers: vec![TreeNumber::new("C01.001")],
                ..DescriptorRecord::new("D2", "Kid")
            },
            DescriptorRecord {
                tree_numbers: vec![TreeNumber::new("C02")],
                ..DescriptorRecord::new("D1", "New")
            },
        ];
        let export = MeshStore::from_records(records, &MeshConfig::default()).to_export();

        assert_eq!(
            export.ui_to_tree.get("D1"),
            Some(&vec![TreeNumber::new("C01"), TreeNumber::new("C02")])
        );
        assert_eq!(export.descriptor_details["D1"].name, "New");
        assert_eq!(
            export.parent_child_relations.get("Old"),
            Some(&vec!["Kid".to_string()])
        );
        assert_eq!(
            export.similar_pairs,
            vec![LabelPair::new("Old", "Kid", RelationKind::ParentChild)]
        );
    }

    #[test]
    fn test_export_json_shape() {
        let export = sample_store().to_export();
        let value = serde_json::to_value(&export).unwrap();

        assert_eq!(value["tree_to_descriptor"]["C01"], "Root");
        assert_eq!(value["descriptor_details"]["D2"]["tree_numbers"][0], "C01.001");
        assert_eq!(value["descriptor_details"]["D2"]["definition"], "");
        assert_eq!(
            value["similar_pairs"][2],
            serde_json::json!(["Alpha", "Beta", "siblings"])
        );
    }

    #[test]
    fn test_write_and_read_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh_hierarchy.json");
        let export = sample_store().to_export();

        export.write_json(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"descriptor_details\""));

        assert_eq!(HierarchyExport::read_json(&path).unwrap(), export);
    }

    #[test]
    fn test_write_pairs_tsv() {
        let pairs = vec![
            LabelPair::new("Root", "Alpha", RelationKind::ParentChild),
            LabelPair::new("Alpha", "Beta", RelationKind::Siblings),
        ];
        let mut out = Vec::new();
        write_pairs_tsv(&pairs, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "term_a\tterm_b\trelation\nRoot\tAlpha\tparent_child\nAlpha\tBeta\tsiblings\n"
        );
    }
}
