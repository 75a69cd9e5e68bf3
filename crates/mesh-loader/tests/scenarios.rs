//! End-to-end hierarchy scenarios, from descriptor XML to labeled pairs.

use mesh_loader::mesh_types::{LabelPair, RelationKind, TreeNumber};
use mesh_loader::{MeshConfig, MeshStore};

fn record(ui: &str, name: &str, trees: &[&str]) -> String {
    let trees: String = trees
        .iter()
        .map(|t| format!("      <TreeNumber>{t}</TreeNumber>\n"))
        .collect();
    format!(
        "  <DescriptorRecord DescriptorClass=\"1\">\n\
         \x20   <DescriptorUI>{ui}</DescriptorUI>\n\
         \x20   <DescriptorName><String>{name}</String></DescriptorName>\n\
         \x20   <TreeNumberList>\n{trees}    </TreeNumberList>\n\
         \x20 </DescriptorRecord>\n"
    )
}

fn catalog(records: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE DescriptorRecordSet SYSTEM \"desc2025.dtd\">\n\
         <DescriptorRecordSet LanguageCode=\"eng\">\n{}</DescriptorRecordSet>\n",
        records.concat()
    )
}

fn load(records: &[String]) -> MeshStore {
    MeshStore::load_str(&catalog(records), MeshConfig::default()).unwrap()
}

#[test]
fn single_root_has_no_edges_or_pairs() {
    let store = load(&[record("X1", "Root", &["C01"])]);

    assert_eq!(store.relation_count(), 0);
    assert!(store.label_pairs().is_empty());
    assert_eq!(store.tree_to_descriptor().len(), 1);
    assert_eq!(
        store.tree_to_descriptor().get("C01").map(String::as_str),
        Some("Root")
    );
}

#[test]
fn parent_declared_first_yields_one_edge() {
    let store = load(&[
        record("X1", "Root", &["C01"]),
        record("X2", "Child", &["C01.001"]),
    ]);

    assert_eq!(store.relation_count(), 1);
    assert!(store.children_of("Root").unwrap().contains("Child"));
    assert_eq!(
        store.label_pairs(),
        vec![LabelPair::new("Root", "Child", RelationKind::ParentChild)]
    );
}

#[test]
fn child_declared_first_yields_no_edge_when_streaming() {
    let records = [
        record("X2", "Child", &["C01.001"]),
        record("X1", "Root", &["C01"]),
    ];

    let store = load(&records);
    assert_eq!(store.relation_count(), 0);
    assert!(store.label_pairs().is_empty());
    assert_eq!(store.stats().unresolved_links, 1);

    let two_pass = MeshStore::load_str(&catalog(&records), MeshConfig::two_pass()).unwrap();
    assert_eq!(
        two_pass.label_pairs(),
        vec![LabelPair::new("Root", "Child", RelationKind::ParentChild)]
    );
}

#[test]
fn three_children_yield_three_sibling_pairs() {
    let store = load(&[
        record("X1", "Root", &["C01"]),
        record("X2", "A", &["C01.001"]),
        record("X3", "B", &["C01.002"]),
        record("X4", "C", &["C01.003"]),
    ]);

    let pairs = store.label_pairs();
    assert_eq!(
        pairs,
        vec![
            LabelPair::new("Root", "A", RelationKind::ParentChild),
            LabelPair::new("Root", "B", RelationKind::ParentChild),
            LabelPair::new("Root", "C", RelationKind::ParentChild),
            LabelPair::new("A", "B", RelationKind::Siblings),
            LabelPair::new("A", "C", RelationKind::Siblings),
            LabelPair::new("B", "C", RelationKind::Siblings),
        ]
    );
}

#[test]
fn malformed_input_returns_no_store() {
    let xml = catalog(&[record("X1", "Root", &["C01"])]).replace("</DescriptorName>", "");
    let err = MeshStore::load_str(&xml, MeshConfig::default()).unwrap_err();
    assert!(err.is_malformed_input());
}

#[test]
fn graph_properties_hold_on_a_mixed_catalog() {
    let store = load(&[
        record("D1", "Diseases", &["C"]),
        record("D2", "Infections", &["C.01"]),
        record("D3", "Bacterial Infections", &["C.01.150"]),
        record("D4", "Virus Diseases", &["C.01.925"]),
        record("D5", "Bacteremia", &["C.01.150.100", "C.23.550.470"]),
        record("D6", "Sepsis", &["C.01.150.200"]),
        record("D7", "Pathologic Processes", &["C.23"]),
        record("D8", "Infection", &["C.23.550"]),
        record("D9", "Orphan Code", &["Z99.001"]),
    ]);

    // Depth-1 positions are never children.
    let top_level: Vec<&str> = store
        .tree_to_descriptor()
        .iter()
        .filter(|(tn, _)| tn.is_top_level())
        .map(|(_, name)| name.as_str())
        .collect();
    for children in store.parent_child_relations().values() {
        for name in &top_level {
            assert!(!children.contains(*name));
        }
    }

    // Every edge is backed by a tree number whose parent position belongs to the parent.
    for (parent, children) in store.parent_child_relations() {
        for child in children {
            let backed = store
                .tree_numbers_for_name(child)
                .unwrap()
                .iter()
                .filter_map(TreeNumber::parent)
                .any(|p| store.descriptor_for_tree(p) == Some(parent.as_str()));
            assert!(backed, "edge {parent} -> {child} has no backing tree number");
        }
    }

    // Sibling counts are k*(k-1)/2 per parent.
    let expected_siblings: usize = store
        .parent_child_relations()
        .values()
        .map(|c| c.len() * (c.len() - 1) / 2)
        .sum();
    let pairs = store.label_pairs();
    let siblings = pairs.iter().filter(|p| p.is_siblings()).count();
    let parent_child = pairs.iter().filter(|p| p.is_parent_child()).count();
    assert_eq!(siblings, expected_siblings);
    assert_eq!(parent_child, store.relation_count());
    assert!(pairs.iter().all(|p| p.term_a != p.term_b));
    assert!(pairs
        .iter()
        .all(|p| matches!(p.kind.as_str(), "parent_child" | "siblings")));

    // Bacteremia sits under two parents.
    let bacteremia = store.get_hierarchy_relations_by_id("D5").unwrap();
    assert_eq!(bacteremia.parents.len(), 2);
}

#[test]
fn incomplete_records_never_reach_the_graph() {
    let nameless = "  <DescriptorRecord>\n    <DescriptorUI>D9</DescriptorUI>\n\
                    <TreeNumberList><TreeNumber>C01.009</TreeNumber></TreeNumberList>\n\
                    </DescriptorRecord>\n"
        .to_string();
    let store = load(&[
        record("X1", "Root", &["C01"]),
        nameless,
        record("X2", "Child", &["C01.001"]),
    ]);

    assert!(store.get_descriptor("D9").is_none());
    assert!(store.descriptor_for_tree("C01.009").is_none());
    assert_eq!(store.stats().skipped_records, 1);
    let export = store.to_export();
    assert!(!export.descriptor_details.contains_key("D9"));
    assert!(export
        .similar_pairs
        .iter()
        .all(|p| p.term_a != "D9" && p.term_b != "D9"));
}
