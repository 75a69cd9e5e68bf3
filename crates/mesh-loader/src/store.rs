//! In-memory MeSH hierarchy store.
//!
//! Holds the parsed descriptors together with the lookup tables and the
//! relation graph derived from their tree numbers. A store is built once
//! from a complete catalog and is read-only afterwards.
//!
//! ## Edge discovery
//!
//! With [`EdgeDiscovery::Streaming`] (the default) every tree number is
//! resolved as soon as it is registered, walking every level of its own
//! lineage against the positions seen so far. A child position declared
//! before its parent position therefore never yields an edge.
//! [`EdgeDiscovery::TwoPass`] resolves all tree numbers against the complete
//! table instead.
//!
//! ```ignore
//! let store = MeshStore::load_file("desc2025.xml", MeshConfig::default())?;
//!
//! let pairs = store.label_pairs();
//! let relations = store.get_hierarchy_relations_by_id("D016667");
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use mesh_types::{DescriptorRecord, LabelPair, MeshId, TreeNumber};

use crate::hierarchy::{self, RelationMap};
use crate::loader::read_catalog;
use crate::parser::DescriptorParser;
use crate::types::{CatalogAnomaly, EdgeDiscovery, MeshConfig, MeshResult, ParseStats};

/// Descriptor details keyed the way the MeSH browser labels them.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DescriptorSummary {
    /// Descriptor unique identifier.
    #[serde(rename = "MeSH_Unique_ID")]
    pub mesh_id: MeshId,
    /// Tree numbers in declaration order.
    #[serde(rename = "Tree_Numbers")]
    pub tree_numbers: Vec<TreeNumber>,
    /// Preferred name.
    #[serde(rename = "Term_Name")]
    pub term_name: String,
    /// Annotation or scope note.
    #[serde(rename = "Definition")]
    pub definition: String,
}

impl From<&DescriptorRecord> for DescriptorSummary {
    fn from(record: &DescriptorRecord) -> Self {
        Self {
            mesh_id: record.mesh_id.clone(),
            tree_numbers: record.tree_numbers.clone(),
            term_name: record.name.clone(),
            definition: record.definition.clone(),
        }
    }
}

/// A neighbouring descriptor in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RelatedDescriptor {
    /// Descriptor unique identifier.
    pub id: MeshId,
    /// Preferred name.
    pub name: String,
}

/// Parents and children of one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HierarchyRelations {
    /// Descriptor unique identifier.
    pub mesh_id: MeshId,
    /// Preferred name.
    pub term_name: String,
    /// One entry per tree number whose parent position has a known owner.
    pub parents: Vec<RelatedDescriptor>,
    /// Children from the relation graph, sorted by identifier.
    pub children: Vec<RelatedDescriptor>,
    /// Every tree number registered under the identifier, in declaration
    /// order.
    pub tree_numbers: Vec<TreeNumber>,
}

/// In-memory store for a MeSH descriptor catalog and its hierarchy.
///
/// # Example
///
/// ```
/// use mesh_loader::{MeshConfig, MeshStore};
///
/// let xml = r#"<DescriptorRecordSet>
///   <DescriptorRecord>
///     <DescriptorUI>D1</DescriptorUI>
///     <DescriptorName><String>Bacterial Infections</String></DescriptorName>
///     <TreeNumberList><TreeNumber>C01.150</TreeNumber></TreeNumberList>
///   </DescriptorRecord>
///   <DescriptorRecord>
///     <DescriptorUI>D2</DescriptorUI>
///     <DescriptorName><String>Bacteremia</String></DescriptorName>
///     <TreeNumberList><TreeNumber>C01.150.100</TreeNumber></TreeNumberList>
///   </DescriptorRecord>
/// </DescriptorRecordSet>"#;
///
/// let store = MeshStore::load_str(xml, MeshConfig::default()).unwrap();
/// assert_eq!(store.children_of("Bacterial Infections").unwrap().len(), 1);
/// assert_eq!(store.label_pairs().len(), 1);
/// ```
#[derive(Default)]
pub struct MeshStore {
    /// Descriptors in catalog order.
    records: Vec<DescriptorRecord>,
    /// Identifier to position in `records`.
    index_by_id: HashMap<MeshId, usize>,
    /// Name to tree numbers, in declaration order.
    descriptor_to_tree: BTreeMap<String, Vec<TreeNumber>>,
    /// Tree number to owning name.
    tree_to_descriptor: BTreeMap<TreeNumber, String>,
    /// Tree number to owning identifier.
    tree_to_ui: BTreeMap<TreeNumber, MeshId>,
    /// Identifier to every tree number registered under it, in declaration
    /// order. A repeated identifier appends to its earlier codes.
    ui_to_tree: BTreeMap<MeshId, Vec<TreeNumber>>,
    /// Relation graph keyed by identifier: parent to children.
    children_by_id: BTreeMap<MeshId, BTreeSet<MeshId>>,
    /// Relation graph keyed by the names owning each position when the edge
    /// was resolved.
    parent_child: RelationMap,
    /// Non-fatal problems found while loading.
    anomalies: Vec<CatalogAnomaly>,
    /// Parse and resolution statistics.
    stats: ParseStats,
    /// Strategy used to build the graph.
    edge_discovery: EdgeDiscovery,
    /// Keep an anomaly per unresolved link, not just the count.
    record_unresolved_links: bool,
}

impl std::fmt::Debug for MeshStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshStore")
            .field("records", &self.records.len())
            .field("descriptor_to_tree", &self.descriptor_to_tree.len())
            .field("tree_to_descriptor", &self.tree_to_descriptor.len())
            .field("tree_to_ui", &self.tree_to_ui.len())
            .field("ui_to_tree", &self.ui_to_tree.len())
            .field("children_by_id", &self.children_by_id.len())
            .field("parent_child", &self.parent_child.len())
            .field("anomalies", &self.anomalies.len())
            .field("edge_discovery", &self.edge_discovery)
            .finish()
    }
}

impl MeshStore {
    /// Builds a store from records in catalog order.
    pub fn from_records(
        records: impl IntoIterator<Item = DescriptorRecord>,
        config: &MeshConfig,
    ) -> Self {
        let mut store = Self {
            edge_discovery: config.edge_discovery,
            record_unresolved_links: config.record_unresolved_links,
            ..Default::default()
        };

        for record in records {
            store.register(record);
        }

        if store.edge_discovery == EdgeDiscovery::TwoPass {
            store.resolve_all_edges();
        }

        if config.detect_name_collisions {
            store.detect_name_collisions();
        }
        store
    }

    /// Parses descriptor XML and builds a store.
    ///
    /// Parsing completes before any table is populated, so malformed input
    /// never produces a partial store.
    pub fn load_str(xml: &str, config: MeshConfig) -> MeshResult<Self> {
        let parsed = DescriptorParser::from_str(xml).parse_all()?;

        let mut store = Self::from_records(parsed.records, &config);
        let unresolved = store.stats.unresolved_links;
        store.stats = ParseStats {
            unresolved_links: unresolved,
            ..parsed.stats
        };
        let mut anomalies = parsed.anomalies;
        anomalies.append(&mut store.anomalies);
        store.anomalies = anomalies;

        tracing::info!(
            descriptors = store.descriptor_count(),
            tree_numbers = store.tree_number_count(),
            relations = store.relation_count(),
            skipped = store.stats.skipped_records,
            unresolved = store.stats.unresolved_links,
            "Built MeSH hierarchy"
        );
        Ok(store)
    }

    /// Reads a descriptor XML file and builds a store.
    pub fn load_file<P: AsRef<Path>>(path: P, config: MeshConfig) -> MeshResult<Self> {
        let xml = read_catalog(path)?;
        Self::load_str(&xml, config)
    }

    /// Registers one record and its tree numbers.
    fn register(&mut self, record: DescriptorRecord) {
        let slot = match self.index_by_id.get(&record.mesh_id) {
            Some(&idx) => {
                tracing::warn!(mesh_id = %record.mesh_id, "Duplicate descriptor identifier");
                self.anomalies.push(CatalogAnomaly::DuplicateIdentifier {
                    mesh_id: record.mesh_id.clone(),
                });
                self.records[idx] = record;
                idx
            }
            None => {
                let idx = self.records.len();
                self.index_by_id.insert(record.mesh_id.clone(), idx);
                self.records.push(record);
                idx
            }
        };

        let mesh_id = self.records[slot].mesh_id.clone();
        let name = self.records[slot].name.clone();
        let tree_numbers = self.records[slot].tree_numbers.clone();

        for tree_number in tree_numbers {
            self.descriptor_to_tree
                .entry(name.clone())
                .or_default()
                .push(tree_number.clone());
            self.tree_to_descriptor
                .insert(tree_number.clone(), name.clone());
            self.ui_to_tree
                .entry(mesh_id.clone())
                .or_default()
                .push(tree_number.clone());

            if let Some(previous) = self.tree_to_ui.insert(tree_number.clone(), mesh_id.clone()) {
                if previous != mesh_id {
                    tracing::warn!(
                        %tree_number,
                        %previous,
                        current = %mesh_id,
                        "Tree number declared by two descriptors"
                    );
                    self.anomalies.push(CatalogAnomaly::DuplicateTreeNumber {
                        tree_number: tree_number.clone(),
                        previous,
                        current: mesh_id.clone(),
                    });
                }
            }

            if self.edge_discovery == EdgeDiscovery::Streaming {
                self.extract_hierarchy_relations(&tree_number);
            }
        }
    }

    /// Adds an edge for every parent/child position pair along the tree
    /// number's lineage whose two positions both have an owner.
    fn extract_hierarchy_relations(&mut self, tree_number: &TreeNumber) {
        for (parent_tree, child_tree) in tree_number.lineage() {
            let parent = owner_of(parent_tree, &self.tree_to_ui, &self.tree_to_descriptor);
            let child = owner_of(child_tree, &self.tree_to_ui, &self.tree_to_descriptor);
            match (parent, child) {
                (Some(parent), Some(child)) => self.add_edge(parent, child),
                (parent, _) => {
                    let missing = if parent.is_none() { parent_tree } else { child_tree };
                    self.note_unresolved(tree_number, missing);
                }
            }
        }
    }

    /// Records an edge in both the identifier graph and the name view.
    fn add_edge(&mut self, parent: Owner, child: Owner) {
        self.children_by_id
            .entry(parent.mesh_id)
            .or_default()
            .insert(child.mesh_id);
        self.parent_child
            .entry(parent.name)
            .or_default()
            .insert(child.name);
    }

    fn note_unresolved(&mut self, tree_number: &TreeNumber, missing: &str) {
        tracing::trace!(%tree_number, missing, "Unresolved tree number link");
        self.stats.unresolved_links += 1;
        if self.record_unresolved_links {
            self.anomalies.push(CatalogAnomaly::UnresolvedCode {
                tree_number: tree_number.clone(),
                missing: missing.to_string(),
            });
        }
    }

    /// Second pass of [`EdgeDiscovery::TwoPass`].
    fn resolve_all_edges(&mut self) {
        let tree_numbers: Vec<&TreeNumber> = self.tree_to_ui.keys().collect();

        #[cfg(feature = "parallel")]
        let links: Vec<Link> = tree_numbers
            .par_iter()
            .flat_map_iter(|tn| resolve_lineage(tn, &self.tree_to_ui, &self.tree_to_descriptor))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let links: Vec<Link> = tree_numbers
            .iter()
            .flat_map(|tn| resolve_lineage(tn, &self.tree_to_ui, &self.tree_to_descriptor))
            .collect();

        for link in links {
            match link {
                Link::Edge { parent, child } => self.add_edge(parent, child),
                Link::Unresolved {
                    tree_number,
                    missing,
                } => self.note_unresolved(&tree_number, &missing),
            }
        }
    }

    fn detect_name_collisions(&mut self) {
        let mut by_name: BTreeMap<&str, Vec<&MeshId>> = BTreeMap::new();
        for record in &self.records {
            by_name.entry(&record.name).or_default().push(&record.mesh_id);
        }

        let collisions: Vec<CatalogAnomaly> = by_name
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(name, ids)| {
                let mut mesh_ids: Vec<MeshId> = ids.into_iter().cloned().collect();
                mesh_ids.sort();
                CatalogAnomaly::NameCollision {
                    name: name.to_string(),
                    mesh_ids,
                }
            })
            .collect();

        for collision in collisions {
            tracing::warn!("{}", collision);
            self.anomalies.push(collision);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOOKUPS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Gets a descriptor by identifier.
    pub fn get_descriptor(&self, mesh_id: &str) -> Option<&DescriptorRecord> {
        self.index_by_id.get(mesh_id).map(|&idx| &self.records[idx])
    }

    /// Checks if a descriptor exists.
    pub fn has_descriptor(&self, mesh_id: &str) -> bool {
        self.index_by_id.contains_key(mesh_id)
    }

    /// Gets the browser-style summary of a descriptor by identifier.
    pub fn get_mesh_by_id(&self, mesh_id: &str) -> Option<DescriptorSummary> {
        self.get_descriptor(mesh_id).map(DescriptorSummary::from)
    }

    /// Finds the first descriptor, in catalog order, whose name matches
    /// `term_name` ignoring case.
    pub fn search_mesh_by_name(&self, term_name: &str) -> Option<DescriptorSummary> {
        let wanted = term_name.to_lowercase();
        self.records
            .iter()
            .find(|record| record.name.to_lowercase() == wanted)
            .map(DescriptorSummary::from)
    }

    /// Gets the parents and children of a descriptor.
    ///
    /// Tree numbers are every code registered under the identifier. Parents
    /// are resolved per tree number by stripping its last segment; children
    /// come from the relation graph.
    pub fn get_hierarchy_relations_by_id(&self, mesh_id: &str) -> Option<HierarchyRelations> {
        let record = self.get_descriptor(mesh_id)?;
        let tree_numbers = self.ui_to_tree.get(mesh_id).cloned().unwrap_or_default();

        let parents = tree_numbers
            .iter()
            .filter_map(|tn| tn.parent())
            .filter_map(|parent_tree| self.tree_to_ui.get(parent_tree))
            .filter_map(|parent_id| self.get_descriptor(parent_id))
            .map(|parent| RelatedDescriptor {
                id: parent.mesh_id.clone(),
                name: parent.name.clone(),
            })
            .collect();

        let children = self
            .children_by_id
            .get(mesh_id)
            .into_iter()
            .flatten()
            .filter_map(|child_id| self.get_descriptor(child_id))
            .map(|child| RelatedDescriptor {
                id: child.mesh_id.clone(),
                name: child.name.clone(),
            })
            .collect();

        Some(HierarchyRelations {
            mesh_id: record.mesh_id.clone(),
            term_name: record.name.clone(),
            parents,
            children,
            tree_numbers,
        })
    }

    /// Gets the tree numbers registered under a name.
    pub fn tree_numbers_for_name(&self, name: &str) -> Option<&[TreeNumber]> {
        self.descriptor_to_tree.get(name).map(Vec::as_slice)
    }

    /// Gets the name owning a tree number.
    pub fn descriptor_for_tree(&self, tree_number: &str) -> Option<&str> {
        self.tree_to_descriptor.get(tree_number).map(String::as_str)
    }

    /// Gets the identifier owning a tree number.
    pub fn mesh_id_for_tree(&self, tree_number: &str) -> Option<&str> {
        self.tree_to_ui.get(tree_number).map(String::as_str)
    }

    /// Gets the child names of a parent name.
    pub fn children_of(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.parent_child.get(name)
    }

    /// Gets the child identifiers of a parent identifier.
    pub fn child_ids_of(&self, mesh_id: &str) -> Option<&BTreeSet<MeshId>> {
        self.children_by_id.get(mesh_id)
    }

    /// Returns the name-keyed relation graph.
    pub fn parent_child_relations(&self) -> &RelationMap {
        &self.parent_child
    }

    /// Returns all labeled pairs: parent/child pairs, then sibling pairs.
    pub fn label_pairs(&self) -> Vec<LabelPair> {
        hierarchy::label_pairs(&self.parent_child)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TABLES AND COUNTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Returns the name to tree numbers table.
    pub fn descriptor_to_tree(&self) -> &BTreeMap<String, Vec<TreeNumber>> {
        &self.descriptor_to_tree
    }

    /// Returns the tree number to name table.
    pub fn tree_to_descriptor(&self) -> &BTreeMap<TreeNumber, String> {
        &self.tree_to_descriptor
    }

    /// Returns the tree number to identifier table.
    pub fn tree_to_ui(&self) -> &BTreeMap<TreeNumber, MeshId> {
        &self.tree_to_ui
    }

    /// Returns the identifier to tree numbers table.
    pub fn ui_to_tree(&self) -> &BTreeMap<MeshId, Vec<TreeNumber>> {
        &self.ui_to_tree
    }

    /// Returns an iterator over descriptors in catalog order.
    pub fn records(&self) -> impl Iterator<Item = &DescriptorRecord> {
        self.records.iter()
    }

    /// Returns the number of descriptors.
    pub fn descriptor_count(&self) -> usize {
        self.records.len()
    }

    /// Returns the number of distinct tree numbers.
    pub fn tree_number_count(&self) -> usize {
        self.tree_to_descriptor.len()
    }

    /// Returns the number of parent/child edges in the name view.
    pub fn relation_count(&self) -> usize {
        self.parent_child.values().map(BTreeSet::len).sum()
    }

    /// Returns the strategy used to build the graph.
    pub fn edge_discovery(&self) -> EdgeDiscovery {
        self.edge_discovery
    }

    /// Returns load statistics.
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Returns non-fatal problems found while loading.
    pub fn anomalies(&self) -> &[CatalogAnomaly] {
        &self.anomalies
    }
}

/// Descriptor owning a tree number at the moment an edge is resolved.
struct Owner {
    mesh_id: MeshId,
    name: String,
}

fn owner_of(
    tree_number: &str,
    ids: &BTreeMap<TreeNumber, MeshId>,
    names: &BTreeMap<TreeNumber, String>,
) -> Option<Owner> {
    Some(Owner {
        mesh_id: ids.get(tree_number)?.clone(),
        name: names.get(tree_number)?.clone(),
    })
}

/// Outcome of resolving one lineage step in the two-pass build.
enum Link {
    Edge { parent: Owner, child: Owner },
    Unresolved { tree_number: TreeNumber, missing: String },
}

fn resolve_lineage(
    tree_number: &TreeNumber,
    ids: &BTreeMap<TreeNumber, MeshId>,
    names: &BTreeMap<TreeNumber, String>,
) -> Vec<Link> {
    tree_number
        .lineage()
        .map(|(parent_tree, child_tree)| {
            match (owner_of(parent_tree, ids, names), owner_of(child_tree, ids, names)) {
                (Some(parent), Some(child)) => Link::Edge { parent, child },
                (parent, _) => Link::Unresolved {
                    tree_number: tree_number.clone(),
                    missing: (if parent.is_none() { parent_tree } else { child_tree }).to_string(),
                },
            }
        })
        .collect()
}
