//! In-memory graph store
//!
//! A transaction works on a private copy of the store and publishes it on
//! commit. The store carries a version counter; committing against a store
//! that moved since `begin` is a conflict.

use crate::error::SinkError;
use crate::properties::Properties;
use crate::sink::{CommitSummary, GraphSink, NodeRef, Transaction};
use crate::snapshot::{GraphSnapshot, SnapshotNode, SnapshotRelationship};
use parking_lot::RwLock;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::HashMap;

/// Stored node
#[derive(Debug, Clone, PartialEq)]
struct NodeData {
    labels: Vec<String>,
    properties: Properties,
}

impl NodeData {
    fn has_labels(&self, labels: &[&str]) -> bool {
        labels.iter().all(|l| self.labels.iter().any(|own| own == l))
    }
}

/// Stored relationship
#[derive(Debug, Clone, PartialEq)]
struct RelData {
    rel_type: String,
    properties: Properties,
}

#[derive(Debug, Clone, Default)]
struct Store {
    graph: StableDiGraph<NodeData, RelData>,
    by_label: HashMap<String, Vec<NodeIndex>>,
    version: u64,
}

impl Store {
    fn insert_node(&mut self, labels: &[&str], properties: Properties) -> NodeRef {
        let index = self.graph.add_node(NodeData {
            labels: labels.iter().map(|l| (*l).to_owned()).collect(),
            properties,
        });
        for label in labels {
            self.by_label.entry((*label).to_owned()).or_default().push(index);
        }
        to_ref(index)
    }

    fn find(&self, labels: &[&str], predicate: &Properties) -> Vec<NodeRef> {
        let matches = |index: &NodeIndex| {
            self.graph
                .node_weight(*index)
                .is_some_and(|n| n.has_labels(labels) && n.properties.matches(predicate))
        };

        // Scan the smallest label bucket; unlabeled lookups scan everything
        let bucket = labels
            .iter()
            .map(|l| self.by_label.get(*l).map_or(&[][..], Vec::as_slice))
            .min_by_key(|nodes| nodes.len());

        match bucket {
            Some(nodes) => nodes.iter().filter(|i| matches(*i)).map(|i| to_ref(*i)).collect(),
            None => self
                .graph
                .node_indices()
                .filter(|i| matches(i))
                .map(to_ref)
                .collect(),
        }
    }

    fn contains(&self, node: NodeRef) -> bool {
        self.graph.contains_node(to_index(node))
    }
}

fn to_ref(index: NodeIndex) -> NodeRef {
    NodeRef::new(index.index() as u64)
}

#[allow(clippy::cast_possible_truncation)]
fn to_index(node: NodeRef) -> NodeIndex {
    NodeIndex::new(node.id() as usize)
}

/// Transactional in-memory graph
#[derive(Debug, Default)]
pub struct MemoryGraph {
    store: RwLock<Store>,
}

impl MemoryGraph {
    /// Create empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.store.read().graph.node_count()
    }

    /// Committed relationship count
    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.store.read().graph.edge_count()
    }

    /// Number of commits so far
    #[must_use]
    pub fn version(&self) -> u64 {
        self.store.read().version
    }

    /// Committed nodes matching labels and predicate
    #[must_use]
    pub fn find(&self, labels: &[&str], predicate: &Properties) -> Vec<NodeRef> {
        self.store.read().find(labels, predicate)
    }

    /// Copy of the committed graph
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        let store = self.store.read();
        let graph = &store.graph;

        let nodes = graph
            .node_indices()
            .filter_map(|index| {
                graph.node_weight(index).map(|n| SnapshotNode {
                    id: to_ref(index),
                    labels: n.labels.clone(),
                    properties: n.properties.clone(),
                })
            })
            .collect();

        let relationships = graph
            .edge_references()
            .map(|edge| SnapshotRelationship {
                from: to_ref(edge.source()),
                to: to_ref(edge.target()),
                rel_type: edge.weight().rel_type.clone(),
                properties: edge.weight().properties.clone(),
            })
            .collect();

        GraphSnapshot {
            nodes,
            relationships,
        }
    }
}

impl GraphSink for MemoryGraph {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, SinkError> {
        let working = self.store.read().clone();
        tracing::trace!("memory transaction opened at version {}", working.version);
        Ok(Box::new(MemoryTransaction {
            owner: self,
            base_version: working.version,
            working,
            summary: CommitSummary::default(),
            finished: false,
        }))
    }
}

/// Transaction over a private copy of a [`MemoryGraph`]
#[derive(Debug)]
struct MemoryTransaction<'a> {
    owner: &'a MemoryGraph,
    base_version: u64,
    working: Store,
    summary: CommitSummary,
    finished: bool,
}

impl Transaction for MemoryTransaction<'_> {
    fn create_node(&mut self, labels: &[&str], properties: Properties) -> Result<NodeRef, SinkError> {
        self.summary.nodes_created += 1;
        Ok(self.working.insert_node(labels, properties))
    }

    fn upsert_node(
        &mut self,
        labels: &[&str],
        match_properties: &Properties,
        mut all_properties: Properties,
    ) -> Result<NodeRef, SinkError> {
        if let Some(existing) = self.working.find(labels, match_properties).first() {
            self.summary.nodes_merged += 1;
            return Ok(*existing);
        }

        all_properties.fill_from(match_properties);
        self.summary.nodes_created += 1;
        Ok(self.working.insert_node(labels, all_properties))
    }

    fn match_nodes(&self, labels: &[&str], predicate: &Properties) -> Result<Vec<NodeRef>, SinkError> {
        Ok(self.working.find(labels, predicate))
    }

    fn create_relationship(
        &mut self,
        from: NodeRef,
        to: NodeRef,
        rel_type: &str,
        properties: Properties,
    ) -> Result<(), SinkError> {
        for endpoint in [from, to] {
            if !self.working.contains(endpoint) {
                return Err(SinkError::NodeNotFound(endpoint));
            }
        }

        self.working.graph.add_edge(
            to_index(from),
            to_index(to),
            RelData {
                rel_type: rel_type.to_owned(),
                properties,
            },
        );
        self.summary.relationships_created += 1;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<CommitSummary, SinkError> {
        self.finished = true;
        let owner = self.owner;
        let mut store = owner.store.write();
        if store.version != self.base_version {
            return Err(SinkError::Conflict {
                expected: self.base_version,
                actual: store.version,
            });
        }

        let mut working = std::mem::take(&mut self.working);
        working.version = self.base_version + 1;
        *store = working;

        tracing::trace!("memory transaction committed as version {}", store.version);
        Ok(self.summary)
    }

    fn rollback(mut self: Box<Self>) {
        self.finished = true;
        tracing::debug!("memory transaction rolled back at version {}", self.base_version);
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                "memory transaction dropped without commit, discarding {} node(s)",
                self.summary.nodes_created
            );
        }
    }
}
