//! Sink contract
//!
//! Implement [`GraphSink`] to load into another store. The loader only ever
//! talks to a sink through these two traits.

use crate::error::SinkError;
use crate::properties::Properties;
use serde::{Deserialize, Serialize};

/// Opaque handle to a stored node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(u64);

impl NodeRef {
    /// Wrap a store-specific node id
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Store-specific node id
    #[inline]
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Write counters for one transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Nodes inserted by `create_node` or by an upsert miss
    pub nodes_created: usize,
    /// Upserts that found an existing node
    pub nodes_merged: usize,
    /// Relationships inserted
    pub relationships_created: usize,
}

/// One unit of work against a sink
///
/// Reads see the transaction's own writes. Nothing is visible to other
/// transactions before [`Transaction::commit`].
pub trait Transaction {
    /// Unconditional insert
    ///
    /// # Errors
    /// Store-specific write failures.
    fn create_node(&mut self, labels: &[&str], properties: Properties) -> Result<NodeRef, SinkError>;

    /// Create-or-find keyed on `match_properties`
    ///
    /// An existing node carrying every label and every match property is
    /// returned unchanged. Otherwise a node is created from `all_properties`
    /// plus any match property it does not set.
    ///
    /// # Errors
    /// Store-specific write failures.
    fn upsert_node(
        &mut self,
        labels: &[&str],
        match_properties: &Properties,
        all_properties: Properties,
    ) -> Result<NodeRef, SinkError>;

    /// Nodes carrying every label whose properties match `predicate`
    ///
    /// # Errors
    /// Store-specific read failures.
    fn match_nodes(&self, labels: &[&str], predicate: &Properties) -> Result<Vec<NodeRef>, SinkError>;

    /// Unconditional relationship insert
    ///
    /// # Errors
    /// `SinkError::NodeNotFound` when an endpoint does not exist.
    fn create_relationship(
        &mut self,
        from: NodeRef,
        to: NodeRef,
        rel_type: &str,
        properties: Properties,
    ) -> Result<(), SinkError>;

    /// Publish every write of this transaction
    ///
    /// # Errors
    /// Commit failures; the transaction's writes are discarded.
    fn commit(self: Box<Self>) -> Result<CommitSummary, SinkError>;

    /// Discard every write of this transaction
    fn rollback(self: Box<Self>);
}

/// A transactional graph store
pub trait GraphSink {
    /// Open a transaction
    ///
    /// # Errors
    /// `SinkError::Unavailable` when the store cannot be reached.
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ref_roundtrip() {
        let node = NodeRef::new(42);
        assert_eq!(node.id(), 42);
        assert_eq!(node.to_string(), "#42");
    }

    #[test]
    fn commit_summary_default_is_zero() {
        let summary = CommitSummary::default();
        assert_eq!(summary.nodes_created + summary.nodes_merged + summary.relationships_created, 0);
    }
}
