//! iamgraph Sink Layer
//!
//! The contract the loader writes through, and an in-memory implementation.
//!
//! # Contract
//!
//! ```text
//! GraphSink::begin() → Transaction
//!     create_node / upsert_node / match_nodes / create_relationship
//! Transaction::commit() | Transaction::rollback()
//! ```
//!
//! Writes inside a transaction are visible to that transaction only until
//! commit. [`MemoryGraph`] implements this with snapshot isolation over a
//! `petgraph` stable graph.
//!
//! # Example
//!
//! ```rust
//! use iamgraph_sink::{GraphSink, MemoryGraph, Properties};
//!
//! let graph = MemoryGraph::new();
//! let mut tx = graph.begin()?;
//! let p = tx.create_node(&["Policy"], Properties::new().with("name", "P1"))?;
//! let r = tx.upsert_node(
//!     &["Resource"],
//!     &Properties::new().with("name", "*").with("forPolicy", "P1"),
//!     Properties::new(),
//! )?;
//! tx.create_relationship(p, r, "CONTAINS", Properties::new())?;
//! tx.commit()?;
//!
//! assert_eq!(graph.node_count(), 2);
//! # Ok::<(), iamgraph_sink::SinkError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod memory;
pub mod properties;
pub mod sink;
pub mod snapshot;

pub use error::SinkError;
pub use memory::MemoryGraph;
pub use properties::Properties;
pub use sink::{CommitSummary, GraphSink, NodeRef, Transaction};
pub use snapshot::{GraphSnapshot, SnapshotNode, SnapshotRelationship};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
