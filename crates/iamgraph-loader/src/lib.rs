//! iamgraph Loader
//!
//! Materializes IAM policy and principal records as a labeled permission
//! graph in any [`iamgraph_sink::GraphSink`].
//!
//! # Phases
//!
//! Each phase runs in its own transaction and commits before the next one
//! starts, because later phases look up nodes written by earlier ones:
//!
//! 1. **policies** - one `Policy` node per policy record
//! 2. **resources** - `Resource` / `NotResource` nodes, merged on `(name, forPolicy)`
//! 3. **actions** - `Action` / `NotAction` nodes plus `CONTAINS` and `WORKS_ON` / `WORKS_NOT_ON`
//! 4. **principals** - `User` / `Group` / `Role` nodes plus `IS_ATTACHED_TO` and `PART_OF`
//!
//! Malformed documents and missing endpoints are skipped and collected into
//! the [`LoadReport`]; sink failures abort the run.
//!
//! # Example
//!
//! ```rust
//! use iamgraph_loader::{GraphLoader, LoaderConfig, PolicyRecord, RecordSet};
//! use iamgraph_sink::MemoryGraph;
//!
//! let records = RecordSet {
//!     policies: vec![PolicyRecord::new(
//!         "P1",
//!         "[{'Resource': 's3:bucket', 'Action': ['s3:Get','s3:Put']}]",
//!     )],
//!     ..RecordSet::default()
//! };
//!
//! let graph = MemoryGraph::new();
//! let report = GraphLoader::new(LoaderConfig::default()).run(&graph, &records)?;
//!
//! assert!(report.is_complete());
//! assert_eq!(graph.node_count(), 4);
//! assert_eq!(graph.relationship_count(), 4);
//! # Ok::<(), iamgraph_loader::LoadError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod model;
pub mod phases;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod workbook;

pub use config::{LoaderConfig, LogFormat, SheetNames};
pub use error::{DocumentParseError, LoadError, LookupMissError, WorkbookError};
pub use model::{NodeLabel, RelType};
pub use phases::Phase;
pub use pipeline::GraphLoader;
pub use records::{
    AssumeRoleDocument, EntityIdentity, PolicyRecord, PrincipalKind, PrincipalRecord, RecordKind,
    RecordRef, RecordSet,
};
pub use report::{LoadReport, PhaseReport, SkipReason, SkippedItem, UnmatchedReference};
pub use workbook::{Row, Workbook};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
