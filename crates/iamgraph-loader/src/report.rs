//! Run report
//!
//! The report, not the log, is the record of partial success: every skipped
//! record or tuple and every unmatched attachment name ends up here.

use crate::error::{DocumentParseError, LookupMissError};
use crate::model::NodeLabel;
use crate::phases::Phase;
use crate::records::RecordRef;
use chrono::{DateTime, Utc};
use iamgraph_sink::CommitSummary;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why an item was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Document or attachment text did not parse
    DocumentParse {
        /// Column the text came from
        field: String,
        /// Parser message
        message: String,
        /// Text as it appeared in the export
        raw: String,
    },
    /// An edge endpoint was missing
    LookupMiss {
        /// Lookup failure
        message: String,
    },
}

impl From<&DocumentParseError> for SkipReason {
    fn from(err: &DocumentParseError) -> Self {
        Self::DocumentParse {
            field: err.field.to_owned(),
            message: err.source.to_string(),
            raw: err.raw().to_owned(),
        }
    }
}

impl From<&LookupMissError> for SkipReason {
    fn from(err: &LookupMissError) -> Self {
        Self::LookupMiss {
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DocumentParse { field, message, .. } => write!(f, "cannot parse {field}: {message}"),
            Self::LookupMiss { message } => f.write_str(message),
        }
    }
}

/// A skipped record or tuple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    /// Owning record
    pub record: RecordRef,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// An attachment or membership name with no matching node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedReference {
    /// Record holding the reference
    pub record: RecordRef,
    /// Label that was looked up
    pub label: NodeLabel,
    /// Name that was looked up
    pub name: String,
}

/// Outcome of one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    /// Phase
    pub phase: Phase,
    /// Records the phase looked at
    pub records_processed: usize,
    /// What the phase transaction committed
    pub commit: CommitSummary,
    /// Skipped records and tuples
    pub skipped: Vec<SkippedItem>,
    /// Names that matched no node
    pub unmatched: Vec<UnmatchedReference>,
}

impl PhaseReport {
    /// Create empty report for a phase
    #[must_use]
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            records_processed: 0,
            commit: CommitSummary::default(),
            skipped: Vec::new(),
            unmatched: Vec::new(),
        }
    }
}

/// Outcome of a load run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Run id
    pub run_id: Uuid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time, set once every phase committed
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-phase outcomes in execution order
    pub phases: Vec<PhaseReport>,
}

impl LoadReport {
    /// Start report for a new run
    #[must_use]
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            phases: Vec::with_capacity(Phase::ALL.len()),
        }
    }

    /// Mark run finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Report of one phase
    #[must_use]
    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Every skipped item across phases
    pub fn skipped(&self) -> impl Iterator<Item = &SkippedItem> {
        self.phases.iter().flat_map(|p| &p.skipped)
    }

    /// Number of skipped items
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.phases.iter().map(|p| p.skipped.len()).sum()
    }

    /// Number of unmatched references
    #[must_use]
    pub fn unmatched_count(&self) -> usize {
        self.phases.iter().map(|p| p.unmatched.len()).sum()
    }

    /// Nothing was skipped
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped_count() == 0
    }

    /// Totals over all phases
    #[must_use]
    pub fn totals(&self) -> CommitSummary {
        self.phases.iter().fold(CommitSummary::default(), |acc, p| CommitSummary {
            nodes_created: acc.nodes_created + p.commit.nodes_created,
            nodes_merged: acc.nodes_merged + p.commit.nodes_merged,
            relationships_created: acc.relationships_created + p.commit.relationships_created,
        })
    }
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "run {}", self.run_id)?;
        writeln!(
            f,
            "{:<11} {:>7} {:>7} {:>7} {:>7} {:>7} {:>9}",
            "phase", "records", "created", "merged", "rels", "skipped", "unmatched"
        )?;
        for p in &self.phases {
            writeln!(
                f,
                "{:<11} {:>7} {:>7} {:>7} {:>7} {:>7} {:>9}",
                p.phase.as_str(),
                p.records_processed,
                p.commit.nodes_created,
                p.commit.nodes_merged,
                p.commit.relationships_created,
                p.skipped.len(),
                p.unmatched.len()
            )?;
        }
        for item in self.skipped() {
            writeln!(f, "skipped {}: {}", item.record, item.reason)?;
        }
        Ok(())
    }
}
