//! Loader error taxonomy
//!
//! [`DocumentParseError`] and [`LookupMissError`] are recoverable: the loader
//! skips the affected record or tuple and notes it in the report.
//! [`LoadError`] ends the run.

use crate::model::NodeLabel;
use crate::phases::Phase;
use crate::records::RecordRef;
use iamgraph_document::DocumentError;
use iamgraph_sink::SinkError;
use std::path::PathBuf;

/// Document or attachment text of a record could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse {field} of {record}: {source}")]
pub struct DocumentParseError {
    /// Owning record
    pub record: RecordRef,
    /// Column the text came from
    pub field: &'static str,
    /// Underlying parse failure
    #[source]
    pub source: DocumentError,
}

impl DocumentParseError {
    /// Create parse error for a record column
    #[must_use]
    pub fn new(record: RecordRef, field: &'static str, source: DocumentError) -> Self {
        Self { record, field, source }
    }

    /// Text as it appeared in the export
    #[must_use]
    pub fn raw(&self) -> &str {
        self.source.raw()
    }
}

/// A node that an edge needs was not found
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupMissError {
    /// No Policy node with the record's name
    #[error("no Policy node named '{policy}'")]
    Policy {
        /// Policy name
        policy: String,
    },

    /// No resource node with the grant's name under this policy
    #[error("no {label} node '{resource}' for policy '{policy}'")]
    Resource {
        /// Resource or NotResource
        label: NodeLabel,
        /// Resource value
        resource: String,
        /// Owning policy
        policy: String,
    },
}

/// Workbook input could not be read
#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    /// File could not be read
    #[error("cannot read workbook {path}: {source}")]
    Io {
        /// Workbook path
        path: PathBuf,
        /// IO failure
        #[source]
        source: std::io::Error,
    },

    /// Text is not a sheet-to-rows JSON mapping
    #[error("invalid workbook JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fatal loader errors
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Sink rejected an operation or the commit
    #[error(
        "sink transaction failed in {phase} phase{}: {source}",
        .record.as_ref().map(|r| format!(" at {r}")).unwrap_or_default()
    )]
    SinkTransaction {
        /// Phase being executed
        phase: Phase,
        /// Record being processed, if the failure was not the commit itself
        record: Option<RecordRef>,
        /// Sink failure
        #[source]
        source: SinkError,
    },

    /// A record was skipped while `abort_on_skip` is set
    #[error("{phase} phase aborted at {record}: {reason}")]
    Aborted {
        /// Phase being executed
        phase: Phase,
        /// Skipped record
        record: RecordRef,
        /// Why the record was skipped
        reason: String,
    },

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// Input could not be loaded
    #[error(transparent)]
    Input(#[from] WorkbookError),
}

impl LoadError {
    /// Create sink error with phase context
    #[must_use]
    pub fn sink(phase: Phase, record: Option<&RecordRef>, source: SinkError) -> Self {
        Self::SinkTransaction {
            phase,
            record: record.cloned(),
            source,
        }
    }

    /// Phase the error occurred in, if any
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::SinkTransaction { phase, .. } | Self::Aborted { phase, .. } => Some(*phase),
            Self::Config(_) | Self::Input(_) => None,
        }
    }
}
