//! Error types for document parsing

/// Errors raised while turning raw policy or attachment text into structure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// Repaired text is still not valid JSON
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        /// Parser message
        message: String,
        /// 1-based line of the failure in the repaired text
        line: usize,
        /// 1-based column of the failure in the repaired text
        column: usize,
        /// Text as it appeared in the export
        raw: String,
        /// Text after dialect repair
        repaired: String,
    },

    /// Parsed value does not have the expected shape
    #[error("unexpected shape: expected {expected}, found {found}")]
    UnexpectedShape {
        /// Expected shape description
        expected: &'static str,
        /// Offending JSON fragment
        found: String,
        /// Text as it appeared in the export
        raw: String,
    },

    /// A list entry lacks the key naming the referenced entity
    #[error("entry is missing '{field}': {entry}")]
    MissingField {
        /// Key that was expected
        field: String,
        /// Offending JSON fragment
        entry: String,
        /// Text as it appeared in the export
        raw: String,
    },
}

impl DocumentError {
    /// Create syntax error from a serde_json failure
    pub(crate) fn syntax(err: &serde_json::Error, raw: &str, repaired: String) -> Self {
        Self::Syntax {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
            raw: raw.to_owned(),
            repaired,
        }
    }

    /// Text as it appeared in the export
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Syntax { raw, .. }
            | Self::UnexpectedShape { raw, .. }
            | Self::MissingField { raw, .. } => raw,
        }
    }
}
