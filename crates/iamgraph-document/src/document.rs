//! Policy documents
//!
//! A policy document is one statement object or an array of them. Parsing
//! always yields a sequence so callers never special-case the single form.

use crate::error::DocumentError;
use crate::repair::repair;
use crate::statement::{Grant, Statement};
use serde_json::Value;

/// Parsed policy document
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument {
    statements: Vec<Value>,
}

impl PolicyDocument {
    /// Repair and parse raw policy text
    ///
    /// # Errors
    /// `DocumentError::Syntax` when the repaired text is not valid JSON.
    pub fn parse(raw: &str) -> Result<Self, DocumentError> {
        let repaired = repair(raw);
        let value: Value = serde_json::from_str(&repaired)
            .map_err(|e| DocumentError::syntax(&e, raw, repaired.clone()))?;
        Ok(Self::from_value(value))
    }

    /// Wrap an already parsed value, lifting a single statement into a sequence
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let statements = match value {
            Value::Array(items) => items,
            single => vec![single],
        };
        Self { statements }
    }

    /// Statement values in document order
    #[inline]
    #[must_use]
    pub fn raw_statements(&self) -> &[Value] {
        &self.statements
    }

    /// Classified statements in document order
    pub fn statements(&self) -> impl Iterator<Item = Statement> + '_ {
        self.statements.iter().map(Statement::from_value)
    }

    /// Grants of every statement, concatenated
    #[must_use]
    pub fn grants(&self) -> Vec<Grant> {
        self.statements().flat_map(|s| s.grants()).collect()
    }

    /// Number of statements
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Document has no statements
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::StatementShape;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_single_quoted_array() {
        let doc = PolicyDocument::parse("[{'Resource': 's3:bucket', 'Action': ['s3:Get','s3:Put']}]");
        assert!(doc.is_ok());

        let doc = doc.unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.raw_statements()[0]["Resource"], "s3:bucket");
    }

    #[test]
    fn wraps_single_statement() {
        let doc = PolicyDocument::parse("{'Resource': '*', 'Action': '*'}").unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.grants().len(), 1);
    }

    #[test]
    fn matches_strict_json() {
        let mangled = PolicyDocument::parse("[{'Effect': 'Allow', 'Enabled': True, 'Resource': ['a']}]").unwrap();
        let strict = PolicyDocument::parse(r#"[{"Effect": "Allow", "Enabled": true, "Resource": ["a"]}]"#).unwrap();
        assert_eq!(mangled, strict);
        assert_eq!(mangled.raw_statements()[0]["Enabled"], json!(true));
    }

    #[test]
    fn truncated_text_is_syntax_error() {
        let err = PolicyDocument::parse("[{'Resource': 's3:bucket', 'Act").unwrap_err();
        assert!(matches!(err, DocumentError::Syntax { .. }));
        assert_eq!(err.raw(), "[{'Resource': 's3:bucket', 'Act");
    }

    #[test]
    fn empty_text_is_syntax_error() {
        assert!(PolicyDocument::parse("").is_err());
    }

    #[test]
    fn grants_across_statements() {
        let doc = PolicyDocument::parse(
            "[{'Resource': ['a', 'b'], 'Action': 'x'}, {'NotResource': 'c', 'NotAction': ['y', 'z']}]",
        )
        .unwrap();

        let grants = doc.grants();
        assert_eq!(grants.len(), 4);
        assert_eq!(
            grants.iter().filter(|g| g.shape == StatementShape::NotResourceNotAction).count(),
            2
        );
    }

    #[test]
    fn from_value_keeps_arrays() {
        let doc = PolicyDocument::from_value(json!([{}, {}]));
        assert_eq!(doc.len(), 2);
        assert!(doc.grants().is_empty());
    }
}
