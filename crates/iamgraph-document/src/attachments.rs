//! Attachment and membership lists
//!
//! Principal exports carry references to other entities as stringified
//! lists, e.g. `[{'PolicyName': 'P1', 'PolicyArn': '...'}]` for attached
//! policies or `[{'UserName': 'bob'}]` for group members.

use crate::error::DocumentError;
use crate::repair::repair;
use serde_json::Value;

/// Key naming the policy in an attached-policies entry
pub const POLICY_NAME_KEY: &str = "PolicyName";
/// Key naming the user in a group-membership entry
pub const USER_NAME_KEY: &str = "UserName";

/// Names referenced by an attachment or membership column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentList {
    names: Vec<String>,
}

impl AttachmentList {
    /// Repair and parse a list column, extracting the name stored under `key`
    ///
    /// A blank cell is an empty list. Entries may be objects holding `key`
    /// or bare strings.
    ///
    /// # Errors
    /// - `DocumentError::Syntax` if the repaired text is not valid JSON
    /// - `DocumentError::MissingField` if an object entry lacks `key`
    /// - `DocumentError::UnexpectedShape` for entries that are neither
    pub fn parse(raw: &str, key: &str) -> Result<Self, DocumentError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let repaired = repair(raw);
        let value: Value = serde_json::from_str(&repaired)
            .map_err(|e| DocumentError::syntax(&e, raw, repaired.clone()))?;

        let entries = match value {
            Value::Array(items) => items,
            single => vec![single],
        };

        let names = entries
            .iter()
            .map(|entry| name_of(entry, key, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { names })
    }

    /// Referenced names, in list order
    #[inline]
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of references
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// No references
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn name_of(entry: &Value, key: &str, raw: &str) -> Result<String, DocumentError> {
    match entry {
        Value::String(name) => Ok(name.clone()),
        Value::Object(map) => match map.get(key) {
            Some(Value::String(name)) => Ok(name.clone()),
            _ => Err(DocumentError::MissingField {
                field: key.to_owned(),
                entry: entry.to_string(),
                raw: raw.to_owned(),
            }),
        },
        other => Err(DocumentError::UnexpectedShape {
            expected: "object or string entry",
            found: other.to_string(),
            raw: raw.to_owned(),
        }),
    }
}
