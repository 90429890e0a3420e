//! Workbook input: sheets of rows exported from the account
//!
//! A workbook is a JSON object mapping sheet name to an array of row
//! objects. Cells are read as text; missing and `null` cells are empty.

use crate::config::SheetNames;
use crate::error::WorkbookError;
use crate::records::{
    AssumeRoleDocument, EntityIdentity, PolicyRecord, PrincipalKind, PrincipalRecord, RecordSet,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// One sheet row: column name to cell value
pub type Row = IndexMap<String, Value>;

/// Sheets of an exported workbook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Workbook {
    sheets: IndexMap<String, Vec<Row>>,
}

impl Workbook {
    /// Create empty workbook
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With sheet
    #[must_use]
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.sheets.insert(name.into(), rows);
        self
    }

    /// Parse workbook JSON
    ///
    /// # Errors
    /// Returns `WorkbookError::Json` unless the text is an object of row arrays.
    pub fn from_json_str(text: &str) -> Result<Self, WorkbookError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read workbook JSON file
    ///
    /// # Errors
    /// Returns `WorkbookError::Io` if the file cannot be read, or
    /// `WorkbookError::Json` if it does not parse.
    pub fn from_path(path: &Path) -> Result<Self, WorkbookError> {
        let text = std::fs::read_to_string(path).map_err(|source| WorkbookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Rows of a sheet
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&[Row]> {
        self.sheets.get(name).map(Vec::as_slice)
    }

    /// Sheet names in file order
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    /// Extract loader records
    ///
    /// A missing sheet yields no records of that kind.
    #[must_use]
    pub fn to_records(&self, names: &SheetNames) -> RecordSet {
        let records = RecordSet {
            policies: self.rows(&names.policies).iter().map(policy_from_row).collect(),
            users: self
                .rows(&names.users)
                .iter()
                .map(|row| principal_from_row(PrincipalKind::User, row))
                .collect(),
            groups: self
                .rows(&names.groups)
                .iter()
                .map(|row| principal_from_row(PrincipalKind::Group, row))
                .collect(),
            roles: self
                .rows(&names.roles)
                .iter()
                .map(|row| principal_from_row(PrincipalKind::Role, &strip_dots(row)))
                .collect(),
        };
        debug!(
            "Workbook records: {} policies, {} users, {} groups, {} roles",
            records.policies.len(),
            records.users.len(),
            records.groups.len(),
            records.roles.len()
        );
        records
    }

    fn rows(&self, name: &str) -> &[Row] {
        self.sheet(name).unwrap_or_else(|| {
            warn!("Sheet '{}' not found, treating as empty", name);
            &[]
        })
    }
}

/// Cell text; missing and null cells are empty, other scalars are rendered
fn cell(row: &Row, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Roles exports flatten nested columns with dots
fn strip_dots(row: &Row) -> Row {
    row.iter().map(|(k, v)| (k.replace('.', ""), v.clone())).collect()
}

fn identity(row: &Row, name: &str, id: &str) -> EntityIdentity {
    EntityIdentity {
        name: cell(row, name),
        id: cell(row, id),
        arn: cell(row, "Arn"),
    }
}

fn policy_from_row(row: &Row) -> PolicyRecord {
    let mut policy_object = cell(row, "PolicyObject");
    // Long documents overflow into a second column
    policy_object.push_str(&cell(row, "ExtraPolicySpace"));

    PolicyRecord {
        identity: identity(row, "PolicyName", "PolicyId"),
        policy_object,
    }
}

fn principal_from_row(kind: PrincipalKind, row: &Row) -> PrincipalRecord {
    let identity = match kind {
        PrincipalKind::User => identity(row, "UserName", "UserId"),
        PrincipalKind::Group => identity(row, "GroupName", "GroupId"),
        PrincipalKind::Role => identity(row, "RoleName", "RoleId"),
    };
    let users = if kind == PrincipalKind::Group {
        cell(row, "Users")
    } else {
        String::new()
    };
    let assume_role = if kind == PrincipalKind::Role {
        AssumeRoleDocument {
            version: cell(row, "AssumeRolePolicyDocumentVersion"),
            statement: cell(row, "AssumeRolePolicyDocumentStatement"),
        }
    } else {
        AssumeRoleDocument::default()
    };

    PrincipalRecord {
        kind,
        identity,
        attached_policies: cell(row, "AttachedPolicies"),
        users,
        assume_role,
    }
}
