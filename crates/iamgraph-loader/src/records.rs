//! Tabular records consumed by the loader

use crate::model::{keys, NodeLabel};
use iamgraph_sink::Properties;
use serde::{Deserialize, Serialize};

/// Name, id and ARN shared by every exported entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIdentity {
    /// Entity name, used as the graph lookup key
    pub name: String,
    /// Export id
    pub id: String,
    /// Amazon resource name
    pub arn: String,
}

impl EntityIdentity {
    /// Create identity with only a name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn write_into(&self, props: &mut Properties) {
        props.insert(keys::NAME, self.name.as_str());
        props.insert(keys::ID, self.id.as_str());
        props.insert(keys::ARN, self.arn.as_str());
    }
}

/// Kind of record a report entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Policy record
    Policy,
    /// User record
    User,
    /// Group record
    Group,
    /// Role record
    Role,
}

impl RecordKind {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::User => "user",
            Self::Group => "group",
            Self::Role => "role",
        }
    }
}

/// Identity of the record a skip or failure belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    /// Record kind
    pub kind: RecordKind,
    /// Record name
    pub name: String,
    /// Record id, empty when the export had none
    pub id: String,
}

impl std::fmt::Display for RecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.kind.as_str(), self.name)?;
        if !self.id.is_empty() {
            write!(f, " ({})", self.id)?;
        }
        Ok(())
    }
}

/// One row of the policies sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    /// Policy identity
    pub identity: EntityIdentity,
    /// Raw policy document text
    pub policy_object: String,
}

impl PolicyRecord {
    /// Create policy record with empty id and ARN
    #[must_use]
    pub fn new(name: impl Into<String>, policy_object: impl Into<String>) -> Self {
        Self {
            identity: EntityIdentity::named(name),
            policy_object: policy_object.into(),
        }
    }

    /// Policy name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Report identity
    #[must_use]
    pub fn record_ref(&self) -> RecordRef {
        RecordRef {
            kind: RecordKind::Policy,
            name: self.identity.name.clone(),
            id: self.identity.id.clone(),
        }
    }

    /// Properties of the `Policy` node
    #[must_use]
    pub fn node_properties(&self) -> Properties {
        let mut props = Properties::new();
        self.identity.write_into(&mut props);
        props.insert(keys::POLICY_OBJECT, self.policy_object.as_str());
        props
    }
}

/// Principal kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrincipalKind {
    /// User
    User,
    /// Group
    Group,
    /// Role
    Role,
}

impl PrincipalKind {
    /// Node label
    #[must_use]
    pub const fn label(self) -> NodeLabel {
        match self {
            Self::User => NodeLabel::User,
            Self::Group => NodeLabel::Group,
            Self::Role => NodeLabel::Role,
        }
    }

    /// Report record kind
    #[must_use]
    pub const fn record_kind(self) -> RecordKind {
        match self {
            Self::User => RecordKind::User,
            Self::Group => RecordKind::Group,
            Self::Role => RecordKind::Role,
        }
    }
}

/// Trust policy columns of a role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumeRoleDocument {
    /// `AssumeRolePolicyDocument.Version` text
    pub version: String,
    /// `AssumeRolePolicyDocument.Statement` text
    pub statement: String,
}

/// One row of the users, groups or roles sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRecord {
    /// Which sheet the row came from
    pub kind: PrincipalKind,
    /// Principal identity
    pub identity: EntityIdentity,
    /// Raw attached-policies text
    pub attached_policies: String,
    /// Raw membership text, groups only
    pub users: String,
    /// Trust policy, roles only
    pub assume_role: AssumeRoleDocument,
}

impl PrincipalRecord {
    /// Create principal record with no attachments
    #[must_use]
    pub fn new(kind: PrincipalKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            identity: EntityIdentity::named(name),
            attached_policies: String::new(),
            users: String::new(),
            assume_role: AssumeRoleDocument::default(),
        }
    }

    /// Create user record
    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self::new(PrincipalKind::User, name)
    }

    /// Create group record
    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(PrincipalKind::Group, name)
    }

    /// Create role record
    #[must_use]
    pub fn role(name: impl Into<String>) -> Self {
        Self::new(PrincipalKind::Role, name)
    }

    /// Set attached-policies text
    #[must_use]
    pub fn with_attached_policies(mut self, raw: impl Into<String>) -> Self {
        self.attached_policies = raw.into();
        self
    }

    /// Set membership text
    #[must_use]
    pub fn with_users(mut self, raw: impl Into<String>) -> Self {
        self.users = raw.into();
        self
    }

    /// Principal name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Report identity
    #[must_use]
    pub fn record_ref(&self) -> RecordRef {
        RecordRef {
            kind: self.kind.record_kind(),
            name: self.identity.name.clone(),
            id: self.identity.id.clone(),
        }
    }

    /// Properties of the principal node
    #[must_use]
    pub fn node_properties(&self) -> Properties {
        let mut props = Properties::new();
        self.identity.write_into(&mut props);
        props.insert(keys::ATTACHED_POLICIES, self.attached_policies.as_str());
        match self.kind {
            PrincipalKind::User => {}
            PrincipalKind::Group => props.insert(keys::USERS, self.users.as_str()),
            PrincipalKind::Role => {
                props.insert(keys::ASSUME_ROLE_VERSION, self.assume_role.version.as_str());
                props.insert(keys::ASSUME_ROLE_STATEMENT, self.assume_role.statement.as_str());
            }
        }
        props
    }
}

/// Everything one load run consumes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Policy rows
    pub policies: Vec<PolicyRecord>,
    /// User rows
    pub users: Vec<PrincipalRecord>,
    /// Group rows
    pub groups: Vec<PrincipalRecord>,
    /// Role rows
    pub roles: Vec<PrincipalRecord>,
}

impl RecordSet {
    /// Users, then groups, then roles
    pub fn principals(&self) -> impl Iterator<Item = &PrincipalRecord> {
        self.users.iter().chain(&self.groups).chain(&self.roles)
    }

    /// Total number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len() + self.users.len() + self.groups.len() + self.roles.len()
    }

    /// Check if there are no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_properties_follow_schema() {
        let record = PolicyRecord::new("P1", "[]");
        let props = record.node_properties();
        let keys: Vec<&str> = props.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["name", "id", "arn", "policyObject"]);
        assert_eq!(props.get_str("policyObject"), Some("[]"));
    }

    #[test]
    fn group_carries_users_role_carries_trust_policy() {
        let group = PrincipalRecord::group("devs").with_users("[{'UserName': 'bob'}]");
        assert_eq!(
            group.node_properties().get_str("users"),
            Some("[{'UserName': 'bob'}]")
        );

        let mut role = PrincipalRecord::role("deployer");
        role.assume_role.version = "2012-10-17".into();
        let props = role.node_properties();
        assert_eq!(props.get_str("assumeRolePolicyDocumentVersion"), Some("2012-10-17"));
        assert!(props.get("users").is_none());

        let user = PrincipalRecord::user("bob").node_properties();
        assert_eq!(user.len(), 4);
    }

    #[test]
    fn record_ref_display() {
        let mut record = PolicyRecord::new("P1", "");
        assert_eq!(record.record_ref().to_string(), "policy 'P1'");
        record.identity.id = "ANPA1".into();
        assert_eq!(record.record_ref().to_string(), "policy 'P1' (ANPA1)");
    }

    #[test]
    fn principals_in_sheet_order() {
        let records = RecordSet {
            users: vec![PrincipalRecord::user("u")],
            groups: vec![PrincipalRecord::group("g")],
            roles: vec![PrincipalRecord::role("r")],
            ..RecordSet::default()
        };
        let names: Vec<&str> = records.principals().map(PrincipalRecord::name).collect();
        assert_eq!(names, vec!["u", "g", "r"]);
        assert_eq!(records.len(), 3);
    }
}
