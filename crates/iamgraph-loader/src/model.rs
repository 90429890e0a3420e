//! Graph schema: node labels, relationship types, property keys

use iamgraph_document::{Polarity, StatementShape};
use serde::{Deserialize, Serialize};

/// Node labels written by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    /// A policy record
    Policy,
    /// Positive resource selector value, scoped to one policy
    Resource,
    /// Negative resource selector value, scoped to one policy
    NotResource,
    /// Positive action selector value, one per grant
    Action,
    /// Negative action selector value, one per grant
    NotAction,
    /// User principal
    User,
    /// Group principal
    Group,
    /// Role principal
    Role,
}

impl NodeLabel {
    /// Label text
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Policy => "Policy",
            Self::Resource => "Resource",
            Self::NotResource => "NotResource",
            Self::Action => "Action",
            Self::NotAction => "NotAction",
            Self::User => "User",
            Self::Group => "Group",
            Self::Role => "Role",
        }
    }

    /// Resource node label for a selector polarity
    #[must_use]
    pub const fn for_resource(polarity: Polarity) -> Self {
        match polarity {
            Polarity::Positive => Self::Resource,
            Polarity::Negative => Self::NotResource,
        }
    }

    /// Action node label for a selector polarity
    #[must_use]
    pub const fn for_action(polarity: Polarity) -> Self {
        match polarity {
            Polarity::Positive => Self::Action,
            Polarity::Negative => Self::NotAction,
        }
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types written by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelType {
    /// Policy → Action / NotAction
    Contains,
    /// Action → Resource, plain grants only
    WorksOn,
    /// Action / NotAction → Resource / NotResource when either axis is negative
    WorksNotOn,
    /// Policy → User / Group / Role
    IsAttachedTo,
    /// User → Group
    PartOf,
}

impl RelType {
    /// Type text
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "CONTAINS",
            Self::WorksOn => "WORKS_ON",
            Self::WorksNotOn => "WORKS_NOT_ON",
            Self::IsAttachedTo => "IS_ATTACHED_TO",
            Self::PartOf => "PART_OF",
        }
    }

    /// Edge from action node to resource node for a statement shape
    #[must_use]
    pub fn for_shape(shape: StatementShape) -> Self {
        if shape.is_plain_grant() {
            Self::WorksOn
        } else {
            Self::WorksNotOn
        }
    }
}

impl std::fmt::Display for RelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Property keys
pub mod keys {
    /// Entity name, the lookup key of every node kind
    pub const NAME: &str = "name";
    /// Export id
    pub const ID: &str = "id";
    /// Amazon resource name
    pub const ARN: &str = "arn";
    /// Raw policy document text
    pub const POLICY_OBJECT: &str = "policyObject";
    /// Owning policy of a resource node
    pub const FOR_POLICY: &str = "forPolicy";
    /// Raw attached-policies text
    pub const ATTACHED_POLICIES: &str = "attachedPolicies";
    /// Raw group membership text
    pub const USERS: &str = "users";
    /// Trust policy version of a role
    pub const ASSUME_ROLE_VERSION: &str = "assumeRolePolicyDocumentVersion";
    /// Trust policy statements of a role
    pub const ASSUME_ROLE_STATEMENT: &str = "assumeRolePolicyDocumentStatement";
}
