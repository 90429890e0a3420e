//! The four load phases
//!
//! Each function runs inside the transaction of its phase. Records are
//! handled independently: a record that fails to parse is skipped and the
//! rest of the phase continues.

use crate::error::{DocumentParseError, LoadError, LookupMissError};
use crate::model::{keys, NodeLabel, RelType};
use crate::pipeline::PhaseContext;
use crate::records::{PolicyRecord, PrincipalKind, PrincipalRecord, RecordRef, RecordSet};
use iamgraph_document::{AttachmentList, PolicyDocument, POLICY_NAME_KEY, USER_NAME_KEY};
use iamgraph_sink::{NodeRef, Properties, Transaction};
use serde::{Deserialize, Serialize};

/// Load phases in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Policy nodes
    Policies,
    /// Resource and NotResource nodes
    Resources,
    /// Action and NotAction nodes with their edges
    Actions,
    /// Principal nodes with attachment and membership edges
    Principals,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 4] = [Self::Policies, Self::Resources, Self::Actions, Self::Principals];

    /// Phase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Policies => "policies",
            Self::Resources => "resources",
            Self::Actions => "actions",
            Self::Principals => "principals",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const POLICY_OBJECT_FIELD: &str = "PolicyObject";
const ATTACHED_POLICIES_FIELD: &str = "AttachedPolicies";
const USERS_FIELD: &str = "Users";

/// Phase 1: one `Policy` node per record
pub(crate) fn load_policies(
    tx: &mut dyn Transaction,
    records: &RecordSet,
    ctx: &mut PhaseContext,
) -> Result<(), LoadError> {
    for policy in &records.policies {
        let record = policy.record_ref();
        ctx.record_processed(&record);
        tx.create_node(&[NodeLabel::Policy.as_str()], policy.node_properties())
            .map_err(|e| LoadError::sink(ctx.phase(), Some(&record), e))?;
    }
    Ok(())
}

/// Phase 2: upsert resource nodes keyed on `(name, forPolicy)`
pub(crate) fn load_resources(
    tx: &mut dyn Transaction,
    records: &RecordSet,
    ctx: &mut PhaseContext,
) -> Result<(), LoadError> {
    for policy in &records.policies {
        let record = policy.record_ref();
        ctx.record_processed(&record);

        let Some(document) = parse_policy(policy, &record, ctx)? else {
            continue;
        };

        for statement in document.statements() {
            let Some(axis) = statement.resource_axis() else {
                continue;
            };
            let label = NodeLabel::for_resource(axis.polarity);

            for value in &axis.values {
                let key = resource_key(value, policy.name());
                tx.upsert_node(&[label.as_str()], &key, key.clone())
                    .map_err(|e| LoadError::sink(ctx.phase(), Some(&record), e))?;
            }
        }
    }
    Ok(())
}

/// Phase 3: one action node per grant and matched endpoint pair
pub(crate) fn load_actions(
    tx: &mut dyn Transaction,
    records: &RecordSet,
    ctx: &mut PhaseContext,
) -> Result<(), LoadError> {
    for policy in &records.policies {
        let record = policy.record_ref();
        ctx.record_processed(&record);

        let Some(document) = parse_policy(policy, &record, ctx)? else {
            continue;
        };
        let grants = document.grants();
        if grants.is_empty() {
            continue;
        }

        let policy_nodes = tx
            .match_nodes(&[NodeLabel::Policy.as_str()], &name_key(policy.name()))
            .map_err(|e| LoadError::sink(ctx.phase(), Some(&record), e))?;

        for grant in grants {
            if policy_nodes.is_empty() {
                let miss = LookupMissError::Policy {
                    policy: policy.name().to_owned(),
                };
                ctx.skip_lookup(&record, &miss)?;
                continue;
            }

            let resource_label = NodeLabel::for_resource(grant.shape.resource_polarity());
            let resource_nodes = tx
                .match_nodes(&[resource_label.as_str()], &resource_key(&grant.resource, policy.name()))
                .map_err(|e| LoadError::sink(ctx.phase(), Some(&record), e))?;
            if resource_nodes.is_empty() {
                let miss = LookupMissError::Resource {
                    label: resource_label,
                    resource: grant.resource.clone(),
                    policy: policy.name().to_owned(),
                };
                ctx.skip_lookup(&record, &miss)?;
                continue;
            }

            let action_label = NodeLabel::for_action(grant.shape.action_polarity());
            let edge = RelType::for_shape(grant.shape);
            for &policy_node in &policy_nodes {
                for &resource_node in &resource_nodes {
                    let result = link_action(
                        tx,
                        policy_node,
                        resource_node,
                        action_label,
                        &grant.action,
                        edge,
                    );
                    result.map_err(|e| LoadError::sink(ctx.phase(), Some(&record), e))?;
                }
            }
        }
    }
    Ok(())
}

/// Phase 4: principal nodes, then attachment and membership edges
///
/// All principal nodes are created before any edge so that membership
/// lookups see every user regardless of sheet order.
pub(crate) fn load_principals(
    tx: &mut dyn Transaction,
    records: &RecordSet,
    ctx: &mut PhaseContext,
) -> Result<(), LoadError> {
    for principal in records.principals() {
        let record = principal.record_ref();
        ctx.record_processed(&record);
        tx.create_node(&[principal.kind.label().as_str()], principal.node_properties())
            .map_err(|e| LoadError::sink(ctx.phase(), Some(&record), e))?;
    }

    for principal in records.principals() {
        let record = principal.record_ref();
        attach_policies(tx, principal, &record, ctx)?;
        if principal.kind == PrincipalKind::Group {
            link_members(tx, principal, &record, ctx)?;
        }
    }
    Ok(())
}

fn attach_policies(
    tx: &mut dyn Transaction,
    principal: &PrincipalRecord,
    record: &RecordRef,
    ctx: &mut PhaseContext,
) -> Result<(), LoadError> {
    let Some(list) = parse_list(
        &principal.attached_policies,
        POLICY_NAME_KEY,
        ATTACHED_POLICIES_FIELD,
        record,
        ctx,
    )?
    else {
        return Ok(());
    };

    let label = principal.kind.label();
    for policy_name in list.names() {
        let policies = tx
            .match_nodes(&[NodeLabel::Policy.as_str()], &name_key(policy_name))
            .map_err(|e| LoadError::sink(ctx.phase(), Some(record), e))?;
        let targets = tx
            .match_nodes(&[label.as_str()], &name_key(principal.name()))
            .map_err(|e| LoadError::sink(ctx.phase(), Some(record), e))?;

        if policies.is_empty() {
            ctx.unmatched(record, NodeLabel::Policy, policy_name);
            continue;
        }
        link_all(tx, &policies, &targets, RelType::IsAttachedTo)
            .map_err(|e| LoadError::sink(ctx.phase(), Some(record), e))?;
    }
    Ok(())
}

fn link_members(
    tx: &mut dyn Transaction,
    group: &PrincipalRecord,
    record: &RecordRef,
    ctx: &mut PhaseContext,
) -> Result<(), LoadError> {
    let Some(list) = parse_list(&group.users, USER_NAME_KEY, USERS_FIELD, record, ctx)? else {
        return Ok(());
    };

    for user_name in list.names() {
        let users = tx
            .match_nodes(&[NodeLabel::User.as_str()], &name_key(user_name))
            .map_err(|e| LoadError::sink(ctx.phase(), Some(record), e))?;
        let groups = tx
            .match_nodes(&[NodeLabel::Group.as_str()], &name_key(group.name()))
            .map_err(|e| LoadError::sink(ctx.phase(), Some(record), e))?;

        if users.is_empty() {
            ctx.unmatched(record, NodeLabel::User, user_name);
            continue;
        }
        link_all(tx, &users, &groups, RelType::PartOf)
            .map_err(|e| LoadError::sink(ctx.phase(), Some(record), e))?;
    }
    Ok(())
}

fn parse_policy(
    policy: &PolicyRecord,
    record: &RecordRef,
    ctx: &mut PhaseContext,
) -> Result<Option<PolicyDocument>, LoadError> {
    match PolicyDocument::parse(&policy.policy_object) {
        Ok(document) => Ok(Some(document)),
        Err(source) => {
            let err = DocumentParseError::new(record.clone(), POLICY_OBJECT_FIELD, source);
            ctx.skip_parse(&err)?;
            Ok(None)
        }
    }
}

fn parse_list(
    raw: &str,
    key: &str,
    field: &'static str,
    record: &RecordRef,
    ctx: &mut PhaseContext,
) -> Result<Option<AttachmentList>, LoadError> {
    match AttachmentList::parse(raw, key) {
        Ok(list) => Ok(Some(list)),
        Err(source) => {
            let err = DocumentParseError::new(record.clone(), field, source);
            ctx.skip_parse(&err)?;
            Ok(None)
        }
    }
}

fn link_action(
    tx: &mut dyn Transaction,
    policy_node: NodeRef,
    resource_node: NodeRef,
    label: NodeLabel,
    action: &str,
    edge: RelType,
) -> Result<(), iamgraph_sink::SinkError> {
    let action_node = tx.create_node(&[label.as_str()], name_key(action))?;
    tx.create_relationship(policy_node, action_node, RelType::Contains.as_str(), Properties::new())?;
    tx.create_relationship(action_node, resource_node, edge.as_str(), Properties::new())
}

fn link_all(
    tx: &mut dyn Transaction,
    from: &[NodeRef],
    to: &[NodeRef],
    rel: RelType,
) -> Result<(), iamgraph_sink::SinkError> {
    for &a in from {
        for &b in to {
            tx.create_relationship(a, b, rel.as_str(), Properties::new())?;
        }
    }
    Ok(())
}

fn name_key(name: &str) -> Properties {
    Properties::new().with(keys::NAME, name)
}

fn resource_key(name: &str, policy: &str) -> Properties {
    Properties::new().with(keys::NAME, name).with(keys::FOR_POLICY, policy)
}
