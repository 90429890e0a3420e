//! Testing utilities for iamgraph workspace
//!
//! Shared record fixtures, workbook builders and a sink that fails on demand.

#![allow(missing_docs)]

use iamgraph_loader::{PolicyRecord, PrincipalRecord, RecordSet, Row, Workbook};
use iamgraph_sink::{
    CommitSummary, GraphSink, MemoryGraph, NodeRef, Properties, SinkError, Transaction,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Document granting `s3:Get` and `s3:Put` on `s3:bucket`
pub const BUCKET_DOCUMENT: &str = "[{'Resource': 's3:bucket', 'Action': ['s3:Get','s3:Put']}]";

/// Document that does not parse even after repair
pub const BROKEN_DOCUMENT: &str = "[{'Resource': 's3:bucket', 'Action': ";

pub fn policy(name: &str, document: &str) -> PolicyRecord {
    PolicyRecord::new(name, document)
}

pub fn bucket_policy(name: &str) -> PolicyRecord {
    policy(name, BUCKET_DOCUMENT)
}

/// Attached-policies cell naming `policies`
pub fn attached(policies: &[&str]) -> String {
    let entries: Vec<String> = policies
        .iter()
        .map(|p| format!("{{'PolicyName': '{p}', 'PolicyArn': 'arn:aws:iam::aws:policy/{p}'}}"))
        .collect();
    format!("[{}]", entries.join(", "))
}

/// Group membership cell naming `users`
pub fn members(users: &[&str]) -> String {
    let entries: Vec<String> = users.iter().map(|u| format!("{{'UserName': '{u}'}}")).collect();
    format!("[{}]", entries.join(", "))
}

pub fn records_with_policies(policies: Vec<PolicyRecord>) -> RecordSet {
    RecordSet {
        policies,
        ..RecordSet::default()
    }
}

/// One policy, one user, one group containing the user, both attached
pub fn sample_records() -> RecordSet {
    RecordSet {
        policies: vec![bucket_policy("P1")],
        users: vec![PrincipalRecord::user("bob").with_attached_policies(attached(&["P1"]))],
        groups: vec![PrincipalRecord::group("devs")
            .with_attached_policies(attached(&["P1"]))
            .with_users(members(&["bob"]))],
        roles: Vec::new(),
    }
}

pub fn row(value: Value) -> Row {
    serde_json::from_value(value).unwrap()
}

/// Workbook with all four sheets in the export's column layout
pub fn sample_workbook() -> Workbook {
    Workbook::new()
        .with_sheet(
            "policies",
            vec![
                row(json!({
                    "PolicyName": "P1",
                    "PolicyId": "ANPA0000000000000001",
                    "Arn": "arn:aws:iam::123456789012:policy/P1",
                    "PolicyObject": "[{'Effect': 'Allow', 'Resource': 's3:bucket', ",
                    "ExtraPolicySpace": "'Action': ['s3:Get','s3:Put']}]"
                })),
                row(json!({
                    "PolicyName": "DenyAll",
                    "PolicyId": "ANPA0000000000000002",
                    "Arn": "arn:aws:iam::123456789012:policy/DenyAll",
                    "PolicyObject": "{'Effect': 'Deny', 'NotResource': 'arn:aws:s3:::audit', 'Action': '*', 'Condition': {'Bool': {'aws:SecureTransport': False}}}",
                    "ExtraPolicySpace": null
                })),
            ],
        )
        .with_sheet(
            "users",
            vec![row(json!({
                "UserName": "bob",
                "UserId": "AIDA0000000000000001",
                "Arn": "arn:aws:iam::123456789012:user/bob",
                "AttachedPolicies": attached(&["P1"])
            }))],
        )
        .with_sheet(
            "groups",
            vec![row(json!({
                "GroupName": "devs",
                "GroupId": "AGPA0000000000000001",
                "Arn": "arn:aws:iam::123456789012:group/devs",
                "AttachedPolicies": attached(&["DenyAll"]),
                "Users": members(&["bob", "alice"])
            }))],
        )
        .with_sheet(
            "roles",
            vec![row(json!({
                "RoleName": "deployer",
                "RoleId": "AROA0000000000000001",
                "Arn": "arn:aws:iam::123456789012:role/deployer",
                "AttachedPolicies": attached(&["P1", "Missing"]),
                "AssumeRolePolicyDocument.Version": "2012-10-17",
                "AssumeRolePolicyDocument.Statement": "[{'Effect': 'Allow', 'Principal': {'Service': 'ec2.amazonaws.com'}, 'Action': 'sts:AssumeRole'}]"
            }))],
        )
}

/// Memory sink whose commit fails for the transaction numbered `fail_at` (0-based)
#[derive(Debug, Default)]
pub struct FailingSink {
    pub inner: MemoryGraph,
    fail_at: usize,
    begun: AtomicUsize,
}

impl FailingSink {
    pub fn failing_commit(fail_at: usize) -> Self {
        Self {
            inner: MemoryGraph::new(),
            fail_at,
            begun: AtomicUsize::new(0),
        }
    }
}

impl GraphSink for FailingSink {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, SinkError> {
        let n = self.begun.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.begin()?;
        Ok(Box::new(FailingTransaction {
            inner,
            fail: n == self.fail_at,
        }))
    }
}

struct FailingTransaction<'a> {
    inner: Box<dyn Transaction + 'a>,
    fail: bool,
}

impl Transaction for FailingTransaction<'_> {
    fn create_node(&mut self, labels: &[&str], properties: Properties) -> Result<NodeRef, SinkError> {
        self.inner.create_node(labels, properties)
    }

    fn upsert_node(
        &mut self,
        labels: &[&str],
        match_properties: &Properties,
        all_properties: Properties,
    ) -> Result<NodeRef, SinkError> {
        self.inner.upsert_node(labels, match_properties, all_properties)
    }

    fn match_nodes(&self, labels: &[&str], predicate: &Properties) -> Result<Vec<NodeRef>, SinkError> {
        self.inner.match_nodes(labels, predicate)
    }

    fn create_relationship(
        &mut self,
        from: NodeRef,
        to: NodeRef,
        rel_type: &str,
        properties: Properties,
    ) -> Result<(), SinkError> {
        self.inner.create_relationship(from, to, rel_type, properties)
    }

    fn commit(self: Box<Self>) -> Result<CommitSummary, SinkError> {
        let this = *self;
        if this.fail {
            this.inner.rollback();
            return Err(SinkError::unavailable("connection reset during commit"));
        }
        this.inner.commit()
    }

    fn rollback(self: Box<Self>) {
        let this = *self;
        this.inner.rollback();
    }
}
