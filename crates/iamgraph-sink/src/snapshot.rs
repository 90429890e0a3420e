//! Serializable graph snapshots and exports
//!
//! A [`GraphSnapshot`] renders as JSON (serde) or as a Cypher script that
//! replays the graph into a property-graph database.

use crate::properties::Properties;
use crate::sink::NodeRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

/// Temporary key used to join relationships to nodes in Cypher exports
const EXPORT_KEY: &str = "_iamgraphId";

/// Node in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// Store id
    pub id: NodeRef,
    /// Labels
    pub labels: Vec<String>,
    /// Properties
    pub properties: Properties,
}

impl SnapshotNode {
    /// Check for label
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// `name` property, if it is a string
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.properties.get_str("name")
    }
}

/// Relationship in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRelationship {
    /// Start node
    pub from: NodeRef,
    /// End node
    pub to: NodeRef,
    /// Relationship type
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Properties
    pub properties: Properties,
}

/// Point-in-time copy of a graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// All nodes
    pub nodes: Vec<SnapshotNode>,
    /// All relationships
    pub relationships: Vec<SnapshotRelationship>,
}

impl GraphSnapshot {
    /// Look up node by id
    #[must_use]
    pub fn node(&self, id: NodeRef) -> Option<&SnapshotNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes carrying `label`
    pub fn nodes_with_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a SnapshotNode> + 'a {
        self.nodes.iter().filter(move |n| n.has_label(label))
    }

    /// Relationships of type `rel_type`
    pub fn relationships_of_type<'a>(
        &'a self,
        rel_type: &'a str,
    ) -> impl Iterator<Item = &'a SnapshotRelationship> + 'a {
        self.relationships.iter().filter(move |r| r.rel_type == rel_type)
    }

    /// `(from name, to name)` pairs of every relationship of `rel_type`
    #[must_use]
    pub fn named_pairs(&self, rel_type: &str) -> Vec<(String, String)> {
        self.relationships_of_type(rel_type)
            .filter_map(|r| {
                let from = self.node(r.from)?.name()?;
                let to = self.node(r.to)?.name()?;
                Some((from.to_owned(), to.to_owned()))
            })
            .collect()
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    /// Serialization failures from serde_json.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Cypher script recreating this graph
    ///
    /// Nodes are created with a temporary id property that the relationship
    /// statements match on; the script removes it at the end.
    #[must_use]
    pub fn to_cypher(&self) -> String {
        let mut script = String::new();

        for node in &self.nodes {
            let mut props = node.properties.clone();
            props.insert(EXPORT_KEY, node.id.id());

            let labels: String = node.labels.iter().map(|l| format!(":{}", cypher_name(l))).collect();
            let _ = writeln!(script, "CREATE (n{labels} {});", cypher_map(&props));
        }

        for rel in &self.relationships {
            let _ = writeln!(
                script,
                "MATCH (a {{{key}: {from}}}), (b {{{key}: {to}}}) CREATE (a)-[:{ty} {props}]->(b);",
                key = EXPORT_KEY,
                from = rel.from.id(),
                to = rel.to.id(),
                ty = cypher_name(&rel.rel_type),
                props = cypher_map(&rel.properties),
            );
        }

        if !self.nodes.is_empty() {
            let _ = writeln!(script, "MATCH (n) WHERE n.{EXPORT_KEY} IS NOT NULL REMOVE n.{EXPORT_KEY};");
        }
        script
    }
}

/// Label, type or key, backtick-quoted unless it is a plain identifier
fn cypher_name(name: &str) -> String {
    let plain = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_owned()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

fn cypher_map(props: &Properties) -> String {
    let entries: Vec<String> = props
        .iter()
        .map(|(k, v)| format!("{}: {}", cypher_name(k), cypher_value(v)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn cypher_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => cypher_string(s),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(cypher_value).collect();
            format!("[{}]", rendered.join(", "))
        }
        // Cypher properties cannot hold maps; store them as JSON text
        Value::Object(_) => cypher_string(&value.to_string()),
    }
}

fn cypher_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> GraphSnapshot {
        GraphSnapshot {
            nodes: vec![
                SnapshotNode {
                    id: NodeRef::new(0),
                    labels: vec!["Policy".into()],
                    properties: Properties::new().with("name", "P1").with("policyObject", "[{'Resource': '*'}]"),
                },
                SnapshotNode {
                    id: NodeRef::new(1),
                    labels: vec!["Action".into()],
                    properties: Properties::new().with("name", "s3:Get"),
                },
            ],
            relationships: vec![SnapshotRelationship {
                from: NodeRef::new(0),
                to: NodeRef::new(1),
                rel_type: "CONTAINS".into(),
                properties: Properties::new(),
            }],
        }
    }

    #[test]
    fn cypher_escapes_quotes() {
        let script = sample().to_cypher();
        assert!(script.contains(r"policyObject: '[{\'Resource\': \'*\'}]'"));
    }

    #[test]
    fn cypher_has_one_statement_per_item() {
        let script = sample().to_cypher();
        assert_eq!(script.lines().filter(|l| l.starts_with("CREATE (n:")).count(), 2);
        assert_eq!(script.lines().filter(|l| l.contains("-[:CONTAINS {}]->")).count(), 1);
        assert!(script.lines().last().unwrap().starts_with("MATCH (n) WHERE"));
    }

    #[test]
    fn empty_snapshot_renders_empty_script() {
        assert!(GraphSnapshot::default().to_cypher().is_empty());
    }

    #[test]
    fn cypher_quotes_odd_names() {
        assert_eq!(cypher_name("Policy"), "Policy");
        assert_eq!(cypher_name("odd name"), "`odd name`");
        assert_eq!(cypher_name("9lives"), "`9lives`");
    }

    #[test]
    fn cypher_values() {
        assert_eq!(cypher_value(&json!(null)), "null");
        assert_eq!(cypher_value(&json!([1, "a"])), "[1, 'a']");
        assert_eq!(cypher_value(&json!({"k": 1})), r#"'{"k":1}'"#);
    }

    #[test]
    fn json_uses_type_key() {
        let json = sample().to_json_pretty().unwrap();
        assert!(json.contains("\"type\": \"CONTAINS\""));

        let back: GraphSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn named_pairs_resolve_names() {
        assert_eq!(
            sample().named_pairs("CONTAINS"),
            vec![("P1".to_string(), "s3:Get".to_string())]
        );
    }
}
