//! Transaction behavior of the in-memory sink, driven through the trait objects
//! the loader uses.

use iamgraph_sink::{GraphSink, MemoryGraph, Properties};
use pretty_assertions::assert_eq;

fn named(name: &str) -> Properties {
    Properties::new().with("name", name)
}

/// Later transactions see what earlier ones committed.
#[test]
fn committed_nodes_visible_to_next_transaction() {
    let graph = MemoryGraph::new();
    let sink: &dyn GraphSink = &graph;

    let mut tx = sink.begin().unwrap();
    tx.create_node(&["Policy"], named("P1")).unwrap();
    tx.commit().unwrap();

    let tx = sink.begin().unwrap();
    let found = tx.match_nodes(&["Policy"], &named("P1")).unwrap();
    assert_eq!(found.len(), 1);
    tx.rollback();
}

/// Upserts across separate transactions still resolve to one node.
#[test]
fn upsert_idempotent_across_transactions() {
    let graph = MemoryGraph::new();
    let key = named("s3:bucket").with("forPolicy", "P1");

    for _ in 0..2 {
        let mut tx = graph.begin().unwrap();
        tx.upsert_node(&["Resource"], &key, Properties::new()).unwrap();
        tx.commit().unwrap();
    }

    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.version(), 2);
}

/// A rolled back transaction leaves the committed graph untouched.
#[test]
fn rollback_keeps_previous_state() {
    let graph = MemoryGraph::new();

    let mut tx = graph.begin().unwrap();
    let p = tx.create_node(&["Policy"], named("P1")).unwrap();
    let a = tx.create_node(&["Action"], named("s3:Get")).unwrap();
    tx.create_relationship(p, a, "CONTAINS", Properties::new()).unwrap();
    tx.commit().unwrap();

    let mut tx = graph.begin().unwrap();
    let extra = tx.create_node(&["Action"], named("s3:Put")).unwrap();
    tx.create_relationship(p, extra, "CONTAINS", Properties::new()).unwrap();
    tx.rollback();

    let snapshot = graph.snapshot();
    assert_eq!(snapshot.nodes.len(), 2);
    assert_eq!(
        snapshot.named_pairs("CONTAINS"),
        vec![("P1".to_string(), "s3:Get".to_string())]
    );
}

/// Snapshot exports keep every node and relationship.
#[test]
fn exports_cover_whole_graph() {
    let graph = MemoryGraph::new();
    let mut tx = graph.begin().unwrap();
    let p = tx.create_node(&["Policy"], named("P1")).unwrap();
    let u = tx.create_node(&["User"], named("bob")).unwrap();
    tx.create_relationship(p, u, "IS_ATTACHED_TO", Properties::new()).unwrap();
    tx.commit().unwrap();

    let snapshot = graph.snapshot();
    let cypher = snapshot.to_cypher();
    assert!(cypher.contains("CREATE (n:Policy {name: 'P1'"));
    assert!(cypher.contains("CREATE (n:User {name: 'bob'"));
    assert!(cypher.contains("-[:IS_ATTACHED_TO {}]->"));

    assert_eq!(snapshot.nodes_with_label("User").count(), 1);
    assert_eq!(snapshot.relationships_of_type("IS_ATTACHED_TO").count(), 1);
}
