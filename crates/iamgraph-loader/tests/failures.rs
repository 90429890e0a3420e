//! Fatal sink failures and abort-on-skip behavior

use iamgraph_loader::{GraphLoader, LoadError, LoaderConfig, Phase};
use iamgraph_sink::SinkError;
use iamgraph_test_utils::{bucket_policy, policy, records_with_policies, sample_records, FailingSink, BROKEN_DOCUMENT};

#[test]
fn commit_failure_names_phase_and_keeps_earlier_phases() {
    // Transactions are numbered in phase order; 2 is the actions phase
    let sink = FailingSink::failing_commit(2);
    let result = GraphLoader::default().run(&sink, &sample_records());

    match result {
        Err(LoadError::SinkTransaction { phase, record, source }) => {
            assert_eq!(phase, Phase::Actions);
            assert!(record.is_none());
            assert!(matches!(source, SinkError::Unavailable(_)));
        }
        other => panic!("expected sink failure, got {other:?}"),
    }

    // Policies and resources committed, nothing from the failed phase or later
    let snapshot = sink.inner.snapshot();
    assert_eq!(snapshot.nodes_with_label("Policy").count(), 1);
    assert_eq!(snapshot.nodes_with_label("Resource").count(), 1);
    assert_eq!(snapshot.nodes_with_label("Action").count(), 0);
    assert_eq!(snapshot.nodes_with_label("User").count(), 0);
    assert!(snapshot.relationships.is_empty());
}

#[test]
fn first_phase_failure_leaves_store_empty() {
    let sink = FailingSink::failing_commit(0);
    let err = GraphLoader::default().run(&sink, &sample_records()).unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Policies));
    assert!(err.to_string().contains("policies phase"));
    assert_eq!(sink.inner.node_count(), 0);
}

#[test]
fn abort_on_skip_rolls_back_phase() {
    let sink = FailingSink::failing_commit(usize::MAX);
    let records = records_with_policies(vec![bucket_policy("P1"), policy("P2", BROKEN_DOCUMENT)]);
    let loader = GraphLoader::new(LoaderConfig::default().with_abort_on_skip(true));

    let err = loader.run(&sink, &records).unwrap_err();

    match &err {
        LoadError::Aborted { phase, record, .. } => {
            assert_eq!(*phase, Phase::Resources);
            assert_eq!(record.name, "P2");
        }
        other => panic!("expected abort, got {other:?}"),
    }
    // P1's resource upsert was part of the rolled back transaction
    let snapshot = sink.inner.snapshot();
    assert_eq!(snapshot.nodes_with_label("Policy").count(), 2);
    assert_eq!(snapshot.nodes_with_label("Resource").count(), 0);
}
