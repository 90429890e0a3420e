//! Load pipeline: runs the phases, each inside its own transaction

use crate::config::LoaderConfig;
use crate::error::{DocumentParseError, LoadError, LookupMissError};
use crate::model::NodeLabel;
use crate::phases::{self, Phase};
use crate::records::{RecordRef, RecordSet};
use crate::report::{LoadReport, PhaseReport, SkipReason, SkippedItem, UnmatchedReference};
use iamgraph_sink::{CommitSummary, GraphSink, Transaction};
use tracing::{debug, info, warn};

/// Loads a [`RecordSet`] into a graph sink
#[derive(Debug, Clone, Default)]
pub struct GraphLoader {
    config: LoaderConfig,
}

impl GraphLoader {
    /// Create loader
    #[inline]
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Loader configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Run all phases in order
    ///
    /// A phase starts only after the previous one committed. Skipped items
    /// are collected in the returned report.
    ///
    /// # Errors
    /// Returns `LoadError::SinkTransaction` if the sink fails, and
    /// `LoadError::Aborted` on the first skip when `abort_on_skip` is set.
    /// Phases committed before the failure stay committed.
    pub fn run(&self, sink: &dyn GraphSink, records: &RecordSet) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::start();
        info!(
            run_id = %report.run_id,
            policies = records.policies.len(),
            principals = records.len() - records.policies.len(),
            "Starting load"
        );

        for phase in Phase::ALL {
            let phase_report = self.run_phase(sink, phase, records)?;
            report.phases.push(phase_report);
        }

        report.finish();
        info!(
            run_id = %report.run_id,
            skipped = report.skipped_count(),
            unmatched = report.unmatched_count(),
            "Load finished"
        );
        Ok(report)
    }

    /// Run one phase in its own transaction
    ///
    /// # Errors
    /// Same as [`GraphLoader::run`].
    pub fn run_phase(
        &self,
        sink: &dyn GraphSink,
        phase: Phase,
        records: &RecordSet,
    ) -> Result<PhaseReport, LoadError> {
        info!("Phase {} starting", phase);

        let mut ctx = PhaseContext::new(phase, self.config.abort_on_skip);
        let commit = in_transaction(sink, phase, |tx| match phase {
            Phase::Policies => phases::load_policies(tx, records, &mut ctx),
            Phase::Resources => phases::load_resources(tx, records, &mut ctx),
            Phase::Actions => phases::load_actions(tx, records, &mut ctx),
            Phase::Principals => phases::load_principals(tx, records, &mut ctx),
        })?;

        let report = ctx.finish(commit);
        info!(
            "Phase {} committed: {} created, {} merged, {} relationships, {} skipped, {} unmatched",
            phase,
            report.commit.nodes_created,
            report.commit.nodes_merged,
            report.commit.relationships_created,
            report.skipped.len(),
            report.unmatched.len()
        );
        Ok(report)
    }
}

/// Run `work` in a fresh transaction: commit on success, roll back on error
///
/// # Errors
/// Errors from `work`, or `LoadError::SinkTransaction` if the transaction
/// cannot begin or commit.
pub fn in_transaction<F>(sink: &dyn GraphSink, phase: Phase, work: F) -> Result<CommitSummary, LoadError>
where
    F: FnOnce(&mut dyn Transaction) -> Result<(), LoadError>,
{
    let mut tx = sink.begin().map_err(|e| LoadError::sink(phase, None, e))?;

    match work(tx.as_mut()) {
        Ok(()) => tx.commit().map_err(|e| LoadError::sink(phase, None, e)),
        Err(err) => {
            warn!("Phase {} rolled back: {}", phase, err);
            tx.rollback();
            Err(err)
        }
    }
}

/// Per-phase accumulator for counts, skips and unmatched names
#[derive(Debug)]
pub(crate) struct PhaseContext {
    report: PhaseReport,
    abort_on_skip: bool,
}

impl PhaseContext {
    pub(crate) fn new(phase: Phase, abort_on_skip: bool) -> Self {
        Self {
            report: PhaseReport::new(phase),
            abort_on_skip,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.report.phase
    }

    pub(crate) fn record_processed(&mut self, record: &RecordRef) {
        debug!("{}: processing {}", self.report.phase, record);
        self.report.records_processed += 1;
    }

    /// Record a parse failure; errors when skips abort the run
    pub(crate) fn skip_parse(&mut self, err: &DocumentParseError) -> Result<(), LoadError> {
        warn!(
            "{}: skipping {}: cannot parse {}: {} (raw: {:?})",
            self.report.phase,
            err.record,
            err.field,
            err.source,
            err.raw()
        );
        self.skip(err.record.clone(), SkipReason::from(err))
    }

    /// Record a missing edge endpoint; errors when skips abort the run
    pub(crate) fn skip_lookup(&mut self, record: &RecordRef, err: &LookupMissError) -> Result<(), LoadError> {
        warn!("{}: skipping tuple of {}: {}", self.report.phase, record, err);
        self.skip(record.clone(), SkipReason::from(err))
    }

    fn skip(&mut self, record: RecordRef, reason: SkipReason) -> Result<(), LoadError> {
        metrics::counter!("iamgraph_skipped_total", "phase" => self.report.phase.as_str()).increment(1);

        if self.abort_on_skip {
            return Err(LoadError::Aborted {
                phase: self.report.phase,
                record,
                reason: reason.to_string(),
            });
        }
        self.report.skipped.push(SkippedItem { record, reason });
        Ok(())
    }

    pub(crate) fn unmatched(&mut self, record: &RecordRef, label: NodeLabel, name: &str) {
        debug!("{}: {} references unknown {} '{}'", self.report.phase, record, label, name);
        metrics::counter!("iamgraph_unmatched_total", "phase" => self.report.phase.as_str()).increment(1);
        self.report.unmatched.push(UnmatchedReference {
            record: record.clone(),
            label,
            name: name.to_owned(),
        });
    }

    fn finish(mut self, commit: CommitSummary) -> PhaseReport {
        let phase = self.report.phase.as_str();
        metrics::counter!("iamgraph_nodes_created_total", "phase" => phase).increment(commit.nodes_created as u64);
        metrics::counter!("iamgraph_nodes_merged_total", "phase" => phase).increment(commit.nodes_merged as u64);
        metrics::counter!("iamgraph_relationships_created_total", "phase" => phase)
            .increment(commit.relationships_created as u64);

        self.report.commit = commit;
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::PolicyRecord;
    use iamgraph_sink::{MemoryGraph, Properties, SinkError};

    #[test]
    fn closure_error_rolls_back() {
        let graph = MemoryGraph::new();

        let result = in_transaction(&graph, Phase::Policies, |tx| {
            tx.create_node(&["Policy"], Properties::new().with("name", "P1"))
                .map_err(|e| LoadError::sink(Phase::Policies, None, e))?;
            Err(LoadError::sink(Phase::Policies, None, SinkError::Rejected("boom".into())))
        });

        assert!(result.is_err());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.version(), 0);
    }

    #[test]
    fn success_commits() {
        let graph = MemoryGraph::new();

        let summary = in_transaction(&graph, Phase::Policies, |tx| {
            tx.create_node(&["Policy"], Properties::new().with("name", "P1"))
                .map_err(|e| LoadError::sink(Phase::Policies, None, e))?;
            Ok(())
        })
        .unwrap();

        assert_eq!(summary.nodes_created, 1);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn abort_on_skip_turns_skip_into_error() {
        let mut ctx = PhaseContext::new(Phase::Actions, true);
        let record = PolicyRecord::new("P1", "").record_ref();
        let miss = LookupMissError::Policy { policy: "P1".into() };

        let result = ctx.skip_lookup(&record, &miss);
        assert!(matches!(result, Err(LoadError::Aborted { phase: Phase::Actions, .. })));
    }

    #[test]
    fn skips_accumulate_without_abort() {
        let mut ctx = PhaseContext::new(Phase::Actions, false);
        let record = PolicyRecord::new("P1", "").record_ref();
        let miss = LookupMissError::Policy { policy: "P1".into() };

        ctx.skip_lookup(&record, &miss).unwrap();
        ctx.skip_lookup(&record, &miss).unwrap();
        ctx.unmatched(&record, NodeLabel::User, "ghost");

        let report = ctx.finish(CommitSummary::default());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.unmatched.len(), 1);
    }

    #[test]
    fn loader_runs_phases_in_order() {
        let graph = MemoryGraph::new();
        let records = RecordSet {
            policies: vec![PolicyRecord::new("P1", "[{'Resource': 'r', 'Action': 'a'}]")],
            ..RecordSet::default()
        };

        let report = GraphLoader::default().run(&graph, &records).unwrap();
        let order: Vec<Phase> = report.phases.iter().map(|p| p.phase).collect();
        assert_eq!(order, Phase::ALL.to_vec());
        assert!(report.finished_at.is_some());
        assert_eq!(graph.version(), 4);
    }
}
