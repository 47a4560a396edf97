//! Anchor/extension record association.
//!
//! Records sharing an ID are consolidated into composite records by four
//! strategies of decreasing strictness, run in a fixed order:
//!
//! 1. [`SegmentPair`]: one anchor and one extension with the same segment.
//! 2. [`NumericPair`]: one anchor (numeric annotation) and one extension.
//! 3. [`Triple`]: three scored records, resolved by score or position.
//! 4. [`Greedy`]: best-scored anchor first, nearest free extension.
//!
//! Between the third and fourth strategy, IDs whose remaining records all
//! come from one channel are labelled and retired. A record consumed by any
//! step is never seen again by a later one.

pub mod scores;
pub mod store;
pub mod strategy;

use std::collections::BTreeMap;

use crate::types::{MergedRecord, SourceRecord, Stage, UniqueLabel};

pub use scores::QualityScores;
pub use store::{Group, RecordStore};
pub use strategy::{Greedy, NumericPair, Outcome, SegmentPair, Strategy, Triple};

/// One step of the association pipeline.
pub enum Step {
    Merge(Box<dyn Strategy>),
    LabelExclusive,
}

/// Label and consume IDs whose unconsumed records come from a single channel.
///
/// Returns the number of records labelled.
pub fn label_exclusive_groups(store: &mut RecordStore) -> usize {
    let mut labelled = 0;
    for group in store.group_by_id() {
        let anchors = group
            .members
            .iter()
            .filter(|&&idx| store.get(idx).is_anchor())
            .count();
        let label = if anchors == group.members.len() {
            UniqueLabel::AnchorOnly
        } else if anchors == 0 {
            UniqueLabel::ExtensionOnly
        } else {
            continue;
        };
        for &idx in &group.members {
            store.label(idx, label);
        }
        labelled += group.members.len();
    }
    labelled
}

/// Ordered list of merge steps applied to a [`RecordStore`].
pub struct RecordAssociationEngine {
    steps: Vec<Step>,
}

impl Default for RecordAssociationEngine {
    fn default() -> Self {
        RecordAssociationEngine {
            steps: vec![
                Step::Merge(Box::new(SegmentPair)),
                Step::Merge(Box::new(NumericPair)),
                Step::Merge(Box::new(Triple)),
                Step::LabelExclusive,
                Step::Merge(Box::new(Greedy)),
            ],
        }
    }
}

impl RecordAssociationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine from a custom step list.
    pub fn with_steps(steps: Vec<Step>) -> Self {
        RecordAssociationEngine { steps }
    }

    /// Run every step in order and return the merged records.
    ///
    /// `store` is updated in place: consumed records are flagged processed and
    /// single-channel IDs are labelled. Running again on an exhausted store
    /// produces nothing.
    pub fn run(&self, store: &mut RecordStore, scores: &QualityScores) -> Vec<MergedRecord> {
        let mut merged = Vec::new();

        for step in &self.steps {
            match step {
                Step::Merge(strategy) => {
                    let before = merged.len();
                    run_strategy(strategy.as_ref(), store, scores, &mut merged);
                    log::info!(
                        "Stage {}: {} merged records",
                        strategy.stage(),
                        merged.len() - before
                    );
                }
                Step::LabelExclusive => {
                    let labelled = label_exclusive_groups(store);
                    log::info!("Labelled {} single-source records", labelled);
                }
            }
        }

        merged
    }
}

fn run_strategy(
    strategy: &dyn Strategy,
    store: &mut RecordStore,
    scores: &QualityScores,
    merged: &mut Vec<MergedRecord>,
) {
    if strategy.needs_scores() {
        store.attach_scores(scores);
    }

    for group in strategy.partition(store) {
        if !strategy.matches(&group, store) {
            continue;
        }
        match strategy.apply(&group, store) {
            Ok(Some(outcome)) => {
                for idx in outcome.consumed {
                    store.consume(idx);
                }
                merged.extend(outcome.merged);
            }
            Ok(None) => {
                log::debug!("Stage {}: no merge for group {}", strategy.stage(), group.key());
            }
            Err(err) => {
                log::debug!("Stage {}: skipping group: {}", strategy.stage(), err);
            }
        }
    }
}

/// Counts reported at the end of a merge run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeSummary {
    pub total_records: usize,
    pub processed_records: usize,
    pub merged_per_stage: BTreeMap<Stage, usize>,
    /// IDs none of whose records were consumed.
    pub untouched_ids: Vec<String>,
}

impl MergeSummary {
    pub fn new(store: &RecordStore, merged: &[MergedRecord]) -> Self {
        let mut merged_per_stage = BTreeMap::new();
        for record in merged {
            *merged_per_stage.entry(record.stage).or_insert(0) += 1;
        }
        MergeSummary {
            total_records: store.len(),
            processed_records: store.processed_count(),
            merged_per_stage,
            untouched_ids: store.untouched_ids(),
        }
    }

    /// Write the summary to the log.
    pub fn log(&self) {
        log::info!(
            "Number of processed rows: {} of {}",
            self.processed_records,
            self.total_records
        );
        for (stage, count) in &self.merged_per_stage {
            log::info!("  {}: {} merged", stage, count);
        }
        if self.untouched_ids.is_empty() {
            log::info!("No ID group is entirely unprocessed");
        } else {
            log::info!(
                "IDs with all rows unprocessed ({}): {}",
                self.untouched_ids.len(),
                self.untouched_ids.join(",")
            );
        }
    }
}

/// Run the default pipeline over `records`.
///
/// Returns the merged records and the source records with their final
/// `processed` and `label` state.
pub fn associate_records(
    records: Vec<SourceRecord>,
    scores: &QualityScores,
) -> (Vec<MergedRecord>, Vec<SourceRecord>) {
    let mut store = RecordStore::new(records);
    let merged = RecordAssociationEngine::default().run(&mut store, scores);
    MergeSummary::new(&store, &merged).log();
    (merged, store.into_records())
}
