//! Owner of the source records and of their consumption state.

use std::collections::BTreeMap;

use crate::merge::scores::QualityScores;
use crate::types::{SourceRecord, UniqueLabel};

/// A set of unconsumed records sharing an ID (and optionally a segment).
///
/// `members` are indices into the [`RecordStore`], in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub segment: Option<String>,
    pub members: Vec<usize>,
}

impl Group {
    /// Human readable key for log messages.
    pub fn key(&self) -> String {
        match &self.segment {
            Some(segment) => format!("{}/{}", self.id, segment),
            None => self.id.clone(),
        }
    }
}

/// Source records plus their monotonic `processed` flags.
///
/// Stages never see consumed records: every grouping helper works on the
/// unconsumed view only.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<SourceRecord>,
}

impl RecordStore {
    pub fn new(records: Vec<SourceRecord>) -> Self {
        RecordStore { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, idx: usize) -> &SourceRecord {
        &self.records[idx]
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<SourceRecord> {
        self.records
    }

    /// Indices of records not yet consumed, in input order.
    pub fn unconsumed(&self) -> impl Iterator<Item = usize> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_processed())
            .map(|(i, _)| i)
    }

    /// Number of consumed records.
    pub fn processed_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_processed()).count()
    }

    pub fn consume(&mut self, idx: usize) {
        self.records[idx].mark_processed();
    }

    /// Label a record and consume it.
    pub fn label(&mut self, idx: usize, label: UniqueLabel) {
        let record = &mut self.records[idx];
        record.label = Some(label);
        record.mark_processed();
    }

    /// Look up the quality score of every unconsumed anchor.
    ///
    /// Anchors whose annotation is missing from the table get `None`.
    pub fn attach_scores(&mut self, scores: &QualityScores) {
        for record in self.records.iter_mut() {
            if record.is_anchor() && !record.is_processed() {
                record.quality_score = scores.get(&record.annotation);
            }
        }
    }

    /// Unconsumed records grouped by ID, in ID order.
    pub fn group_by_id(&self) -> Vec<Group> {
        self.group_by(false)
    }

    /// Unconsumed records grouped by (ID, segment), in key order.
    pub fn group_by_id_segment(&self) -> Vec<Group> {
        self.group_by(true)
    }

    fn group_by(&self, with_segment: bool) -> Vec<Group> {
        let mut groups: BTreeMap<(&str, Option<&str>), Vec<usize>> = BTreeMap::new();
        for idx in self.unconsumed() {
            let record = &self.records[idx];
            let segment = with_segment.then_some(record.segment.as_str());
            groups
                .entry((record.id.as_str(), segment))
                .or_default()
                .push(idx);
        }

        groups
            .into_iter()
            .map(|((id, segment), members)| Group {
                id: id.to_string(),
                segment: segment.map(str::to_string),
                members,
            })
            .collect()
    }

    /// IDs whose records are all still unconsumed, in ID order.
    pub fn untouched_ids(&self) -> Vec<String> {
        let mut any_processed: BTreeMap<&str, bool> = BTreeMap::new();
        for record in &self.records {
            *any_processed.entry(record.id.as_str()).or_insert(false) |= record.is_processed();
        }
        any_processed
            .into_iter()
            .filter(|(_, processed)| !processed)
            .map(|(id, _)| id.to_string())
            .collect()
    }
}
