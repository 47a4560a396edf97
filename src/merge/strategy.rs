//! The four anchor/extension merge strategies.
//!
//! Each strategy partitions the unconsumed records into groups, decides
//! whether a group qualifies, and turns a qualifying group into merged
//! records plus the set of records it consumes. Strategies only read the
//! store; the engine applies the consumption.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::merge::store::{Group, RecordStore};
use crate::types::{MergedRecord, SourceRecord, Stage, Strand};

/// Result of applying a strategy to one group.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub merged: Vec<MergedRecord>,
    /// Store indices to mark processed.
    pub consumed: Vec<usize>,
}

/// One stage of the merge pipeline.
pub trait Strategy {
    fn stage(&self) -> Stage;

    /// Whether anchors must carry their quality score before this stage runs.
    fn needs_scores(&self) -> bool {
        false
    }

    /// Split the unconsumed records into candidate groups.
    fn partition(&self, store: &RecordStore) -> Vec<Group>;

    /// Cheap cardinality/composition check.
    fn matches(&self, group: &Group, store: &RecordStore) -> bool;

    /// Build the merge for a matching group.
    ///
    /// `Ok(None)` means the group qualified but no merge could be chosen;
    /// `Err` reports a group that violates a uniformity precondition.
    fn apply(&self, group: &Group, store: &RecordStore) -> Result<Option<Outcome>, Error>;
}

/// Coordinates of a merged pair with the anchor at the 5' end.
///
/// Plus strand spans anchor start to extension end; minus strand spans
/// extension start to anchor end.
pub fn pair_span(anchor: &SourceRecord, extension: &SourceRecord) -> (i64, i64) {
    match anchor.strand {
        Strand::Positive => (anchor.start, extension.end),
        Strand::Negative => (extension.start, anchor.end),
    }
}

/// Coordinates used by [`NumericPair`]: on the minus strand the merged
/// record runs from anchor end to extension start.
pub fn numeric_pair_span(anchor: &SourceRecord, extension: &SourceRecord) -> (i64, i64) {
    match anchor.strand {
        Strand::Positive => (anchor.start, extension.end),
        Strand::Negative => (anchor.end, extension.start),
    }
}

type SpanFn = fn(&SourceRecord, &SourceRecord) -> (i64, i64);

/// Split group members into (anchors, extensions), keeping input order.
fn split_kinds(members: &[usize], store: &RecordStore) -> (Vec<usize>, Vec<usize>) {
    members
        .iter()
        .copied()
        .partition(|&idx| store.get(idx).is_anchor())
}

/// True for exactly one anchor and one extension.
fn is_single_pair(group: &Group, store: &RecordStore) -> bool {
    if group.members.len() != 2 {
        return false;
    }
    let (anchors, extensions) = split_kinds(&group.members, store);
    anchors.len() == 1 && extensions.len() == 1
}

/// Return the single chromosome and strand shared by `members`.
fn uniform_locus(
    group: &Group,
    members: &[usize],
    store: &RecordStore,
) -> Result<(String, Strand), Error> {
    let first = store.get(members[0]);
    for &idx in &members[1..] {
        let record = store.get(idx);
        if record.strand != first.strand {
            return Err(Error::InconsistentGroup {
                id: group.key(),
                reason: "records lie on different strands".to_string(),
            });
        }
        if record.chrom != first.chrom {
            return Err(Error::InconsistentGroup {
                id: group.key(),
                reason: "records lie on different chromosomes".to_string(),
            });
        }
    }
    Ok((first.chrom.clone(), first.strand))
}

/// First index minimising `key`.
fn first_min_by_key<F>(candidates: &[usize], key: F) -> Option<usize>
where
    F: Fn(usize) -> i64,
{
    candidates.iter().copied().min_by_key(|&idx| key(idx))
}

/// First index maximising `key`.
fn first_max_by<F>(candidates: &[usize], key: F) -> Option<usize>
where
    F: Fn(usize) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for &idx in candidates {
        let value = key(idx);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// S1: one anchor and one extension sharing ID and segment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SegmentPair;

impl Strategy for SegmentPair {
    fn stage(&self) -> Stage {
        Stage::SegmentPair
    }

    fn partition(&self, store: &RecordStore) -> Vec<Group> {
        store.group_by_id_segment()
    }

    fn matches(&self, group: &Group, store: &RecordStore) -> bool {
        is_single_pair(group, store)
    }

    fn apply(&self, group: &Group, store: &RecordStore) -> Result<Option<Outcome>, Error> {
        let (anchors, extensions) = split_kinds(&group.members, store);
        let anchor = store.get(anchors[0]);
        let extension = store.get(extensions[0]);
        let (start, end) = pair_span(anchor, extension);

        Ok(Some(Outcome {
            merged: vec![MergedRecord::from_pair(anchor, extension, start, end, self.stage())],
            consumed: group.members.clone(),
        }))
    }
}

/// S2: one anchor with a numeric annotation and one extension sharing an ID.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumericPair;

impl Strategy for NumericPair {
    fn stage(&self) -> Stage {
        Stage::NumericPair
    }

    fn partition(&self, store: &RecordStore) -> Vec<Group> {
        store.group_by_id()
    }

    fn matches(&self, group: &Group, store: &RecordStore) -> bool {
        is_single_pair(group, store)
            && group
                .members
                .iter()
                .any(|&idx| store.get(idx).is_anchor() && store.get(idx).has_numeric_annotation())
    }

    fn apply(&self, group: &Group, store: &RecordStore) -> Result<Option<Outcome>, Error> {
        let (anchors, extensions) = split_kinds(&group.members, store);
        let anchor = store.get(anchors[0]);
        let extension = store.get(extensions[0]);
        let (start, end) = numeric_pair_span(anchor, extension);

        Ok(Some(Outcome {
            merged: vec![MergedRecord::from_pair(anchor, extension, start, end, self.stage())],
            consumed: group.members.clone(),
        }))
    }
}

/// S3: exactly three scored records, either two anchors and one extension or
/// one anchor and two extensions.
#[derive(Debug, Default, Clone, Copy)]
pub struct Triple;

impl Triple {
    /// Anchors with a quality score plus every extension.
    fn candidates(group: &Group, store: &RecordStore) -> Vec<usize> {
        group
            .members
            .iter()
            .copied()
            .filter(|&idx| {
                let record = store.get(idx);
                record.is_extension() || record.quality_score.is_some()
            })
            .collect()
    }

    /// Pick the extension to pair with a lone anchor.
    fn choose_extension(
        anchor: &SourceRecord,
        extensions: &[usize],
        strand: Strand,
        store: &RecordStore,
    ) -> Option<usize> {
        match strand {
            Strand::Positive => {
                let downstream: Vec<usize> = extensions
                    .iter()
                    .copied()
                    .filter(|&idx| store.get(idx).start > anchor.start)
                    .collect();
                if downstream.is_empty() {
                    first_min_by_key(extensions, |idx| store.get(idx).end)
                } else {
                    first_min_by_key(&downstream, |idx| (store.get(idx).start - anchor.start).abs())
                }
            }
            Strand::Negative => {
                let upstream: Vec<usize> = extensions
                    .iter()
                    .copied()
                    .filter(|&idx| store.get(idx).end < anchor.end)
                    .collect();
                if !upstream.is_empty() {
                    return first_min_by_key(&upstream, |idx| (store.get(idx).end - anchor.end).abs());
                }
                let beyond: Vec<usize> = extensions
                    .iter()
                    .copied()
                    .filter(|&idx| store.get(idx).end > anchor.end)
                    .collect();
                first_max_by(&beyond, |idx| store.get(idx).start as f64)
            }
        }
    }
}

impl Strategy for Triple {
    fn stage(&self) -> Stage {
        Stage::Triple
    }

    fn needs_scores(&self) -> bool {
        true
    }

    fn partition(&self, store: &RecordStore) -> Vec<Group> {
        store.group_by_id()
    }

    fn matches(&self, group: &Group, store: &RecordStore) -> bool {
        Self::candidates(group, store).len() == 3
    }

    fn apply(&self, group: &Group, store: &RecordStore) -> Result<Option<Outcome>, Error> {
        let candidates = Self::candidates(group, store);
        let (anchors, extensions) = split_kinds(&candidates, store);
        let anchors: Vec<usize> = anchors
            .into_iter()
            .filter(|&idx| store.get(idx).has_numeric_annotation())
            .collect();
        if anchors.is_empty() || extensions.is_empty() {
            return Ok(None);
        }

        let (_, strand) = uniform_locus(group, &candidates, store)?;

        // two anchors take the segment-pair span, two extensions the numeric-pair span
        let pair = match (anchors.len(), extensions.len()) {
            (2, 1) => first_max_by(&anchors, |idx| store.get(idx).quality_score.unwrap_or(0.0))
                .map(|anchor| (anchor, extensions[0], pair_span as SpanFn)),
            (1, 2) => {
                let anchor = store.get(anchors[0]);
                Self::choose_extension(anchor, &extensions, strand, store)
                    .map(|extension| (anchors[0], extension, numeric_pair_span as SpanFn))
            }
            _ => None,
        };

        Ok(pair.map(|(a, e, span)| {
            let anchor = store.get(a);
            let extension = store.get(e);
            let (start, end) = span(anchor, extension);
            Outcome {
                merged: vec![MergedRecord::from_pair(anchor, extension, start, end, self.stage())],
                consumed: group.members.clone(),
            }
        }))
    }
}

/// S4: greedy matching of anchors (best score first) to the nearest free
/// extension on the same strand.
#[derive(Debug, Default, Clone, Copy)]
pub struct Greedy;

impl Greedy {
    /// Distance between an anchor and an extension at their shared 5' end.
    fn distance(anchor: &SourceRecord, extension: &SourceRecord) -> i64 {
        match anchor.strand {
            Strand::Positive => (extension.start - anchor.start).abs(),
            Strand::Negative => (extension.end - anchor.end).abs(),
        }
    }
}

impl Strategy for Greedy {
    fn stage(&self) -> Stage {
        Stage::Greedy
    }

    fn needs_scores(&self) -> bool {
        true
    }

    fn partition(&self, store: &RecordStore) -> Vec<Group> {
        let mut groups = store.group_by_id();
        for group in groups.iter_mut() {
            group.members.retain(|&idx| store.get(idx).label.is_none());
        }
        groups.retain(|g| !g.members.is_empty());
        groups
    }

    fn matches(&self, group: &Group, store: &RecordStore) -> bool {
        let (anchors, extensions) = split_kinds(&group.members, store);
        !anchors.is_empty() && !extensions.is_empty()
    }

    fn apply(&self, group: &Group, store: &RecordStore) -> Result<Option<Outcome>, Error> {
        let mut by_strand: BTreeMap<Strand, Vec<usize>> = BTreeMap::new();
        for &idx in &group.members {
            by_strand.entry(store.get(idx).strand).or_default().push(idx);
        }

        let mut merged = Vec::new();
        for members in by_strand.values() {
            let (mut anchors, mut pool) = split_kinds(members, store);
            let score = |idx: usize| store.get(idx).quality_score.unwrap_or(0.0);
            anchors.sort_by(|&a, &b| score(b).total_cmp(&score(a)));

            for a in anchors {
                if pool.is_empty() {
                    break;
                }
                let anchor = store.get(a);
                let Some(pos) = (0..pool.len())
                    .min_by_key(|&p| Self::distance(anchor, store.get(pool[p])))
                else {
                    break;
                };
                let extension = store.get(pool.remove(pos));
                let (start, end) = pair_span(anchor, extension);
                merged.push(MergedRecord::from_pair(anchor, extension, start, end, self.stage()));
            }
        }

        if merged.is_empty() {
            return Ok(None);
        }
        Ok(Some(Outcome {
            merged,
            consumed: group.members.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;

    fn rec(
        id: &str,
        segment: &str,
        kind: SourceKind,
        start: i64,
        end: i64,
        strand: Strand,
        annotation: &str,
    ) -> SourceRecord {
        SourceRecord::new(id, segment, kind, "chrI", start, end, strand, annotation)
    }

    fn scored(mut record: SourceRecord, score: f64) -> SourceRecord {
        record.quality_score = Some(score);
        record
    }

    #[test]
    fn test_pair_span_rules_differ_on_minus() {
        let anchor = rec("X", "a", SourceKind::Anchor, 100, 120, Strand::Negative, "1");
        let extension = rec("X", "b", SourceKind::Extension, 40, 90, Strand::Negative, "t");
        assert_eq!(pair_span(&anchor, &extension), (40, 120));
        assert_eq!(numeric_pair_span(&anchor, &extension), (120, 40));
    }

    #[test]
    fn test_segment_pair_requires_one_of_each() {
        let store = RecordStore::new(vec![
            rec("X", "A", SourceKind::Anchor, 10, 20, Strand::Positive, "1"),
            rec("X", "A", SourceKind::Anchor, 30, 40, Strand::Positive, "2"),
        ]);
        let groups = SegmentPair.partition(&store);
        assert_eq!(groups.len(), 1);
        assert!(!SegmentPair.matches(&groups[0], &store));
    }

    #[test]
    fn test_numeric_pair_requires_numeric_anchor() {
        let store = RecordStore::new(vec![
            rec("X", "A", SourceKind::Anchor, 10, 20, Strand::Positive, "novel"),
            rec("X", "B", SourceKind::Extension, 30, 40, Strand::Positive, "t"),
        ]);
        let groups = NumericPair.partition(&store);
        assert!(!NumericPair.matches(&groups[0], &store));
    }

    #[test]
    fn test_triple_two_anchors_picks_best_score() {
        let store = RecordStore::new(vec![
            scored(rec("X", "a1", SourceKind::Anchor, 100, 110, Strand::Positive, "1"), 5.0),
            scored(rec("X", "a2", SourceKind::Anchor, 120, 130, Strand::Positive, "2"), 9.0),
            rec("X", "e", SourceKind::Extension, 125, 400, Strand::Positive, "t"),
        ]);
        let group = &Triple.partition(&store)[0];
        assert!(Triple.matches(group, &store));
        let outcome = Triple.apply(group, &store).unwrap().unwrap();
        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.merged[0].start, 120);
        assert_eq!(outcome.merged[0].end, 400);
        assert_eq!(outcome.merged[0].quality_score, 9.0);
        assert_eq!(outcome.consumed, vec![0, 1, 2]);
    }

    #[test]
    fn test_triple_unscored_anchor_not_counted() {
        let store = RecordStore::new(vec![
            scored(rec("X", "a1", SourceKind::Anchor, 100, 110, Strand::Positive, "1"), 5.0),
            rec("X", "a2", SourceKind::Anchor, 120, 130, Strand::Positive, "2"),
            rec("X", "e1", SourceKind::Extension, 125, 400, Strand::Positive, "t"),
            rec("X", "e2", SourceKind::Extension, 105, 300, Strand::Positive, "u"),
        ]);
        let group = &Triple.partition(&store)[0];
        assert!(Triple.matches(group, &store));
        let outcome = Triple.apply(group, &store).unwrap().unwrap();
        // e2 starts closest downstream of the anchor
        assert_eq!(outcome.merged[0].segment, "a1;e2");
        assert_eq!(outcome.consumed, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_triple_plus_fallback_to_min_end() {
        let store = RecordStore::new(vec![
            scored(rec("X", "a", SourceKind::Anchor, 500, 510, Strand::Positive, "1"), 1.0),
            rec("X", "e1", SourceKind::Extension, 100, 900, Strand::Positive, "t"),
            rec("X", "e2", SourceKind::Extension, 200, 800, Strand::Positive, "u"),
        ]);
        let group = &Triple.partition(&store)[0];
        let outcome = Triple.apply(group, &store).unwrap().unwrap();
        assert_eq!(outcome.merged[0].segment, "a;e2");
        assert_eq!((outcome.merged[0].start, outcome.merged[0].end), (500, 800));
    }

    #[test]
    fn test_triple_minus_prefers_upstream_end() {
        let store = RecordStore::new(vec![
            scored(rec("X", "a", SourceKind::Anchor, 900, 1000, Strand::Negative, "1"), 1.0),
            rec("X", "e1", SourceKind::Extension, 100, 700, Strand::Negative, "t"),
            rec("X", "e2", SourceKind::Extension, 300, 950, Strand::Negative, "u"),
        ]);
        let group = &Triple.partition(&store)[0];
        let outcome = Triple.apply(group, &store).unwrap().unwrap();
        assert_eq!(outcome.merged[0].segment, "a;e2");
        // lone minus-strand anchor runs from its end to the extension start
        assert_eq!((outcome.merged[0].start, outcome.merged[0].end), (1000, 300));
        assert_eq!(outcome.merged[0].length, 701);
    }

    #[test]
    fn test_triple_two_anchors_minus_uses_segment_span() {
        let store = RecordStore::new(vec![
            scored(rec("X", "a1", SourceKind::Anchor, 900, 1000, Strand::Negative, "1"), 2.0),
            scored(rec("X", "a2", SourceKind::Anchor, 800, 850, Strand::Negative, "2"), 7.0),
            rec("X", "e", SourceKind::Extension, 300, 820, Strand::Negative, "t"),
        ]);
        let group = &Triple.partition(&store)[0];
        let outcome = Triple.apply(group, &store).unwrap().unwrap();
        assert_eq!(outcome.merged[0].segment, "a2;e");
        assert_eq!((outcome.merged[0].start, outcome.merged[0].end), (300, 850));
    }

    #[test]
    fn test_triple_minus_fallback_and_drop() {
        let store = RecordStore::new(vec![
            scored(rec("X", "a", SourceKind::Anchor, 900, 1000, Strand::Negative, "1"), 1.0),
            rec("X", "e1", SourceKind::Extension, 950, 1200, Strand::Negative, "t"),
            rec("X", "e2", SourceKind::Extension, 980, 1100, Strand::Negative, "u"),
        ]);
        let group = &Triple.partition(&store)[0];
        let outcome = Triple.apply(group, &store).unwrap().unwrap();
        assert_eq!(outcome.merged[0].segment, "a;e2");

        let store = RecordStore::new(vec![
            scored(rec("Y", "a", SourceKind::Anchor, 900, 1000, Strand::Negative, "1"), 1.0),
            rec("Y", "e1", SourceKind::Extension, 950, 1000, Strand::Negative, "t"),
            rec("Y", "e2", SourceKind::Extension, 980, 1000, Strand::Negative, "u"),
        ]);
        let group = &Triple.partition(&store)[0];
        assert!(Triple.apply(group, &store).unwrap().is_none());
    }

    #[test]
    fn test_triple_mixed_strands_rejected() {
        let store = RecordStore::new(vec![
            scored(rec("X", "a", SourceKind::Anchor, 100, 110, Strand::Positive, "1"), 1.0),
            rec("X", "e1", SourceKind::Extension, 120, 300, Strand::Positive, "t"),
            rec("X", "e2", SourceKind::Extension, 50, 90, Strand::Negative, "u"),
        ]);
        let group = &Triple.partition(&store)[0];
        assert!(matches!(
            Triple.apply(group, &store),
            Err(Error::InconsistentGroup { .. })
        ));
    }

    #[test]
    fn test_triple_mixed_chromosomes_rejected() {
        let mut far = rec("X", "e2", SourceKind::Extension, 130, 350, Strand::Positive, "u");
        far.chrom = "chrII".to_string();
        let store = RecordStore::new(vec![
            scored(rec("X", "a", SourceKind::Anchor, 100, 110, Strand::Positive, "1"), 1.0),
            rec("X", "e1", SourceKind::Extension, 120, 300, Strand::Positive, "t"),
            far,
        ]);
        let group = &Triple.partition(&store)[0];
        assert!(Triple.matches(group, &store));
        match Triple.apply(group, &store) {
            Err(Error::InconsistentGroup { id, reason }) => {
                assert_eq!(id, "X");
                assert!(reason.contains("chromosome"), "{}", reason);
            }
            other => panic!("expected an inconsistent group, got {:?}", other),
        }
    }

    #[test]
    fn test_greedy_is_not_reoptimised() {
        // a1 (best score) grabs e1 at distance 10, leaving a2 with e2 at 200;
        // a1-e2 plus a2-e1 would total 190 instead of 210
        let store = RecordStore::new(vec![
            scored(rec("X", "a1", SourceKind::Anchor, 100, 110, Strand::Positive, "1"), 9.0),
            scored(rec("X", "a2", SourceKind::Anchor, 0, 10, Strand::Positive, "2"), 3.0),
            rec("X", "e1", SourceKind::Extension, 90, 500, Strand::Positive, "t"),
            rec("X", "e2", SourceKind::Extension, 200, 600, Strand::Positive, "u"),
        ]);
        let group = &Greedy.partition(&store)[0];
        let outcome = Greedy.apply(group, &store).unwrap().unwrap();
        let segments: Vec<&str> = outcome.merged.iter().map(|m| m.segment.as_str()).collect();
        assert_eq!(segments, vec!["a1;e1", "a2;e2"]);
    }

    #[test]
    fn test_greedy_strands_do_not_mix() {
        let store = RecordStore::new(vec![
            rec("X", "a1", SourceKind::Anchor, 100, 110, Strand::Positive, "1"),
            rec("X", "e1", SourceKind::Extension, 100, 500, Strand::Negative, "t"),
        ]);
        let group = &Greedy.partition(&store)[0];
        assert!(Greedy.matches(group, &store));
        assert!(Greedy.apply(group, &store).unwrap().is_none());
    }
}
