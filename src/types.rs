//! Core data structures for clustmatch.
//!
//! This module contains the record types exchanged between the parsers,
//! the detectors, the merge engine and the output writers.

use std::fmt;
use std::str::FromStr;

/// Strand orientation for genomic features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Positive,
    Negative,
}

/// Error type for parsing strand from string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStrandError;

impl fmt::Display for ParseStrandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid strand: expected '+' or '-'")
    }
}

impl std::error::Error for ParseStrandError {}

impl FromStr for Strand {
    type Err = ParseStrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Positive),
            "-" => Ok(Strand::Negative),
            _ => Err(ParseStrandError),
        }
    }
}

impl Strand {
    /// Convert strand to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Positive => "+",
            Strand::Negative => "-",
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected signal cluster.
///
/// `fields` holds every column of the original input row so that the
/// annotated outputs can reproduce it verbatim.
#[derive(Debug, Clone)]
pub struct ClusterRecord {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub fields: Vec<String>,
}

impl ClusterRecord {
    /// Create a cluster whose original row is just its coordinates.
    pub fn new(chrom: &str, start: i64, end: i64, strand: Strand) -> Self {
        ClusterRecord {
            chrom: chrom.to_string(),
            start,
            end,
            strand,
            fields: vec![
                chrom.to_string(),
                strand.to_string(),
                start.to_string(),
                end.to_string(),
            ],
        }
    }
}

/// A set of clusters sharing one input header.
#[derive(Debug, Clone, Default)]
pub struct ClusterSet {
    pub header: Vec<String>,
    pub records: Vec<ClusterRecord>,
}

impl ClusterSet {
    /// Build a set from records created with [`ClusterRecord::new`].
    pub fn from_records(records: Vec<ClusterRecord>) -> Self {
        ClusterSet {
            header: ["chr", "strand", "start", "end"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            records,
        }
    }

    /// Distinct chromosomes in first-seen order.
    pub fn chromosomes(&self) -> Vec<String> {
        let mut seen = indexmap::IndexSet::new();
        for record in &self.records {
            seen.insert(record.chrom.as_str());
        }
        seen.into_iter().map(str::to_string).collect()
    }
}

/// A reference gene (or exon) interval.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneRecord {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub name: String,
}

impl GeneRecord {
    /// Create a new gene record.
    pub fn new(chrom: &str, start: i64, end: i64, strand: Strand, name: &str) -> Self {
        GeneRecord {
            chrom: chrom.to_string(),
            start,
            end,
            strand,
            name: name.to_string(),
        }
    }
}

/// A cluster annotated with the genes it overlaps.
#[derive(Debug, Clone)]
pub struct AnnotatedCluster {
    pub cluster: ClusterRecord,
    /// Comma-joined distinct names of all overlapping genes.
    pub overlap_gene: String,
    /// Comma-joined distinct names of overlapping genes on the other strand.
    pub antisense_gene: String,
}

/// A cluster sitting inside the promoter window of an opposite-strand gene.
#[derive(Debug, Clone)]
pub struct ProximityHit {
    pub cluster: ClusterRecord,
    pub bidirect_gene: String,
    /// Raw coordinate difference between the cluster boundary and the window edge.
    pub gap: i64,
}

/// The two experimental channels paired by the merge engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Anchor,
    Extension,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Anchor => "anchor",
            SourceKind::Extension => "extension",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Label given to groups whose remaining records come from a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueLabel {
    AnchorOnly,
    ExtensionOnly,
}

impl UniqueLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueLabel::AnchorOnly => "anchor-only",
            UniqueLabel::ExtensionOnly => "extension-only",
        }
    }
}

impl fmt::Display for UniqueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UniqueLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anchor-only" => Ok(UniqueLabel::AnchorOnly),
            "extension-only" => Ok(UniqueLabel::ExtensionOnly),
            _ => Err(format!("unknown label '{}'", s)),
        }
    }
}

/// One input row of the merge pipeline.
///
/// The `processed` flag is private: it can only be raised through
/// [`SourceRecord::mark_processed`], never lowered.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub id: String,
    pub segment: String,
    pub kind: SourceKind,
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub annotation: String,
    pub quality_score: Option<f64>,
    pub label: Option<UniqueLabel>,
    /// Original input row, written back with the updated state.
    pub fields: Vec<String>,
    processed: bool,
}

impl SourceRecord {
    /// Create a new, unprocessed source record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: &str,
        segment: &str,
        kind: SourceKind,
        chrom: &str,
        start: i64,
        end: i64,
        strand: Strand,
        annotation: &str,
    ) -> Self {
        SourceRecord {
            id: id.to_string(),
            segment: segment.to_string(),
            kind,
            chrom: chrom.to_string(),
            start,
            end,
            strand,
            annotation: annotation.to_string(),
            quality_score: None,
            label: None,
            fields: Vec::new(),
            processed: false,
        }
    }

    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub fn mark_processed(&mut self) {
        self.processed = true;
    }

    pub fn is_anchor(&self) -> bool {
        self.kind == SourceKind::Anchor
    }

    pub fn is_extension(&self) -> bool {
        self.kind == SourceKind::Extension
    }

    /// True when the annotation is a non-empty run of ASCII digits.
    pub fn has_numeric_annotation(&self) -> bool {
        is_numeric(&self.annotation)
    }
}

/// True when `s` is a non-empty run of ASCII digits.
pub fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Merge stage that produced a [`MergedRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    SegmentPair,
    NumericPair,
    Triple,
    Greedy,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::SegmentPair => "segment-pair",
            Stage::NumericPair => "numeric-pair",
            Stage::Triple => "triple",
            Stage::Greedy => "greedy",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A composite record built from one anchor and one extension.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub length: i64,
    pub id: String,
    pub segment: String,
    pub annotation: String,
    pub quality_score: f64,
    pub stage: Stage,
}

impl MergedRecord {
    /// Build a merged record with explicit coordinates.
    ///
    /// Chromosome, strand and ID come from the anchor; segment and
    /// annotation are the anchor's and extension's joined with `;`.
    pub fn from_pair(
        anchor: &SourceRecord,
        extension: &SourceRecord,
        start: i64,
        end: i64,
        stage: Stage,
    ) -> Self {
        MergedRecord {
            chrom: anchor.chrom.clone(),
            start,
            end,
            strand: anchor.strand,
            length: (end - start).abs() + 1,
            id: anchor.id.clone(),
            segment: format!("{};{}", anchor.segment, extension.segment),
            annotation: format!("{};{}", anchor.annotation, extension.annotation),
            quality_score: anchor.quality_score.unwrap_or(0.0),
            stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strand_parsing() {
        assert_eq!("+".parse::<Strand>(), Ok(Strand::Positive));
        assert_eq!("-".parse::<Strand>(), Ok(Strand::Negative));
        assert!(".".parse::<Strand>().is_err());
    }

    #[test]
    fn test_unique_label_parsing() {
        assert_eq!("anchor-only".parse::<UniqueLabel>(), Ok(UniqueLabel::AnchorOnly));
        assert_eq!("extension-only".parse::<UniqueLabel>(), Ok(UniqueLabel::ExtensionOnly));
        assert!("both".parse::<UniqueLabel>().is_err());
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("12345"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("12a"));
        assert!(!is_numeric("-12"));
        assert!(!is_numeric("1.5"));
    }

    #[test]
    fn test_processed_is_sticky() {
        let mut record = SourceRecord::new(
            "X",
            "A",
            SourceKind::Anchor,
            "chrI",
            10,
            20,
            Strand::Positive,
            "7",
        );
        assert!(!record.is_processed());
        record.mark_processed();
        record.mark_processed();
        assert!(record.is_processed());
    }

    #[test]
    fn test_merged_record_from_pair() {
        let mut anchor = SourceRecord::new(
            "X",
            "A",
            SourceKind::Anchor,
            "chrI",
            10,
            20,
            Strand::Positive,
            "7",
        );
        let extension = SourceRecord::new(
            "X",
            "B",
            SourceKind::Extension,
            "chrI",
            25,
            40,
            Strand::Positive,
            "tx1",
        );
        let merged = MergedRecord::from_pair(&anchor, &extension, 10, 40, Stage::Greedy);
        assert_eq!(merged.length, 31);
        assert_eq!(merged.segment, "A;B");
        assert_eq!(merged.annotation, "7;tx1");
        assert_eq!(merged.quality_score, 0.0);

        anchor.quality_score = Some(12.0);
        let merged = MergedRecord::from_pair(&anchor, &extension, 40, 10, Stage::Greedy);
        assert_eq!(merged.length, 31);
        assert_eq!(merged.quality_score, 12.0);
    }

    #[test]
    fn test_cluster_set_chromosomes_in_order() {
        let set = ClusterSet::from_records(vec![
            ClusterRecord::new("chrII", 1, 2, Strand::Positive),
            ClusterRecord::new("chrI", 1, 2, Strand::Positive),
            ClusterRecord::new("chrII", 3, 4, Strand::Negative),
        ]);
        assert_eq!(set.chromosomes(), vec!["chrII", "chrI"]);
    }
}
