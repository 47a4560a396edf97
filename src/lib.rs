//! clustmatch - cluster annotation and anchor/extension record merging.
//!
//! This library provides two independent pipelines over genomic interval
//! tables:
//!
//! - **Detection**: annotate read clusters with the genes they overlap
//!   (and those overlapping on the opposite strand), and find clusters in
//!   the promoter window of an opposite-strand gene (bidirectional
//!   candidates). Both are backed by a static [`IntervalIndex`].
//! - **Merging**: consolidate anchor-channel and extension-channel records
//!   sharing an ID into composite records with a four-stage
//!   [`RecordAssociationEngine`].
//!
//! # Example
//!
//! ```ignore
//! use clustmatch::matcher::{detect_bidirectional, detect_overlaps};
//! use clustmatch::parser::{parse_clusters, parse_genes};
//! use std::path::Path;
//!
//! let clusters = parse_clusters(Path::new("sample.unassignedClusters.txt"))?;
//! let genes = parse_genes(Path::new("exons.csv"))?;
//!
//! for chrom in clusters.chromosomes() {
//!     let annotated = detect_overlaps(&clusters.records, &genes, &chrom);
//!     let hits = detect_bidirectional(&clusters.records, &genes, &chrom, 200, 50);
//!     // Write results...
//! }
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod matcher;
pub mod merge;
pub mod output;
pub mod parser;
pub mod types;

pub use config::Config;
pub use error::Error;
pub use index::{Interval, IntervalIndex};
pub use merge::{associate_records, MergeSummary, QualityScores, RecordAssociationEngine, RecordStore};
pub use types::{
    AnnotatedCluster, ClusterRecord, ClusterSet, GeneRecord, MergedRecord, ProximityHit,
    SourceKind, SourceRecord, Stage, Strand, UniqueLabel,
};
