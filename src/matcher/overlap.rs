//! Cluster-gene overlap detection.
//!
//! Every cluster on a chromosome is checked against an interval index of the
//! genes on that chromosome, and annotated with the distinct names of the
//! genes it overlaps and of those lying on the opposite strand.

use indexmap::IndexSet;

use crate::error::Error;
use crate::index::{Interval, IntervalIndex};
use crate::types::{AnnotatedCluster, ClusterRecord, GeneRecord, Strand};

/// Build the per-chromosome gene index, keyed by `(name, strand)`.
fn build_gene_index<'a>(
    genes: &'a [GeneRecord],
    chromosome: &str,
) -> IntervalIndex<(&'a str, Strand)> {
    let intervals = genes
        .iter()
        .filter(|g| g.chrom == chromosome)
        .map(|g| Interval::new(g.start, g.end, (g.name.as_str(), g.strand)))
        .collect();
    let index = IntervalIndex::build(intervals);

    for iv in index.rejected() {
        let err = Error::InvalidInterval {
            chrom: chromosome.to_string(),
            start: iv.start,
            end: iv.end,
        };
        log::warn!("Skipping gene {}: {}", iv.val.0, err);
    }

    index
}

/// Annotate a single cluster against a prebuilt gene index.
fn annotate(cluster: &ClusterRecord, index: &IntervalIndex<(&str, Strand)>) -> AnnotatedCluster {
    let hits = index.find(cluster.start, cluster.end);

    let mut overlap: IndexSet<&str> = IndexSet::new();
    let mut antisense: IndexSet<&str> = IndexSet::new();
    for hit in hits {
        let (name, strand) = hit.val;
        overlap.insert(name);
        if strand != cluster.strand {
            antisense.insert(name);
        }
    }

    AnnotatedCluster {
        cluster: cluster.clone(),
        overlap_gene: join_names(&overlap),
        antisense_gene: join_names(&antisense),
    }
}

fn join_names(names: &IndexSet<&str>) -> String {
    names.iter().copied().collect::<Vec<_>>().join(",")
}

/// Annotate every cluster on `chromosome` with the genes it overlaps.
///
/// Clusters on other chromosomes are ignored. Clusters with `start > end`
/// are rejected with a warning and do not appear in the output. Gene names
/// are listed once each, in the order their intervals start.
pub fn detect_overlaps(
    clusters: &[ClusterRecord],
    genes: &[GeneRecord],
    chromosome: &str,
) -> Vec<AnnotatedCluster> {
    let index = build_gene_index(genes, chromosome);

    let mut results = Vec::new();
    for cluster in clusters.iter().filter(|c| c.chrom == chromosome) {
        if cluster.start > cluster.end {
            let err = Error::InvalidInterval {
                chrom: cluster.chrom.clone(),
                start: cluster.start,
                end: cluster.end,
            };
            log::warn!("Skipping cluster: {}", err);
            continue;
        }
        results.push(annotate(cluster, &index));
    }

    log::debug!(
        "{}: {} clusters annotated against {} genes",
        chromosome,
        results.len(),
        index.len()
    );
    results
}
