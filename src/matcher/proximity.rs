//! Bidirectional (divergent promoter) proximity detection.
//!
//! A window is laid around the 5' boundary of every gene on one strand, and
//! clusters on the opposite strand are looked up by their own 5'-most
//! coordinate:
//!
//! ```text
//!  plus genes:   window = gene_start - upstream ..= gene_start + downstream
//!                point  = minus cluster end,   gap = cluster.end - window.start
//!  minus genes:  window = gene_end - upstream   ..= gene_end + downstream
//!                point  = plus cluster start,  gap = window.end - cluster.start
//! ```
//!
//! Gene coordinates are 1-based inclusive, so both window edges are part of
//! the window; the half-open index interval is `[start, end + 1)`. Window
//! arithmetic saturates at the `i64` range.
//!
//! Every (cluster, window) hit is reported; nothing is deduplicated, so a
//! gene contributing several exon rows produces several hits.

use crate::error::Error;
use crate::index::{Interval, IntervalIndex};
use crate::types::{ClusterRecord, GeneRecord, ProximityHit, Strand};

/// A promoter window around a gene boundary, both edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window<'a> {
    gene: &'a str,
    start: i64,
    end: i64,
}

/// Which gene boundary a window is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Start,
    End,
}

/// Build the window index for genes of one strand on one chromosome.
fn build_window_index<'a>(
    genes: &'a [GeneRecord],
    chromosome: &str,
    strand: Strand,
    boundary: Boundary,
    upstream_gap: i64,
    downstream_gap: i64,
) -> IntervalIndex<Window<'a>> {
    let intervals = genes
        .iter()
        .filter(|g| g.chrom == chromosome && g.strand == strand)
        .map(|g| {
            let anchor = match boundary {
                Boundary::Start => g.start,
                Boundary::End => g.end,
            };
            let window = Window {
                gene: g.name.as_str(),
                start: anchor.saturating_sub(upstream_gap),
                end: anchor.saturating_add(downstream_gap),
            };
            Interval::new(window.start, window.end.saturating_add(1), window)
        })
        .collect();
    let index = IntervalIndex::build(intervals);

    for iv in index.rejected() {
        let err = Error::InvalidInterval {
            chrom: chromosome.to_string(),
            start: iv.val.start,
            end: iv.val.end,
        };
        log::warn!("Skipping window of gene {}: {}", iv.val.gene, err);
    }

    index
}

/// Find clusters lying in the promoter window of an opposite-strand gene.
///
/// Minus-strand clusters are reported first (matched against plus-strand
/// gene starts), followed by plus-strand clusters (matched against
/// minus-strand gene ends). Within a pass, clusters keep input order and
/// windows are listed in start order.
///
/// `gap` is the raw offset of the cluster's 5' end from the window edge and is not
/// clamped; it measures a position inside the window, not a distance to the
/// gene itself.
pub fn detect_bidirectional(
    clusters: &[ClusterRecord],
    genes: &[GeneRecord],
    chromosome: &str,
    upstream_gap: i64,
    downstream_gap: i64,
) -> Vec<ProximityHit> {
    let mut results = Vec::new();

    let plus_windows = build_window_index(
        genes,
        chromosome,
        Strand::Positive,
        Boundary::Start,
        upstream_gap,
        downstream_gap,
    );
    for cluster in clusters
        .iter()
        .filter(|c| c.chrom == chromosome && c.strand == Strand::Negative)
    {
        for hit in plus_windows.find_point(cluster.end) {
            results.push(ProximityHit {
                cluster: cluster.clone(),
                bidirect_gene: hit.val.gene.to_string(),
                gap: cluster.end.saturating_sub(hit.val.start),
            });
        }
    }

    let minus_windows = build_window_index(
        genes,
        chromosome,
        Strand::Negative,
        Boundary::End,
        upstream_gap,
        downstream_gap,
    );
    for cluster in clusters
        .iter()
        .filter(|c| c.chrom == chromosome && c.strand == Strand::Positive)
    {
        for hit in minus_windows.find_point(cluster.start) {
            results.push(ProximityHit {
                cluster: cluster.clone(),
                bidirect_gene: hit.val.gene.to_string(),
                gap: hit.val.end.saturating_sub(cluster.start),
            });
        }
    }

    log::debug!("{}: {} bidirectional candidates", chromosome, results.len());
    results
}
