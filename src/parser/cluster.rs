//! Cluster table parser.
//!
//! Cluster files are the `.unassignedClusters.txt` tables produced upstream:
//! one row per cluster with at least `chr`, `strand`, `start` and `end`
//! columns. All columns are kept so the annotated output can echo them.

use anyhow::Result;
use std::path::Path;

use crate::parser::table::{read_table, Table};
use crate::types::{ClusterRecord, ClusterSet, Strand};

/// Parse a cluster file (tab-separated unless named `.csv`, optionally gzipped).
pub fn parse_clusters(path: &Path) -> Result<ClusterSet> {
    let table = read_table(path)?;
    clusters_from_table(table)
}

/// Build a [`ClusterSet`] from an already parsed table.
pub fn clusters_from_table(table: Table) -> Result<ClusterSet> {
    let chrom_col = table.column(&["chr", "chrom", "chromosome"])?;
    let start_col = table.column(&["start"])?;
    let end_col = table.column(&["end"])?;
    let strand_col = table.column(&["strand"])?;

    let mut records = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let strand = match row.get(strand_col).parse::<Strand>() {
            Ok(s) => s,
            Err(e) => {
                log::warn!("{} line {}: skipping cluster, {}", table.name, row.line, e);
                continue;
            }
        };
        records.push(ClusterRecord {
            chrom: row.get(chrom_col).to_string(),
            start: table.parse_i64(row, start_col)?,
            end: table.parse_i64(row, end_col)?,
            strand,
            fields: row.fields.clone(),
        });
    }

    log::debug!("{}: {} clusters", table.name, records.len());
    Ok(ClusterSet {
        header: table.header,
        records,
    })
}
