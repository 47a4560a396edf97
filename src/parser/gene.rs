//! Gene (exon) annotation table parser.
//!
//! Accepts either the `chromosome, strand, gene_start, gene_end, gene_name`
//! layout or the shorter `chr, start, end, strand, name` one.

use anyhow::Result;
use std::path::Path;

use crate::parser::table::{read_table, Table};
use crate::types::{GeneRecord, Strand};

/// Parse a gene table (comma-separated when named `.csv`, optionally gzipped).
pub fn parse_genes(path: &Path) -> Result<Vec<GeneRecord>> {
    let table = read_table(path)?;
    genes_from_table(&table)
}

/// Build gene records from an already parsed table.
pub fn genes_from_table(table: &Table) -> Result<Vec<GeneRecord>> {
    let chrom_col = table.column(&["chromosome", "chr", "chrom"])?;
    let start_col = table.column(&["gene_start", "start"])?;
    let end_col = table.column(&["gene_end", "end"])?;
    let strand_col = table.column(&["strand"])?;
    let name_col = table.column(&["gene_name", "name"])?;

    let mut genes = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let strand = match row.get(strand_col).parse::<Strand>() {
            Ok(s) => s,
            Err(e) => {
                log::warn!("{} line {}: skipping gene, {}", table.name, row.line, e);
                continue;
            }
        };
        genes.push(GeneRecord {
            chrom: row.get(chrom_col).to_string(),
            start: table.parse_i64(row, start_col)?,
            end: table.parse_i64(row, end_col)?,
            strand,
            name: row.get(name_col).to_string(),
        });
    }

    log::debug!("{}: {} gene intervals", table.name, genes.len());
    Ok(genes)
}
