//! Source record table parser.
//!
//! The table mixes anchor and extension rows; the channel of a row is read
//! from its source label column and mapped through [`Config`].
//!
//! A table previously written by the merge driver carries `Processed` and
//! `unique` columns. Their state is restored onto the records and the columns
//! are dropped from the kept header and fields, so writing the set again
//! yields a single pair.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::parser::table::{read_table, Table};
use crate::types::{SourceKind, SourceRecord, Strand, UniqueLabel};

/// State columns appended by [`crate::output::write_sources`].
const PROCESSED_COLUMN: &str = "Processed";
const UNIQUE_COLUMN: &str = "unique";

/// Source records together with the header of the table they came from.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub header: Vec<String>,
    pub records: Vec<SourceRecord>,
}

/// Parse a source record table.
pub fn parse_sources(path: &Path, config: &Config) -> Result<SourceSet> {
    let table = read_table(path)?;
    sources_from_table(table, config)
}

/// Build a [`SourceSet`] from an already parsed table.
pub fn sources_from_table(table: Table, config: &Config) -> Result<SourceSet> {
    let id_col = table.column(&["ID", "id"])?;
    let segment_col = table.column(&["segment"])?;
    let source_col = table.column(&["sourse", "source"])?;
    let chrom_col = table.column(&["chr", "chrom", "chromosome"])?;
    let start_col = table.column(&["start"])?;
    let end_col = table.column(&["end"])?;
    let strand_col = table.column(&["stand", "strand"])?;
    let annotation_col = table.column(&["annotation"])?;
    let processed_col = table.optional_column(&[PROCESSED_COLUMN]);
    let unique_col = table.optional_column(&[UNIQUE_COLUMN]);
    let is_state = |idx: usize| Some(idx) == processed_col || Some(idx) == unique_col;

    let mut records = Vec::with_capacity(table.rows.len());
    let mut skipped = 0usize;
    for row in &table.rows {
        let source = row.get(source_col);
        let kind = if source == config.anchor_source {
            SourceKind::Anchor
        } else if source == config.extension_source {
            SourceKind::Extension
        } else {
            log::warn!(
                "{} line {}: unknown source '{}', row ignored",
                table.name,
                row.line,
                source
            );
            skipped += 1;
            continue;
        };
        let strand = match row.get(strand_col).parse::<Strand>() {
            Ok(s) => s,
            Err(e) => {
                log::warn!("{} line {}: skipping record, {}", table.name, row.line, e);
                skipped += 1;
                continue;
            }
        };

        let mut record = SourceRecord::new(
            row.get(id_col),
            row.get(segment_col),
            kind,
            row.get(chrom_col),
            table.parse_i64(row, start_col)?,
            table.parse_i64(row, end_col)?,
            strand,
            row.get(annotation_col),
        );
        if let Some(col) = processed_col {
            match row.get(col) {
                "True" | "true" => record.mark_processed(),
                "False" | "false" | "" => {}
                other => log::warn!(
                    "{} line {}: unrecognised {} value '{}'",
                    table.name,
                    row.line,
                    PROCESSED_COLUMN,
                    other
                ),
            }
        }
        if let Some(col) = unique_col {
            let value = row.get(col);
            if !value.is_empty() {
                match value.parse::<UniqueLabel>() {
                    Ok(label) => {
                        record.label = Some(label);
                        record.mark_processed();
                    }
                    Err(e) => log::warn!("{} line {}: {}", table.name, row.line, e),
                }
            }
        }
        record.fields = row
            .fields
            .iter()
            .enumerate()
            .filter(|&(idx, _)| !is_state(idx))
            .map(|(_, f)| f.clone())
            .collect();
        records.push(record);
    }

    if skipped > 0 {
        log::warn!("{}: {} rows skipped", table.name, skipped);
    }
    let header = table
        .header
        .iter()
        .enumerate()
        .filter(|&(idx, _)| !is_state(idx))
        .map(|(_, h)| h.clone())
        .collect();
    Ok(SourceSet { header, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::table::read_table_from;

    const HEADER: &str = "chr,start,end,stand,Length,ID,segment,sourse,annotation\n";

    fn parse(body: &str) -> Result<SourceSet> {
        let content = format!("{}{}", HEADER, body);
        let table = read_table_from(content.as_bytes(), b',', "sources")?;
        sources_from_table(table, &Config::default())
    }

    #[test]
    fn test_parse_sources_maps_channels() {
        let set = parse(
            "chrI,10,20,+,11,X,A,dcp2cage,101\nchrI,25,40,+,16,X,A,dcp2nanopore,G1.1\n",
        )
        .unwrap();
        assert_eq!(set.header.len(), 9);
        assert_eq!(set.records.len(), 2);
        assert!(set.records[0].is_anchor());
        assert!(set.records[1].is_extension());
        assert_eq!(set.records[1].annotation, "G1.1");
        assert_eq!(set.records[0].fields[4], "11");
        assert!(!set.records[0].is_processed());
    }

    #[test]
    fn test_unknown_source_skipped() {
        let set = parse("chrI,10,20,+,11,X,A,other,1\nchrI,10,20,-,11,X,A,dcp2cage,1\n").unwrap();
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.records[0].strand, Strand::Negative);
    }

    #[test]
    fn test_custom_source_labels() {
        let content = format!("{}chrI,1,2,+,2,X,A,cage,1\n", HEADER);
        let table = read_table_from(content.as_bytes(), b',', "sources").unwrap();
        let config = Config {
            anchor_source: "cage".to_string(),
            ..Config::default()
        };
        let set = sources_from_table(table, &config).unwrap();
        assert!(set.records[0].is_anchor());
    }

    #[test]
    fn test_missing_annotation_column() {
        let table =
            read_table_from("ID,segment\nX,A\n".as_bytes(), b',', "sources").unwrap();
        assert!(sources_from_table(table, &Config::default()).is_err());
    }

    #[test]
    fn test_state_columns_restored_and_dropped() {
        let content = "chr,start,end,stand,ID,segment,sourse,annotation,Processed,unique\n\
                       chrI,10,20,+,X,A,dcp2cage,101,True,\n\
                       chrI,50,60,+,Y,B,dcp2cage,102,True,anchor-only\n\
                       chrI,70,80,+,Z,B,dcp2nanopore,t,False,\n";
        let table = read_table_from(content.as_bytes(), b',', "sources").unwrap();
        let set = sources_from_table(table, &Config::default()).unwrap();

        assert_eq!(set.header.len(), 8);
        assert!(!set.header.iter().any(|h| h == "Processed" || h == "unique"));
        assert_eq!(set.records[0].fields.len(), 8);

        assert!(set.records[0].is_processed());
        assert_eq!(set.records[0].label, None);
        assert!(set.records[1].is_processed());
        assert_eq!(set.records[1].label, Some(UniqueLabel::AnchorOnly));
        assert!(!set.records[2].is_processed());
    }
}
