//! Delimited text tables with a header line.
//!
//! Both comma- and tab-separated files are supported, plain or gzipped. The
//! delimiter is picked from the file name: `.csv` / `.csv.gz` are read as
//! comma-separated, everything else as tab-separated.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::Error;

/// Opens `path` for buffered reading, decompressing `.gz` files on the fly.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    if path.to_string_lossy().ends_with(".gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Field delimiter implied by a file name.
pub fn delimiter_for(path: &Path) -> u8 {
    let name = path.to_string_lossy();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    if name.ends_with(".csv") {
        b','
    } else {
        b'\t'
    }
}

/// One data line of a table.
#[derive(Debug, Clone)]
pub struct Row {
    /// 1-based line number in the source file.
    pub line: usize,
    pub fields: Vec<String>,
}

impl Row {
    /// Field at `idx`, or the empty string for short rows.
    pub fn get(&self, idx: usize) -> &str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }
}

/// A parsed table.
#[derive(Debug, Clone)]
pub struct Table {
    /// Name used in error messages (usually the file path).
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Index of the first column matching any of `aliases`.
    pub fn column(&self, aliases: &[&str]) -> Result<usize, Error> {
        self.optional_column(aliases)
            .ok_or_else(|| Error::MissingColumn {
                column: aliases.join("|"),
                table: self.name.clone(),
            })
    }

    pub fn optional_column(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|alias| self.header.iter().position(|h| h == alias))
    }

    /// Parse an integer coordinate, accepting integral floats such as `100.0`.
    pub fn parse_i64(&self, row: &Row, idx: usize) -> Result<i64, Error> {
        let raw = row.get(idx);
        parse_coordinate(raw).ok_or_else(|| Error::InvalidValue {
            table: self.name.clone(),
            line: row.line,
            column: self.header[idx].clone(),
            value: raw.to_string(),
        })
    }
}

fn parse_coordinate(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let v: f64 = raw.parse().ok()?;
    if v.is_finite() && v.fract() == 0.0 {
        Some(v as i64)
    } else {
        None
    }
}

/// Read a table from a file.
pub fn read_table(path: &Path) -> Result<Table> {
    let reader = open_reader(path)?;
    read_table_from(reader, delimiter_for(path), &path.display().to_string())
}

/// Read a table from any reader.
///
/// The first record is the header. Blank lines are skipped and rows may be
/// shorter or longer than the header.
pub fn read_table_from<R: Read>(reader: R, delimiter: u8, name: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", name))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.with_context(|| format!("Failed to read {}", name))?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        rows.push(Row {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(Table {
        name: name.to_string(),
        header,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_for() {
        assert_eq!(delimiter_for(Path::new("genes.csv")), b',');
        assert_eq!(delimiter_for(Path::new("genes.csv.gz")), b',');
        assert_eq!(delimiter_for(Path::new("a.unassignedClusters.txt")), b'\t');
        assert_eq!(delimiter_for(Path::new("a.tsv.gz")), b'\t');
    }

    #[test]
    fn test_read_table_skips_empty_lines() {
        let content = "chr,start,end\n\nchrI,1,2\r\nchrII,3,4\n";
        let table = read_table_from(content.as_bytes(), b',', "t").unwrap();
        assert_eq!(table.header, vec!["chr", "start", "end"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get(0), "chrI");
        assert_eq!(table.rows[1].get(2), "4");
        assert_eq!(table.rows[1].get(7), "");
    }

    #[test]
    fn test_quoted_fields() {
        let content = "\"ID\",\"segment\",\"genes\"\n\"X\",\"A;B\",\"G1,G2\"\n";
        let table = read_table_from(content.as_bytes(), b',', "t").unwrap();
        assert_eq!(table.header, vec!["ID", "segment", "genes"]);
        assert_eq!(table.rows[0].get(1), "A;B");
        assert_eq!(table.rows[0].get(2), "G1,G2");
    }

    #[test]
    fn test_ragged_rows_accepted() {
        let content = "chr\tstart\tend\nchrI\t1\nchrI\t1\t2\textra\n";
        let table = read_table_from(content.as_bytes(), b'\t', "t").unwrap();
        assert_eq!(table.rows[0].fields.len(), 2);
        assert_eq!(table.rows[1].fields.len(), 4);
    }

    #[test]
    fn test_column_aliases_and_missing() {
        let content = "chrom\tstart\n";
        let table = read_table_from(content.as_bytes(), b'\t', "t").unwrap();
        assert_eq!(table.column(&["chr", "chrom"]).unwrap(), 0);
        let err = table.column(&["end"]).unwrap_err();
        assert_eq!(
            err,
            Error::MissingColumn {
                column: "end".to_string(),
                table: "t".to_string()
            }
        );
    }

    #[test]
    fn test_parse_coordinates() {
        let content = "start\n100\n100.0\n1e2\nabc\n";
        let table = read_table_from(content.as_bytes(), b'\t', "t").unwrap();
        assert_eq!(table.parse_i64(&table.rows[0], 0).unwrap(), 100);
        assert_eq!(table.parse_i64(&table.rows[1], 0).unwrap(), 100);
        assert_eq!(table.parse_i64(&table.rows[2], 0).unwrap(), 100);
        assert!(matches!(
            table.parse_i64(&table.rows[3], 0),
            Err(Error::InvalidValue { line: 5, .. })
        ));
    }
}
