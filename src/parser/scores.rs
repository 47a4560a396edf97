//! Quality-score table parser.

use anyhow::Result;
use std::path::Path;

use crate::merge::QualityScores;
use crate::parser::table::{read_table, Table};

/// Parse a quality table, keyed by `key_column` with scores in `value_column`.
pub fn parse_scores(path: &Path, key_column: &str, value_column: &str) -> Result<QualityScores> {
    let table = read_table(path)?;
    scores_from_table(&table, key_column, value_column)
}

/// Build a [`QualityScores`] lookup from an already parsed table.
///
/// Rows with an empty or non-numeric score are dropped. A key seen twice
/// keeps its last score.
pub fn scores_from_table(
    table: &Table,
    key_column: &str,
    value_column: &str,
) -> Result<QualityScores> {
    let key_col = table.column(&[key_column])?;
    let value_col = table.column(&[value_column])?;

    let mut scores = QualityScores::new();
    let mut dropped = 0usize;
    for row in &table.rows {
        match row.get(value_col).parse::<f64>() {
            Ok(v) if v.is_finite() => scores.insert(row.get(key_col), v),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("{}: {} rows without a score dropped", table.name, dropped);
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::table::read_table_from;

    #[test]
    fn test_scores_drop_missing_values() {
        let content = "cluster,tags_dcp2,other\n101,12,x\n102,,y\n103,NA,z\n104,3.5,w\n";
        let table = read_table_from(content.as_bytes(), b',', "tags").unwrap();
        let scores = scores_from_table(&table, "cluster", "tags_dcp2").unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.get("101"), Some(12.0));
        assert_eq!(scores.get("104"), Some(3.5));
        assert_eq!(scores.get("103"), None);
    }

    #[test]
    fn test_scores_missing_column() {
        let table = read_table_from("cluster\n1\n".as_bytes(), b',', "tags").unwrap();
        assert!(scores_from_table(&table, "cluster", "tags_dcp2").is_err());
    }
}
