//! Output formatting for clustmatch results.
//!
//! Rows are built as plain field lists and written through a
//! [`csv::Writer`], so the same formatting serves tab- and comma-separated
//! outputs and fields containing the delimiter are quoted.

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::types::{AnnotatedCluster, MergedRecord, ProximityHit, SourceRecord};

/// Columns of the merged record table.
pub const MERGED_HEADER: [&str; 10] = [
    "chr",
    "start",
    "end",
    "stand",
    "Length",
    "ID",
    "segment",
    "sourse",
    "annotation",
    "tags_dcp2",
];

/// An output file, gzip-compressed when its name ends in `.gz`.
///
/// Call [`OutputFile::finish`] once writing is done; it flushes the buffer
/// and writes the gzip trailer, reporting any I/O error.
pub enum OutputFile {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl OutputFile {
    pub fn finish(self) -> Result<()> {
        match self {
            OutputFile::Plain(mut writer) => writer.flush()?,
            OutputFile::Gzip(encoder) => {
                let mut writer = encoder.finish().context("Failed to finish gzip stream")?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputFile::Plain(w) => w.write(buf),
            OutputFile::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputFile::Plain(w) => w.flush(),
            OutputFile::Gzip(w) => w.flush(),
        }
    }
}

/// Create an output file for `path`.
pub fn create_writer(path: &Path) -> Result<OutputFile> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    let writer = BufWriter::new(file);
    if path.to_string_lossy().ends_with(".gz") {
        Ok(OutputFile::Gzip(GzEncoder::new(writer, Compression::default())))
    } else {
        Ok(OutputFile::Plain(writer))
    }
}

fn table_writer<W: Write>(writer: W, delimiter: u8) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(writer)
}

fn write_rows<W, I>(writer: W, delimiter: u8, header: Vec<String>, rows: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = Vec<String>>,
{
    let mut out = table_writer(writer, delimiter);
    out.write_record(&header)?;
    for row in rows {
        out.write_record(&row)?;
    }
    out.flush()?;
    Ok(())
}

fn extend_header(header: &[String], extra: &[&str]) -> Vec<String> {
    header
        .iter()
        .cloned()
        .chain(extra.iter().map(|s| s.to_string()))
        .collect()
}

/// Scores are written without a trailing `.0` when integral.
pub fn format_score(score: f64) -> String {
    format!("{}", score)
}

/// Fields of one annotated cluster: its original columns plus the two gene columns.
pub fn annotated_row(annotated: &AnnotatedCluster) -> Vec<String> {
    let mut row = annotated.cluster.fields.clone();
    row.push(annotated.overlap_gene.clone());
    row.push(annotated.antisense_gene.clone());
    row
}

/// Write annotated clusters under `header` + `overlap_gene`, `antisense_gene`.
pub fn write_annotated<W: Write>(
    writer: W,
    header: &[String],
    annotated: &[AnnotatedCluster],
    delimiter: u8,
) -> Result<()> {
    write_rows(
        writer,
        delimiter,
        extend_header(header, &["overlap_gene", "antisense_gene"]),
        annotated.iter().map(annotated_row),
    )
}

/// Fields of one proximity hit: the cluster's original columns plus gene and gap.
pub fn proximity_row(hit: &ProximityHit) -> Vec<String> {
    let mut row = hit.cluster.fields.clone();
    row.push(hit.bidirect_gene.clone());
    row.push(hit.gap.to_string());
    row
}

/// Write proximity hits under `header` + `bidirect_gene`, `gap`.
pub fn write_proximity<W: Write>(
    writer: W,
    header: &[String],
    hits: &[ProximityHit],
    delimiter: u8,
) -> Result<()> {
    write_rows(
        writer,
        delimiter,
        extend_header(header, &["bidirect_gene", "gap"]),
        hits.iter().map(proximity_row),
    )
}

/// Fields of one merged record, labelled with `source`.
pub fn merged_row(record: &MergedRecord, source: &str) -> Vec<String> {
    vec![
        record.chrom.clone(),
        record.start.to_string(),
        record.end.to_string(),
        record.strand.to_string(),
        record.length.to_string(),
        record.id.clone(),
        record.segment.clone(),
        source.to_string(),
        record.annotation.clone(),
        format_score(record.quality_score),
    ]
}

/// Write merged records with the [`MERGED_HEADER`] columns.
pub fn write_merged<W: Write>(
    writer: W,
    merged: &[MergedRecord],
    source: &str,
    delimiter: u8,
) -> Result<()> {
    write_rows(
        writer,
        delimiter,
        extend_header(&[], &MERGED_HEADER),
        merged.iter().map(|r| merged_row(r, source)),
    )
}

/// Fields of one source record: its original columns plus `Processed` and `unique`.
pub fn source_row(record: &SourceRecord) -> Vec<String> {
    let mut row = record.fields.clone();
    row.push(if record.is_processed() { "True" } else { "False" }.to_string());
    row.push(record.label.map(|l| l.as_str()).unwrap_or("").to_string());
    row
}

/// Write source records with their final state.
pub fn write_sources<W: Write>(
    writer: W,
    header: &[String],
    records: &[SourceRecord],
    delimiter: u8,
) -> Result<()> {
    write_rows(
        writer,
        delimiter,
        extend_header(header, &["Processed", "unique"]),
        records.iter().map(source_row),
    )
}
