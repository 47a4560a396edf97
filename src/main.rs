//! CLI entry point for clustmatch.
//!
//! `detect` annotates cluster files against a gene table; `merge` runs the
//! anchor/extension association pipeline over a source record table.

use ahash::AHashMap;
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clustmatch::config::{Config, CLUSTER_FILE_SUFFIX};
use clustmatch::matcher::{detect_bidirectional, detect_overlaps};
use clustmatch::merge::associate_records;
use clustmatch::output::{create_writer, write_annotated, write_merged, write_proximity, write_sources};
use clustmatch::parser::{delimiter_for, parse_clusters, parse_genes, parse_scores, parse_sources};
use clustmatch::types::{AnnotatedCluster, GeneRecord, ProximityHit};

/// Cluster annotation and anchor/extension record merging.
#[derive(Parser, Debug)]
#[command(name = "clustmatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate cluster files with overlapping and bidirectional genes
    Detect(DetectArgs),
    /// Merge anchor and extension records sharing an ID
    Merge(MergeArgs),
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Cluster files, or directories scanned for `*.unassignedClusters.txt`
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Gene (exon) annotation table
    #[arg(short = 'g', long = "genes")]
    genes: PathBuf,

    /// Output directory (created if missing)
    #[arg(short = 'o', long = "output-dir")]
    output_dir: PathBuf,

    /// Window extent upstream of the gene boundary in bp
    #[arg(short = 'u', long = "upstream", default_value = "200")]
    upstream: i64,

    /// Window extent downstream of the gene boundary in bp
    #[arg(short = 'd', long = "downstream", default_value = "50")]
    downstream: i64,

    /// Chromosomes to analyse (comma-separated); default is all
    #[arg(short = 'c', long = "chromosomes", value_delimiter = ',')]
    chromosomes: Vec<String>,

    /// Number of worker threads (0 = auto-detect, 1 = sequential)
    #[arg(long = "threads", short = 'j', default_value = "8")]
    threads: usize,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Source record table (anchor and extension rows)
    #[arg(short = 'r', long = "records")]
    records: PathBuf,

    /// Quality score table
    #[arg(short = 's', long = "scores")]
    scores: PathBuf,

    /// Output file for merged records
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Output file for the source records with their final state
    #[arg(short = 'u', long = "updated")]
    updated: PathBuf,

    /// Source label of anchor rows
    #[arg(long = "anchor-source", default_value = "dcp2cage")]
    anchor_source: String,

    /// Source label of extension rows
    #[arg(long = "extension-source", default_value = "dcp2nanopore")]
    extension_source: String,

    /// Source label written on merged rows
    #[arg(long = "merged-source", default_value = "merged")]
    merged_source: String,

    /// Score table column holding the annotation key
    #[arg(long = "score-key", default_value = "cluster")]
    score_key: String,

    /// Score table column holding the score
    #[arg(long = "score-column", default_value = "tags_dcp2")]
    score_column: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let start = Instant::now();
    match cli.command {
        Command::Detect(args) => run_detect(&args)?,
        Command::Merge(args) => run_merge(&args)?,
    }
    log::info!("Done in {:.2?}", start.elapsed());
    Ok(())
}

/// Expand directories into the cluster files they contain, sorted by name.
fn collect_cluster_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)
                .with_context(|| format!("Failed to read directory {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.is_file()
                        && p.file_name()
                            .map(|n| n.to_string_lossy().ends_with(CLUSTER_FILE_SUFFIX))
                            .unwrap_or(false)
                })
                .collect();
            found.sort();
            if found.is_empty() {
                log::warn!("No *{} files in {}", CLUSTER_FILE_SUFFIX, input.display());
            }
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            bail!("Cluster input not found: {}", input.display());
        }
    }
    Ok(files)
}

fn run_detect(args: &DetectArgs) -> Result<()> {
    if !args.genes.exists() {
        bail!("Gene file not found: {}", args.genes.display());
    }

    let config = Config {
        upstream_gap: args.upstream,
        downstream_gap: args.downstream,
        chromosomes: args.chromosomes.clone(),
        ..Config::default()
    };
    config.validate()?;

    let num_threads = if args.threads == 0 {
        num_cpus::get()
    } else {
        args.threads
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .context("Failed to build thread pool")?;

    let files = collect_cluster_files(&args.inputs)?;
    if files.is_empty() {
        bail!("No cluster files to process");
    }

    log::info!("Parsing gene file: {}", args.genes.display());
    let genes = parse_genes(&args.genes)?;
    let mut genes_by_chrom: AHashMap<String, Vec<GeneRecord>> = AHashMap::new();
    for gene in genes {
        genes_by_chrom.entry(gene.chrom.clone()).or_default().push(gene);
    }

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Failed to create output directory {}", args.output_dir.display())
    })?;

    log::info!("Using {} threads", num_threads);
    for file in &files {
        detect_file(file, &genes_by_chrom, &config, &pool, &args.output_dir)?;
    }
    Ok(())
}

/// Run both detectors over one cluster file, one chromosome per task.
fn detect_file(
    path: &Path,
    genes_by_chrom: &AHashMap<String, Vec<GeneRecord>>,
    config: &Config,
    pool: &rayon::ThreadPool,
    output_dir: &Path,
) -> Result<()> {
    log::info!("Processing cluster file: {}", path.display());
    let clusters = parse_clusters(path)?;
    let chromosomes = config.chromosomes_for(clusters.chromosomes());

    let per_chrom: Vec<(Vec<ProximityHit>, Vec<AnnotatedCluster>)> = pool.install(|| {
        chromosomes
            .par_iter()
            .map(|chrom| {
                let genes = genes_by_chrom.get(chrom).map(Vec::as_slice).unwrap_or(&[]);
                if genes.is_empty() {
                    log::debug!("{}: no genes on this chromosome", chrom);
                }
                let hits = detect_bidirectional(
                    &clusters.records,
                    genes,
                    chrom,
                    config.upstream_gap,
                    config.downstream_gap,
                );
                let annotated = detect_overlaps(&clusters.records, genes, chrom);
                (hits, annotated)
            })
            .collect()
    });

    let (hits, annotated): (Vec<_>, Vec<_>) = per_chrom.into_iter().unzip();
    let hits: Vec<ProximityHit> = hits.into_iter().flatten().collect();
    let annotated: Vec<AnnotatedCluster> = annotated.into_iter().flatten().collect();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clusters".to_string());

    let bidirectional_path = output_dir.join(format!("{}_bidirectional.csv", name));
    let mut out = create_writer(&bidirectional_path)?;
    write_proximity(&mut out, &clusters.header, &hits, delimiter_for(&bidirectional_path))?;
    out.finish()?;

    let overlap_path = output_dir.join(format!("{}_overlap.csv", name));
    let mut out = create_writer(&overlap_path)?;
    write_annotated(&mut out, &clusters.header, &annotated, delimiter_for(&overlap_path))?;
    out.finish()?;

    log::info!(
        "{}: {} bidirectional hits, {} annotated clusters",
        name,
        hits.len(),
        annotated.len()
    );
    Ok(())
}

fn run_merge(args: &MergeArgs) -> Result<()> {
    if !args.records.exists() {
        bail!("Record file not found: {}", args.records.display());
    }
    if !args.scores.exists() {
        bail!("Score file not found: {}", args.scores.display());
    }

    let config = Config {
        anchor_source: args.anchor_source.clone(),
        extension_source: args.extension_source.clone(),
        merged_source: args.merged_source.clone(),
        score_key_column: args.score_key.clone(),
        score_value_column: args.score_column.clone(),
        ..Config::default()
    };
    config.validate()?;

    log::info!("Parsing record file: {}", args.records.display());
    let sources = parse_sources(&args.records, &config)?;
    let scores = parse_scores(
        &args.scores,
        &config.score_key_column,
        &config.score_value_column,
    )?;
    log::info!(
        "{} records, {} quality scores",
        sources.records.len(),
        scores.len()
    );

    let (merged, records) = associate_records(sources.records, &scores);

    log::info!("Writing merged records to: {}", args.output.display());
    let mut out = create_writer(&args.output)?;
    write_merged(&mut out, &merged, &config.merged_source, delimiter_for(&args.output))?;
    out.finish()?;

    log::info!("Writing updated records to: {}", args.updated.display());
    let mut out = create_writer(&args.updated)?;
    write_sources(&mut out, &sources.header, &records, delimiter_for(&args.updated))?;
    out.finish()?;

    Ok(())
}
