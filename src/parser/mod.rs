//! Parsers for the delimited input tables.

pub mod cluster;
pub mod gene;
pub mod scores;
pub mod source;
pub mod table;

pub use cluster::parse_clusters;
pub use gene::parse_genes;
pub use scores::parse_scores;
pub use source::{parse_sources, SourceSet};
pub use table::{delimiter_for, open_reader, read_table, Table};
