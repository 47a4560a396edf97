//! Configuration and defaults for clustmatch.
//!
//! This module contains the configuration structure and default values
//! shared by the detectors and the merge engine.

use crate::error::Error;

/// Default distance upstream of a gene boundary covered by the bidirectional window.
pub const DEFAULT_UPSTREAM_GAP: i64 = 200;

/// Default distance downstream of a gene boundary covered by the bidirectional window.
pub const DEFAULT_DOWNSTREAM_GAP: i64 = 50;

/// Suffix of the cluster files picked up when a directory is given as input.
pub const CLUSTER_FILE_SUFFIX: &str = ".unassignedClusters.txt";

/// Configuration for detection and merging.
#[derive(Debug, Clone)]
pub struct Config {
    /// Window extent before the gene boundary in bp.
    pub upstream_gap: i64,
    /// Window extent after the gene boundary in bp.
    pub downstream_gap: i64,
    /// Chromosomes to analyse; empty means every chromosome in the cluster set.
    pub chromosomes: Vec<String>,
    /// Source label of anchor records.
    pub anchor_source: String,
    /// Source label of extension records.
    pub extension_source: String,
    /// Source label written on merged records.
    pub merged_source: String,
    /// Quality table column holding the annotation key.
    pub score_key_column: String,
    /// Quality table column holding the score.
    pub score_value_column: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            upstream_gap: DEFAULT_UPSTREAM_GAP,
            downstream_gap: DEFAULT_DOWNSTREAM_GAP,
            chromosomes: Vec::new(),
            anchor_source: "dcp2cage".to_string(),
            extension_source: "dcp2nanopore".to_string(),
            merged_source: "merged".to_string(),
            score_key_column: "cluster".to_string(),
            score_value_column: "tags_dcp2".to_string(),
        }
    }
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check values that would make the run meaningless.
    pub fn validate(&self) -> Result<(), Error> {
        if self.upstream_gap < 0 {
            return Err(Error::InvalidConfig(
                "the upstream gap cannot be lower than 0 bps".to_string(),
            ));
        }
        if self.downstream_gap < 0 {
            return Err(Error::InvalidConfig(
                "the downstream gap cannot be lower than 0 bps".to_string(),
            ));
        }
        if self.anchor_source == self.extension_source {
            return Err(Error::InvalidConfig(format!(
                "anchor and extension sources must differ (both are '{}')",
                self.anchor_source
            )));
        }
        Ok(())
    }

    /// Chromosomes to process for a cluster set, honouring an explicit selection.
    pub fn chromosomes_for(&self, available: Vec<String>) -> Vec<String> {
        if self.chromosomes.is_empty() {
            available
        } else {
            self.chromosomes.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.upstream_gap, 200);
        assert_eq!(config.downstream_gap, 50);
        assert!(config.chromosomes.is_empty());
        assert_eq!(config.anchor_source, "dcp2cage");
        assert_eq!(config.extension_source, "dcp2nanopore");
        assert_eq!(config.score_key_column, "cluster");
        assert_eq!(config.score_value_column, "tags_dcp2");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_gap_rejected() {
        let mut config = Config::new();
        config.upstream_gap = -1;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::new();
        config.downstream_gap = -5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_same_sources_rejected() {
        let mut config = Config::new();
        config.extension_source = config.anchor_source.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chromosome_selection() {
        let available = vec!["chrI".to_string(), "chrII".to_string()];
        let config = Config::new();
        assert_eq!(config.chromosomes_for(available.clone()), available);

        let mut config = Config::new();
        config.chromosomes = vec!["chrV".to_string()];
        assert_eq!(config.chromosomes_for(available), vec!["chrV"]);
    }
}
