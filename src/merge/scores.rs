//! Quality-score lookup keyed by annotation.

use ahash::AHashMap;

/// Side table mapping an annotation to its quality score.
#[derive(Debug, Clone, Default)]
pub struct QualityScores {
    by_annotation: AHashMap<String, f64>,
}

impl QualityScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the score of an annotation.
    pub fn insert(&mut self, annotation: &str, score: f64) {
        self.by_annotation.insert(annotation.to_string(), score);
    }

    /// Score of `annotation`, if the table has one.
    pub fn get(&self, annotation: &str) -> Option<f64> {
        self.by_annotation.get(annotation).copied()
    }

    /// Score of `annotation`, or 0 when the table has none.
    pub fn score(&self, annotation: &str) -> f64 {
        self.get(annotation).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.by_annotation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_annotation.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for QualityScores {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        QualityScores {
            by_annotation: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_score_defaults_to_zero() {
        let scores: QualityScores = vec![("101", 12.5)].into_iter().collect();
        assert_eq!(scores.get("101"), Some(12.5));
        assert_eq!(scores.get("102"), None);
        assert_eq!(scores.score("102"), 0.0);
        assert_eq!(scores.len(), 1);
    }
}
