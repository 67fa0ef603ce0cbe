use serde::Deserialize;
use shared::{ConfusionMatrix, Metrics};

/// Historical accuracy figures attached verbatim to every result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub confusion_matrix: ConfusionMatrix,
    pub metrics: Metrics,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            confusion_matrix: ConfusionMatrix {
                true_positives: 92,
                false_positives: 2,
                true_negatives: 5,
                false_negatives: 1,
            },
            metrics: Metrics {
                accuracy: 0.97,
                precision: 0.98,
                recall: 0.99,
                f1_score: 0.98,
            },
        }
    }
}

impl MetricsSnapshot {
    /// Derives the scalar metrics from raw counts. Zero denominators give 0.
    pub fn from_confusion_matrix(matrix: ConfusionMatrix) -> Self {
        let tp = matrix.true_positives as f64;
        let fp = matrix.false_positives as f64;
        let tn = matrix.true_negatives as f64;
        let fn_ = matrix.false_negatives as f64;

        let accuracy = ratio(tp + tn, tp + fp + tn + fn_);
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = ratio(2.0 * precision * recall, precision + recall);

        Self {
            confusion_matrix: matrix,
            metrics: Metrics {
                accuracy,
                precision,
                recall,
                f1_score,
            },
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// `metrics` section of the pipeline YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsConfig {
    pub confusion_matrix: ConfusionMatrix,
    #[serde(default)]
    pub metrics: Option<Metrics>,
}

impl From<MetricsConfig> for MetricsSnapshot {
    fn from(config: MetricsConfig) -> Self {
        match config.metrics {
            Some(metrics) => Self {
                confusion_matrix: config.confusion_matrix,
                metrics,
            },
            None => Self::from_confusion_matrix(config.confusion_matrix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_matches_published_figures() {
        let snapshot = MetricsSnapshot::default();
        assert_eq!(snapshot.confusion_matrix.true_positives, 92);
        assert_eq!(snapshot.confusion_matrix.false_positives, 2);
        assert_eq!(snapshot.confusion_matrix.true_negatives, 5);
        assert_eq!(snapshot.confusion_matrix.false_negatives, 1);
        assert_eq!(snapshot.metrics.accuracy, 0.97);
        assert_eq!(snapshot.metrics.precision, 0.98);
        assert_eq!(snapshot.metrics.recall, 0.99);
        assert_eq!(snapshot.metrics.f1_score, 0.98);
    }

    #[test]
    fn derives_metrics_from_counts() {
        let snapshot = MetricsSnapshot::from_confusion_matrix(ConfusionMatrix {
            true_positives: 8,
            false_positives: 2,
            true_negatives: 6,
            false_negatives: 4,
        });
        assert!((snapshot.metrics.accuracy - 0.7).abs() < 1e-12);
        assert!((snapshot.metrics.precision - 0.8).abs() < 1e-12);
        assert!((snapshot.metrics.recall - 8.0 / 12.0).abs() < 1e-12);
        let expected_f1 = 2.0 * 0.8 * (8.0 / 12.0) / (0.8 + 8.0 / 12.0);
        assert!((snapshot.metrics.f1_score - expected_f1).abs() < 1e-12);
    }

    #[test]
    fn empty_counts_give_zero_metrics() {
        let snapshot = MetricsSnapshot::from_confusion_matrix(ConfusionMatrix {
            true_positives: 0,
            false_positives: 0,
            true_negatives: 0,
            false_negatives: 0,
        });
        assert_eq!(snapshot.metrics.accuracy, 0.0);
        assert_eq!(snapshot.metrics.f1_score, 0.0);
    }

    #[test]
    fn explicit_metrics_are_kept_verbatim() {
        let config: MetricsConfig = serde_yaml::from_str(
            "confusionMatrix:\n  truePositives: 1\n  falsePositives: 1\n  trueNegatives: 1\n  falseNegatives: 1\nmetrics:\n  accuracy: 0.9\n  precision: 0.8\n  recall: 0.7\n  f1Score: 0.6\n",
        )
        .unwrap();
        let snapshot = MetricsSnapshot::from(config);
        assert_eq!(snapshot.metrics.f1_score, 0.6);
        assert_eq!(snapshot.confusion_matrix.true_positives, 1);
    }
}
