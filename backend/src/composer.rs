use chrono::Utc;
use shared::{ResultData, ResultRecord, ValidationResult};
use uuid::Uuid;

use crate::classifier::ClassificationOutcome;
use crate::metrics::MetricsSnapshot;

pub const SUCCESS_MESSAGE: &str = "Signature processed successfully";

pub fn compose(outcome: &ClassificationOutcome, snapshot: &MetricsSnapshot) -> ResultRecord {
    ResultRecord {
        success: true,
        message: SUCCESS_MESSAGE.to_string(),
        result_id: Uuid::new_v4().to_string(),
        data: ResultData {
            validation_result: ValidationResult {
                is_valid: outcome.is_valid(),
                confidence: round_one_decimal(outcome.confidence_percent),
            },
            confusion_matrix: snapshot.confusion_matrix,
            metrics: snapshot.metrics,
            timestamp: epoch_seconds(),
        },
    }
}

/// Rounds the exact binary value to one decimal, ties to even.
pub fn round_one_decimal(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(label: usize, confidence_percent: f64) -> ClassificationOutcome {
        ClassificationOutcome {
            label,
            confidence_percent,
        }
    }

    #[test]
    fn rounds_confidence_to_one_decimal() {
        assert_eq!(round_one_decimal(97.34), 97.3);
        assert_eq!(round_one_decimal(97.36), 97.4);
        assert_eq!(round_one_decimal(100.0), 100.0);
    }

    #[test]
    fn rounding_follows_the_exact_binary_value() {
        assert_eq!(round_one_decimal(56.25), 56.2);
        assert_eq!(round_one_decimal(62.25), 62.2);
        assert_eq!(round_one_decimal(50.25), 50.2);
        assert_eq!(round_one_decimal(50.05), 50.0);
        assert_eq!(round_one_decimal(87.45), 87.5);
        assert_eq!(round_one_decimal(99.95), 100.0);
        assert_eq!(round_one_decimal(50.0), 50.0);
    }

    #[test]
    fn attaches_verdict_and_snapshot() {
        let snapshot = MetricsSnapshot::default();
        let record = compose(&outcome(1, 88.88), &snapshot);

        assert!(record.success);
        assert_eq!(record.message, SUCCESS_MESSAGE);
        assert!(record.data.validation_result.is_valid);
        assert_eq!(record.data.validation_result.confidence, 88.9);
        assert_eq!(record.data.confusion_matrix, snapshot.confusion_matrix);
        assert_eq!(record.data.metrics, snapshot.metrics);
        assert!(Uuid::parse_str(&record.result_id).is_ok());
        assert!(record.data.timestamp > 1_600_000_000.0);
    }

    #[test]
    fn mints_a_fresh_id_each_time() {
        let snapshot = MetricsSnapshot::default();
        let first = compose(&outcome(0, 60.0), &snapshot);
        let second = compose(&outcome(0, 60.0), &snapshot);
        assert_ne!(first.result_id, second.result_id);
        assert!(!first.data.validation_result.is_valid);
    }
}
