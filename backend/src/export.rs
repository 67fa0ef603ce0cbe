use shared::{ExportFormat, ResultRecord};

pub fn render(record: &ResultRecord, format: ExportFormat) -> Result<String, serde_json::Error> {
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(record),
        ExportFormat::Csv => Ok(to_csv(record)),
    }
}

fn to_csv(record: &ResultRecord) -> String {
    let data = &record.data;
    let cm = &data.confusion_matrix;
    let m = &data.metrics;

    let rows: [(&str, &str, String); 12] = [
        ("result", "resultId", record.result_id.clone()),
        ("result", "timestamp", data.timestamp.to_string()),
        ("validationResult", "isValid", data.validation_result.is_valid.to_string()),
        ("validationResult", "confidence", data.validation_result.confidence.to_string()),
        ("confusionMatrix", "truePositives", cm.true_positives.to_string()),
        ("confusionMatrix", "falsePositives", cm.false_positives.to_string()),
        ("confusionMatrix", "trueNegatives", cm.true_negatives.to_string()),
        ("confusionMatrix", "falseNegatives", cm.false_negatives.to_string()),
        ("metrics", "accuracy", m.accuracy.to_string()),
        ("metrics", "precision", m.precision.to_string()),
        ("metrics", "recall", m.recall.to_string()),
        ("metrics", "f1Score", m.f1_score.to_string()),
    ];

    let mut out = String::from("section,field,value\n");
    for (section, field, value) in rows {
        out.push_str(&format!("{},{},{}\n", section, field, value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_record;

    #[test]
    fn csv_lists_every_value() {
        let csv = render(&sample_record("r-1", 91.2), ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "section,field,value");
        assert_eq!(lines.len(), 13);
        assert!(lines.contains(&"result,resultId,r-1"));
        assert!(lines.contains(&"validationResult,confidence,91.2"));
        assert!(lines.contains(&"confusionMatrix,truePositives,92"));
        assert!(lines.contains(&"metrics,f1Score,0.98"));
    }

    #[test]
    fn json_is_the_stored_record() {
        let record = sample_record("r-2", 64.0);
        let json = render(&record, ExportFormat::Json).unwrap();
        let parsed: ResultRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
