//! Flat tabular export of a job's results.

use crate::domain::models::TurnResult;

/// Stable column set, one row per result.
const COLUMNS: [&str; 16] = [
    "conversation_id",
    "turn_number",
    "category",
    "input",
    "expected_intent",
    "expected_response",
    "expected_parameters",
    "agent_response",
    "matched_intent",
    "intent_matched",
    "response_matched",
    "parameters_matched",
    "score",
    "differences",
    "execution_time_ms",
    "error",
];

/// Serialize results to delimited text with standard quote escaping.
pub fn to_csv(results: &[TurnResult]) -> String {
    let mut out = String::new();
    out.push_str(&COLUMNS.join(","));
    out.push('\n');

    for result in results {
        let fields = [
            result.conversation_id.clone(),
            result.turn_number.to_string(),
            result.category.clone().unwrap_or_default(),
            result.input.clone(),
            result.expected_intent.clone().unwrap_or_default(),
            result.expected_response.clone().unwrap_or_default(),
            result
                .expected_parameters
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            result.agent_response.clone(),
            result.matched_intent.clone().unwrap_or_default(),
            result.intent_matched.to_string(),
            result.response_matched.to_string(),
            result.parameters_matched.to_string(),
            format!("{:.3}", result.score),
            result.differences.join("; "),
            result.execution_time_ms.to_string(),
            result.error.clone().unwrap_or_default(),
        ];

        let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Wrap a field in quotes when it contains the delimiter, a quote, or a
/// line break, doubling internal quotes.
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_header_and_rows() {
        let mut result = TurnResult::blank("conv, one", 1, "hello", "hi there");
        result.score = 0.5;
        result.differences = vec!["response: similarity 0.500 below threshold 0.800".to_string()];

        let csv = to_csv(&[result]);
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("conversation_id,turn_number,"));
        assert_eq!(header.split(',').count(), COLUMNS.len());

        let row = lines.next().unwrap();
        assert!(row.starts_with("\"conv, one\",1,"));
        assert!(row.contains("0.500"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_empty_results_is_header_only() {
        let csv = to_csv(&[]);
        assert_eq!(csv.lines().count(), 1);
    }
}
