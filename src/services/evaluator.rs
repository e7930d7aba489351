//! Response evaluator: pure comparison of expected versus actual replies.
//!
//! Everything in this module is deterministic given identical inputs and
//! configuration. Nothing here performs I/O or suspends.

use serde_json::Value;

use crate::domain::models::{AgentReply, EvaluationConfig, TestTurn};

/// Normalize a string according to the evaluation configuration.
///
/// Punctuation removal strips every non-word, non-space character;
/// whitespace normalization collapses runs to a single space and trims.
/// The result is idempotent under re-normalization.
pub fn normalize_text(text: &str, config: &EvaluationConfig) -> String {
    let mut normalized = if config.ignore_case {
        text.to_lowercase()
    } else {
        text.to_string()
    };

    if config.ignore_punctuation {
        normalized = normalized
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
            .collect();
    }

    if config.ignore_whitespace {
        normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    normalized
}

/// Classic dynamic-programming Levenshtein distance.
///
/// Substitution, insertion, and deletion each cost 1.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut matrix = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        matrix[0][j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a.len()][b.len()]
}

/// Similarity score in `[0, 1]` between two strings after normalization.
///
/// Identical normalized strings score 1.0; if either side normalizes to
/// empty the score is 0.0; otherwise `1 - distance / max_len`.
pub fn calculate_similarity(expected: &str, actual: &str, config: &EvaluationConfig) -> f64 {
    let a = normalize_text(expected, config);
    let b = normalize_text(actual, config);

    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let distance = levenshtein(&a, &b);
    let max_len = a.chars().count().max(b.chars().count());
    1.0 - distance as f64 / max_len as f64
}

/// Lowercase an intent name and map its delimiter class to one canonical
/// separator, so `flight.book` and `Flight_Book` compare equal.
fn canonical_intent(intent: &str) -> String {
    intent
        .to_lowercase()
        .chars()
        .map(|c| if c == '.' || c == '-' || c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Intent comparison with wildcard semantics for an absent expectation.
pub fn intents_match(expected: Option<&str>, actual: Option<&str>) -> bool {
    match (expected, actual) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(expected), Some(actual)) => canonical_intent(expected) == canonical_intent(actual),
    }
}

/// Kind of difference found while diffing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    TypeMismatch,
    ValueMismatch,
    MissingKey,
    LengthMismatch,
    MissingParameters,
}

/// A single difference at one path, with both sides retained for reporting.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParameterDifference {
    pub path: String,
    pub kind: DifferenceKind,
    pub expected: Option<Value>,
    pub actual: Option<Value>,
}

impl ParameterDifference {
    pub fn describe(&self) -> String {
        let render = |v: &Option<Value>| match v {
            Some(v) => v.to_string(),
            None => "<absent>".to_string(),
        };
        match self.kind {
            DifferenceKind::TypeMismatch => format!(
                "{}: type mismatch (expected {}, got {})",
                self.path,
                render(&self.expected),
                render(&self.actual)
            ),
            DifferenceKind::ValueMismatch => format!(
                "{}: expected {}, got {}",
                self.path,
                render(&self.expected),
                render(&self.actual)
            ),
            DifferenceKind::MissingKey => format!("{}: missing key", self.path),
            DifferenceKind::LengthMismatch => format!(
                "{}: array length mismatch (expected {}, got {})",
                self.path,
                render(&self.expected),
                render(&self.actual)
            ),
            DifferenceKind::MissingParameters => {
                format!("{}: parameters expected but none returned", self.path)
            }
        }
    }
}

/// Outcome of a structured-parameter comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterComparison {
    pub matched: bool,
    pub differences: Vec<ParameterDifference>,
}

impl ParameterComparison {
    fn matched_empty() -> Self {
        Self { matched: true, differences: Vec::new() }
    }
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn push_difference(
    out: &mut Vec<ParameterDifference>,
    path: &str,
    kind: DifferenceKind,
    expected: Option<Value>,
    actual: Option<Value>,
) {
    out.push(ParameterDifference { path: path.to_string(), kind, expected, actual });
}

/// Depth-first structural diff with a dotted/bracketed path accumulator.
fn diff_value(path: &str, expected: &Value, actual: &Value, out: &mut Vec<ParameterDifference>) {
    match (expected, actual) {
        (Value::Null, Value::Null) => {}
        (Value::Null, _) | (_, Value::Null) => {
            push_difference(
                out,
                path,
                DifferenceKind::ValueMismatch,
                Some(expected.clone()),
                Some(actual.clone()),
            );
        }
        (Value::Array(expected_items), Value::Array(actual_items)) => {
            if expected_items.len() != actual_items.len() {
                push_difference(
                    out,
                    path,
                    DifferenceKind::LengthMismatch,
                    Some(Value::from(expected_items.len())),
                    Some(Value::from(actual_items.len())),
                );
            }
            // Compare element-wise up to the shorter length.
            for (i, (e, a)) in expected_items.iter().zip(actual_items.iter()).enumerate() {
                diff_value(&format!("{path}[{i}]"), e, a, out);
            }
        }
        (Value::Object(expected_map), Value::Object(actual_map)) => {
            for (key, expected_child) in expected_map {
                let child_path = format!("{path}.{key}");
                match actual_map.get(key) {
                    Some(actual_child) => diff_value(&child_path, expected_child, actual_child, out),
                    None => push_difference(
                        out,
                        &child_path,
                        DifferenceKind::MissingKey,
                        Some(expected_child.clone()),
                        None,
                    ),
                }
            }
        }
        _ if value_type(expected) != value_type(actual) => {
            // Stop descending at a type mismatch.
            push_difference(
                out,
                path,
                DifferenceKind::TypeMismatch,
                Some(expected.clone()),
                Some(actual.clone()),
            );
        }
        _ => {
            if expected != actual {
                push_difference(
                    out,
                    path,
                    DifferenceKind::ValueMismatch,
                    Some(expected.clone()),
                    Some(actual.clone()),
                );
            }
        }
    }
}

/// Deep comparison of expected versus actual parameter trees.
///
/// An absent expectation always matches; expected parameters with no actual
/// set at all yield a single explanatory difference.
pub fn parameters_match(expected: Option<&Value>, actual: Option<&Value>) -> ParameterComparison {
    match (expected, actual) {
        (None, _) => ParameterComparison::matched_empty(),
        (Some(expected), None) => ParameterComparison {
            matched: false,
            differences: vec![ParameterDifference {
                path: "$".to_string(),
                kind: DifferenceKind::MissingParameters,
                expected: Some(expected.clone()),
                actual: None,
            }],
        },
        (Some(expected), Some(actual)) => {
            let mut differences = Vec::new();
            diff_value("$", expected, actual, &mut differences);
            ParameterComparison { matched: differences.is_empty(), differences }
        }
    }
}

/// Evaluation of a single turn.
#[derive(Debug, Clone)]
pub struct TurnEvaluation {
    pub intent_matched: bool,
    pub response_matched: bool,
    pub parameters_matched: bool,
    pub score: f64,
    pub differences: Vec<String>,
}

/// Score one reply against its turn's assertions.
///
/// The verdict is the conjunction of every configured assertion; absent
/// assertions always hold.
pub fn evaluate_turn(turn: &TestTurn, reply: &AgentReply, config: &EvaluationConfig) -> TurnEvaluation {
    let mut differences = Vec::new();

    let intent_matched =
        intents_match(turn.expected_intent.as_deref(), reply.matched_intent.as_deref());
    if !intent_matched {
        differences.push(format!(
            "intent: expected '{}', got {}",
            turn.expected_intent.as_deref().unwrap_or_default(),
            reply.matched_intent.as_deref().map_or_else(|| "none".to_string(), |i| format!("'{i}'")),
        ));
    }

    let (score, response_matched) = match turn.expected_response {
        Some(ref expected) => {
            let score = calculate_similarity(expected, &reply.response_text, config);
            let matched = score >= config.fuzzy_threshold;
            if !matched {
                differences.push(format!(
                    "response: similarity {score:.3} below threshold {:.3}",
                    config.fuzzy_threshold
                ));
            }
            (score, matched)
        }
        None => (1.0, true),
    };

    let comparison = parameters_match(turn.expected_parameters.as_ref(), reply.parameters.as_ref());
    if !comparison.matched {
        differences.extend(comparison.differences.iter().map(ParameterDifference::describe));
    }

    TurnEvaluation {
        intent_matched,
        response_matched,
        parameters_matched: comparison.matched,
        score,
        differences,
    }
}
