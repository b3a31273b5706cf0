//! Record types for inference and grading.
//!
//! These types define the persisted JSON shapes: the inference record-set
//! (`[{question, question_type, answer, response, trace?}]`) and the graded
//! output (`{summary, results}`).

use finqa_core::{Generation, TraceEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single question to answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Identifier; defaults to the position in the filtered sequence
    pub id: String,
    /// The question text sent to the responder
    pub question: String,
    /// Category the question belongs to (e.g. `conceptual`)
    pub question_type: String,
    /// The expected answer used by the judge
    pub reference_answer: String,
}

impl QuestionRecord {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        question_type: impl Into<String>,
        reference_answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            question_type: question_type.into(),
            reference_answer: reference_answer.into(),
        }
    }
}

/// Responder output for one question, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub question: String,

    pub question_type: String,

    /// Reference answer, persisted as `answer`
    #[serde(rename = "answer")]
    pub reference_answer: String,

    /// Answer text or a generation diagnostic
    pub response: String,

    /// Tool invocations; present for agentic runs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<TraceEntry>>,
}

impl InferenceResult {
    /// Build the result for `record` from a responder's generation.
    ///
    /// The trace is kept only when `agentic` is set, so direct runs never
    /// carry a `trace` field.
    pub fn from_generation(record: &QuestionRecord, generation: Generation, agentic: bool) -> Self {
        Self {
            question: record.question.clone(),
            question_type: record.question_type.clone(),
            reference_answer: record.reference_answer.clone(),
            response: generation.response,
            trace: agentic.then_some(generation.trace),
        }
    }
}

/// Aggregate grading counts for one record-set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub correct: usize,
    pub incorrect: usize,
    /// `correct / (correct + incorrect)` rounded to 4 decimals, `0` when empty
    pub accuracy: f64,
}

impl RunSummary {
    pub fn from_counts(correct: usize, incorrect: usize) -> Self {
        let total = correct + incorrect;
        let accuracy = if total == 0 {
            0.0
        } else {
            round4(correct as f64 / total as f64)
        };

        Self {
            correct,
            incorrect,
            accuracy,
        }
    }

    /// Tally a sequence of verdicts.
    pub fn from_verdicts<I: IntoIterator<Item = bool>>(verdicts: I) -> Self {
        let (correct, incorrect) =
            verdicts
                .into_iter()
                .fold((0, 0), |(c, i), is_correct| {
                    if is_correct {
                        (c + 1, i)
                    } else {
                        (c, i + 1)
                    }
                });
        Self::from_counts(correct, incorrect)
    }

    pub fn total(&self) -> usize {
        self.correct + self.incorrect
    }
}

/// Text form of a record field.
///
/// Strings are taken as-is, a missing or `null` value is empty, and anything
/// else (`4`, `true`, arrays) is rendered as its JSON text.
pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Round half away from zero to 4 decimal places.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Graded output file contents.
///
/// `results` holds the input records verbatim plus `isCorrect` and
/// `judge_response`, so unknown fields pass through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedOutput {
    pub summary: RunSummary,
    pub results: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn record() -> QuestionRecord {
        QuestionRecord::new("0", "What is EBITDA?", "conceptual", "Earnings before ...")
    }

    #[rstest]
    #[case::empty(0, 0, 0.0)]
    #[case::all_correct(1, 0, 1.0)]
    #[case::all_wrong(0, 3, 0.0)]
    #[case::two_thirds(2, 1, 0.6667)]
    #[case::one_seventh(1, 6, 0.1429)]
    fn test_accuracy(#[case] correct: usize, #[case] incorrect: usize, #[case] expected: f64) {
        let summary = RunSummary::from_counts(correct, incorrect);
        assert_eq!(summary.accuracy, expected);
        assert!((0.0..=1.0).contains(&summary.accuracy));
    }

    #[rstest]
    #[case::string(json!("4"), "4")]
    #[case::integer(json!(4), "4")]
    #[case::float(json!(12.5), "12.5")]
    #[case::boolean(json!(true), "true")]
    #[case::null(Value::Null, "")]
    #[case::list(json!([1, 2]), "[1,2]")]
    fn test_value_text(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value_text(Some(&value)), expected);
    }

    #[test]
    fn test_value_text_missing() {
        assert_eq!(value_text(None), "");
    }

    #[test]
    fn test_from_verdicts() {
        let summary = RunSummary::from_verdicts([true, false, true, true]);
        assert_eq!(summary.correct, 3);
        assert_eq!(summary.incorrect, 1);
        assert_eq!(summary.accuracy, 0.75);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn test_direct_result_omits_trace() {
        let result = InferenceResult::from_generation(&record(), Generation::answer("x"), false);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(
            json,
            json!({
                "question": "What is EBITDA?",
                "question_type": "conceptual",
                "answer": "Earnings before ...",
                "response": "x"
            })
        );
    }

    #[test]
    fn test_agentic_result_keeps_empty_trace() {
        let result = InferenceResult::from_generation(&record(), Generation::answer("x"), true);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["trace"], json!([]));
    }

    #[test]
    fn test_inference_result_field_order() {
        let result = InferenceResult::from_generation(&record(), Generation::answer("x"), false);
        let text = serde_json::to_string(&result).unwrap();
        let keys: Vec<usize> = ["\"question\"", "\"question_type\"", "\"answer\"", "\"response\""]
            .iter()
            .map(|k| text.find(k).unwrap())
            .collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "{}", text);
    }
}
