//! Question sources.
//!
//! Provides the [`Dataset`] trait and [`JsonFileDataset`], which reads a JSON
//! array or JSON Lines export of a question set (e.g. FinanceQA).

use crate::results::{value_text, QuestionRecord};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;

/// Question category evaluated by default.
pub const DEFAULT_QUESTION_TYPE: &str = "conceptual";

/// Errors that can occur when loading datasets.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DatasetError {
    /// Failed to read dataset file
    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse dataset
    #[error("Failed to parse dataset: {0}")]
    Parse(String),
}

/// An ordered source of questions.
///
/// Implement this trait to add support for other question sources.
pub trait Dataset: Send + Sync {
    /// The name of this dataset (used in logs).
    fn name(&self) -> &str;

    /// Load questions in order.
    ///
    /// If `sample_size` is specified, return at most that many questions,
    /// taken from the front.
    fn load(
        &self,
        sample_size: Option<usize>,
    ) -> impl std::future::Future<Output = Result<Vec<QuestionRecord>, DatasetError>> + Send;
}

/// Dataset backed by a local JSON or JSON Lines file.
///
/// Each entry needs a `question`; `answer` and `question_type` default to
/// empty strings and `id` defaults to the position after filtering. A
/// non-string `answer` such as `4` is kept as its JSON text.
///
/// # Example
///
/// ```no_run
/// use finqa_eval::{Dataset, JsonFileDataset};
/// use std::path::PathBuf;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let dataset = JsonFileDataset::new(PathBuf::from("financeqa_test.jsonl"))
///     .with_question_type("conceptual");
/// let questions = dataset.load(None).await?;
/// println!("Loaded {} questions", questions.len());
/// # Ok(())
/// # }
/// ```
pub struct JsonFileDataset {
    path: PathBuf,
    name: String,
    question_type: Option<String>,
}

impl JsonFileDataset {
    /// Create a dataset from a JSON file. No category filter is applied.
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("json_dataset")
            .to_string();

        Self {
            path,
            name,
            question_type: None,
        }
    }

    /// Keep only entries whose `question_type` equals `question_type`.
    #[must_use]
    pub fn with_question_type(mut self, question_type: impl Into<String>) -> Self {
        self.question_type = Some(question_type.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Parse file content into entries, accepting a JSON array or JSON Lines.
    fn parse_entries(content: &str) -> Result<Vec<JsonEntry>, DatasetError> {
        let trimmed = content.trim_start();
        if trimmed.starts_with('[') {
            return serde_json::from_str(trimmed).map_err(|e| DatasetError::Parse(e.to_string()));
        }

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .map_err(|e| DatasetError::Parse(format!("line {}: {}", i + 1, e)))
            })
            .collect()
    }
}

impl Dataset for JsonFileDataset {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self, sample_size: Option<usize>) -> Result<Vec<QuestionRecord>, DatasetError> {
        let content = fs::read_to_string(&self.path).await?;
        let entries = Self::parse_entries(&content)?;
        let total = entries.len();

        let mut questions: Vec<QuestionRecord> = entries
            .into_iter()
            .filter(|entry| match &self.question_type {
                Some(wanted) => entry.question_type.as_deref() == Some(wanted.as_str()),
                None => true,
            })
            .enumerate()
            .map(|(index, entry)| QuestionRecord {
                id: entry.id.map(id_to_string).unwrap_or_else(|| index.to_string()),
                question: entry.question,
                question_type: entry.question_type.unwrap_or_default(),
                reference_answer: value_text(entry.answer.as_ref()),
            })
            .collect();

        log::info!(
            "Loaded {} of {} entries from {}{}",
            questions.len(),
            total,
            self.path.display(),
            self.question_type
                .as_ref()
                .map(|t| format!(" (question_type = {})", t))
                .unwrap_or_default()
        );

        if let Some(size) = sample_size {
            questions.truncate(size);
        }

        Ok(questions)
    }
}

fn id_to_string(id: Value) -> String {
    match id {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Internal structure for parsing question entries.
#[derive(Deserialize)]
struct JsonEntry {
    #[serde(default)]
    id: Option<Value>,
    question: String,
    #[serde(default)]
    question_type: Option<String>,
    /// Numeric answers are common in finance sets; kept as JSON text
    #[serde(default)]
    answer: Option<Value>,
}
