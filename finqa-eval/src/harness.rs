//! Inference run orchestrator.
//!
//! [`InferenceRun`] sends every question of a dataset through a responder,
//! one at a time and in order, and persists the whole record-set once at the
//! end. A failed generation becomes a diagnostic response; it never stops the
//! run.

use crate::dataset::{Dataset, DatasetError};
use crate::results::{InferenceResult, QuestionRecord};
use crate::store::{write_json_atomic, StoreError};
use finqa_core::Responder;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors that stop an inference run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// Failed to load dataset
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Failed to persist the record-set
    #[error("Failed to save results: {0}")]
    Store(#[from] StoreError),
}

/// Progress events emitted during an inference run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum RunProgress {
    /// Dataset loaded, run starting.
    Started {
        /// Total number of questions to answer.
        total: usize,
    },
    /// A question was answered (or failed).
    QuestionCompleted {
        completed: usize,
        total: usize,
        /// Whether the response is a generation diagnostic.
        failed: bool,
    },
}

/// Outcome of an inference run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Where the record-set was written
    pub output_path: PathBuf,
    /// Number of records written
    pub total: usize,
    /// Records whose response is a generation diagnostic
    pub failed: usize,
    pub duration: Duration,
}

/// Sequential inference over a dataset.
///
/// # Example
///
/// ```no_run
/// use finqa_core::{DirectResponder, LlmClient, LlmConfig};
/// use finqa_eval::{InferenceRun, JsonFileDataset};
/// use std::path::PathBuf;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let llm = LlmClient::new(LlmConfig::ollama("llama3.1:8b"))?;
/// let responder = DirectResponder::new(Arc::new(llm));
/// let dataset = JsonFileDataset::new(PathBuf::from("financeqa.jsonl"))
///     .with_question_type("conceptual");
///
/// let run = InferenceRun::new("llama3.1_8b_output_simple.json");
/// let report = run.run(&responder, &dataset, None).await?;
/// println!("Wrote {} records", report.total);
/// # Ok(())
/// # }
/// ```
pub struct InferenceRun {
    output_path: PathBuf,
}

impl InferenceRun {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Run inference over `dataset` and persist the results.
    pub async fn run<D>(
        &self,
        responder: &dyn Responder,
        dataset: &D,
        sample_size: Option<usize>,
    ) -> Result<RunReport, RunError>
    where
        D: Dataset,
    {
        self.run_with_progress(responder, dataset, sample_size, |_| {})
            .await
    }

    /// Same as [`run`](Self::run), reporting progress to `on_progress`.
    pub async fn run_with_progress<D, F>(
        &self,
        responder: &dyn Responder,
        dataset: &D,
        sample_size: Option<usize>,
        on_progress: F,
    ) -> Result<RunReport, RunError>
    where
        D: Dataset,
        F: Fn(RunProgress),
    {
        let start_time = Instant::now();

        let questions = dataset.load(sample_size).await?;
        log::info!(
            "Answering {} questions from {} with the {} responder",
            questions.len(),
            dataset.name(),
            responder.name()
        );

        let (results, failed) = answer_all(responder, &questions, on_progress).await;

        write_json_atomic(&self.output_path, &results)?;
        log::info!(
            "Saved {} results to {}",
            results.len(),
            self.output_path.display()
        );

        Ok(RunReport {
            output_path: self.output_path.clone(),
            total: results.len(),
            failed,
            duration: start_time.elapsed(),
        })
    }
}

/// Answer each question in order with one call in flight.
///
/// Returns exactly one result per question, in input order, and the number of
/// generations that failed.
pub async fn answer_all<F>(
    responder: &dyn Responder,
    questions: &[QuestionRecord],
    on_progress: F,
) -> (Vec<InferenceResult>, usize)
where
    F: Fn(RunProgress),
{
    let total = questions.len();
    let agentic = responder.is_agentic();
    on_progress(RunProgress::Started { total });

    let mut results = Vec::with_capacity(total);
    let mut failures = 0;
    for (i, record) in questions.iter().enumerate() {
        let generation = responder.generate(&record.question).await;
        let failed = generation.is_failure();
        if failed {
            failures += 1;
            log::warn!("Question {} failed: {}", record.id, generation.response);
        }

        results.push(InferenceResult::from_generation(record, generation, agentic));
        on_progress(RunProgress::QuestionCompleted {
            completed: i + 1,
            total,
            failed,
        });
    }

    (results, failures)
}
