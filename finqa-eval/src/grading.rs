//! Grading orchestrator.
//!
//! For every `*.json` record-set in an input directory, the orchestrator
//! judges each record with bounded parallelism, pairs verdicts back to records
//! by index, and writes `{summary, results}` to a same-named file in the
//! output directory. Files are processed one after another.

use crate::judge::{Judge, JudgeOutcome, JudgeVerdict};
use crate::results::{value_text, GradedOutput, RunSummary};
use crate::store::{write_json_atomic, StoreError};

use futures_util::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Field set on every graded record with the boolean verdict.
pub const IS_CORRECT_FIELD: &str = "isCorrect";

/// Field set on every graded record with the judge reply or error.
pub const JUDGE_RESPONSE_FIELD: &str = "judge_response";

/// Errors that stop a grading run.
///
/// Malformed input files are not errors; they are skipped and reported in
/// [`GradingReport`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GradingError {
    /// Input directory could not be listed
    #[error("Failed to read input directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output directory could not be created
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Graded output could not be written
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The blocking writer task panicked or was cancelled
    #[error("Output writer task failed: {0}")]
    Writer(#[from] tokio::task::JoinError),
}

/// Progress events emitted during grading.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum GradingProgress {
    /// A file passed validation and judging is starting.
    FileStarted { file: String, total: usize },
    /// One record received its verdict.
    RecordJudged {
        file: String,
        completed: usize,
        total: usize,
    },
    /// A file was written.
    FileCompleted { file: String, summary: RunSummary },
    /// A file was skipped.
    FileSkipped { file: String, reason: String },
}

/// Configuration for the grading orchestrator.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct GradingConfig {
    /// Maximum number of judge calls in flight
    ///
    /// Default: available parallelism of the machine
    pub concurrency: usize,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

impl GradingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency limit.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1); // At least 1
        self
    }
}

/// Number of concurrency units available to this process.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Graded {
        input: PathBuf,
        output: PathBuf,
        summary: RunSummary,
        /// Records whose judge call failed (counted as incorrect)
        judge_unavailable: usize,
    },
    Skipped {
        input: PathBuf,
        reason: String,
    },
}

/// Result of grading a directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradingReport {
    /// One entry per discovered file, in processing order
    pub files: Vec<FileOutcome>,
}

impl GradingReport {
    pub fn graded(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f, FileOutcome::Graded { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.files.len() - self.graded()
    }
}

/// Fans out judge calls per record-set file and writes graded output.
pub struct GradingOrchestrator {
    judge: Arc<dyn Judge>,
    config: GradingConfig,
}

impl GradingOrchestrator {
    pub fn new(judge: Arc<dyn Judge>, config: GradingConfig) -> Self {
        Self { judge, config }
    }

    pub fn config(&self) -> &GradingConfig {
        &self.config
    }

    /// Grade every `*.json` file in `input_dir` into `output_dir`.
    pub async fn grade_dir(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<GradingReport, GradingError> {
        self.grade_dir_with_progress(input_dir, output_dir, |_| {})
            .await
    }

    /// Same as [`grade_dir`](Self::grade_dir), reporting progress to `on_progress`.
    pub async fn grade_dir_with_progress<F>(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        on_progress: F,
    ) -> Result<GradingReport, GradingError>
    where
        F: Fn(GradingProgress),
    {
        let files = discover_inputs(input_dir).await?;
        log::info!("Found {} JSON files in {}", files.len(), input_dir.display());

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| GradingError::CreateDir {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let mut report = GradingReport::default();
        for input in files {
            let outcome = self.grade_file(&input, output_dir, &on_progress).await?;
            report.files.push(outcome);
        }

        Ok(report)
    }

    /// Grade one file into `output_dir/<same name>`.
    ///
    /// Unreadable or malformed input is reported as [`FileOutcome::Skipped`].
    pub async fn grade_file<F>(
        &self,
        input: &Path,
        output_dir: &Path,
        on_progress: &F,
    ) -> Result<FileOutcome, GradingError>
    where
        F: Fn(GradingProgress),
    {
        let file = display_name(input);

        let items = match load_record_set(input).await {
            Ok(items) => items,
            Err(reason) => {
                log::warn!("Skipping {}: {}", file, reason);
                on_progress(GradingProgress::FileSkipped {
                    file,
                    reason: reason.clone(),
                });
                return Ok(FileOutcome::Skipped {
                    input: input.to_path_buf(),
                    reason,
                });
            }
        };

        let total = items.len();
        on_progress(GradingProgress::FileStarted {
            file: file.clone(),
            total,
        });

        let verdicts = self
            .judge_all(&items, |completed| {
                on_progress(GradingProgress::RecordJudged {
                    file: file.clone(),
                    completed,
                    total,
                })
            })
            .await;

        let judge_unavailable = verdicts
            .iter()
            .filter(|v| v.outcome == JudgeOutcome::Unavailable)
            .count();
        if judge_unavailable > 0 {
            log::warn!(
                "{}: {} of {} judge calls failed and were counted as incorrect",
                file,
                judge_unavailable,
                total
            );
        }

        let graded = apply_verdicts(items, verdicts);
        let summary = graded.summary;
        let output = output_dir.join(input.file_name().unwrap_or(input.as_os_str()));

        // Temp file write plus fsync; keep it off the runtime threads.
        let target = output.clone();
        tokio::task::spawn_blocking(move || write_json_atomic(&target, &graded)).await??;

        log::info!(
            "Saved output to {} ({}/{} correct, accuracy {})",
            output.display(),
            summary.correct,
            summary.total(),
            summary.accuracy
        );
        on_progress(GradingProgress::FileCompleted { file, summary });

        Ok(FileOutcome::Graded {
            input: input.to_path_buf(),
            output,
            summary,
            judge_unavailable,
        })
    }

    /// Judge every record, returning verdicts in record order.
    ///
    /// At most `concurrency` calls are in flight. Each call carries its
    /// record index and lands in that slot, whatever order calls finish in.
    /// `on_judged` receives the running count of completed calls.
    pub async fn judge_all<F>(&self, items: &[Map<String, Value>], on_judged: F) -> Vec<JudgeVerdict>
    where
        F: Fn(usize),
    {
        let judge = &self.judge;
        let mut slots: Vec<Option<JudgeVerdict>> = (0..items.len()).map(|_| None).collect();

        let mut verdicts = stream::iter(items.iter().enumerate())
            .map(|(index, item)| {
                let reference = text_field(item, "answer");
                let response = text_field(item, "response");
                async move { (index, judge.judge(&reference, &response).await) }
            })
            .buffer_unordered(self.config.concurrency.max(1));

        let mut completed = 0;
        while let Some((index, verdict)) = verdicts.next().await {
            slots[index] = Some(verdict);
            completed += 1;
            on_judged(completed);
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| JudgeVerdict::unavailable("no verdict recorded")))
            .collect()
    }
}

/// List `*.json` files in `dir`, sorted by file name.
pub async fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>, GradingError> {
    let read_dir_error = |source| GradingError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_dir_error)? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") && is_file(&path).await {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Read a record-set and check it is an array of objects.
///
/// The error is a human-readable reason for skipping the file.
pub async fn load_record_set(path: &Path) -> Result<Vec<Map<String, Value>>, String> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("could not read file: {}", e))?;

    let value: Value =
        serde_json::from_str(&content).map_err(|e| format!("invalid JSON: {}", e))?;

    let Value::Array(items) = value else {
        return Err("not a list of items.".to_string());
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(format!("item {} is not an object.", i)),
        })
        .collect()
}

/// Set `isCorrect` and `judge_response` on each record and tally the summary.
///
/// Existing values of both fields are overwritten in place, so grading an
/// already graded file yields the same shape.
pub fn apply_verdicts(items: Vec<Map<String, Value>>, verdicts: Vec<JudgeVerdict>) -> GradedOutput {
    let summary = RunSummary::from_verdicts(verdicts.iter().map(JudgeVerdict::is_correct));

    let results = items
        .into_iter()
        .zip(verdicts)
        .map(|(mut item, verdict)| {
            item.insert(IS_CORRECT_FIELD.to_string(), Value::Bool(verdict.is_correct()));
            item.insert(
                JUDGE_RESPONSE_FIELD.to_string(),
                Value::String(verdict.judge_response),
            );
            Value::Object(item)
        })
        .collect();

    GradedOutput { summary, results }
}

/// Text of `field` as the judge should see it.
fn text_field(item: &Map<String, Value>, field: &str) -> String {
    value_text(item.get(field))
}

/// Follows symlinks, like `Path::is_file`.
async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
