//! # Finqa Eval
//!
//! Inference and grading pipeline for finance question answering.
//!
//! ## Overview
//!
//! - **Datasets**: load questions from JSON or JSON Lines files, filtered by category
//! - **Inference**: [`InferenceRun`] answers every question in order with a
//!   [`Responder`](finqa_core::Responder) and persists the record-set once
//! - **Judge**: [`LlmJudge`] asks a chat model whether a response matches the reference
//! - **Grading**: [`GradingOrchestrator`] judges record-sets with bounded
//!   parallelism and writes `{summary, results}` per file
//! - **Tracking**: [`DurationTracker`] records each run as a CSV row
//!
//! ## Architecture
//!
//! ```text
//! finqa-core (backends, responders, tools)
//!     ↓
//! finqa-eval (datasets, inference, judge, grading)  ← this crate
//! ```
//!
//! ## Grading Example
//!
//! ```no_run
//! use finqa_core::LlmClient;
//! use finqa_eval::{judge_llm_config, GradingConfig, GradingOrchestrator, LlmJudge};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = LlmClient::new(judge_llm_config(std::env::var("OPENAI_API_KEY").ok()))?;
//! let judge = Arc::new(LlmJudge::new(Arc::new(backend)));
//!
//! let orchestrator = GradingOrchestrator::new(judge, GradingConfig::default());
//! let report = orchestrator
//!     .grade_dir(Path::new("outputs"), Path::new("graded"))
//!     .await?;
//! println!("Graded {} files, skipped {}", report.graded(), report.skipped());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dataset;
pub mod grading;
pub mod harness;
pub mod judge;
pub mod results;
pub mod store;
pub mod tracking;

// Re-export public API
pub use config::{BackendToml, ConfigError, FinqaConfig, GradingToml, CONFIG_FILE_NAME};
pub use dataset::{Dataset, DatasetError, JsonFileDataset, DEFAULT_QUESTION_TYPE};
pub use grading::{
    apply_verdicts, default_concurrency, discover_inputs, load_record_set, FileOutcome,
    GradingConfig, GradingError, GradingOrchestrator, GradingProgress, GradingReport,
};
pub use harness::{answer_all, InferenceRun, RunError, RunProgress, RunReport};
pub use judge::{
    classify, judge_llm_config, judge_user_prompt, Judge, JudgeOutcome, JudgeVerdict, LlmJudge,
    DEFAULT_JUDGE_MAX_TOKENS, DEFAULT_JUDGE_MODEL, DEFAULT_JUDGE_TEMPERATURE, JUDGE_SYSTEM_PROMPT,
};
pub use results::{GradedOutput, InferenceResult, QuestionRecord, RunSummary};
pub use store::{read_json, write_json_atomic, StoreError};
pub use tracking::{
    track, DurationTracker, NoopObserver, RunObserver, TrackingError, DEFAULT_PROJECT_NAME,
};
