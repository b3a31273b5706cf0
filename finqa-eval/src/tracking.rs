//! Run tracking.
//!
//! A [`RunObserver`] is started before an orchestrator runs and stopped
//! after it finishes; [`track`] wraps a future with that lifecycle.
//! [`DurationTracker`] appends one CSV row per run with the project name,
//! the experiment description, the local start time (`%Y-%m-%dT%H:%M:%S`)
//! and the wall-clock duration.

use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Project name recorded by default.
pub const DEFAULT_PROJECT_NAME: &str = "finqa";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const CSV_HEADER: &str = "project_name,experiment_description,start_time,duration_seconds";

/// Errors from a run observer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackingError {
    #[error("Observer was stopped before it was started")]
    NotStarted,

    #[error("Failed to write tracking file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Scoped observer around one orchestrator invocation.
pub trait RunObserver {
    fn start(&mut self);

    fn stop(&mut self) -> Result<(), TrackingError>;
}

/// Start `observer`, drive `future` to completion, then stop `observer`.
///
/// A failure to stop is logged; the future's output is returned either way.
pub async fn track<O, F>(observer: &mut O, future: F) -> F::Output
where
    O: RunObserver + ?Sized,
    F: Future,
{
    observer.start();
    let output = future.await;
    if let Err(e) = observer.stop() {
        log::warn!("Run tracking failed: {}", e);
    }
    output
}

/// Records run duration to a CSV file.
#[derive(Debug)]
pub struct DurationTracker {
    project_name: String,
    experiment_description: String,
    file_path: PathBuf,
    started: Option<(DateTime<Local>, Instant)>,
    last_duration: Option<Duration>,
}

impl DurationTracker {
    pub fn new(
        project_name: impl Into<String>,
        experiment_description: impl Into<String>,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            experiment_description: experiment_description.into(),
            file_path: file_path.into(),
            started: None,
            last_duration: None,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Duration of the last completed run.
    pub fn last_duration(&self) -> Option<Duration> {
        self.last_duration
    }

    fn append_row(&self, start: DateTime<Local>, duration: Duration) -> Result<(), TrackingError> {
        let io_error = |source| TrackingError::Io {
            path: self.file_path.clone(),
            source,
        };

        let needs_header = std::fs::metadata(&self.file_path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(io_error)?;

        let mut row = String::new();
        if needs_header {
            row.push_str(CSV_HEADER);
            row.push('\n');
        }
        row.push_str(&format!(
            "{},{},{},{:.3}\n",
            csv_field(&self.project_name),
            csv_field(&self.experiment_description),
            start.format(TIMESTAMP_FORMAT),
            duration.as_secs_f64()
        ));

        file.write_all(row.as_bytes()).map_err(io_error)
    }
}

impl RunObserver for DurationTracker {
    fn start(&mut self) {
        self.started = Some((Local::now(), Instant::now()));
    }

    fn stop(&mut self) -> Result<(), TrackingError> {
        let (start, instant) = self.started.take().ok_or(TrackingError::NotStarted)?;
        let duration = instant.elapsed();
        self.last_duration = Some(duration);

        self.append_row(start, duration)?;
        log::info!(
            "Run took {:.1}s (recorded in {})",
            duration.as_secs_f64(),
            self.file_path.display()
        );
        Ok(())
    }
}

/// Observer that records nothing.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn start(&mut self) {}

    fn stop(&mut self) -> Result<(), TrackingError> {
        Ok(())
    }
}

/// Quote a CSV field when it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
