//! Shared test utilities for integration tests

// Each test file includes this module separately,
// so not all functions are used in every compilation unit.
#![allow(dead_code)]

use async_trait::async_trait;
use finqa_eval::{Dataset, DatasetError, Judge, JudgeVerdict, QuestionRecord};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A dataset with a fixed set of questions.
pub struct MockDataset {
    questions: Vec<QuestionRecord>,
}

impl MockDataset {
    pub fn new(questions: &[(&str, &str)]) -> Self {
        let questions = questions
            .iter()
            .enumerate()
            .map(|(i, (question, answer))| {
                QuestionRecord::new(i.to_string(), *question, "conceptual", *answer)
            })
            .collect();
        Self { questions }
    }
}

impl Dataset for MockDataset {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load(&self, sample_size: Option<usize>) -> Result<Vec<QuestionRecord>, DatasetError> {
        let n = sample_size.unwrap_or(self.questions.len());
        Ok(self.questions.iter().take(n).cloned().collect())
    }
}

/// Judge that replies with a fixed text and counts its calls.
pub struct FixedJudge {
    reply: String,
    calls: AtomicUsize,
}

impl FixedJudge {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Judge for FixedJudge {
    async fn judge(&self, _reference: &str, _response: &str) -> JudgeVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        JudgeVerdict::from_reply(&self.reply)
    }
}

/// Judge that says "yes" when response equals reference.
///
/// A response of the form `slow:<ms>:<text>` sleeps for `<ms>` first and is
/// compared using `<text>`, so tests can force completion order. Tracks the
/// peak number of concurrent calls.
#[derive(Default)]
pub struct MatchingJudge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MatchingJudge {
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Judge for MatchingJudge {
    async fn judge(&self, reference: &str, response: &str) -> JudgeVerdict {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let mut text = response;
        if let Some(rest) = response.strip_prefix("slow:") {
            if let Some((ms, tail)) = rest.split_once(':') {
                let ms: u64 = ms.parse().unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                text = tail;
            }
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if text == reference {
            JudgeVerdict::from_reply("yes")
        } else {
            JudgeVerdict::from_reply("no")
        }
    }
}

/// Judge that records each (reference, response) pair it is asked about and
/// says "yes" when they are equal.
#[derive(Default)]
pub struct RecordingJudge {
    seen: Mutex<Vec<(String, String)>>,
}

impl RecordingJudge {
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Judge for RecordingJudge {
    async fn judge(&self, reference: &str, response: &str) -> JudgeVerdict {
        self.seen
            .lock()
            .unwrap()
            .push((reference.to_string(), response.to_string()));
        JudgeVerdict::from_reply(if reference == response { "yes" } else { "no" })
    }
}

/// Judge whose backend is always down.
pub struct UnavailableJudge;

#[async_trait]
impl Judge for UnavailableJudge {
    async fn judge(&self, _reference: &str, _response: &str) -> JudgeVerdict {
        JudgeVerdict::unavailable("connection refused")
    }
}

/// Write `value` as pretty JSON to `dir/name`.
pub fn write_json(dir: &Path, name: &str, value: &Value) {
    let text = serde_json::to_string_pretty(value).unwrap();
    std::fs::write(dir.join(name), text).unwrap();
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}
