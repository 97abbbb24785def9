//! Test harness for batch runs.
//!
//! The `TestHarness` owns an in-memory mail host with one account (`acct1`,
//! shown as `me@example.com`), a scripted model backend that counts its calls,
//! and a file-backed database in a temporary directory so that persistence can
//! be checked by reopening it.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use mailsorter::ai::{ModelBackend, ModelError};
use mailsorter::config::Settings;
use mailsorter::db::Database;
use mailsorter::email::{MemoryMailHost, MessageTracker};
use mailsorter::pipeline::{BatchRunner, RunReport};

pub const ACCOUNT_ID: &str = "acct1";
pub const ACCOUNT_NAME: &str = "me@example.com";

/// Model backend answering from a queue, falling back to a fixed answer.
pub struct ScriptedBackend {
    answers: Mutex<VecDeque<String>>,
    fallback: String,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn always(answer: impl Into<String>) -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            fallback: answer.into(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answers in order, then `fallback` once the queue is empty.
    pub fn sequence(answers: Vec<String>, fallback: impl Into<String>) -> Self {
        let backend = Self::always(fallback);
        *backend.answers.lock().unwrap() = answers.into();
        backend
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.answers.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub host: Arc<MemoryMailHost>,
    pub backend: Arc<ScriptedBackend>,
    pub db_path: PathBuf,
}

impl TestHarness {
    /// Harness with an empty account and the given backend.
    pub fn new(backend: ScriptedBackend) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("data").join("mailsorter.db");

        let host = MemoryMailHost::new();
        host.add_account(ACCOUNT_ID, ACCOUNT_NAME);

        Self {
            temp_dir,
            host: Arc::new(host),
            backend: Arc::new(backend),
            db_path,
        }
    }

    /// Opens a fresh handle on the harness database.
    pub fn tracker(&self) -> MessageTracker {
        MessageTracker::new(Database::open(&self.db_path).expect("Failed to open database"))
    }

    pub fn runner(&self, settings: Settings) -> BatchRunner {
        BatchRunner::new(settings, self.host.clone(), self.backend.clone(), self.tracker())
    }

    pub async fn run(&self, settings: Settings) -> RunReport {
        self.runner(settings).run().await.expect("batch run failed")
    }
}
