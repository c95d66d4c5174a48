//! Testing utilities for the a11y remediation workspace
//!
//! Shared test doubles and fixtures.

#![allow(missing_docs)]

use a11y_detect::{IssueScanner, ScanError};
use a11y_llm::backend::{CompletionBackend, CompletionRequest};
use a11y_llm::TransportError;
use a11y_model::Issue;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Script {
    replies: Mutex<VecDeque<Result<String, TransportError>>>,
    fallback: Mutex<Option<String>>,
    models: Mutex<Vec<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicUsize,
}

/// Completion backend answering from a queue of canned replies
///
/// Once the queue is empty every call gets the fallback reply (empty text
/// unless set). Clones share the same script and counters.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Script>,
}

impl ScriptedBackend {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::default();
        for reply in replies {
            backend.push_reply(reply);
        }
        backend
    }

    /// Backend giving the same reply to every call
    pub fn repeating(reply: impl Into<String>) -> Self {
        let backend = Self::default();
        *backend.script.fallback.lock().unwrap() = Some(reply.into());
        backend
    }

    pub fn push_reply(&self, reply: impl Into<String>) -> &Self {
        self.script.replies.lock().unwrap().push_back(Ok(reply.into()));
        self
    }

    pub fn push_error(&self, error: TransportError) -> &Self {
        self.script.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_models<I, S>(self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.script.models.lock().unwrap() = models.into_iter().map(Into::into).collect();
        self
    }

    /// Number of completion calls so far
    pub fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.script.requests.lock().unwrap().clone()
    }

    /// Text of every message of request `n`, joined
    pub fn prompt_text(&self, n: usize) -> String {
        self.requests()
            .get(n)
            .map(|r| serde_json::to_string(&r.messages).unwrap())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String, TransportError> {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        self.script.requests.lock().unwrap().push(request);
        let next = self.script.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply,
            None => Ok(self.script.fallback.lock().unwrap().clone().unwrap_or_default()),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, TransportError> {
        Ok(self.script.models.lock().unwrap().clone())
    }
}

/// Scanner returning fixed reports and recording what it was asked to scan
///
/// Call `n` gets report `n`; calls past the end repeat the last report.
#[derive(Debug, Default)]
pub struct StaticScanner {
    reports: Vec<Vec<Issue>>,
    failure: Option<String>,
    scanned: Mutex<Vec<(PathBuf, String)>>,
}

impl StaticScanner {
    /// Scanner returning `issues` on every call
    pub fn new(issues: Vec<Issue>) -> Self {
        Self::sequence(vec![issues])
    }

    /// Scanner returning one report per call
    pub fn sequence(reports: Vec<Vec<Issue>>) -> Self {
        Self {
            reports,
            ..Self::default()
        }
    }

    /// Scanner that always fails with `stderr`
    pub fn failing(stderr: impl Into<String>) -> Self {
        Self {
            failure: Some(stderr.into()),
            ..Self::default()
        }
    }

    /// Paths scanned so far
    pub fn scanned_paths(&self) -> Vec<PathBuf> {
        self.scanned.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    /// Document contents as they were on disk when scanned
    pub fn scanned_documents(&self) -> Vec<String> {
        self.scanned.lock().unwrap().iter().map(|(_, d)| d.clone()).collect()
    }
}

#[async_trait]
impl IssueScanner for StaticScanner {
    async fn scan(&self, path: &Path) -> Result<Vec<Issue>, ScanError> {
        let document = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ScanError::io_error(path, e))?;
        let call = {
            let mut scanned = self.scanned.lock().unwrap();
            scanned.push((path.to_path_buf(), document));
            scanned.len() - 1
        };
        if let Some(stderr) = &self.failure {
            return Err(ScanError::Failed {
                status: Some(1),
                stderr: stderr.clone(),
            });
        }
        Ok(self
            .reports
            .get(call)
            .or_else(|| self.reports.last())
            .cloned()
            .unwrap_or_default())
    }
}

pub mod fixtures {
    //! HTML pages and canned model replies

    use a11y_model::Issue;
    use serde_json::json;

    /// Page with two unnamed toolbar buttons, one named one and an image without alt
    pub const TOOLBAR_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en"><head><title>Editor</title></head>
<body>
<main>
  <h1>Editor</h1>
  <div class="toolbar">
    <button class="bold"></button>
    <button aria-label="Italic"></button>
    <button class="underline"></button>
  </div>
  <img id="hero" src="https://cdn.example/hero.png">
</main>
</body></html>"#;

    /// Page with no detectable defects
    pub const CLEAN_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en"><head><title>About</title></head>
<body><main><h1>About us</h1><p>We build things.</p><button>Contact</button></main></body></html>"#;

    /// Scanner issue for `#hero` in [`TOOLBAR_PAGE`]
    pub fn missing_alt_issue() -> Issue {
        Issue::new(
            "WCAG2AA.Principle1.Guideline1_1.1_1_1.H37",
            "Img element missing an alt attribute. Use the alt attribute to specify a short text alternative.",
        )
        .with_context(r#"<img id="hero" src="https://cdn.example/hero.png">"#)
        .with_selector("#hero")
        .with_runner("htmlcs")
    }

    /// Scanner issue with an unmapped criterion and a skip-link message
    pub fn bypass_issue() -> Issue {
        Issue::new(
            "WCAG2AA.Principle2.Guideline2_4.2_4_2.H25.1.NoTitleEl",
            "Provide a mechanism to bypass blocks of repeated content.",
        )
        .with_type("notice")
        .with_selector("main")
        .with_runner("htmlcs")
    }

    /// Structured-fix reply carrying `markup`
    pub fn fix_reply(markup: &str) -> String {
        format!("<fix_output>{}</fix_output>", json!({ "html": markup }))
    }

    /// Alt-text reply without a relevancy score
    pub fn alt_reply(alt_text: &str) -> String {
        json!({ "altText": alt_text }).to_string()
    }

    /// Alt-text reply with a relevancy score
    pub fn alt_reply_scored(alt_text: &str, relevancy: f64) -> String {
        json!({ "altText": alt_text, "relevancy": relevancy, "reasoning": "fits the page" }).to_string()
    }
}
