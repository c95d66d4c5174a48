//! Scanner Adapter
//!
//! Runs an external accessibility checker against a materialized document
//! and normalizes its report into [`Issue`]s. The adapter only reads the
//! file it is given; creating and removing it is the caller's job.

use crate::error::ScanError;
use a11y_model::Issue;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Default scanner program
pub const DEFAULT_PROGRAM: &str = "pa11y";

/// Exit statuses that carry a usable report (2 = issues found)
const SUCCESS_STATUSES: &[i32] = &[0, 2];

/// Source of scanner issues
#[async_trait]
pub trait IssueScanner: Send + Sync {
    /// Scan the document at `path`
    ///
    /// # Errors
    /// - `ScanError` on any failure; there is no partial result
    async fn scan(&self, path: &Path) -> Result<Vec<Issue>, ScanError>;
}

/// `pa11y`-compatible command-line scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandScanner {
    program: String,
    args: Vec<String>,
}

impl Default for CommandScanner {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM, ["--reporter", "json"])
    }
}

impl CommandScanner {
    /// Create a scanner invoking `program` with `args` followed by the document URL
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Program name
    #[inline]
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl IssueScanner for CommandScanner {
    async fn scan(&self, path: &Path) -> Result<Vec<Issue>, ScanError> {
        let path = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| ScanError::io_error(path, e))?;
        let target = format!("file://{}", path.display());
        debug!(program = %self.program, target = %target, "running scanner");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&target)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ScanError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let status = output.status.code();
        if !status.is_some_and(|code| SUCCESS_STATUSES.contains(&code)) {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(?status, stderr = %stderr, "scanner failed");
            return Err(ScanError::Failed { status, stderr });
        }

        let issues = parse_report(&String::from_utf8_lossy(&output.stdout))?;
        info!(issues = issues.len(), "scan complete");
        Ok(issues)
    }
}

/// Normalize a scanner JSON report into issues
///
/// Accepted shapes: an array of issues, an object with an `issues` array,
/// or an array of such objects (one per scanned page). Unknown fields are
/// ignored.
///
/// # Errors
/// - `ScanError::UnparsableOutput` if the text is not one of those shapes
pub fn parse_report(stdout: &str) -> Result<Vec<Issue>, ScanError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| ScanError::UnparsableOutput(e.to_string()))?;

    let mut raw = Vec::new();
    collect_issues(value, &mut raw)?;
    raw.into_iter()
        .map(|v| serde_json::from_value(v).map_err(|e| ScanError::UnparsableOutput(e.to_string())))
        .collect()
}

fn collect_issues(value: Value, out: &mut Vec<Value>) -> Result<(), ScanError> {
    match value {
        Value::Array(items) => {
            for item in items {
                if item.as_object().is_some_and(|map| map.contains_key("issues")) {
                    collect_issues(item, out)?;
                } else {
                    out.push(item);
                }
            }
            Ok(())
        }
        Value::Object(mut map) => match map.remove("issues") {
            Some(issues @ Value::Array(_)) => collect_issues(issues, out),
            _ => Err(ScanError::UnparsableOutput("report has no issues array".into())),
        },
        other => Err(ScanError::UnparsableOutput(format!("unexpected report: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUE: &str = r#"{
        "code": "WCAG2AA.Principle1.Guideline1_1.1_1_1.H30.2",
        "type": "error",
        "typeCode": 1,
        "message": "Img element is missing alt text",
        "context": "<img src=\"a.jpg\">",
        "selector": "html > body > img",
        "runner": "htmlcs",
        "runnerExtras": {}
    }"#;

    #[test]
    fn parses_bare_array() {
        let issues = parse_report(&format!("[{ISSUE}]")).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].selector, "html > body > img");
    }

    #[test]
    fn parses_result_object() {
        let issues = parse_report(&format!(
            r#"{{"documentTitle": "t", "pageUrl": "u", "issues": [{ISSUE}, {ISSUE}]}}"#
        ))
        .unwrap();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn parses_array_of_result_objects() {
        let issues = parse_report(&format!(
            r#"[{{"issues": [{ISSUE}]}}, {{"issues": []}}]"#
        ))
        .unwrap();
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn document_level_issue_with_null_context_parses() {
        let report = r#"[{
            "code": "WCAG2AA.Principle3.Guideline3_1.3_1_1.H57.2",
            "type": "error",
            "message": "The html element should have a lang attribute",
            "context": null,
            "selector": "",
            "runner": "htmlcs"
        }, {ISSUE}]"#
            .replace("{ISSUE}", ISSUE);
        let issues = parse_report(&report).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].context, "");
        assert_eq!(issues[0].selector, "");
        assert_eq!(issues[0].runner, "htmlcs");
        assert_eq!(issues[1].selector, "html > body > img");
    }

    #[test]
    fn empty_output_is_no_issues() {
        assert!(parse_report("\n").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_unparsable() {
        assert!(matches!(
            parse_report("Error: could not launch browser"),
            Err(ScanError::UnparsableOutput(_))
        ));
        assert!(matches!(parse_report("42"), Err(ScanError::UnparsableOutput(_))));
    }

    #[tokio::test]
    async fn missing_document_is_io_error() {
        let scanner = CommandScanner::default();
        let err = scanner.scan(Path::new("/definitely/not/here.html")).await.unwrap_err();
        assert!(matches!(err, ScanError::Io { .. }));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
        let scanner = CommandScanner::new("a11y-no-such-scanner-binary", Vec::<String>::new());
        let err = scanner.scan(file.path()).await.unwrap_err();
        assert!(matches!(err, ScanError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_status_two_with_report_is_success() {
        let file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
        let script = format!("printf '%s' '[{}]'; exit 2", ISSUE.replace('\n', " ").replace('\'', ""));
        let scanner = CommandScanner::new("sh", ["-c".to_string(), script, "scanner".to_string()]);
        let issues = scanner.scan(file.path()).await.unwrap();
        assert_eq!(issues.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn other_exit_status_is_failure() {
        let file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
        let scanner = CommandScanner::new("sh", ["-c", "echo boom >&2; exit 1", "scanner"]);
        let err = scanner.scan(file.path()).await.unwrap_err();
        match err {
            ScanError::Failed { status, stderr } => {
                assert_eq!(status, Some(1));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
