//! Pipeline Orchestrator
//!
//! One run walks a document through:
//!
//! ```text
//! materialize → scan → detect → classify → filter → report
//!                                              ↓ (improve)
//!                     plan → generate (buffered) → apply → verify → hooks
//! ```
//!
//! Each run is wrapped in a `pipeline_run` span carrying its `run_id`.
//! Every stage error is fatal; per-issue application problems are recorded
//! in the [`RemediationSummary`] and the run continues.

use crate::classify::TaskClassifier;
use crate::config::{PipelineConfig, RunMode, API_KEY_ENV};
use crate::error::{ConfigurationError, PipelineError, PipelineResult};
use crate::filter::TaskFilter;
use crate::hook::PostProcessHook;
use crate::remediation::{page_context_from, Planned, RemediationJob, Remediator, SkipReason};
use a11y_detect::{CustomDetector, IssueScanner};
use a11y_dom::{FixApplier, HtmlDocument, Patch, PatchEntry, PatchOutcome};
use a11y_llm::LlmGateway;
use a11y_model::{FixProposal, Issue, Relevancy, Report, ReportBuilder, Task, WcagMappingTable};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// What happened to one filtered issue during remediation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationStatus {
    /// Fix applied to the document
    Applied,
    /// No generation call was made
    Skipped(SkipReason),
    /// Fix generated but not applied
    Unapplied(PatchOutcome),
}

/// Remediation record for one filtered issue
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationEntry {
    /// Issue code
    pub code: String,
    /// Issue selector at detection time
    pub selector: String,
    /// Assigned task
    pub task: Task,
    /// Outcome
    pub status: RemediationStatus,
    /// Relevancy of generated alt text
    pub relevancy: Option<Relevancy>,
}

/// Per-issue remediation records, in filtered-issue order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemediationSummary {
    /// One entry per filtered issue
    pub entries: Vec<RemediationEntry>,
}

impl RemediationSummary {
    /// Number of fixes applied
    #[must_use]
    pub fn applied(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == RemediationStatus::Applied)
            .count()
    }

    /// Entries that did not change the document
    pub fn unapplied(&self) -> impl Iterator<Item = &RemediationEntry> {
        self.entries
            .iter()
            .filter(|e| e.status != RemediationStatus::Applied)
    }
}

/// Result of an improve run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Report over the original document
    pub report: Report,
    /// Serialized document after fixes
    pub fixed_html: String,
    /// Per-issue remediation records
    pub remediation: RemediationSummary,
    /// Issues found by the verification re-scan, when enabled
    pub remaining_issues: Option<Vec<Issue>>,
}

/// Detection result over one document
struct Analysis {
    all: Vec<Issue>,
    filtered: Vec<Issue>,
}

/// Accessibility remediation pipeline
pub struct Pipeline {
    config: PipelineConfig,
    filter: TaskFilter,
    table: WcagMappingTable,
    scanner: Arc<dyn IssueScanner>,
    detector: CustomDetector,
    remediator: Option<Remediator>,
    hooks: Vec<Arc<dyn PostProcessHook>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("filter", &self.filter)
            .field("semantic_rule", &self.detector.has_semantic_rule())
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Build a pipeline for `mode` with the command-line scanner and HTTP backend
    ///
    /// # Errors
    /// - `ConfigurationError` if the configuration is invalid for `mode`
    pub fn from_config(config: PipelineConfig, mode: RunMode) -> Result<Self, ConfigurationError> {
        config.validate(mode)?;
        let gateway = if config.needs_model(mode) {
            Some(config.build_gateway()?)
        } else {
            None
        };
        let scanner = Arc::new(config.build_scanner());
        Self::with_parts(config, scanner, gateway)
    }

    /// Build a pipeline from explicit collaborators
    ///
    /// # Errors
    /// - `ConfigurationError::UnknownTask` for a bad include/exclude list
    /// - `ConfigurationError::MissingCredential` if the semantic rule is on without a gateway
    pub fn with_parts(
        config: PipelineConfig,
        scanner: Arc<dyn IssueScanner>,
        gateway: Option<LlmGateway>,
    ) -> Result<Self, ConfigurationError> {
        let filter = TaskFilter::from_names(&config.include_tasks, &config.exclude_tasks)?;

        let mut detector = CustomDetector::new().with_max_prompt_chars(config.detector.max_prompt_chars);
        if config.detector.semantic_rule {
            let gateway = gateway
                .clone()
                .ok_or(ConfigurationError::MissingCredential { env: API_KEY_ENV })?;
            detector = detector.with_gateway(gateway);
        }

        let remediator = gateway.map(|gateway| {
            Remediator::new(gateway).with_asset_root(config.remediation.asset_root.clone())
        });

        Ok(Self {
            config,
            filter,
            table: WcagMappingTable::standard(),
            scanner,
            detector,
            remediator,
            hooks: Vec::new(),
        })
    }

    /// Register a hook called after every improve run
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn PostProcessHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Detect, classify and filter issues, then report
    ///
    /// # Arguments
    /// * `html` - Document markup
    /// * `context` - Caller context, copied into the report
    ///
    /// # Errors
    /// - `PipelineError` from the first failing stage
    pub async fn report(&self, html: &str, context: Value) -> PipelineResult<Report> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("pipeline_run", run_id = %run_id, mode = "report");
        async {
            let doc = HtmlDocument::parse(html)?;
            let analysis = self.analyze(&doc).await?;
            Ok::<_, PipelineError>(self.build_report(&run_id, analysis.all, analysis.filtered, context))
        }
        .instrument(span)
        .await
    }

    /// Full run: report, then generate and apply fixes for the filtered issues
    ///
    /// # Errors
    /// - `ConfigurationError::MissingCredential` without a gateway
    /// - `PipelineError` from the first failing stage
    pub async fn improve(&self, html: &str, context: Value) -> PipelineResult<PipelineOutcome> {
        let remediator = self
            .remediator
            .as_ref()
            .ok_or(ConfigurationError::MissingCredential { env: API_KEY_ENV })?
            .clone()
            .with_page_context(page_context_from(&context));

        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("pipeline_run", run_id = %run_id, mode = "improve");
        let outcome = async {
            let mut doc = HtmlDocument::parse(html)?;
            let analysis = self.analyze(&doc).await?;

            let plans: Vec<Planned> = analysis
                .filtered
                .iter()
                .map(|issue| remediator.plan(&doc, issue, task_of(issue)))
                .collect();
            let proposals = self.generate(&remediator, &plans).await?;

            let patches: Vec<Patch> = proposals
                .iter()
                .filter_map(|p| p.proposed_markup().map(|m| Patch::new(p.selector(), m)))
                .collect();
            let applied = FixApplier::new().apply(&mut doc, &patches);
            let remediation = summarize(&analysis.filtered, &plans, &proposals, applied.entries);
            info!(
                filtered = analysis.filtered.len(),
                applied = remediation.applied(),
                "remediation complete"
            );

            let fixed_html = doc.serialize();
            let remaining_issues = if self.config.remediation.verify {
                Some(self.verify(&fixed_html).await?)
            } else {
                None
            };

            Ok::<_, PipelineError>(PipelineOutcome {
                report: self.build_report(&run_id, analysis.all, analysis.filtered, context),
                fixed_html,
                remediation,
                remaining_issues,
            })
        }
        .instrument(span)
        .await?;

        for hook in &self.hooks {
            hook.after_run(html, &outcome);
        }
        Ok(outcome)
    }

    /// Generate a fix for a single issue of `html`, outside a run
    ///
    /// # Errors
    /// - `ConfigurationError::MissingCredential` without a gateway
    /// - `PipelineError::Dom` if the markup is empty
    /// - `PipelineError::Generation` if the model call fails
    pub async fn solve_issue(&self, html: &str, issue: &Issue, task: Task) -> PipelineResult<FixProposal> {
        let remediator = self
            .remediator
            .as_ref()
            .ok_or(ConfigurationError::MissingCredential { env: API_KEY_ENV })?;
        let doc = HtmlDocument::parse(html)?;
        Ok(remediator.solve_issue(&doc, issue, task).await?)
    }

    async fn analyze(&self, doc: &HtmlDocument) -> PipelineResult<Analysis> {
        let mut all = self.scan(doc.source()).await?;
        let custom = self.detector.detect(doc).await.map_err(|e| {
            error!(error = %e, "custom detection failed");
            e
        })?;
        all.extend(custom);

        TaskClassifier::new(&self.table).classify_all(&mut all);
        let filtered = self.filter.apply(&all);
        info!(total = all.len(), filtered = filtered.len(), "issues classified and filtered");
        Ok(Analysis { all, filtered })
    }

    /// Materialize `markup`, run the scanner on it and remove the file
    async fn scan(&self, markup: &str) -> PipelineResult<Vec<Issue>> {
        let file = self.materialize(markup).await?;
        let result = self.scanner.scan(file.path()).await;
        if let Err(e) = file.close() {
            warn!(error = %e, "failed to remove materialized document");
        }
        result.map_err(|e| {
            error!(error = %e, "scan failed");
            PipelineError::from(e)
        })
    }

    async fn materialize(&self, markup: &str) -> PipelineResult<NamedTempFile> {
        let dir = self.config.work_dir();
        let file = tempfile::Builder::new()
            .prefix("a11y-")
            .suffix(".html")
            .tempfile_in(&dir)
            .map_err(|e| PipelineError::materialize(&dir, e))?;
        tokio::fs::write(file.path(), markup)
            .await
            .map_err(|e| PipelineError::materialize(&dir, e))?;
        debug!(path = %file.path().display(), "document materialized");
        Ok(file)
    }

    /// Run every planned job, `concurrency` at a time, keeping plan order
    async fn generate(&self, remediator: &Remediator, plans: &[Planned]) -> PipelineResult<Vec<FixProposal>> {
        let jobs: Vec<&RemediationJob> = plans
            .iter()
            .filter_map(|plan| match plan {
                Planned::Job(job) => Some(job),
                Planned::Skipped(_) => None,
            })
            .collect();
        debug!(jobs = jobs.len(), "dispatching generation calls");

        stream::iter(jobs.into_iter().map(|job| remediator.generate(job)))
            .buffered(self.config.remediation.concurrency.max(1))
            .try_collect()
            .await
            .map_err(|e| {
                error!(error = %e, stage = e.stage(), "fix generation failed");
                PipelineError::from(e)
            })
    }

    async fn verify(&self, fixed_html: &str) -> PipelineResult<Vec<Issue>> {
        let mut remaining = self.scan(fixed_html).await?;
        TaskClassifier::new(&self.table).classify_all(&mut remaining);
        info!(remaining = remaining.len(), "verification scan complete");
        Ok(remaining)
    }

    fn build_report(&self, run_id: &str, all: Vec<Issue>, filtered: Vec<Issue>, context: Value) -> Report {
        let report = ReportBuilder::new(run_id)
            .with_all_issues(&all)
            .with_filtered(filtered)
            .with_context(context)
            .with_threshold(self.config.threshold)
            .build();
        info!(
            total = report.total_issues,
            filtered = report.filtered_issues,
            pass = report.pass_threshold,
            "report built"
        );
        report
    }
}

fn task_of(issue: &Issue) -> Task {
    issue.task_type.unwrap_or(Task::SemanticStructure)
}

/// Join plans, proposals and patch outcomes back onto the filtered issues
fn summarize(
    issues: &[Issue],
    plans: &[Planned],
    proposals: &[FixProposal],
    patch_entries: Vec<PatchEntry>,
) -> RemediationSummary {
    let mut proposals = proposals.iter();
    let mut outcomes = patch_entries.into_iter().map(|entry| entry.outcome);
    let entries = issues
        .iter()
        .zip(plans)
        .map(|(issue, plan)| {
            let (status, relevancy) = match plan {
                Planned::Skipped(reason) => {
                    warn!(code = %issue.code, selector = %issue.selector, ?reason, "issue not remediated");
                    (RemediationStatus::Skipped(reason.clone()), None)
                }
                Planned::Job(_) => {
                    let proposal = proposals.next();
                    let relevancy = match proposal {
                        Some(FixProposal::AltText { proposal, .. }) => Some(proposal.relevancy),
                        _ => None,
                    };
                    let outcome = if proposal.and_then(FixProposal::proposed_markup).is_some() {
                        outcomes.next().unwrap_or(PatchOutcome::NotFound)
                    } else {
                        PatchOutcome::NotFound
                    };
                    let status = if outcome.is_applied() {
                        RemediationStatus::Applied
                    } else {
                        RemediationStatus::Unapplied(outcome)
                    };
                    (status, relevancy)
                }
            };
            RemediationEntry {
                code: issue.code.clone(),
                selector: issue.selector.clone(),
                task: task_of(issue),
                status,
                relevancy,
            }
        })
        .collect();
    RemediationSummary { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a11y_test_utils::{fixtures, ScriptedBackend, StaticScanner};

    fn config() -> PipelineConfig {
        PipelineConfig::default().with_semantic_rule(false)
    }

    #[tokio::test]
    async fn report_counts_all_and_filtered() {
        let scanner = StaticScanner::new(vec![fixtures::missing_alt_issue()]);
        let pipeline = Pipeline::with_parts(
            config().with_include_tasks(vec!["BUTTON".into()]),
            Arc::new(scanner),
            None,
        )
        .unwrap();

        let report = pipeline
            .report(fixtures::TOOLBAR_PAGE, serde_json::json!({"postId": 7}))
            .await
            .unwrap();
        assert_eq!(report.total_issues, 3);
        assert_eq!(report.filtered_issues, 2);
        assert_eq!(report.count_for(Task::AltText), 1);
        assert_eq!(report.count_for(Task::Button), 2);
        assert_eq!(report.context["postId"], 7);
        assert!(!report.pass_threshold);
    }

    #[tokio::test]
    async fn improve_without_gateway_is_configuration_error() {
        let pipeline = Pipeline::with_parts(config(), Arc::new(StaticScanner::default()), None).unwrap();
        let err = pipeline.improve("<p>x</p>", Value::Null).await.unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn semantic_rule_requires_gateway() {
        let err = Pipeline::with_parts(
            PipelineConfig::default(),
            Arc::new(StaticScanner::default()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingCredential { .. }));
    }

    #[tokio::test]
    async fn scan_failure_aborts_run() {
        let pipeline =
            Pipeline::with_parts(config(), Arc::new(StaticScanner::failing("browser crashed")), None).unwrap();
        let err = pipeline.report("<p>x</p>", Value::Null).await.unwrap_err();
        assert!(matches!(err, PipelineError::Scan(_)));
    }

    #[tokio::test]
    async fn materialized_document_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config();
        cfg.scanner.work_dir = Some(dir.path().to_path_buf());
        let scanner = Arc::new(StaticScanner::default());
        let pipeline = Pipeline::with_parts(cfg, scanner.clone(), None).unwrap();

        pipeline.report("<p>x</p>", Value::Null).await.unwrap();
        let seen = scanner.scanned_paths();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with(dir.path()));
        assert!(!seen[0].exists());
    }

    #[tokio::test]
    async fn improve_applies_structured_fix() {
        let backend = ScriptedBackend::new([fixtures::fix_reply(
            r#"<div class="toolbar"><button aria-label="Bold">B</button></div>"#,
        )]);
        let gateway = LlmGateway::new(Arc::new(backend.clone()));
        let pipeline = Pipeline::with_parts(config(), Arc::new(StaticScanner::default()), Some(gateway)).unwrap();

        let outcome = pipeline
            .improve(r#"<main><div class="toolbar"><button></button></div></main>"#, Value::Null)
            .await
            .unwrap();
        assert_eq!(outcome.remediation.applied(), 1);
        assert!(outcome.fixed_html.contains(r#"aria-label="Bold""#));
        assert_eq!(backend.calls(), 1);
        assert!(outcome.remaining_issues.is_none());
    }
}
