//! End-to-end pipeline scenarios over scripted collaborators
//!
//! Tenet: a run either completes with a report naming total vs. filtered
//! counts, or fails at exactly one stage; per-issue application problems
//! never fail the run.

use a11y_core::{
    Pipeline, PipelineConfig, PipelineError, PipelineOutcome, PostProcessHook, RemediationStatus,
    SkipReason,
};
use a11y_dom::PatchOutcome;
use a11y_llm::{GatewayConfig, GenerationError, LlmGateway, TransportError};
use a11y_model::{Issue, Relevancy, Task};
use a11y_test_utils::{fixtures, ScriptedBackend, StaticScanner};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

fn sequential_config() -> PipelineConfig {
    let mut config = PipelineConfig::default().with_semantic_rule(false);
    config.remediation.concurrency = 1;
    config
}

fn gateway(backend: &ScriptedBackend) -> LlmGateway {
    LlmGateway::new(Arc::new(backend.clone()))
}

#[derive(Default)]
struct RecordingHook {
    seen: Mutex<Vec<(String, usize)>>,
}

impl PostProcessHook for RecordingHook {
    fn after_run(&self, original: &str, outcome: &PipelineOutcome) {
        self.seen
            .lock()
            .unwrap()
            .push((original.to_string(), outcome.remediation.applied()));
    }
}

#[tokio::test]
async fn threshold_zero_with_one_issue_fails() {
    let scanner = StaticScanner::new(vec![fixtures::missing_alt_issue()]);
    let pipeline = Pipeline::with_parts(
        PipelineConfig::default().with_semantic_rule(false),
        Arc::new(scanner),
        None,
    )
    .unwrap();

    let report = pipeline.report(fixtures::CLEAN_PAGE, json!({})).await.unwrap();
    assert_eq!(report.total_issues, 1);
    assert_eq!(report.filtered_issues, 1);
    assert_eq!(report.threshold, 0);
    assert!(!report.pass_threshold);
}

#[tokio::test]
async fn clean_page_passes() {
    let pipeline = Pipeline::with_parts(
        PipelineConfig::default().with_semantic_rule(false),
        Arc::new(StaticScanner::default()),
        None,
    )
    .unwrap();
    let report = pipeline.report(fixtures::CLEAN_PAGE, Value::Null).await.unwrap();
    assert_eq!(report.total_issues, 0);
    assert!(report.pass_threshold);
    assert!(Task::all().iter().all(|t| report.count_for(*t) == 0));
}

#[tokio::test]
async fn report_json_uses_host_keys() {
    let scanner = StaticScanner::new(vec![fixtures::missing_alt_issue(), fixtures::bypass_issue()]);
    let pipeline = Pipeline::with_parts(
        PipelineConfig::default()
            .with_semantic_rule(false)
            .with_threshold(5)
            .with_exclude_tasks(vec!["SKIP_CONTENT".into()]),
        Arc::new(scanner),
        None,
    )
    .unwrap();

    let report = pipeline.report(fixtures::TOOLBAR_PAGE, json!({"url": "/editor"})).await.unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["totalIssues"], 4);
    assert_eq!(value["filteredIssues"], 3);
    assert_eq!(value["categorizedCounts"]["SKIP_CONTENT"], 1);
    assert_eq!(value["categorizedCounts"]["BUTTON"], 2);
    assert_eq!(value["categorizedCounts"]["SEMANTIC_STRUCTURE"], 0);
    assert_eq!(value["passThreshold"], true);
    assert_eq!(value["context"]["url"], "/editor");
    assert_eq!(value["issues"][0]["taskType"], "ALT_TEXT");
}

#[tokio::test]
async fn semantic_rule_adds_model_judged_issues() {
    let backend = ScriptedBackend::new([
        r##"<fix_output>{"issues": [{"selector": "#more", "message": "Link text does not describe its target"}]}</fix_output>"##,
    ]);
    let pipeline = Pipeline::with_parts(
        PipelineConfig::default(),
        Arc::new(StaticScanner::default()),
        Some(gateway(&backend)),
    )
    .unwrap();

    let html = r#"<main><p>News <a id="more" href="/news">click here</a></p></main>"#;
    let report = pipeline.report(html, Value::Null).await.unwrap();
    assert_eq!(report.total_issues, 1);
    assert_eq!(report.count_for(Task::Button), 1);
    assert_eq!(report.issues[0].runner, "custom-detector");
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn improve_fixes_images_and_buttons() {
    let backend = ScriptedBackend::new([
        fixtures::alt_reply("Snowy mountain at dawn"),
        fixtures::fix_reply(
            r#"<div class="toolbar"><button class="bold" aria-label="Bold"></button><button aria-label="Italic"></button><button class="underline" aria-label="Underline"></button></div>"#,
        ),
        fixtures::fix_reply(r#"<div class="toolbar"></div>"#),
    ]);
    let scanner = Arc::new(StaticScanner::sequence(vec![
        vec![fixtures::missing_alt_issue()],
        Vec::new(),
    ]));
    let hook = Arc::new(RecordingHook::default());
    let pipeline = Pipeline::with_parts(
        sequential_config().with_verify(true),
        scanner.clone(),
        Some(gateway(&backend)),
    )
    .unwrap()
    .with_hook(hook.clone());

    let outcome = pipeline.improve(fixtures::TOOLBAR_PAGE, Value::Null).await.unwrap();

    let statuses: Vec<_> = outcome
        .remediation
        .entries
        .iter()
        .map(|e| (e.selector.as_str(), e.task, e.status.clone()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("#hero", Task::AltText, RemediationStatus::Applied),
            ("button.bold", Task::Button, RemediationStatus::Applied),
            (
                "button.underline",
                Task::Button,
                RemediationStatus::Unapplied(PatchOutcome::Stale)
            ),
        ]
    );
    assert_eq!(outcome.remediation.entries[0].relevancy, Some(Relevancy::NEUTRAL));

    assert!(outcome.fixed_html.contains(r#"alt="Snowy mountain at dawn""#));
    assert!(outcome.fixed_html.contains(r#"aria-label="Underline""#));
    assert_eq!(outcome.report.filtered_issues, 3);
    assert_eq!(backend.calls(), 3);

    assert_eq!(outcome.remaining_issues.as_deref(), Some(&[][..]));
    let scanned = scanner.scanned_documents();
    assert_eq!(scanned.len(), 2);
    assert!(scanned[1].contains("Snowy mountain at dawn"));

    let seen = hook.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, fixtures::TOOLBAR_PAGE);
    assert_eq!(seen[0].1, 2);
}

#[tokio::test]
async fn unresolvable_issue_is_skipped_and_others_apply() {
    let ghost = Issue::new("WCAG2AA.Principle4.Guideline4_1.4_1_2.H91", "Button has no name")
        .with_selector("#ghost");
    let backend = ScriptedBackend::new([fixtures::fix_reply(
        r#"<div class="toolbar"><button class="bold">B</button><button aria-label="Italic"></button><button class="underline">U</button></div>"#,
    )]);
    let pipeline = Pipeline::with_parts(
        sequential_config(),
        Arc::new(StaticScanner::new(vec![ghost])),
        Some(gateway(&backend)),
    )
    .unwrap();

    let page = r#"<main><div class="toolbar"><button class="bold"></button><button aria-label="Italic"></button></div></main>"#;
    let outcome = pipeline.improve(page, Value::Null).await.unwrap();

    assert_eq!(
        outcome.remediation.entries[0].status,
        RemediationStatus::Skipped(SkipReason::NotFound)
    );
    assert_eq!(outcome.remediation.entries[1].status, RemediationStatus::Applied);
    assert_eq!(backend.calls(), 1);
    assert!(outcome.fixed_html.contains("<button class=\"bold\">B</button>"));
}

#[tokio::test]
async fn generation_without_envelope_fails_after_budget() {
    let backend = ScriptedBackend::repeating("I fixed it, trust me.");
    let gateway = LlmGateway::with_config(
        Arc::new(backend.clone()),
        GatewayConfig {
            max_retries: 3,
            ..GatewayConfig::default()
        },
    );
    let pipeline = Pipeline::with_parts(
        sequential_config(),
        Arc::new(StaticScanner::default()),
        Some(gateway),
    )
    .unwrap();

    let err = pipeline
        .improve("<main><button></button></main>", Value::Null)
        .await
        .unwrap_err();
    assert_eq!(backend.calls(), 4);
    assert_eq!(err.exit_code(), 4);
    match err {
        PipelineError::Generation(GenerationError::RetriesExhausted { attempts, last }) => {
            assert_eq!(attempts, 4);
            assert!(matches!(*last, GenerationError::EnvelopeMissing));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn nothing_to_fix_leaves_document_untouched() {
    let backend = ScriptedBackend::default();
    let pipeline = Pipeline::with_parts(
        sequential_config(),
        Arc::new(StaticScanner::default()),
        Some(gateway(&backend)),
    )
    .unwrap();

    let outcome = pipeline.improve(fixtures::CLEAN_PAGE, Value::Null).await.unwrap();
    assert_eq!(outcome.fixed_html, fixtures::CLEAN_PAGE);
    assert!(outcome.remediation.entries.is_empty());
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn solve_issue_returns_proposal_without_applying() {
    let backend = ScriptedBackend::new([fixtures::fix_reply("<nav><a href=\"#main\">Skip</a></nav>")]);
    let pipeline = Pipeline::with_parts(
        sequential_config(),
        Arc::new(StaticScanner::default()),
        Some(gateway(&backend)),
    )
    .unwrap();

    let issue = fixtures::bypass_issue();
    let proposal = pipeline
        .solve_issue(fixtures::TOOLBAR_PAGE, &issue, Task::SkipContent)
        .await
        .unwrap();
    assert_eq!(proposal.proposed_markup(), Some("<nav><a href=\"#main\">Skip</a></nav>"));
    assert!(backend.prompt_text(0).contains("[Task: SKIP_CONTENT]"));
}

#[tokio::test]
async fn page_context_scores_generated_alt_text() {
    let backend = ScriptedBackend::new([fixtures::alt_reply_scored("Snowy peak above the valley", 0.9)]);
    let pipeline = Pipeline::with_parts(
        sequential_config(),
        Arc::new(StaticScanner::new(vec![fixtures::missing_alt_issue()])),
        Some(gateway(&backend)),
    )
    .unwrap();

    let page = r#"<main><img id="hero" src="https://cdn.example/hero.png"></main>"#;
    let outcome = pipeline
        .improve(page, json!({"context": "Mountain photography blog"}))
        .await
        .unwrap();

    assert_eq!(outcome.remediation.entries.len(), 1);
    assert_eq!(outcome.remediation.entries[0].relevancy, Some(Relevancy::new(0.9)));
    assert!(outcome.fixed_html.contains(r#"alt="Snowy peak above the valley""#));
    assert!(backend.prompt_text(0).contains("Mountain photography blog"));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn transient_transport_failure_is_retried() {
    let backend = ScriptedBackend::default();
    backend
        .push_error(TransportError::status(503, "overloaded"))
        .push_reply(fixtures::fix_reply("<main><button>Save</button></main>"));
    let pipeline = Pipeline::with_parts(
        sequential_config(),
        Arc::new(StaticScanner::default()),
        Some(gateway(&backend)),
    )
    .unwrap();

    let outcome = pipeline
        .improve("<body><main><button></button></main></body>", Value::Null)
        .await
        .unwrap();
    assert_eq!(backend.calls(), 2);
    assert_eq!(outcome.remediation.applied(), 1);
    assert!(outcome.fixed_html.contains("<button>Save</button>"));
}

#[tokio::test]
async fn vision_models_are_listed_from_the_backend() {
    let backend = ScriptedBackend::default().with_models(["gpt-4o", "gpt-3.5-turbo", "llava-vision-1"]);
    assert_eq!(
        gateway(&backend).list_vision_models().await,
        vec!["gpt-4o".to_string(), "llava-vision-1".to_string()]
    );

    let empty = ScriptedBackend::default();
    assert_eq!(gateway(&empty).list_vision_models().await, vec!["gpt-4o".to_string()]);
}
