//! Subcommand handlers
//!
//! Each handler writes its result to stdout and returns the process status.
//! Logs go to stderr.

use crate::input::{self, opt};
use a11y_core::{Pipeline, RunMode, TaskClassifier};
use a11y_llm::{LlmGateway, PageContext};
use a11y_model::{Report, Task, WcagMappingTable};
use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::ArgMatches;
use serde_json::{json, Value};
use std::process::ExitCode;
use tracing::info;

/// Dispatch the chosen subcommand
pub(crate) async fn run(matches: &ArgMatches) -> Result<ExitCode> {
    match matches.subcommand() {
        Some(("report", sub)) => report(sub).await,
        Some(("improve", sub)) => improve(sub).await,
        Some(("alt-text", sub)) => alt_text(sub).await,
        Some(("solve-issue", sub)) => solve_issue(sub).await,
        Some(("list-models", sub)) => list_models(sub).await,
        Some((other, _)) => bail!("unknown command {other}"),
        None => bail!("no command given"),
    }
}

fn status(report: &Report) -> ExitCode {
    if report.pass_threshold {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn report(matches: &ArgMatches) -> Result<ExitCode> {
    let config = input::load_config(matches)?;
    let html = input::read_html(matches).await?;
    let context = input::report_context(context_arg(matches))?;

    let pipeline = Pipeline::from_config(config, RunMode::Report)?;
    let report = pipeline.report(&html, context).await?;
    info!(
        total = report.total_issues,
        filtered = report.filtered_issues,
        pass = report.pass_threshold,
        "report ready"
    );
    print_json(&report)?;
    Ok(status(&report))
}

async fn improve(matches: &ArgMatches) -> Result<ExitCode> {
    let config = input::load_config(matches)?;
    let html = input::read_html(matches).await?;
    let context = input::report_context(context_arg(matches))?;

    let pipeline = Pipeline::from_config(config, RunMode::Improve)?;
    let outcome = pipeline.improve(&html, context).await?;
    info!(
        applied = outcome.remediation.applied(),
        unapplied = outcome.remediation.unapplied().count(),
        remaining = outcome.remaining_issues.as_ref().map(Vec::len),
        "document improved"
    );
    if opt::<bool>(matches, "raw").copied().unwrap_or(false) {
        println!("{}", outcome.fixed_html);
    } else {
        println!("{}", STANDARD.encode(outcome.fixed_html.as_bytes()));
    }
    Ok(status(&outcome.report))
}

async fn alt_text(matches: &ArgMatches) -> Result<ExitCode> {
    let gateway = input::load_config(matches)?.build_gateway()?;
    let page = opt::<String>(matches, "context")
        .map(String::as_str)
        .and_then(input::alt_context);

    let output = match opt::<String>(matches, "existing-alt") {
        Some(alt) => {
            let page = page.context("--existing-alt needs a non-empty --context")?;
            let context = context_text(&gateway, page).await?;
            let (relevancy, reasoning) = gateway.check_relevancy(alt, &context).await?;
            json!({
                "altText": alt,
                "relevancy": relevancy,
                "relevancyLabel": relevancy.label(),
                "reasoning": reasoning,
            })
        }
        None => {
            let image = opt::<String>(matches, "image").context("an image is required")?;
            let proposal = gateway
                .generate_alt_text(&input::image_input(image), page.as_ref())
                .await?;
            let mut output = serde_json::to_value(&proposal)?;
            output["relevancyLabel"] = Value::from(proposal.relevancy.label());
            output
        }
    };
    print_json(&output)?;
    Ok(ExitCode::SUCCESS)
}

async fn context_text(gateway: &LlmGateway, context: PageContext) -> Result<String> {
    Ok(match context {
        PageContext::Text(text) => text,
        PageContext::Markup(markup) => gateway.summarize_page(&markup).await?,
    })
}

async fn solve_issue(matches: &ArgMatches) -> Result<ExitCode> {
    let config = input::load_config(matches)?.with_semantic_rule(false);
    let html = input::read_html(matches).await?;
    let context = input::report_context(context_arg(matches))?;
    let issue = input::issue(opt::<String>(matches, "issue").map_or("", String::as_str))?;

    let task = match opt::<String>(matches, "issue-type") {
        Some(name) => name
            .parse::<Task>()
            .map_err(a11y_core::ConfigurationError::from)?,
        None => TaskClassifier::new(&WcagMappingTable::standard()).classify(&issue),
    };

    let pipeline = Pipeline::from_config(config, RunMode::Improve)?;
    let solution = pipeline.solve_issue(&html, &issue, task).await?;
    print_json(&json!({
        "issueType": task,
        "originalIssue": issue,
        "solution": solution,
        "context": context,
    }))?;
    Ok(ExitCode::SUCCESS)
}

async fn list_models(matches: &ArgMatches) -> Result<ExitCode> {
    let gateway = input::load_config(matches)?.build_gateway()?;
    print_json(&gateway.list_vision_models().await)?;
    Ok(ExitCode::SUCCESS)
}

fn context_arg(matches: &ArgMatches) -> &str {
    opt::<String>(matches, "context").map_or("{}", String::as_str)
}

/// Status for a failed command
///
/// Pipeline errors carry their own status; bad input and configuration
/// share the configuration status.
pub(crate) fn failure_status(err: &anyhow::Error) -> u8 {
    if let Some(err) = err.downcast_ref::<a11y_core::PipelineError>() {
        return u8::try_from(err.exit_code()).unwrap_or(5);
    }
    if err.downcast_ref::<a11y_core::ConfigurationError>().is_some()
        || err.downcast_ref::<input::InputError>().is_some()
    {
        return 2;
    }
    if err.downcast_ref::<a11y_llm::GenerationError>().is_some() {
        return 4;
    }
    5
}
