//! Decoding of command-line input
//!
//! - HTML arrives base64-encoded as a positional argument, or raw via `--file`
//! - report/solve context is a JSON object echoed back to the caller
//! - alt-text context is plain text, JSON with a `context` field, or base64 HTML
//! - configuration layers file, then environment, then flags

use a11y_core::{page_context_from, ConfigurationError, PipelineConfig};
use a11y_llm::{ImageInput, PageContext};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::ArgMatches;
use serde_json::Value;
use std::any::Any;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Malformed command-line input
#[derive(Debug, Error)]
pub(crate) enum InputError {
    /// The HTML argument is not base64
    #[error("HTML argument is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes are not text
    #[error("{0} is not valid UTF-8")]
    NotUtf8(&'static str),

    /// An input file could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON argument does not parse
    #[error("{what} is not valid JSON: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A JSON argument parsed to the wrong shape
    #[error("{0} must be a JSON object")]
    NotAnObject(&'static str),
}

/// Value of `id` if the subcommand defines it and it was given
pub(crate) fn opt<'a, T>(matches: &'a ArgMatches, id: &str) -> Option<&'a T>
where
    T: Any + Clone + Send + Sync + 'static,
{
    matches.try_get_one::<T>(id).ok().flatten()
}

fn flag(matches: &ArgMatches, id: &str) -> bool {
    opt::<bool>(matches, id).copied().unwrap_or(false)
}

fn list(matches: &ArgMatches, id: &str) -> Option<Vec<String>> {
    matches
        .try_get_many::<String>(id)
        .ok()
        .flatten()
        .map(|values| values.map(|v| v.trim().to_string()).collect())
}

/// Decode a base64-encoded HTML document
///
/// # Errors
/// - `InputError::Base64` / `InputError::NotUtf8` for undecodable input
pub(crate) fn decode_html(encoded: &str) -> Result<String, InputError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    String::from_utf8(bytes).map_err(|_| InputError::NotUtf8("decoded HTML"))
}

/// HTML document from the `html` argument or the `--file` path
///
/// # Errors
/// - `InputError::Read` if the file cannot be read
/// - any [`decode_html`] error
pub(crate) async fn read_html(matches: &ArgMatches) -> Result<String, InputError> {
    if let Some(path) = opt::<PathBuf>(matches, "file") {
        return tokio::fs::read_to_string(path)
            .await
            .map_err(|source| InputError::Read {
                path: path.clone(),
                source,
            });
    }
    decode_html(opt::<String>(matches, "html").map_or("", String::as_str))
}

/// Context object echoed into reports
///
/// # Errors
/// - `InputError::Json` if `text` does not parse
/// - `InputError::NotAnObject` for anything but an object
pub(crate) fn report_context(text: &str) -> Result<Value, InputError> {
    let value: Value = serde_json::from_str(text).map_err(|source| InputError::Json {
        what: "--context",
        source,
    })?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(InputError::NotAnObject("--context"))
    }
}

/// Page context for alt text
///
/// JSON is read through its `context` field. Otherwise text that decodes
/// from base64 to markup is summarized, and anything else is used verbatim.
pub(crate) fn alt_context(text: &str) -> Option<PageContext> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if value.is_object() {
            return page_context_from(&value);
        }
    }
    match decode_html(text) {
        Ok(markup) if markup.contains('<') => Some(PageContext::Markup(markup)),
        _ => Some(PageContext::Text(text.to_string())),
    }
}

/// Image argument as a file, inline data or remote URL
pub(crate) fn image_input(arg: &str) -> ImageInput {
    let arg = arg.trim();
    if arg.starts_with("http://") || arg.starts_with("https://") {
        ImageInput::Url(arg.to_string())
    } else if arg.starts_with("data:") || !Path::new(arg).exists() {
        ImageInput::Inline(arg.to_string())
    } else {
        ImageInput::Path(PathBuf::from(arg))
    }
}

/// Parse a JSON issue argument
///
/// # Errors
/// - `InputError::Json` if it does not parse as an issue
pub(crate) fn issue(text: &str) -> Result<a11y_model::Issue, InputError> {
    serde_json::from_str(text).map_err(|source| InputError::Json {
        what: "issue",
        source,
    })
}

/// Configuration layered as flag > environment > file > defaults
///
/// Flags a subcommand does not define are ignored.
///
/// # Errors
/// - `ConfigurationError::InvalidFile` if `--config` cannot be loaded
pub(crate) fn load_config(matches: &ArgMatches) -> Result<PipelineConfig, ConfigurationError> {
    let config = match opt::<PathBuf>(matches, "config") {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    Ok(apply_flags(config.with_env(), matches))
}

fn apply_flags(mut config: PipelineConfig, matches: &ArgMatches) -> PipelineConfig {
    if let Some(key) = opt::<String>(matches, "api-key") {
        config = config.with_api_key(key.clone());
    }
    if let Some(model) = opt::<String>(matches, "model") {
        config = config.with_model(model.clone());
    }
    if let Some(include) = list(matches, "include") {
        config = config.with_include_tasks(include);
    }
    if let Some(exclude) = list(matches, "exclude") {
        config = config.with_exclude_tasks(exclude);
    }
    if let Some(threshold) = opt::<usize>(matches, "threshold") {
        config = config.with_threshold(*threshold);
    }
    if flag(matches, "no-semantic") {
        config = config.with_semantic_rule(false);
    }
    if flag(matches, "verify") {
        config = config.with_verify(true);
    }
    if let Some(root) = opt::<PathBuf>(matches, "asset-root") {
        config = config.with_asset_root(root.clone());
    }
    if let Some(concurrency) = opt::<usize>(matches, "concurrency") {
        config.remediation.concurrency = *concurrency;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;

    fn sub_matches(args: &[&str]) -> ArgMatches {
        let matches = cli::build().try_get_matches_from(args).unwrap();
        matches.subcommand().unwrap().1.clone()
    }

    #[test]
    fn base64_html_is_decoded() {
        let encoded = STANDARD.encode("<p>Hi</p>");
        assert_eq!(decode_html(&encoded).unwrap(), "<p>Hi</p>");
        assert!(matches!(decode_html("not base64!"), Err(InputError::Base64(_))));
        let latin = STANDARD.encode([0xff, 0xfe]);
        assert!(matches!(decode_html(&latin), Err(InputError::NotUtf8(_))));
    }

    #[tokio::test]
    async fn file_input_is_read_raw() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<main>raw</main>").unwrap();
        let matches = sub_matches(&["a11y", "report", "--file", path.to_str().unwrap()]);
        assert_eq!(read_html(&matches).await.unwrap(), "<main>raw</main>");

        let missing = sub_matches(&["a11y", "report", "--file", "/no/such/page.html"]);
        assert!(matches!(read_html(&missing).await, Err(InputError::Read { .. })));
    }

    #[test]
    fn report_context_must_be_an_object() {
        assert_eq!(report_context(r#"{"postId": 7}"#).unwrap()["postId"], 7);
        assert!(matches!(report_context("[1]"), Err(InputError::NotAnObject(_))));
        assert!(matches!(report_context("{"), Err(InputError::Json { .. })));
    }

    #[test]
    fn alt_context_forms() {
        assert_eq!(
            alt_context(r#"{"context": "Horse riding lessons"}"#),
            Some(PageContext::Text("Horse riding lessons".into()))
        );
        let markup = "<main><h1>Stables</h1></main>";
        assert_eq!(
            alt_context(&STANDARD.encode(markup)),
            Some(PageContext::Markup(markup.into()))
        );
        assert_eq!(
            alt_context("A blog about alpine hiking"),
            Some(PageContext::Text("A blog about alpine hiking".into()))
        );
        assert_eq!(alt_context("   "), None);
    }

    #[test]
    fn image_arguments_are_told_apart() {
        assert_eq!(
            image_input("https://cdn.example/a.png"),
            ImageInput::Url("https://cdn.example/a.png".into())
        );
        assert_eq!(
            image_input("data:image/png;base64,AAAA"),
            ImageInput::Inline("data:image/png;base64,AAAA".into())
        );
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        assert_eq!(
            image_input(file.path().to_str().unwrap()),
            ImageInput::Path(file.path().to_path_buf())
        );
        assert_eq!(image_input("iVBORw0KGgo="), ImageInput::Inline("iVBORw0KGgo=".into()));
    }

    #[test]
    fn flags_override_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"threshold = 9\ninclude_tasks = [\"ALT_TEXT\"]\n[llm]\nmodel = \"from-file\"\n",
        )
        .unwrap();
        let matches = sub_matches(&[
            "a11y",
            "improve",
            "PGI+PC9iPg==",
            "--config",
            file.path().to_str().unwrap(),
            "--threshold",
            "3",
            "--include",
            "BUTTON, SKIP_CONTENT",
            "--no-semantic",
            "--verify",
            "--concurrency",
            "2",
        ]);
        let config = load_config(&matches).unwrap();
        assert_eq!(config.threshold, 3);
        assert_eq!(config.include_tasks, vec!["BUTTON", "SKIP_CONTENT"]);
        assert_eq!(config.llm.model, "from-file");
        assert!(!config.detector.semantic_rule);
        assert!(config.remediation.verify);
        assert_eq!(config.remediation.concurrency, 2);
    }

    #[test]
    fn undefined_flags_are_ignored() {
        let matches = sub_matches(&["a11y", "list-models", "--model", "gpt-4o-mini"]);
        let config = load_config(&matches).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.threshold, 0);
    }

    #[test]
    fn issue_json_uses_scanner_keys() {
        let parsed = issue(r##"{"code": "WCAG2AA.Principle1.Guideline1_1.1_1_1.H37", "message": "Img missing alt", "selector": "#hero"}"##).unwrap();
        assert_eq!(parsed.selector, "#hero");
        assert_eq!(parsed.issue_type, "error");
        assert!(matches!(issue("{}"), Err(InputError::Json { .. })));
    }
}
