//! Remediation planning and fix generation
//!
//! Planning is synchronous and reads the detection document; generation is
//! asynchronous and only carries owned data, so a batch of jobs can be
//! driven concurrently while the document stays untouched.
//!
//! - **Alt text**: the issue's `img` (or first descendant `img`) with a
//!   usable `src` goes through the vision call; the fix is the element
//!   re-rendered with the generated `alt`
//! - **Everything else**: a task-specific prompt over the node's parent
//!   markup goes through the structured-fix call; the fix replaces that
//!   parent

use a11y_dom::{path_selector, HtmlDocument, ImageElement, ImageSrc};
use a11y_llm::image::mime_for_extension;
use a11y_llm::{GenerationResult, ImageInput, LlmGateway, PageContext};
use a11y_model::{FixProposal, Issue, Task};
use scraper::ElementRef;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Why an issue produced no generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Selector matches nothing in the document
    NotFound,
    /// Selector text does not parse
    InvalidSelector(String),
}

/// One prepared generation call
#[derive(Debug, Clone, PartialEq)]
pub enum RemediationJob {
    /// Vision call for an image
    AltText {
        /// Image element to re-render
        target: ImageElement,
        /// Image bytes or URL
        image: ImageInput,
    },
    /// Structured-fix call
    Structured {
        /// Task the prompt was built for
        task: Task,
        /// Node the returned markup replaces
        target: String,
        /// Complete prompt, output instructions excluded
        prompt: String,
    },
}

impl RemediationJob {
    /// Selector of the node the fix will replace
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::AltText { target, .. } => &target.selector,
            Self::Structured { target, .. } => target,
        }
    }
}

/// Planning result for one issue
#[derive(Debug, Clone, PartialEq)]
pub enum Planned {
    /// Ready to generate
    Job(RemediationJob),
    /// Nothing to generate
    Skipped(SkipReason),
}

/// Plans and runs fix generation
#[derive(Debug, Clone)]
pub struct Remediator {
    gateway: LlmGateway,
    asset_root: Option<PathBuf>,
    page_context: Option<PageContext>,
}

impl Remediator {
    /// Create a remediator over `gateway`
    #[inline]
    #[must_use]
    pub fn new(gateway: LlmGateway) -> Self {
        Self {
            gateway,
            asset_root: None,
            page_context: None,
        }
    }

    /// With directory for relative image sources
    #[inline]
    #[must_use]
    pub fn with_asset_root(mut self, root: Option<PathBuf>) -> Self {
        self.asset_root = root;
        self
    }

    /// With page context for alt text
    #[inline]
    #[must_use]
    pub fn with_page_context(mut self, context: Option<PageContext>) -> Self {
        self.page_context = context;
        self
    }

    /// Gateway used for generation
    #[inline]
    #[must_use]
    pub fn gateway(&self) -> &LlmGateway {
        &self.gateway
    }

    /// Plan the fix for a classified issue against `doc`
    #[must_use]
    pub fn plan(&self, doc: &HtmlDocument, issue: &Issue, task: Task) -> Planned {
        let element = match doc.select_first(&issue.selector) {
            Ok(Some(el)) => el,
            Ok(None) => return Planned::Skipped(SkipReason::NotFound),
            Err(e) => return Planned::Skipped(SkipReason::InvalidSelector(e.to_string())),
        };

        if task == Task::AltText {
            if let Some(job) = self.plan_alt_text(doc, &issue.selector) {
                return Planned::Job(job);
            }
        }

        let (target, markup) = fix_scope(element);
        debug!(code = %issue.code, task = %task, target = %target, "structured fix planned");
        Planned::Job(RemediationJob::Structured {
            task,
            target,
            prompt: task_prompt(task, &issue.message, &markup),
        })
    }

    fn plan_alt_text(&self, doc: &HtmlDocument, selector: &str) -> Option<RemediationJob> {
        let target = ImageElement::locate(doc, selector).ok().flatten()?;
        let image = match target.src() {
            ImageSrc::DataUrl(url) => ImageInput::Inline(url),
            ImageSrc::Remote(url) => ImageInput::Url(url),
            ImageSrc::Local(src) => ImageInput::Path(self.local_image(&src)?),
            ImageSrc::Missing => return None,
        };
        debug!(target = %target.selector, "alt text planned");
        Some(RemediationJob::AltText { target, image })
    }

    /// Resolve a relative `src`
    ///
    /// Unsupported file types and paths that would leave the asset root
    /// yield `None`.
    fn local_image(&self, src: &str) -> Option<PathBuf> {
        let path = src.split(['?', '#']).next().unwrap_or(src);
        let ext = Path::new(path).extension().and_then(|e| e.to_str())?;
        mime_for_extension(ext)?;
        let relative = Path::new(path.trim_start_matches('/'));
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained {
            warn!(src, "image source escapes the asset root, not loading it");
            return None;
        }
        Some(match &self.asset_root {
            Some(root) => root.join(relative),
            None => relative.to_path_buf(),
        })
    }

    /// Run one prepared job
    ///
    /// # Errors
    /// - `GenerationError` from the gateway, after its retry budget
    pub async fn generate(&self, job: &RemediationJob) -> GenerationResult<FixProposal> {
        match job {
            RemediationJob::AltText { target, image } => {
                let proposal = self
                    .gateway
                    .generate_alt_text(image, self.page_context.as_ref())
                    .await?;
                Ok(FixProposal::AltText {
                    selector: target.selector.clone(),
                    markup: target.render_with_alt(&proposal.alt_text),
                    proposal,
                })
            }
            RemediationJob::Structured { target, prompt, .. } => {
                let payload = self.gateway.solve_markup(prompt).await?;
                Ok(FixProposal::Structured {
                    selector: target.clone(),
                    payload,
                })
            }
        }
    }

    /// Plan and generate a fix for a single issue, outside a pipeline run
    ///
    /// When the issue's node cannot be found, the prompt covers the whole
    /// document and the proposal targets the issue's own selector.
    ///
    /// # Errors
    /// - `GenerationError` from the gateway
    pub async fn solve_issue(
        &self,
        doc: &HtmlDocument,
        issue: &Issue,
        task: Task,
    ) -> GenerationResult<FixProposal> {
        let job = match self.plan(doc, issue, task) {
            Planned::Job(job) => job,
            Planned::Skipped(reason) => {
                debug!(?reason, "node not found, prompting with the whole document");
                RemediationJob::Structured {
                    task,
                    target: issue.selector.clone(),
                    prompt: task_prompt(task, &issue.message, &doc.serialize()),
                }
            }
        };
        self.generate(&job).await
    }
}

/// Node a structured fix replaces and the markup sent for it
///
/// The parent gives the model room to restructure; directly under
/// `body` (or at the root) the node itself is used instead.
fn fix_scope(element: ElementRef<'_>) -> (String, String) {
    let parent = element
        .parent()
        .and_then(ElementRef::wrap)
        .filter(|p| !matches!(p.value().name(), "body" | "html"));
    let scope = parent.unwrap_or(element);
    (path_selector(scope), scope.html())
}

fn task_guidance(task: Task) -> &'static str {
    match task {
        Task::AltText => {
            "Give every informative image a concise alt attribute describing its content and \
             purpose. Decorative images get alt=\"\". Non-img graphics need role=\"img\" and an \
             aria-label."
        }
        Task::Button => {
            "Give every button and link an accessible name that describes its action, using \
             visible text or aria-label. Clickable elements that are not buttons or links must \
             become real button or a elements."
        }
        Task::SkipContent => {
            "Add a skip link as the first focusable element that moves focus to the main \
             content, and make sure the target has a matching id. Keep focus order logical."
        }
        Task::SemanticStructure => {
            "Use semantic HTML5 elements (main, nav, header, footer, section, article), keep \
             heading levels in order, and replace generic containers that act as landmarks."
        }
    }
}

/// Task-specific structured-fix prompt for `markup`
#[must_use]
pub fn task_prompt(task: Task, message: &str, markup: &str) -> String {
    let message = if message.trim().is_empty() {
        format!("Fix accessibility issue of type {task}")
    } else {
        message.trim().to_string()
    };
    format!(
        "Accessibility issue: {message} [Task: {task}]\n\n{}\n\n\
         Return the complete corrected markup for the fragment below, keeping its text, \
         ids and classes.\n\n{markup}",
        task_guidance(task)
    )
}

/// Page context taken from the caller's context object
///
/// A string is used as is; an object contributes its `context` string.
#[must_use]
pub fn page_context_from(value: &Value) -> Option<PageContext> {
    let text = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("context").and_then(Value::as_str),
        _ => None,
    }?;
    let text = text.trim();
    (!text.is_empty()).then(|| PageContext::Text(text.to_string()))
}
