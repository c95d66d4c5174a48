//! Prompt text for gateway operations

use crate::envelope::{FIX_OUTPUT, RELEVANCY, SCRATCHPAD};

/// System prompt for the vision call
pub const ALT_TEXT_SYSTEM: &str = "You are an assistant that writes alternative text for images on \
web pages. Alt text is read aloud by screen readers, so it must be concise, descriptive and \
convey the purpose of the image. Respond with a single JSON object and nothing else.";

/// System prompt for structured fixes
pub const FIX_SYSTEM: &str = "You are a web accessibility engineer. You repair HTML so that it \
conforms to WCAG 2.1 AA while preserving its content, ids and classes.";

/// System prompt for page summaries
pub const SUMMARY_SYSTEM: &str = "You summarize web pages for people who cannot see them.";

/// User prompt for alt text, with or without page context
#[must_use]
pub fn alt_text(context: Option<&str>) -> String {
    match context {
        Some(context) => format!(
            "Generate concise, descriptive alt text for this image for screen reader users. \
             Include the key visual elements and the image's purpose on the page.\n\n\
             The image appears on a page about:\n{context}\n\n\
             Also rate from 0.0 to 1.0 how relevant the image is to that page context.\n\
             Respond as JSON: {{\"altText\": \"...\", \"relevancy\": 0.0, \"reasoning\": \"...\"}}"
        ),
        None => "Generate concise, descriptive alt text for this image for screen reader users. \
                 Include the key visual elements and the image's purpose.\n\
                 Respond as JSON: {\"altText\": \"...\"}"
            .to_string(),
    }
}

/// User prompt scoring existing alt text against page context
#[must_use]
pub fn relevancy(alt_text: &str, context: &str) -> String {
    format!(
        "An image on a web page has this alt text:\n{alt_text}\n\n\
         The page is about:\n{context}\n\n\
         Think about how well the image fits the page inside {sp_open}{sp_close}. \
         Then output only a number from 0.0 (unrelated) to 1.0 (essential) inside \
         {open}{close}.",
        sp_open = SCRATCHPAD.open,
        sp_close = SCRATCHPAD.close,
        open = RELEVANCY.open,
        close = RELEVANCY.close,
    )
}

/// User prompt summarizing condensed page markup
#[must_use]
pub fn summary(condensed_markup: &str) -> String {
    format!(
        "Summarize what this web page is about in two sentences or fewer. \
         Reply with the summary only.\n\n{condensed_markup}"
    )
}

/// Ask for a JSON answer shaped like `example`, wrapped in the output envelope
#[must_use]
pub fn envelope_instructions(example: &str) -> String {
    format!(
        "Return your answer as JSON of the form {example} wrapped in {open} and {close}. \
         Do not put anything else between the tags.",
        open = FIX_OUTPUT.open,
        close = FIX_OUTPUT.close,
    )
}

/// Instructions appended to every structured-fix prompt
#[must_use]
pub fn fix_output_instructions() -> String {
    envelope_instructions(r#"{"html": "<the repaired markup>"}"#)
}
