//! Parsed HTML document
//!
//! [`HtmlDocument`] keeps the original source next to the parsed tree. As
//! long as no patch has been applied, serialization returns the source
//! verbatim, so an untouched document survives the pipeline byte for byte.

use crate::error::{DomError, DomResult};
use scraper::{ElementRef, Html, Selector};

/// HTML document with its original source
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    source: String,
    html: Html,
    modified: bool,
}

impl HtmlDocument {
    /// Parse a full document
    ///
    /// # Errors
    /// - `DomError::EmptyDocument` if the input is blank
    pub fn parse(source: impl Into<String>) -> DomResult<Self> {
        let source = source.into();
        if source.trim().is_empty() {
            return Err(DomError::EmptyDocument);
        }
        let html = Html::parse_document(&source);
        Ok(Self {
            source,
            html,
            modified: false,
        })
    }

    /// Original markup as supplied to [`HtmlDocument::parse`]
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether any node has been replaced since parsing
    #[inline]
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Serialize the current document
    #[must_use]
    pub fn serialize(&self) -> String {
        if self.modified {
            self.html.html()
        } else {
            self.source.clone()
        }
    }

    /// Underlying parsed tree
    #[inline]
    #[must_use]
    pub fn html(&self) -> &Html {
        &self.html
    }

    pub(crate) fn html_mut(&mut self) -> &mut Html {
        self.modified = true;
        &mut self.html
    }

    /// The `body` element, or the root element when there is none
    #[must_use]
    pub fn body(&self) -> ElementRef<'_> {
        Selector::parse("body")
            .ok()
            .and_then(|s| self.html.select(&s).next())
            .unwrap_or_else(|| self.html.root_element())
    }

    /// First element matching `selector`
    ///
    /// # Errors
    /// - `DomError::InvalidSelector` if the selector does not parse
    pub fn select_first(&self, selector: &str) -> DomResult<Option<ElementRef<'_>>> {
        let parsed = parse_selector(selector)?;
        Ok(self.html.select(&parsed).next())
    }

    /// All elements matching `selector`, in document order
    ///
    /// # Errors
    /// - `DomError::InvalidSelector` if the selector does not parse
    pub fn select_all(&self, selector: &str) -> DomResult<Vec<ElementRef<'_>>> {
        let parsed = parse_selector(selector)?;
        Ok(self.html.select(&parsed).collect())
    }
}

/// Parse CSS selector text
///
/// # Errors
/// - `DomError::InvalidSelector` with the parser diagnostic
pub fn parse_selector(selector: &str) -> DomResult<Selector> {
    Selector::parse(selector).map_err(|e| DomError::invalid_selector(selector, format!("{e:?}")))
}
