//! Image targets for alt-text remediation

use crate::document::HtmlDocument;
use crate::error::DomResult;
use crate::render::start_tag;
use crate::selector::path_selector;
use scraper::ElementRef;

/// Where an image's bytes come from, judged by its `src` attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSrc {
    /// Inline `data:` URL
    DataUrl(String),
    /// Absolute `http(s)` URL, passed to the model as is
    Remote(String),
    /// Anything else: a path resolved against the asset root
    Local(String),
    /// No usable `src`
    Missing,
}

impl ImageSrc {
    /// Classify a raw `src` value
    #[must_use]
    pub fn classify(src: &str) -> Self {
        let src = src.trim();
        if src.is_empty() {
            Self::Missing
        } else if src.starts_with("data:") {
            Self::DataUrl(src.to_string())
        } else if src.starts_with("http://") || src.starts_with("https://") {
            Self::Remote(src.to_string())
        } else if let Some(rest) = src.strip_prefix("//") {
            Self::Remote(format!("https://{rest}"))
        } else {
            Self::Local(src.to_string())
        }
    }
}

/// An `img` element lifted out of the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageElement {
    /// Selector addressing the `img` itself
    pub selector: String,
    attributes: Vec<(String, String)>,
}

impl ImageElement {
    /// Resolve the image an issue points at
    ///
    /// When `selector` matches an element that is not an `img`, the first
    /// descendant `img` is used instead. Returns `Ok(None)` when neither exists.
    ///
    /// # Errors
    /// - `DomError::InvalidSelector` if the selector does not parse
    pub fn locate(doc: &HtmlDocument, selector: &str) -> DomResult<Option<Self>> {
        let Some(element) = doc.select_first(selector)? else {
            return Ok(None);
        };
        if element.value().name() == "img" {
            return Ok(Some(Self::from_element(element, selector.to_string())));
        }
        let img = element
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "img");
        Ok(img.map(|img| Self::from_element(img, path_selector(img))))
    }

    fn from_element(element: ElementRef<'_>, selector: String) -> Self {
        Self {
            selector,
            attributes: element
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Value of an attribute
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Classified `src`
    #[must_use]
    pub fn src(&self) -> ImageSrc {
        self.attr("src").map_or(ImageSrc::Missing, ImageSrc::classify)
    }

    /// Re-render the element with `alt` set to the given text
    #[must_use]
    pub fn render_with_alt(&self, alt: &str) -> String {
        let mut out = String::new();
        let others = self
            .attributes
            .iter()
            .filter(|(k, _)| k != "alt")
            .map(|(k, v)| (k.as_str(), v.as_str()));
        start_tag(&mut out, "img", others.chain(std::iter::once(("alt", alt))));
        out
    }
}
