//! Image input loading and validation
//!
//! Accepted inputs:
//! - files with a `jpg jpeg png gif webp bmp` extension
//! - `data:image/<type>;base64,` URLs of the same types
//! - plain base64 that decodes to at least one byte (assumed JPEG)
//! - absolute `http(s)` URLs, passed through untouched

use crate::error::ImageError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static DATA_URL: Lazy<Regex> =
    Lazy::new(|| compile_regex(r"^data:image/(jpeg|jpg|png|gif|webp|bmp);base64,"));

fn compile_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid regex {pattern}: {err}"))
}

/// Image handed to the vision call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// Image file on disk
    Path(PathBuf),
    /// Data URL or plain base64
    Inline(String),
    /// Absolute remote URL
    Url(String),
}

impl ImageInput {
    /// Resolve to the URL string sent to the service
    ///
    /// # Errors
    /// - `ImageError::UnsupportedType` for files or data URLs of other types
    /// - `ImageError::Io` if the file cannot be read
    /// - `ImageError::InvalidBase64` / `ImageError::Empty` for bad inline data
    pub async fn to_url(&self) -> Result<String, ImageError> {
        match self {
            Self::Path(path) => {
                let mime = mime_for_path(path)?;
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| ImageError::io_error(path, e))?;
                if bytes.is_empty() {
                    return Err(ImageError::Empty);
                }
                Ok(data_url(mime, &STANDARD.encode(bytes)))
            }
            Self::Inline(data) => inline_url(data),
            Self::Url(url) => Ok(url.clone()),
        }
    }
}

/// MIME type for a supported file extension
#[must_use]
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

fn mime_for_path(path: &Path) -> Result<&'static str, ImageError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    mime_for_extension(ext).ok_or_else(|| ImageError::UnsupportedType(path.display().to_string()))
}

fn data_url(mime: &str, payload: &str) -> String {
    format!("data:{mime};base64,{payload}")
}

fn inline_url(data: &str) -> Result<String, ImageError> {
    let data = data.trim();
    if let Some(caps) = DATA_URL.captures(data) {
        let payload = &data[caps.get(0).map_or(0, |m| m.end())..];
        decode_non_empty(payload)?;
        let ext = caps.get(1).map_or("jpeg", |m| m.as_str());
        let mime = mime_for_extension(ext).unwrap_or("image/jpeg");
        return Ok(data_url(mime, payload));
    }
    if data.starts_with("data:") {
        let kind = data.split(';').next().unwrap_or(data);
        return Err(ImageError::UnsupportedType(kind.to_string()));
    }
    decode_non_empty(data)?;
    Ok(data_url("image/jpeg", data))
}

fn decode_non_empty(payload: &str) -> Result<(), ImageError> {
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;
    if bytes.is_empty() {
        Err(ImageError::Empty)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("webp"), Some("image/webp"));
        assert_eq!(mime_for_extension("tiff"), None);
    }

    #[tokio::test]
    async fn data_url_is_normalized() {
        let input = ImageInput::Inline("data:image/jpg;base64,AQID".into());
        assert_eq!(input.to_url().await.unwrap(), "data:image/jpeg;base64,AQID");
    }

    #[tokio::test]
    async fn plain_base64_defaults_to_jpeg() {
        let input = ImageInput::Inline("AQID".into());
        assert_eq!(input.to_url().await.unwrap(), "data:image/jpeg;base64,AQID");
    }

    #[tokio::test]
    async fn unsupported_data_url_is_rejected() {
        let input = ImageInput::Inline("data:image/tiff;base64,AQID".into());
        assert!(matches!(input.to_url().await, Err(ImageError::UnsupportedType(_))));
    }

    #[tokio::test]
    async fn garbage_base64_is_rejected() {
        let input = ImageInput::Inline("not base64!!".into());
        assert!(matches!(input.to_url().await, Err(ImageError::InvalidBase64(_))));
    }

    #[tokio::test]
    async fn file_is_read_and_encoded() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&[1, 2, 3]).unwrap();
        let input = ImageInput::Path(file.path().to_path_buf());
        assert_eq!(input.to_url().await.unwrap(), "data:image/png;base64,AQID");
    }

    #[tokio::test]
    async fn wrong_extension_is_rejected_before_reading() {
        let input = ImageInput::Path(PathBuf::from("/nowhere/picture.txt"));
        assert!(matches!(input.to_url().await, Err(ImageError::UnsupportedType(_))));
    }
}
