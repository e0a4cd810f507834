//! The plaintext side of an encrypted file
//!
//! A file is encrypted as its data URL, `data:<mime>;base64,<bytes>`, so the
//! original MIME type travels inside the ciphertext and comes back out on
//! decryption. The MIME type then picks a rendering category; that choice
//! is advisory and never changes the bytes handed back.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use mime::Mime;
use serde::{Deserialize, Serialize};

/// MIME type used when a file arrives without one
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Render `bytes` as a base64 data URL
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    let mime = if mime.trim().is_empty() {
        FALLBACK_MIME
    } else {
        mime.trim()
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a data URL into its MIME type and decoded bytes
///
/// Returns `None` if `value` is not a data URL. Non-base64 data URLs
/// are returned with their payload as-is.
pub fn decode_data_url(value: &str) -> Option<(String, Vec<u8>)> {
    let rest = value.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;

    match header.strip_suffix(";base64") {
        Some(mime) => {
            let bytes = STANDARD.decode(payload.trim()).ok()?;
            Some((mime.to_string(), bytes))
        }
        None => Some((header.to_string(), payload.as_bytes().to_vec())),
    }
}

/// How a decrypted file should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Image,
    Video,
    Audio,
    Document,
    Text,
    Binary,
}

impl ContentCategory {
    pub fn classify(mime: &str) -> Self {
        let Ok(mime) = mime.parse::<Mime>() else {
            return ContentCategory::Binary;
        };

        let type_ = mime.type_().as_str().to_ascii_lowercase();
        let subtype = mime.subtype().as_str().to_ascii_lowercase();
        let json_suffix = mime.suffix().map(|s| s.as_str()) == Some("json");

        match (type_.as_str(), subtype.as_str()) {
            ("image", _) => ContentCategory::Image,
            ("video", _) => ContentCategory::Video,
            ("audio", _) => ContentCategory::Audio,
            ("text", _) => ContentCategory::Text,
            ("application", "pdf" | "msword") => ContentCategory::Document,
            ("application", sub)
                if sub.starts_with("vnd.openxmlformats-officedocument")
                    || sub.starts_with("vnd.oasis.opendocument") =>
            {
                ContentCategory::Document
            }
            ("application", "json" | "xml" | "javascript") => ContentCategory::Text,
            ("application", _) if json_suffix => ContentCategory::Text,
            _ => ContentCategory::Binary,
        }
    }
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContentCategory::Image => "image",
            ContentCategory::Video => "video",
            ContentCategory::Audio => "audio",
            ContentCategory::Document => "document",
            ContentCategory::Text => "text",
            ContentCategory::Binary => "binary",
        };
        f.write_str(name)
    }
}

/// A file recovered from the storage network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedFile {
    /// MIME type carried inside the ciphertext, if the payload was a data URL
    pub mime: Option<String>,
    pub category: ContentCategory,
    pub bytes: Vec<u8>,
}

impl DecryptedFile {
    pub fn from_plaintext(plaintext: String) -> Self {
        match decode_data_url(&plaintext) {
            Some((mime, bytes)) => Self {
                category: ContentCategory::classify(&mime),
                mime: Some(mime),
                bytes,
            },
            // not a data URL, hand the text back untouched
            None => Self {
                mime: None,
                category: ContentCategory::Text,
                bytes: plaintext.into_bytes(),
            },
        }
    }

    /// The payload as display text, for text-like files
    ///
    /// JSON is pretty-printed. Returns `None` for non-text categories or
    /// payloads that are not UTF-8.
    pub fn pretty_text(&self) -> Option<String> {
        if self.category != ContentCategory::Text {
            return None;
        }
        let text = std::str::from_utf8(&self.bytes).ok()?;

        let is_json = self
            .mime
            .as_deref()
            .and_then(|m| m.parse::<Mime>().ok())
            .map(|m| {
                m.subtype().as_str() == "json" || m.suffix().map(|s| s.as_str()) == Some("json")
            })
            .unwrap_or(false);
        if is_json {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
                if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                    return Some(pretty);
                }
            }
        }

        Some(text.to_string())
    }
}
