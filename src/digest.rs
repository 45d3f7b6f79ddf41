//! Content digests for documentation text.

use crate::model::DocText;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Digest of an object's documentation.
///
/// Serialized as the hex string, or `null` for the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum ContentDigest {
    Hex(String),
    /// The documentation could not be encoded, so nothing was hashed.
    Undigestable,
}

impl ContentDigest {
    /// Digest documentation text. Absent documentation hashes as empty text.
    pub fn of_doc(doc: Option<&DocText>) -> Self {
        match doc {
            None => Self::of_text(""),
            Some(DocText::Text(text)) => Self::of_text(text),
            Some(DocText::Raw(bytes)) => {
                tracing::warn!(
                    "documentation is not valid UTF-8 ({} bytes), discarding digest",
                    bytes.len()
                );
                Self::Undigestable
            }
        }
    }

    pub fn of_text(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self::Hex(hex::encode(hasher.finalize()))
    }

    pub fn as_hex(&self) -> Option<&str> {
        match self {
            Self::Hex(hex) => Some(hex),
            Self::Undigestable => None,
        }
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hex(hex) => f.write_str(hex),
            Self::Undigestable => Ok(()),
        }
    }
}

impl From<Option<String>> for ContentDigest {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(hex) => Self::Hex(hex),
            None => Self::Undigestable,
        }
    }
}

impl From<ContentDigest> for Option<String> {
    fn from(value: ContentDigest) -> Self {
        match value {
            ContentDigest::Hex(hex) => Some(hex),
            ContentDigest::Undigestable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_gives_identical_digest() {
        let a = ContentDigest::of_doc(Some(&DocText::from("Computes X")));
        let b = ContentDigest::of_doc(Some(&DocText::from("Computes X")));
        assert_eq!(a, b);
        assert_eq!(a.as_hex().map(str::len), Some(64));
    }

    #[test]
    fn test_different_text_gives_different_digest() {
        let a = ContentDigest::of_text("Computes X");
        let b = ContentDigest::of_text("Computes Y");
        assert_ne!(a, b);
    }

    #[test]
    fn test_missing_doc_hashes_empty_text() {
        assert_eq!(ContentDigest::of_doc(None), ContentDigest::of_text(""));
        assert_eq!(
            ContentDigest::of_text("").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_raw_doc_yields_sentinel() {
        let digest = ContentDigest::of_doc(Some(&DocText::Raw(vec![0xed, 0xa0, 0x80])));
        assert_eq!(digest, ContentDigest::Undigestable);
        assert_eq!(digest.to_string(), "");
    }

    #[test]
    fn test_serde_uses_null_for_sentinel() {
        let json = serde_json::to_string(&ContentDigest::Undigestable).unwrap();
        assert_eq!(json, "null");
        let back: ContentDigest = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, ContentDigest::Hex("abc".to_string()));
    }
}
