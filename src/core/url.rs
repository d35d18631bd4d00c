//! URL path type for canonical path handling.
//!
//! - Internal representation: always decoded (human-readable)
//! - Browser boundary: decode on input

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::utils::path::strip_query_fragment;

/// Characters escaped when a path is written back into a URL.
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Normalized site path.
///
/// Invariants:
/// - Always starts with `/`
/// - No trailing slash, except the root path `/`
/// - No query string or fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UrlPath(Arc<str>);

impl UrlPath {
    /// Normalize an already-decoded path.
    ///
    /// `posts/a/?x=1` -> `/posts/a`, `""` -> `/`, `"//"` -> `/`
    pub fn new(decoded: &str) -> Self {
        let path = strip_query_fragment(decoded.trim());
        let trimmed = path.trim_end_matches('/');

        if trimmed.is_empty() {
            return Self::root();
        }
        if trimmed.starts_with('/') {
            Self(Arc::from(trimmed))
        } else {
            Self(Arc::from(format!("/{trimmed}")))
        }
    }

    /// Create from a browser/markup URL path (percent-encoded).
    ///
    /// Invalid UTF-8 after decoding keeps the encoded form.
    pub fn from_browser(encoded: &str) -> Self {
        let path = strip_query_fragment(encoded);
        let decoded = percent_decode_str(path)
            .decode_utf8()
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| path.to_string());
        Self::new(&decoded)
    }

    /// The root path `/`.
    pub fn root() -> Self {
        Self(Arc::from("/"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.as_ref() == "/"
    }

    /// Encode for use inside a URL (spaces, `%`, `?`, `#`, non-ASCII).
    pub fn to_encoded(&self) -> String {
        utf8_percent_encode(&self.0, PATH_ESCAPE).to_string()
    }
}

impl fmt::Display for UrlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Default for UrlPath {
    fn default() -> Self {
        Self::root()
    }
}

impl AsRef<str> for UrlPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for UrlPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UrlPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for UrlPath {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for UrlPath {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for UrlPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UrlPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_strips_trailing_slash() {
        assert_eq!(UrlPath::new("/posts/hello/"), "/posts/hello");
        assert_eq!(UrlPath::new("/posts/hello///"), "/posts/hello");
    }

    #[test]
    fn test_new_root() {
        assert_eq!(UrlPath::new("/"), "/");
        assert_eq!(UrlPath::new(""), "/");
        assert_eq!(UrlPath::new("  "), "/");
        assert!(UrlPath::new("//").is_root());
    }

    #[test]
    fn test_new_adds_leading_slash() {
        assert_eq!(UrlPath::new("posts/hello"), "/posts/hello");
    }

    #[test]
    fn test_new_strips_query_and_fragment() {
        assert_eq!(UrlPath::new("/latest?page=2#top"), "/latest");
        assert_eq!(UrlPath::new("/?utm=x"), "/");
    }

    #[test]
    fn test_from_browser_decodes() {
        assert_eq!(UrlPath::from_browser("/posts/hello%20world/"), "/posts/hello world");
        assert_eq!(UrlPath::from_browser("/posts/%E4%B8%AD%E6%96%87"), "/posts/中文");
    }

    #[test]
    fn test_from_browser_invalid_utf8() {
        assert_eq!(UrlPath::from_browser("/posts/%FF"), "/posts/%FF");
    }

    #[test]
    fn test_to_encoded() {
        assert_eq!(UrlPath::new("/posts/hello world").to_encoded(), "/posts/hello%20world");
        assert_eq!(UrlPath::new("/posts/中文").to_encoded(), "/posts/%E4%B8%AD%E6%96%87");
        assert_eq!(UrlPath::new("/latest").to_encoded(), "/latest");
    }

    #[test]
    fn test_idempotent() {
        let once = UrlPath::new("blog/x/?q");
        let twice = UrlPath::new(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_serialize_deserialize() {
        let path = UrlPath::new("/latest");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#""/latest""#);
        let parsed: UrlPath = serde_json::from_str(r#""/latest/""#).unwrap();
        assert_eq!(parsed, path);
    }
}
