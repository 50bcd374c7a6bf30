//! Origin resolution for the page currently shown in the embedded frame.

use std::fmt;

use url::Url;

/// The unit of trust for permissions and rate limiting.
///
/// Resolved fresh from the current page URL on every request. A URL that
/// cannot be parsed, or whose origin is opaque (`data:`, `about:blank`), is
/// keyed by its raw text and is never considered trusted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    key: String,
    url: Option<Url>,
}

impl Origin {
    /// Resolves the origin of `raw_url`.
    #[must_use]
    pub fn resolve(raw_url: &str) -> Self {
        let Ok(url) = Url::parse(raw_url.trim()) else {
            return Self::unresolved(raw_url);
        };
        let origin = url.origin();
        if !origin.is_tuple() {
            return Self::unresolved(raw_url);
        }
        Self {
            key: origin.ascii_serialization(),
            url: Some(url),
        }
    }

    fn unresolved(raw_url: &str) -> Self {
        Self {
            key: raw_url.to_string(),
            url: None,
        }
    }

    /// The serialized `scheme://host[:port]` key, or the raw URL when
    /// resolution failed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Whether the URL resolved to a tuple origin.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.url.is_some()
    }

    /// Lowercased host of a resolved origin.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.url.as_ref().and_then(Url::host_str)
    }

    /// Path of the page URL, empty when unresolved.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.as_ref().map_or("", Url::path)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
