//! Anti-phishing heuristics and request budgeting for embedded pages.
//!
//! The checks here are advisory: they decide which warning the user sees
//! before a page loads, never whether the network request is made.

mod rate_limit;

pub use rate_limit::RateLimiter;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::BridgeError;
use crate::origin::Origin;

const MALICIOUS_DOMAIN_MESSAGE: &str =
    "This domain is known to be malicious. Do not enter your wallet password or private keys.";
const PHISHING_PATTERN_MESSAGE: &str =
    "This URL matches known phishing patterns. Be extremely cautious.";
const UNTRUSTED_SITE_MESSAGE: &str =
    "This website is not in our trusted list. Be cautious before connecting your wallet or signing anything.";

/// The lists a [`SecurityPolicy`] is compiled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct SecurityLists {
    /// Domains whose pages skip the generic untrusted-site warning. Matched
    /// as substrings of the host with any leading `www.` removed.
    pub trusted_domains: Vec<String>,
    /// Regular expressions matched case-insensitively against host + path.
    pub phishing_patterns: Vec<String>,
    /// Domains that raise the malicious-domain warning. Matched as
    /// substrings of the host.
    pub malicious_domains: Vec<String>,
}

impl Default for SecurityLists {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(ToString::to_string).collect();
        Self {
            trusted_domains: owned(defaults::TRUSTED_DOMAINS),
            phishing_patterns: owned(defaults::PHISHING_PATTERNS),
            malicious_domains: owned(defaults::MALICIOUS_DOMAINS),
        }
    }
}

/// A known-bad signal raised by a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum Threat {
    /// The host is on the malicious-domain list.
    MaliciousDomain,
    /// The host and path look like a credential phishing page.
    PhishingPattern,
}

/// Which warning is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum WarningKind {
    /// Strong warning; navigation waits for an explicit choice.
    MaliciousDomain,
    /// Advisory banner; navigation continues.
    PhishingPattern,
    /// Generic warning for sites outside the trusted list.
    UntrustedSite,
}

impl From<Threat> for WarningKind {
    fn from(threat: Threat) -> Self {
        match threat {
            Threat::MaliciousDomain => Self::MaliciousDomain,
            Threat::PhishingPattern => Self::PhishingPattern,
        }
    }
}

impl WarningKind {
    /// Text shown to the user.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MaliciousDomain => MALICIOUS_DOMAIN_MESSAGE,
            Self::PhishingPattern => PHISHING_PATTERN_MESSAGE,
            Self::UntrustedSite => UNTRUSTED_SITE_MESSAGE,
        }
    }
}

/// A warning about a navigation destination, handed to the host UI.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct NavigationWarning {
    /// Which warning this is.
    pub kind: WarningKind,
    /// The destination URL.
    pub url: String,
    /// The destination origin.
    pub origin: String,
    /// Text shown to the user.
    pub message: String,
}

impl NavigationWarning {
    pub(crate) fn new(kind: WarningKind, url: &str, origin: &Origin) -> Self {
        Self {
            kind,
            url: url.to_string(),
            origin: origin.as_str().to_string(),
            message: kind.message().to_string(),
        }
    }
}

/// The user's answer to a navigation warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum NavigationChoice {
    /// Load the page anyway.
    Proceed,
    /// Abandon the navigation.
    GoBack,
}

/// Result of checking a destination against the security lists.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct NavigationAssessment {
    /// The destination URL.
    pub url: String,
    /// The destination origin, or the raw URL when it could not be resolved.
    pub origin: String,
    /// Whether the host is on the trusted list.
    pub trusted: bool,
    /// The strongest known-bad signal, if any.
    pub threat: Option<Threat>,
}

impl NavigationAssessment {
    /// Warnings to raise, strongest first.
    ///
    /// A malicious domain always warns, whatever the trusted list says. A
    /// trusted destination with no threat raises nothing.
    #[must_use]
    pub fn warnings(&self) -> Vec<WarningKind> {
        let mut warnings: Vec<WarningKind> = self.threat.map(Into::into).into_iter().collect();
        if !self.trusted && self.threat != Some(Threat::MaliciousDomain) {
            warnings.push(WarningKind::UntrustedSite);
        }
        warnings
    }
}

/// Compiled security lists.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    trusted_domains: Vec<String>,
    phishing_patterns: Vec<Regex>,
    malicious_domains: Vec<String>,
}

impl SecurityPolicy {
    /// Compiles `lists`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidParams`] if a phishing pattern is not a
    /// valid regular expression.
    pub fn new(lists: &SecurityLists) -> Result<Self, BridgeError> {
        let phishing_patterns = lists
            .phishing_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        BridgeError::invalid_params(format!(
                            "invalid phishing pattern {pattern:?}: {e}"
                        ))
                    })
            })
            .collect::<Result<_, _>>()?;
        let lowercase = |items: &[String]| items.iter().map(|d| d.to_lowercase()).collect();
        Ok(Self {
            trusted_domains: lowercase(&lists.trusted_domains),
            phishing_patterns,
            malicious_domains: lowercase(&lists.malicious_domains),
        })
    }

    /// Whether the origin's host is on the trusted list. Unresolved origins
    /// are never trusted.
    #[must_use]
    pub fn is_trusted(&self, origin: &Origin) -> bool {
        let Some(host) = origin.host() else {
            return false;
        };
        let host = host.strip_prefix("www.").unwrap_or(host);
        self.trusted_domains
            .iter()
            .any(|domain| host.contains(domain.as_str()))
    }

    /// The strongest threat raised by the origin. The malicious-domain list
    /// is checked before the phishing patterns.
    ///
    /// Unresolved origins are checked against their raw text.
    #[must_use]
    pub fn threat(&self, origin: &Origin) -> Option<Threat> {
        let (host, target) = match origin.host() {
            Some(host) => (host.to_lowercase(), format!("{host}{}", origin.path()).to_lowercase()),
            None => {
                let raw = origin.as_str().to_lowercase();
                (raw.clone(), raw)
            }
        };
        if self
            .malicious_domains
            .iter()
            .any(|domain| host.contains(domain.as_str()))
        {
            return Some(Threat::MaliciousDomain);
        }
        if self
            .phishing_patterns
            .iter()
            .any(|pattern| pattern.is_match(&target))
        {
            return Some(Threat::PhishingPattern);
        }
        None
    }

    /// Checks `url` against every list.
    #[must_use]
    pub fn assess(&self, url: &str) -> NavigationAssessment {
        let origin = Origin::resolve(url);
        NavigationAssessment {
            url: url.to_string(),
            origin: origin.as_str().to_string(),
            trusted: self.is_trusted(&origin),
            threat: self.threat(&origin),
        }
    }
}

/// Checks `url` against `lists` without creating a bridge.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidParams`] if a phishing pattern does not
/// compile.
#[uniffi::export]
#[allow(clippy::needless_pass_by_value)]
pub fn assess_navigation(
    url: String,
    lists: SecurityLists,
) -> Result<NavigationAssessment, BridgeError> {
    Ok(SecurityPolicy::new(&lists)?.assess(&url))
}
