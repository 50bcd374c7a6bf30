//! The navigation gate: warnings shown before a page is bound to a bridge.

use url::Url;

use crate::bridge::HostBridge;
use crate::error::BridgeError;
use crate::origin::Origin;
use crate::security::{NavigationChoice, NavigationWarning, WarningKind};

/// How a navigation request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum NavigationOutcome {
    /// The page URL was updated and the provider announced.
    Committed,
    /// The user went back; the bridge still serves the previous page.
    Cancelled,
}

/// Prefixes `https://` to destinations typed without an http(s) scheme.
#[must_use]
pub fn normalize_destination(input: &str) -> String {
    let input = input.trim();
    let lower = input.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        input.to_string()
    } else {
        format!("https://{input}")
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl HostBridge {
    /// Navigates the embedded frame to `url`.
    ///
    /// The destination is checked against the security lists first:
    ///
    /// - a malicious domain waits for an explicit choice, and `GoBack`
    ///   cancels the navigation;
    /// - a phishing pattern raises an advisory warning only;
    /// - an untrusted site shows the generic warning, which proceeds on its
    ///   own once the grace period passes (or waits for the user when no
    ///   grace period is configured).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidUrl`] if the destination does not parse.
    #[allow(clippy::needless_pass_by_value)]
    pub async fn navigate(&self, url: String) -> Result<NavigationOutcome, BridgeError> {
        let url = normalize_destination(&url);
        if Url::parse(&url).is_err() {
            log::warn!("invalid navigation target");
            return Err(BridgeError::InvalidUrl { url });
        }

        let inner = &self.inner;
        let origin = Origin::resolve(&url);
        let assessment = inner.policy.assess(&url);

        for kind in assessment.warnings() {
            let warning = NavigationWarning::new(kind, &url, &origin);
            let choice = match kind {
                WarningKind::MaliciousDomain => {
                    log::warn!("navigation to known malicious domain {origin}");
                    inner.presenter.confirm_navigation(warning).await
                }
                WarningKind::PhishingPattern => {
                    log::warn!("navigation target {origin} matches a phishing pattern");
                    inner.presenter.show_navigation_warning(warning);
                    NavigationChoice::Proceed
                }
                WarningKind::UntrustedSite => {
                    let prompt = inner.presenter.confirm_navigation(warning);
                    match inner.config.untrusted_warning_grace() {
                        Some(grace) => tokio::time::timeout(grace, prompt)
                            .await
                            .unwrap_or(NavigationChoice::Proceed),
                        None => prompt.await,
                    }
                }
            };
            if choice == NavigationChoice::GoBack {
                log::info!("user went back from {origin}");
                return Ok(NavigationOutcome::Cancelled);
            }
        }

        inner.commit_navigation(url).await;
        Ok(NavigationOutcome::Committed)
    }
}
