//! `bridgekit inspect`

use std::fs;
use std::path::{Path, PathBuf};

use bridgekit_core::normalize_destination;
use bridgekit_core::security::{
    assess_navigation, NavigationAssessment, SecurityLists, Threat, WarningKind,
};
use eyre::{Result, WrapErr};
use serde_json::{json, Value};

/// Arguments of `bridgekit inspect`.
#[derive(Debug, clap::Args)]
pub struct InspectArgs {
    /// Destination to check. `https://` is assumed without a scheme.
    url: String,

    /// JSON file replacing the built-in security lists. Missing fields keep
    /// the built-in values.
    #[arg(long)]
    lists: Option<PathBuf>,

    /// Prints the assessment as JSON.
    #[arg(long)]
    json: bool,
}

/// Assesses the destination and prints the result.
pub fn run(args: &InspectArgs) -> Result<()> {
    let lists = match &args.lists {
        Some(path) => load_lists(path)?,
        None => SecurityLists::default(),
    };
    let assessment = assess_navigation(normalize_destination(&args.url), lists)?;
    tracing::debug!(
        origin = %assessment.origin,
        trusted = assessment.trusted,
        "assessed destination"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report(&assessment))?);
    } else {
        println!("url:     {}", assessment.url);
        println!("origin:  {}", assessment.origin);
        println!("trusted: {}", if assessment.trusted { "yes" } else { "no" });
        let warnings = assessment.warnings();
        if warnings.is_empty() {
            println!("no warnings");
        }
        for kind in warnings {
            println!("[{}] {}", warning_name(kind), kind.message());
        }
    }
    Ok(())
}

fn load_lists(path: &Path) -> Result<SecurityLists> {
    let raw = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).wrap_err_with(|| format!("invalid security lists in {}", path.display()))
}

fn report(assessment: &NavigationAssessment) -> Value {
    let warnings: Vec<Value> = assessment
        .warnings()
        .into_iter()
        .map(|kind| json!({ "kind": warning_name(kind), "message": kind.message() }))
        .collect();
    json!({
        "url": assessment.url,
        "origin": assessment.origin,
        "trusted": assessment.trusted,
        "threat": assessment.threat.map(threat_name),
        "warnings": warnings,
    })
}

const fn threat_name(threat: Threat) -> &'static str {
    match threat {
        Threat::MaliciousDomain => "malicious_domain",
        Threat::PhishingPattern => "phishing_pattern",
    }
}

const fn warning_name(kind: WarningKind) -> &'static str {
    match kind {
        WarningKind::MaliciousDomain => "malicious_domain",
        WarningKind::PhishingPattern => "phishing_pattern",
        WarningKind::UntrustedSite => "untrusted_site",
    }
}
