//! Version strings: what the user asked for, what a binary reports, and
//! which cached copy wins.

use crate::error::InstallError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

pub const LATEST: &str = "latest";

fn exact_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("static regex"))
}

fn reported_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]+\.[0-9]+\.[0-9]+)").expect("static regex"))
}

/// The `version` input after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequest {
    Latest,
    Exact(String),
}

impl VersionRequest {
    /// Absent, blank or `latest` (any case) means "ask the channel";
    /// everything else must be a plain `X.Y.Z`.
    pub fn parse(input: Option<&str>) -> Result<Self, InstallError> {
        let normalized = input.unwrap_or_default().trim().to_lowercase();
        if normalized.is_empty() || normalized == LATEST {
            return Ok(VersionRequest::Latest);
        }
        if !exact_version_re().is_match(&normalized) {
            return Err(InstallError::InvalidVersion(normalized));
        }
        Ok(VersionRequest::Exact(normalized))
    }
}

impl fmt::Display for VersionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRequest::Latest => f.write_str(LATEST),
            VersionRequest::Exact(v) => f.write_str(v),
        }
    }
}

/// First `X.Y.Z` found in the output of `butler -V`.
pub fn parse_reported_version(output: &str) -> Option<String> {
    reported_version_re()
        .captures(output)
        .map(|caps| caps[1].to_string())
}

/// Picks the greatest cached version by plain string ordering, so
/// `1.2.0` beats `1.10.0`.
pub fn select_latest_installed(versions: &[String]) -> Option<&String> {
    versions.iter().max()
}
