//! Video reference classification.
//!
//! A reference is either an internet URL handed to the service as-is or a file
//! on the local disk. Anything that is neither is rejected before a request is
//! ever assembled.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;
use vidlens_logging::redact_sensitive_data;

/// Why a reference was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    Empty,
    /// `http`/`https` scheme without a host part, e.g. `https://`
    MissingNetloc,
    PathNotFound,
    /// The filesystem could not answer (bad bytes, unreadable cwd, ...)
    Unresolvable,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Empty => "empty reference",
            Self::MissingNetloc => "URL has no network location",
            Self::PathNotFound => "path does not exist",
            Self::Unresolvable => "path could not be resolved",
        };
        f.write_str(s)
    }
}

/// Outcome of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    RemoteUrl,
    /// Carries the absolute path that was found on disk.
    LocalPath(PathBuf),
    Invalid(InvalidReason),
}

/// A raw reference together with how it classified at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    raw: String,
    classification: Classification,
}

impl VideoReference {
    /// Validate `raw` against the current filesystem state.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let classification = classify(&raw);
        Self { raw, classification }
    }

    /// Same as [`VideoReference::new`] but treats an absent value as invalid.
    pub fn from_optional(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) => Self::new(raw),
            None => Self {
                raw: String::new(),
                classification: Classification::Invalid(InvalidReason::Empty),
            },
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.classification, Classification::Invalid(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.classification, Classification::RemoteUrl)
    }

    pub fn local_path(&self) -> Option<&Path> {
        match &self.classification {
            Classification::LocalPath(p) => Some(p),
            _ => None,
        }
    }

    pub fn invalid_reason(&self) -> Option<InvalidReason> {
        match self.classification {
            Classification::Invalid(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Classify a reference. Never panics; every failure maps to `Invalid`.
///
/// First match wins:
/// 1. empty → invalid
/// 2. `http`/`https` scheme → remote URL if it has a network location, invalid otherwise
/// 3. absolute path → local if it exists
/// 4. path relative to the working directory → local if it exists
///
/// Other schemes (`ftp://`, `s3://`) are not special and fall through to the
/// path checks.
pub fn classify(raw: &str) -> Classification {
    if raw.is_empty() {
        debug!("Video reference is empty");
        return Classification::Invalid(InvalidReason::Empty);
    }

    if let Some(parts) = split_url(raw) {
        if parts.scheme.eq_ignore_ascii_case("http") || parts.scheme.eq_ignore_ascii_case("https") {
            return if parts.netloc.is_empty() {
                debug!(reference = %redact_sensitive_data(raw), "URL without network location");
                Classification::Invalid(InvalidReason::MissingNetloc)
            } else {
                debug!(reference = %redact_sensitive_data(raw), "Classified as remote URL");
                Classification::RemoteUrl
            };
        }
    }

    let path = Path::new(raw);
    if path.is_absolute() {
        return check_exists(path.to_path_buf(), raw, "absolute");
    }

    match std::env::current_dir() {
        Ok(cwd) => check_exists(cwd.join(path), raw, "relative"),
        Err(e) => {
            debug!(reference = %raw, error = %e, "Cannot read working directory");
            Classification::Invalid(InvalidReason::Unresolvable)
        }
    }
}

fn check_exists(path: PathBuf, raw: &str, kind: &str) -> Classification {
    match path.try_exists() {
        Ok(true) => {
            debug!(reference = %raw, kind, "Classified as local path");
            Classification::LocalPath(path)
        }
        Ok(false) => {
            debug!(reference = %raw, kind, "Local path does not exist");
            Classification::Invalid(InvalidReason::PathNotFound)
        }
        Err(e) => {
            debug!(reference = %raw, kind, error = %e, "Local path check failed");
            Classification::Invalid(InvalidReason::Unresolvable)
        }
    }
}

/// The pieces of a URL that classification cares about.
#[derive(Debug, PartialEq, Eq)]
struct UrlParts<'a> {
    scheme: &'a str,
    netloc: &'a str,
}

/// Split off scheme and network location the way a generic URI parser does:
/// the scheme is everything before the first `:` if it is a valid scheme
/// token, and a network location exists only when `//` follows.
///
/// Deliberately not `url::Url::parse`: WHATWG parsing rewrites `http:host`
/// into `http://host/` and would accept references that have no `//` part.
fn split_url(raw: &str) -> Option<UrlParts<'_>> {
    let s = raw.trim_start_matches(|c: char| c <= ' ');
    let colon = s.find(':')?;
    let scheme = &s[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic()
        || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }

    let rest = &s[colon + 1..];
    let netloc = match rest.strip_prefix("//") {
        Some(after) => {
            let end = after.find(['/', '?', '#']).unwrap_or(after.len());
            &after[..end]
        }
        None => "",
    };
    Some(UrlParts { scheme, netloc })
}
