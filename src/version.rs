//! Runtime version gate
//!
//! Parses `v<major>.<minor>.<patch>` strings and checks an actual version
//! against a required one under either an exact or a minimum policy.
//!
//! Everything here is pure. The policy is always passed in by the caller;
//! nothing in this module reads the process environment.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use strum::{Display, EnumString};
use thiserror::Error;

/// `v[major].[minor].[patch]`, anchored on both ends
const VERSION_PATTERN: &str = r"^v([0-9]+)\.([0-9]+)\.([0-9]+)$";

fn version_matcher() -> &'static Regex {
    static MATCHER: OnceLock<Regex> = OnceLock::new();
    MATCHER.get_or_init(|| Regex::new(VERSION_PATTERN).expect("version pattern is valid"))
}

/// Errors raised by the version gate. Both are fatal to the task chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionGateError {
    /// Input did not match `v<major>.<minor>.<patch>`
    #[error("Could not parse {description} (was '{raw}')")]
    Parse { description: String, raw: String },

    /// Actual version did not satisfy the comparison policy
    #[error("{reason}")]
    Mismatch { reason: String },
}

/// Parsed `(major, minor, patch)` triple.
///
/// Field order matters: the derived `Ord` is the lexicographic comparison
/// the minimum policy relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionTriple {
    major: u64,
    minor: u64,
    patch: u64,
}

impl VersionTriple {
    /// Parse a version string, naming it by `description` on failure.
    pub fn parse(description: &str, raw: &str) -> Result<Self, VersionGateError> {
        let parse_error = || VersionGateError::Parse {
            description: description.to_string(),
            raw: raw.to_string(),
        };

        let caps = version_matcher().captures(raw).ok_or_else(parse_error)?;
        let component = |i: usize| -> Result<u64, VersionGateError> {
            caps[i].parse::<u64>().map_err(|_| parse_error())
        };

        Ok(Self {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }
}

impl fmt::Display for VersionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// How strictly the actual version must match the required one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum ComparisonPolicy {
    #[strum(serialize = "exact")]
    Exact,
    #[default]
    #[strum(serialize = "minimum")]
    MinimumRequired,
}

impl ComparisonPolicy {
    /// Select a policy from a strictness flag value.
    ///
    /// Any non-empty value selects `Exact`, including `false` and `0`;
    /// `None` or an empty value selects `MinimumRequired`.
    pub fn from_strict_flag(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Self::Exact,
            _ => Self::MinimumRequired,
        }
    }

    /// Word used in the failure reason
    pub fn qualifier(&self) -> &'static str {
        match self {
            Self::Exact => "exactly",
            Self::MinimumRequired => "at least",
        }
    }
}

/// Outcome of a version comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateResult {
    Pass,
    Fail(String),
}

impl GateResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Compare parsed triples. `expected_raw`/`actual_raw` are only used to
/// build the failure reason, so it quotes what the caller was given.
pub fn compare_with_labels(
    actual: VersionTriple,
    expected: VersionTriple,
    policy: ComparisonPolicy,
    actual_raw: &str,
    expected_raw: &str,
) -> GateResult {
    let satisfied = match policy {
        ComparisonPolicy::Exact => actual == expected,
        ComparisonPolicy::MinimumRequired => actual.cmp(&expected) != Ordering::Less,
    };

    if satisfied {
        GateResult::Pass
    } else {
        GateResult::Fail(format!(
            "Incorrect version. Expected {} [{}], but was [{}].",
            policy.qualifier(),
            expected_raw,
            actual_raw
        ))
    }
}

/// Compare parsed triples, quoting their canonical form in the reason.
pub fn compare(
    actual: VersionTriple,
    expected: VersionTriple,
    policy: ComparisonPolicy,
) -> GateResult {
    compare_with_labels(
        actual,
        expected,
        policy,
        &actual.to_string(),
        &expected.to_string(),
    )
}

/// Parse both strings and gate `actual` against `expected`.
///
/// The reason on mismatch quotes the original strings, not a
/// reconstruction from the parsed triples.
pub fn check(
    expected_raw: &str,
    actual_raw: &str,
    policy: ComparisonPolicy,
) -> Result<(), VersionGateError> {
    VersionGate::new("", expected_raw, policy).verify(actual_raw)
}

/// A required version for one named runtime, checked under a fixed policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionGate {
    subject: String,
    required: String,
    policy: ComparisonPolicy,
}

impl VersionGate {
    /// `subject` names the runtime in parse errors, e.g. `Node`.
    pub fn new(
        subject: impl Into<String>,
        required: impl Into<String>,
        policy: ComparisonPolicy,
    ) -> Self {
        Self {
            subject: subject.into(),
            required: required.into(),
            policy,
        }
    }

    pub fn policy(&self) -> ComparisonPolicy {
        self.policy
    }

    pub fn required(&self) -> &str {
        &self.required
    }

    fn label(&self, prefix: &str) -> String {
        [prefix, self.subject.as_str(), "version"]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Gate `actual_raw`. The required version is parsed first, so a bad
    /// configuration is reported before a bad runtime string.
    pub fn verify(&self, actual_raw: &str) -> Result<(), VersionGateError> {
        let expected = VersionTriple::parse(&self.label("expected"), &self.required)?;
        let actual_label = if self.subject.is_empty() {
            self.label("actual")
        } else {
            self.label("")
        };
        let actual = VersionTriple::parse(&actual_label, actual_raw)?;

        match compare_with_labels(actual, expected, self.policy, actual_raw, &self.required) {
            GateResult::Pass => Ok(()),
            GateResult::Fail(reason) => Err(VersionGateError::Mismatch { reason }),
        }
    }
}
