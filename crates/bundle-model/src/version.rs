//! Plugin version values, version requirements and ship-version ranges.
//!
//! Two string schemes exist, selected by the leading major component:
//!
//! - **Classic** (`major <= 1`): `MAJOR.MINOR.PATCH[-PRERELEASE]`, parsed with
//!   the `semver` crate. A missing patch is normalized to `0`.
//! - **Unified** (`major > 1`): two or three dot-separated components, where
//!   the last present component may be the literal `SNAPSHOT`. A two-component
//!   version is a nightly build and has patch `0`.
//!
//! # Examples
//!
//! ```
//! use bundle_model::version::{PluginVersion, VersionRequirement};
//!
//! let v = PluginVersion::parse("2.1").unwrap();
//! assert_eq!((v.major, v.minor, v.patch), (2, 1, 0));
//!
//! let beta = PluginVersion::parse("1.2.3-beta.1").unwrap();
//! assert!(beta < PluginVersion::parse("1.2.3").unwrap());
//!
//! let req: VersionRequirement = "^2.0.0".parse().unwrap();
//! assert!(PluginVersion::parse("2.5.0").unwrap().satisfies(&req));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Literal token marking a snapshot component in the unified scheme.
pub const SNAPSHOT: &str = "SNAPSHOT";

/// Highest major version still written in the classic scheme.
const CLASSIC_MAX_MAJOR: u32 = 1;

/// Weight of the build component in [`PluginVersion::to_long`].
pub const BUILD_CAP: i64 = 100_000;

/// Weight of the patch component in [`PluginVersion::to_long`].
pub const COMPONENT_CAP: i64 = 10_000;

/// Sentinel standing in for a snapshot component.
const SNAPSHOT_VALUE: u32 = i32::MAX as u32;

/// Build values treated as "unbounded" and clamped to `BUILD_CAP - 1`.
const BUILD_NINES: [u32; 9] = [
    9,
    99,
    999,
    9_999,
    99_999,
    999_999,
    9_999_999,
    99_999_999,
    999_999_999,
];

/// A plugin version: `(major, minor, patch, pre_release)`.
///
/// Versions are totally ordered. A release sorts above any pre-release of
/// the same `major.minor.patch`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub pre_release: Option<String>,
}

impl PluginVersion {
    /// Create a release version.
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: None,
        }
    }

    /// Create a snapshot build of `major.minor`.
    pub fn snapshot(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            patch: 0,
            pre_release: Some(SNAPSHOT.to_string()),
        }
    }

    /// Return a copy carrying the given pre-release marker.
    pub fn with_pre_release(mut self, pre_release: impl Into<String>) -> Self {
        self.pre_release = Some(pre_release.into());
        self
    }

    /// Parse a version string in either scheme.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] if the string does not start with a
    /// non-negative integer or is malformed for the scheme its major selects.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let digits = s.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(Error::invalid_version(
                s,
                "must start with a non-negative integer",
            ));
        }
        let major = parse_number(s, &s[..digits])?;

        if major <= CLASSIC_MAX_MAJOR {
            parse_classic(s)
        } else {
            parse_unified(s)
        }
    }

    /// Whether this version uses the unified scheme.
    pub fn is_unified(&self) -> bool {
        self.major > CLASSIC_MAX_MAJOR
    }

    /// Whether this is a snapshot build.
    pub fn is_snapshot(&self) -> bool {
        self.pre_release.as_deref() == Some(SNAPSHOT)
    }

    /// Version string used by business logic: a zero patch is omitted.
    pub fn to_business_string(&self) -> String {
        self.render(false)
    }

    /// Version string used for Marketplace compatibility: the patch is
    /// always present.
    pub fn to_marketplace_string(&self) -> String {
        self.render(true)
    }

    fn render(&self, with_semver_patch_even_when_zero: bool) -> String {
        if self.is_unified() && self.is_snapshot() && self.patch == 0 {
            return format!("{}.{}.{SNAPSHOT}", self.major, self.minor);
        }

        let mut out = format!("{}.{}", self.major, self.minor);
        if self.patch != 0 || with_semver_patch_even_when_zero {
            out.push_str(&format!(".{}", self.patch));
        }
        if let Some(pre) = &self.pre_release {
            out.push('-');
            out.push_str(pre);
        }
        out
    }

    /// Check whether this version satisfies a requirement.
    pub fn satisfies(&self, requirement: &VersionRequirement) -> bool {
        match requirement {
            VersionRequirement::CompatibleWith(v) => self.major == v.major && self >= v,
            VersionRequirement::Above(v) => self >= v,
        }
    }

    /// Legacy numeric encoding, comparable across external consumers.
    ///
    /// Encodes `branch * COMPONENT_CAP * BUILD_CAP + build * COMPONENT_CAP + patch`.
    /// A pre-release appends the snapshot sentinel as the trailing component.
    pub fn to_long(&self) -> i64 {
        let mut components = vec![self.major, self.minor];
        if self.pre_release.is_none() || self.patch != 0 {
            components.push(self.patch);
        }
        if self.pre_release.is_some() {
            components.push(SNAPSHOT_VALUE);
        }

        let branch = i64::from(components[0]);
        let build = clamp_build(components.get(1).copied().unwrap_or(0));
        let patch = clamp_patch(components.get(2).copied().unwrap_or(0));

        branch * COMPONENT_CAP * BUILD_CAP + build * COMPONENT_CAP + patch
    }
}

fn clamp_build(build: u32) -> i64 {
    if build == SNAPSHOT_VALUE || BUILD_NINES.contains(&build) {
        BUILD_CAP - 1
    } else {
        i64::from(build)
    }
}

fn clamp_patch(patch: u32) -> i64 {
    if patch == SNAPSHOT_VALUE {
        COMPONENT_CAP - 1
    } else {
        i64::from(patch)
    }
}

fn parse_number(version: &str, component: &str) -> Result<u32> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_version(
            version,
            format!("'{component}' is not a number"),
        ));
    }
    component
        .parse()
        .map_err(|_| Error::invalid_version(version, format!("'{component}' is out of range")))
}

fn split_pre_release(s: &str) -> (&str, Option<&str>) {
    match s.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (s, None),
    }
}

/// Parse `MAJOR.MINOR[.PATCH][-PRERELEASE]` through semver.
fn parse_classic(s: &str) -> Result<PluginVersion> {
    let (core, pre) = split_pre_release(s);
    let mut normalized = if core.split('.').count() == 2 {
        format!("{core}.0")
    } else {
        core.to_string()
    };
    if let Some(pre) = pre {
        normalized.push('-');
        normalized.push_str(pre);
    }

    let parsed = semver::Version::parse(&normalized)
        .map_err(|e| Error::invalid_version(s, e.to_string()))?;
    if !parsed.build.is_empty() {
        return Err(Error::invalid_version(s, "build metadata is not supported"));
    }

    let component = |value: u64| {
        u32::try_from(value).map_err(|_| Error::invalid_version(s, "component is out of range"))
    };
    Ok(PluginVersion {
        major: component(parsed.major)?,
        minor: component(parsed.minor)?,
        patch: component(parsed.patch)?,
        pre_release: (!parsed.pre.is_empty()).then(|| parsed.pre.as_str().to_string()),
    })
}

/// Parse `MAJOR.MINOR[.PATCH]` where the last component may be `SNAPSHOT`.
fn parse_unified(s: &str) -> Result<PluginVersion> {
    let (core, pre) = split_pre_release(s);
    let parts: Vec<&str> = core.split('.').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(Error::invalid_version(s, "expected 2 or 3 components"));
    }

    let last = parts.len() - 1;
    let mut numbers = [0u32; 3];
    let mut snapshot = false;
    for (index, part) in parts.iter().enumerate() {
        if *part == SNAPSHOT {
            if index == 0 {
                return Err(Error::invalid_version(s, "major cannot be SNAPSHOT"));
            }
            if index != last {
                return Err(Error::invalid_version(
                    s,
                    "SNAPSHOT may only be the last component",
                ));
            }
            snapshot = true;
        } else {
            numbers[index] = parse_number(s, part)?;
        }
    }

    let pre_release = match (snapshot, pre) {
        (true, Some(_)) => {
            return Err(Error::invalid_version(
                s,
                "SNAPSHOT cannot carry a pre-release suffix",
            ));
        }
        (true, None) => Some(SNAPSHOT.to_string()),
        (false, Some(pre)) => Some(validate_pre_release(s, pre)?),
        (false, None) => None,
    };

    Ok(PluginVersion {
        major: numbers[0],
        minor: numbers[1],
        patch: numbers[2],
        pre_release,
    })
}

fn validate_pre_release(version: &str, pre: &str) -> Result<String> {
    let valid = pre.split('.').all(|segment| {
        !segment.is_empty()
            && segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
    });
    if !valid {
        return Err(Error::invalid_version(
            version,
            format!("invalid pre-release '{pre}'"),
        ));
    }
    Ok(pre.to_string())
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    match (is_numeric(a), is_numeric(b)) {
        (true, true) => {
            let a = a.trim_start_matches('0');
            let b = b.trim_start_matches('0');
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        }
        (false, false) => a.cmp(b),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
    }
}

fn compare_pre_release(a: Option<&str>, b: Option<&str>) -> Ordering {
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => (a, b),
    };

    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            // Numerically equal segments ("01" vs "1") still differ as values.
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match compare_segments(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

impl Ord for PluginVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| {
                compare_pre_release(self.pre_release.as_deref(), other.pre_release.as_deref())
            })
    }
}

impl PartialOrd for PluginVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_business_string())
    }
}

impl FromStr for PluginVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PluginVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PluginVersion> for String {
    fn from(value: PluginVersion) -> Self {
        value.to_business_string()
    }
}

/// A requirement one plugin places on the version of a dependency.
///
/// Written as `^VERSION` (same major, at least `VERSION`) or `>=VERSION`
/// (at least `VERSION`, any major).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionRequirement {
    CompatibleWith(PluginVersion),
    Above(PluginVersion),
}

impl VersionRequirement {
    /// The version carried by the requirement.
    pub fn version(&self) -> &PluginVersion {
        match self {
            Self::CompatibleWith(v) | Self::Above(v) => v,
        }
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CompatibleWith(v) => write!(f, "^{v}"),
            Self::Above(v) => write!(f, ">={v}"),
        }
    }
}

impl FromStr for VersionRequirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = |reason: String| Error::InvalidRequirement {
            requirement: s.to_string(),
            reason,
        };

        let (compatible, version) = if let Some(rest) = s.strip_prefix('^') {
            (true, rest)
        } else if let Some(rest) = s.strip_prefix(">=") {
            (false, rest)
        } else {
            return Err(invalid("expected '^' or '>=' prefix".to_string()));
        };

        let version = PluginVersion::parse(version).map_err(|e| invalid(e.to_string()))?;
        Ok(if compatible {
            Self::CompatibleWith(version)
        } else {
            Self::Above(version)
        })
    }
}

impl TryFrom<String> for VersionRequirement {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<VersionRequirement> for String {
    fn from(value: VersionRequirement) -> Self {
        value.to_string()
    }
}

/// Inclusive range of ship versions a plugin is compatible with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipVersionRange {
    pub from: PluginVersion,
    pub to: PluginVersion,
}

impl ShipVersionRange {
    pub fn new(from: PluginVersion, to: PluginVersion) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, version: &PluginVersion) -> bool {
        &self.from <= version && version <= &self.to
    }
}
