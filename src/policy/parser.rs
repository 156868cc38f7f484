use semver::{Version, VersionReq};
use serde::Deserialize;

use crate::policy::{
    error::{PolicyError, unsupported_api_version},
    types::Policy,
};

/// Default compatibility range: any 0.2.x document.
pub const DEFAULT_SUPPORTED_API_VERSION: &str = "^0.2";

/// Compatibility range a Policy `apiVersion` must satisfy before the rest of
/// the document is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionGate {
    requirement: VersionReq,
}

impl VersionGate {
    pub fn new(requirement: VersionReq) -> Self {
        Self { requirement }
    }

    pub fn parse(requirement: &str) -> Result<Self, semver::Error> {
        VersionReq::parse(requirement).map(Self::new)
    }

    pub fn requirement(&self) -> &VersionReq {
        &self.requirement
    }

    /// Returns one message per violated comparator; empty when the version is
    /// accepted.
    pub fn violations(&self, api_version: Option<&str>) -> Vec<String> {
        let Some(raw) = api_version else {
            return vec![format!(
                "apiVersion is missing, expected a version matching {}",
                self.requirement
            )];
        };

        let version = match Version::parse(raw.trim()) {
            Ok(version) => version,
            Err(err) => {
                return vec![format!("{raw:?} is not a valid semantic version: {err}")];
            }
        };

        self.requirement
            .comparators
            .iter()
            .filter(|comparator| !comparator.matches(&version))
            .map(|comparator| format!("{version} does not satisfy {comparator}"))
            .collect()
    }

    pub fn check(&self, api_version: Option<&str>) -> Result<(), PolicyError> {
        let violations = self.violations(api_version);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(unsupported_api_version(violations))
        }
    }
}

impl Default for VersionGate {
    fn default() -> Self {
        Self {
            requirement: VersionReq {
                comparators: vec![semver::Comparator {
                    op: semver::Op::Caret,
                    major: 0,
                    minor: Some(2),
                    patch: None,
                    pre: semver::Prerelease::EMPTY,
                }],
            },
        }
    }
}

#[derive(Deserialize)]
struct VersionHeader {
    #[serde(rename = "apiVersion", default)]
    api_version: Option<serde_yaml::Value>,
}

/// Decodes a Policy document, rejecting it before full decoding when its
/// `apiVersion` is outside the gate's range.
pub fn from_yaml_str(raw: &str, gate: &VersionGate) -> Result<Policy, PolicyError> {
    let header: VersionHeader = serde_yaml::from_str(raw).map_err(PolicyError::Parse)?;

    let api_version = match &header.api_version {
        None | Some(serde_yaml::Value::Null) => None,
        Some(serde_yaml::Value::String(value)) => Some(value.clone()),
        // A bare `0.2` is decoded as a number; keep its text so the gate can
        // report it as an invalid version.
        Some(other) => Some(
            serde_yaml::to_string(other)
                .map(|text| text.trim().to_string())
                .unwrap_or_default(),
        ),
    };
    gate.check(api_version.as_deref())?;

    serde_yaml::from_str(raw).map_err(PolicyError::Parse)
}

pub fn from_yaml_str_default(raw: &str) -> Result<Policy, PolicyError> {
    from_yaml_str(raw, &VersionGate::default())
}

impl Policy {
    pub fn to_yaml_string(&self) -> Result<String, PolicyError> {
        serde_yaml::to_string(self).map_err(PolicyError::Serialize)
    }
}
