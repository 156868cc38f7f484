use std::fmt;

use serde::{Deserialize, Serialize};

/// Every OCF manifest path is rooted under this prefix.
pub const OCF_PATH_PREFIX: &str = "cap.";

/// Reference to one specific revision of a Type manifest.
///
/// A reference counts as resolved only when both fields are non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub revision: String,
}

impl TypeRef {
    pub fn new(path: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            revision: revision.into(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.path.is_empty() && !self.revision.is_empty()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.revision)
    }
}

/// Manifest reference with an optional revision. Used for Interface, Attribute
/// and Type pattern references; the path may end with a `*` segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManifestRef {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl ManifestRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            revision: None,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Parses the `path[:revision]` shorthand.
    pub fn parse_short(value: &str) -> Self {
        match value.split_once(':') {
            Some((path, revision)) if !revision.is_empty() => {
                Self::new(path).with_revision(revision)
            }
            Some((path, _)) => Self::new(path),
            None => Self::new(value),
        }
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref().filter(|revision| !revision.is_empty())
    }
}

impl fmt::Display for ManifestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.revision() {
            Some(revision) => write!(f, "{}:{}", self.path, revision),
            None => write!(f, "{}", self.path),
        }
    }
}

impl From<TypeRef> for ManifestRef {
    fn from(value: TypeRef) -> Self {
        Self {
            path: value.path,
            revision: Some(value.revision).filter(|revision| !revision.is_empty()),
        }
    }
}

/// Drops the last dot-separated node of an OCF path.
///
/// Returns `None` when the path has a single node and nothing can be trimmed.
pub fn trim_last_node_from_ocf_path(path: &str) -> Option<&str> {
    path.rfind('.').map(|idx| &path[..idx])
}
