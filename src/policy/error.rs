use std::fmt;

use thiserror::Error;

use crate::hub::HubError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeInstanceKind {
    RequiredTypeInstance,
    AdditionalTypeInstance,
    BackendTypeInstance,
}

impl fmt::Display for TypeInstanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeInstanceKind::RequiredTypeInstance => "RequiredTypeInstance",
            TypeInstanceKind::AdditionalTypeInstance => "AdditionalTypeInstance",
            TypeInstanceKind::BackendTypeInstance => "BackendTypeInstance",
        };
        f.write_str(name)
    }
}

/// One TypeInstance reference that still lacks its Type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedTypeInstance {
    pub kind: TypeInstanceKind,
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl fmt::Display for UnresolvedTypeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing Type reference for {} {:?}", self.kind, self.id)?;
        if let Some(name) = &self.name {
            write!(f, " (name: {name:?})")?;
        }
        if let Some(description) = &self.description {
            write!(f, " (description: {description:?})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMetadata {
    pub items: Vec<UnresolvedTypeInstance>,
}

impl MissingMetadata {
    pub fn of_kind(&self, kind: TypeInstanceKind) -> impl Iterator<Item = &UnresolvedTypeInstance> {
        self.items.iter().filter(move |item| item.kind == kind)
    }
}

impl fmt::Display for MissingMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "while validating TypeInstance metadata for Policy: {} errors occurred:",
            self.items.len()
        )?;
        for item in &self.items {
            write!(f, "\n\t* {item}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("while unmarshaling policy from YAML: {0}")]
    Parse(#[source] serde_yaml::Error),
    #[error("unsupported API version: {}", .violations.join("; "))]
    UnsupportedApiVersion { violations: Vec<String> },
    #[error("{0}")]
    MissingMetadata(MissingMetadata),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("TypeInstance metadata lookup was cancelled")]
    Cancelled,
    #[error("while finding TypeRef for TypeInstances: {0}")]
    Hub(#[source] HubError),
    #[error("while marshaling policy to YAML: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error("while resolving Action path: {0}")]
    UnresolvedImport(String),
}

impl PolicyError {
    pub fn missing_metadata(&self) -> Option<&MissingMetadata> {
        match self {
            PolicyError::MissingMetadata(missing) => Some(missing),
            _ => None,
        }
    }
}

pub fn invalid_argument(message: impl Into<String>) -> PolicyError {
    PolicyError::InvalidArgument(message.into())
}

pub fn unresolved_import(message: impl Into<String>) -> PolicyError {
    PolicyError::UnresolvedImport(message.into())
}

pub fn unsupported_api_version(violations: Vec<String>) -> PolicyError {
    PolicyError::UnsupportedApiVersion { violations }
}
