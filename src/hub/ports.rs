use std::collections::HashMap;

use async_trait::async_trait;

use crate::{hub::error::HubError, types::TypeRef};

/// Catalog capability consumed by the metadata resolver.
#[async_trait]
pub trait HubClient: Send + Sync {
    /// Finds the Type reference of every listed TypeInstance in one batch.
    ///
    /// Unknown IDs are left out of the result; that is not an error.
    async fn find_type_refs(&self, ids: &[String]) -> Result<HashMap<String, TypeRef>, HubError>;
}
