use std::{collections::HashSet, sync::Arc};

use tokio_util::sync::CancellationToken;

use crate::{
    hub::HubClient,
    policy::{
        error::{PolicyError, invalid_argument},
        references::{type_instance_refs, type_instance_refs_mut},
        types::Policy,
    },
};

/// Fills in missing TypeInstance Type references of a Policy using one
/// batched Hub lookup.
#[derive(Clone)]
pub struct MetadataResolver {
    hub: Option<Arc<dyn HubClient>>,
}

impl MetadataResolver {
    pub fn new(hub: Option<Arc<dyn HubClient>>) -> Self {
        Self { hub }
    }

    pub async fn resolve_type_instance_metadata(
        &self,
        policy: Option<&mut Policy>,
        cancel: &CancellationToken,
    ) -> Result<(), PolicyError> {
        resolve_type_instance_metadata(self.hub.as_deref(), policy, cancel).await
    }
}

/// Resolves TypeRefs for every TypeInstance reference of `policy` that lacks
/// one.
///
/// The document is mutated only after the Hub answered. When some IDs stay
/// unknown, the resolvable references are still filled in and the call fails
/// with `MissingMetadata` listing the remaining ones.
pub async fn resolve_type_instance_metadata(
    hub: Option<&dyn HubClient>,
    policy: Option<&mut Policy>,
    cancel: &CancellationToken,
) -> Result<(), PolicyError> {
    let Some(policy) = policy else {
        return Err(invalid_argument("policy cannot be absent"));
    };
    let Some(hub) = hub else {
        return Err(invalid_argument("hub client cannot be absent"));
    };

    let ids = unresolved_type_instance_ids(policy);
    if ids.is_empty() {
        tracing::debug!(
            target: "policy.metadata",
            "type_instance_metadata_already_resolved"
        );
        return Ok(());
    }

    tracing::debug!(
        target: "policy.metadata",
        id_count = ids.len(),
        "type_instance_metadata_lookup_start"
    );
    let type_refs = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(target: "policy.metadata", "type_instance_metadata_lookup_cancelled");
            return Err(PolicyError::Cancelled);
        }
        result = hub.find_type_refs(&ids) => result.map_err(PolicyError::Hub)?,
    };

    let mut resolved_count = 0usize;
    for mut reference in type_instance_refs_mut(policy) {
        if reference.is_resolved() {
            continue;
        }
        if let Some(type_ref) = type_refs.get(&reference.info.id) {
            reference.set(type_ref.clone());
            resolved_count += 1;
        }
    }

    if let Err(err) = policy.validate_type_instances_metadata() {
        tracing::warn!(
            target: "policy.metadata",
            id_count = ids.len(),
            found_count = type_refs.len(),
            resolved_count = resolved_count,
            error = %err,
            "type_instance_metadata_unresolved"
        );
        return Err(err);
    }

    tracing::info!(
        target: "policy.metadata",
        id_count = ids.len(),
        resolved_count = resolved_count,
        "type_instance_metadata_resolved"
    );
    Ok(())
}

/// Distinct IDs of unresolved references, in document order.
pub fn unresolved_type_instance_ids(policy: &Policy) -> Vec<String> {
    let mut seen = HashSet::new();
    type_instance_refs(policy)
        .into_iter()
        .filter(|reference| !reference.is_resolved())
        .filter(|reference| seen.insert(reference.info.id.clone()))
        .map(|reference| reference.info.id)
        .collect()
}
