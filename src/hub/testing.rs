use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;

use crate::{
    hub::{error::HubError, ports::HubClient},
    types::TypeRef,
};

/// In-memory catalog that records every batch it receives.
#[derive(Debug, Default)]
pub struct InMemoryHubClient {
    type_refs: HashMap<String, TypeRef>,
    failure: Option<HubError>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl InMemoryHubClient {
    pub fn new(type_refs: impl IntoIterator<Item = (String, TypeRef)>) -> Self {
        Self {
            type_refs: type_refs.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn failing(error: HubError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl HubClient for InMemoryHubClient {
    async fn find_type_refs(&self, ids: &[String]) -> Result<HashMap<String, TypeRef>, HubError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ids.to_vec());

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        Ok(ids
            .iter()
            .filter_map(|id| {
                self.type_refs
                    .get(id)
                    .map(|type_ref| (id.clone(), type_ref.clone()))
            })
            .collect())
    }
}
