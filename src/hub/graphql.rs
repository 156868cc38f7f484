use std::{
    collections::HashMap,
    fmt::Write as _,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    hub::{
        error::{
            HubError, internal_error, invalid_request, protocol_violation, timeout_error,
            transport_error,
        },
        ports::HubClient,
    },
    types::TypeRef,
};

fn default_hub_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    pub endpoint: String,
    #[serde(default = "default_hub_timeout_ms")]
    pub timeout_ms: u64,
}

impl HubConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_ms: default_hub_timeout_ms(),
        }
    }
}

/// Local Hub client speaking GraphQL over HTTP.
#[derive(Clone)]
pub struct GraphQLHubClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl GraphQLHubClient {
    pub fn new(config: &HubConfig) -> Result<Self, HubError> {
        if config.endpoint.trim().is_empty() {
            return Err(invalid_request("hub endpoint cannot be empty"));
        }
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| internal_error(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }
}

/// Builds one query with an aliased `typeInstance` field per ID.
pub fn find_type_refs_query(ids: &[String]) -> String {
    let mut body = String::new();
    for (idx, id) in ids.iter().enumerate() {
        let literal = serde_json::to_string(id).unwrap_or_else(|_| format!("{id:?}"));
        let _ = write!(
            body,
            "\n  id_{idx}: typeInstance(id: {literal}) {{\n    id\n    typeRef {{\n      path\n      revision\n    }}\n  }}"
        );
    }
    format!("query FindTypeInstancesTypeRef {{{body}\n}}")
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse {
    #[serde(default)]
    data: Option<HashMap<String, Option<TypeInstanceNode>>>,
    #[serde(default)]
    errors: Vec<GraphQLErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct TypeInstanceNode {
    id: String,
    #[serde(rename = "typeRef", default)]
    type_ref: Option<TypeRef>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorEntry {
    message: String,
}

/// Extracts the ID to TypeRef mapping from a raw GraphQL response body.
/// Null entries and entries without a complete TypeRef are skipped.
pub fn parse_find_type_refs_response(body: &str) -> Result<HashMap<String, TypeRef>, HubError> {
    let response: GraphQLResponse = serde_json::from_str(body)
        .map_err(|err| protocol_violation(format!("invalid GraphQL response: {err}")))?;

    if !response.errors.is_empty() {
        let messages: Vec<&str> = response
            .errors
            .iter()
            .map(|entry| entry.message.as_str())
            .collect();
        return Err(protocol_violation(format!(
            "GraphQL query failed: {}",
            messages.join("; ")
        )));
    }

    Ok(response
        .data
        .unwrap_or_default()
        .into_values()
        .flatten()
        .filter_map(|node| {
            node.type_ref
                .filter(TypeRef::is_resolved)
                .map(|type_ref| (node.id, type_ref))
        })
        .collect())
}

#[async_trait]
impl HubClient for GraphQLHubClient {
    async fn find_type_refs(&self, ids: &[String]) -> Result<HashMap<String, TypeRef>, HubError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let started_at = Instant::now();
        tracing::debug!(
            target: "hub.graphql",
            endpoint = %self.endpoint,
            id_count = ids.len(),
            "find_type_refs_start"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&json!({ "query": find_type_refs_query(ids) }))
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    timeout_error(format!("hub request timed out: {err}"))
                } else {
                    transport_error(format!("hub request failed: {err}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| transport_error(format!("failed to read hub response: {err}")))?;
        if !status.is_success() {
            return Err(transport_error(format!("hub responded with {status}"))
                .with_http_status(status.as_u16()));
        }

        let type_refs = parse_find_type_refs_response(&body)?;
        tracing::debug!(
            target: "hub.graphql",
            endpoint = %self.endpoint,
            id_count = ids.len(),
            found_count = type_refs.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "find_type_refs_done"
        );
        Ok(type_refs)
    }
}
