use std::{fs, sync::Arc};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use capact_policy::{
    cli::config_path_from_args,
    config::Config,
    hub::{GraphQLHubClient, HubClient},
    logging::init_tracing,
    metadata::MetadataResolver,
    policy::{TypeInstanceBackendCollection, from_yaml_str},
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let _logging_guard = init_tracing(&config.logging)?;

    let gate = config.policy.version_gate()?;
    let raw = fs::read_to_string(&config.policy.path)
        .with_context(|| format!("failed to read policy {}", config.policy.path.display()))?;
    let mut policy = from_yaml_str(&raw, &gate)
        .with_context(|| format!("failed to load policy {}", config.policy.path.display()))?;

    let hub: Option<Arc<dyn HubClient>> = match &config.hub {
        Some(hub_config) => Some(Arc::new(
            GraphQLHubClient::new(hub_config).context("failed to construct hub client")?,
        )),
        None => None,
    };
    let resolver = MetadataResolver::new(hub);

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(target: "main", "received SIGINT; cancelling metadata resolution");
            ctrl_c_cancel.cancel();
        }
    });

    if !policy.are_type_instances_metadata_resolved() {
        resolver
            .resolve_type_instance_metadata(Some(&mut policy), &cancel)
            .await
            .context("failed to resolve TypeInstance metadata")?;
    }

    let mut backends = TypeInstanceBackendCollection::from_policy(
        &policy,
        config
            .backends
            .aliases
            .iter()
            .map(|(alias, backend)| (alias.clone(), backend.clone())),
    );
    if let Some(default) = &config.backends.default {
        backends.set_default(default.clone());
    }
    tracing::info!(
        target: "main",
        backend_count = backends.get_all().len(),
        has_default_backend = backends.default_backend().is_some(),
        "policy_ready"
    );

    print!("{}", policy.to_yaml_string()?);
    Ok(())
}
