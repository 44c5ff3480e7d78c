//! # Initialization
//!
//! Operator initialization logic including rustls setup, tracing, metrics,
//! server startup, and Kubernetes client setup.

use crate::config::{ControllerConfig, ServerConfig};
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::Wordpress;
use crate::observability;
use crate::store::{KubeStore, ObjectKey};
use anyhow::{Context, Result};
use kube::{api::Api, api::ListParams, Client};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};

/// Initialization result containing all necessary components for the operator
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
    pub controller_config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("controller_config", &self.controller_config)
            .finish_non_exhaustive()
    }
}

/// Initialize the operator runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation
/// - Reconciler setup
/// - Reconcile existing resources
pub async fn initialize() -> Result<InitializationResult> {
    // Must happen before any TLS connection is made
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider was already installed");
    }

    let controller_config = ControllerConfig::from_env();
    let server_config = ServerConfig::from_env();

    observability::logging::init_tracing(&controller_config)?;

    info!("Starting Wordpress operator v{}", env!("CARGO_PKG_VERSION"));
    info!(config = ?controller_config, "Loaded controller configuration");

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());

    // Start HTTP server for metrics and probes
    let server_state_clone = Arc::clone(&server_state);
    let server_port = server_config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let store = Arc::new(KubeStore::new(client.clone()));
    let reconciler = Arc::new(Reconciler::new(store, &controller_config));

    reconcile_existing_resources(&client, &reconciler, &controller_config).await;

    info!("Operator initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        reconciler,
        server_state,
        controller_config,
    })
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = server_config.startup_timeout();
    let poll_interval = server_config.poll_interval();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        // Set by start_server once bound
        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            break;
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}

/// Reconcile existing Wordpress resources before starting the watch
///
/// Failures are logged and left to the watch loop; a missing CRD does not
/// stop startup.
async fn reconcile_existing_resources(
    client: &Client,
    reconciler: &Arc<Reconciler>,
    config: &ControllerConfig,
) {
    let span = tracing::span!(
        tracing::Level::INFO,
        "controller.startup.reconcile_existing",
        operation = "reconcile_existing_resources"
    );

    async {
        let wordpresses: Api<Wordpress> = match config.watch_namespace.as_deref() {
            Some(namespace) => Api::namespaced(client.clone(), namespace),
            None => Api::all(client.clone()),
        };

        let list = match wordpresses.list(&ListParams::default()).await {
            Ok(list) => list,
            Err(e) => {
                error!("Wordpress CRD is not queryable; {:?}. Is the CRD installed?", e);
                error!("Installation: crdgen | kubectl apply -f -");
                warn!(error = %e, "CRD queryability check failed, continuing with the watch");
                return;
            }
        };

        if list.items.is_empty() {
            info!("No existing Wordpress resources found, watch will pick up new resources");
            return;
        }

        let mut by_namespace: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let keys: Vec<ObjectKey> = list
            .items
            .iter()
            .filter_map(|item| ObjectKey::from_meta(&item.metadata))
            .collect();
        for key in &keys {
            by_namespace
                .entry(key.namespace.clone())
                .or_default()
                .push(key.name.clone());
        }

        info!(
            "Found {} existing Wordpress resources in {} namespaces",
            keys.len(),
            by_namespace.len()
        );
        for (namespace, names) in &by_namespace {
            info!("Namespace {}: {}", namespace, names.join(", "));
        }

        let token = CancellationToken::new();
        for key in &keys {
            match reconciler.reconcile(key, &token).await {
                Ok(outcome) => info!(resource = %key, ?outcome, "reconciliation.success"),
                Err(e) => {
                    error!(resource = %key, error = %e, "reconciliation.error");
                }
            }
        }

        info!("Completed reconciliation of {} existing resources", keys.len());
    }
    .instrument(span)
    .await;
}
