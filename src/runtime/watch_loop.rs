//! # Watch Loop
//!
//! Controller watch loop that monitors Wordpress resources and the objects
//! they own, and triggers reconciliation when changes are detected.

use crate::config::ControllerConfig;
use crate::constants::MANAGED_BY_SELECTOR;
use crate::controller::reconciler::{ReconcileError, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::Wordpress;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use crate::store::ObjectKey;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Service};
use kube::{Api, Client};
use kube_runtime::{controller, controller::Action, watcher, Controller};
use std::future::Future;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

/// Shared state handed to every reconciliation by the controller
#[derive(Debug)]
pub struct ControllerContext {
    pub reconciler: Arc<Reconciler>,
    /// Cancelled on shutdown; each reconciliation runs on a child token
    pub shutdown: CancellationToken,
}

fn api_for<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>,
{
    match namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    }
}

/// Run the controller watch loop
///
/// Watches Wordpress objects plus the deployments, services and claims
/// labelled as managed by this operator. Any change to an owned object
/// schedules its owner. The loop restarts the controller when its stream
/// ends and exits on SIGINT/SIGTERM.
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    config: ControllerConfig,
) -> Result<(), anyhow::Error> {
    info!("Starting controller watch loop...");

    let shutdown = CancellationToken::new();
    let backoff_duration_ms = Arc::new(AtomicU64::new(config.backoff_start_ms));

    // Mark the server as not ready and cancel in-flight reconciliations on shutdown
    spawn_shutdown_handler(shutdown_signal(), Arc::clone(&server_state), shutdown.clone());

    let namespace = config.watch_namespace.as_deref();
    match namespace {
        Some(ns) => info!("Watching Wordpress resources in namespace {}", ns),
        None => info!("Watching Wordpress resources in all namespaces"),
    }

    let context = Arc::new(ControllerContext {
        reconciler,
        shutdown: shutdown.clone(),
    });

    loop {
        if shutdown.is_cancelled() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop"
        );

        let owned = watcher::Config::default().labels(MANAGED_BY_SELECTOR);
        let backoff = Arc::clone(&backoff_duration_ms);
        let backoff_start_ms = config.backoff_start_ms;
        let backoff_max_ms = config.backoff_max_ms;
        let watch_restart_delay = config.watch_restart_delay_duration();

        Controller::new(
            api_for::<Wordpress>(&client, namespace),
            watcher::Config::default().any_semantic(),
        )
        .owns(api_for::<PersistentVolumeClaim>(&client, namespace), owned.clone())
        .owns(api_for::<Deployment>(&client, namespace), owned.clone())
        .owns(api_for::<Service>(&client, namespace), owned)
        .with_config(controller::Config::default().concurrency(config.max_concurrent_reconciliations))
        .shutdown_on_signal()
        .run(
            reconcile_wordpress,
            handle_reconciliation_error,
            Arc::clone(&context),
        )
        .filter_map(move |x| {
            let backoff = Arc::clone(&backoff);
            async move {
                match &x {
                    Ok((object, _)) => {
                        backoff.store(backoff_start_ms, std::sync::atomic::Ordering::Relaxed);
                        debug!(resource = %object, "watch.event.success");
                        Some(x)
                    }
                    Err(e) => {
                        let error_string = format!("{e:?}");
                        handle_watch_stream_error(
                            &error_string,
                            &backoff,
                            backoff_max_ms,
                            watch_restart_delay,
                        )
                        .await
                        .map(|()| x)
                    }
                }
            }
        })
        .for_each(|_| futures::future::ready(()))
        .instrument(watch_span)
        .await;

        if shutdown.is_cancelled() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        // The controller reacts to the same signal and may end first
        let delay = config.watch_restart_delay_after_end_duration();
        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            delay.as_secs()
        );
        tokio::select! {
            () = shutdown.cancelled() => {
                info!("Shutdown requested, exiting watch loop");
                break;
            }
            () = tokio::time::sleep(delay) => {}
        }
    }

    info!("Controller stopped gracefully");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM
///
/// Pods are stopped with SIGTERM, so listening for ctrl-c alone is not enough.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}

/// Once `signal` resolves, report not ready and cancel `shutdown`
fn spawn_shutdown_handler<F>(
    signal: F,
    server_state: Arc<ServerState>,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        signal.await;
        info!("Initiating graceful shutdown...");
        server_state.set_ready(false);
        shutdown.cancel();
    })
}

/// Reconcile one Wordpress object on behalf of the controller
async fn reconcile_wordpress(
    obj: Arc<Wordpress>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcileError> {
    let key = ObjectKey::from_meta(&obj.metadata).ok_or_else(|| {
        ReconcileError::InvalidObject("Wordpress without name or namespace".to_string())
    })?;
    let token = ctx.shutdown.child_token();

    let outcome = ctx.reconciler.reconcile(&key, &token).await?;
    Ok(outcome.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_handler_cancels_and_reports_not_ready() {
        let server_state = Arc::new(ServerState::default());
        server_state.set_ready(true);
        let shutdown = CancellationToken::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = spawn_shutdown_handler(
            async move {
                let _ = rx.await;
            },
            Arc::clone(&server_state),
            shutdown.clone(),
        );
        assert!(!shutdown.is_cancelled());
        assert!(server_state.is_ready());

        tx.send(()).unwrap();
        handle.await.unwrap();

        assert!(shutdown.is_cancelled());
        assert!(!server_state.is_ready());
    }
}
