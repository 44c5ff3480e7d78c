//! Common test utilities for reconciler integration tests
//!
//! Builds Wordpress fixtures and a reconciler running against the
//! in-memory store.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wordpress_operator::config::ControllerConfig;
use wordpress_operator::controller::reconciler::{ReconcileError, ReconcileOutcome, Reconciler};
use wordpress_operator::crd::Wordpress;
use wordpress_operator::store::{InMemoryStore, ManagedKind, ObjectKey};

pub const NAMESPACE: &str = "default";

/// Wordpress `name` with the given images, as a user would apply it
pub fn wordpress(name: &str, mysql_image: &str, wordpress_image: &str) -> Wordpress {
    let yaml = format!(
        r#"
apiVersion: wordpress.gopkg.blogpost.com/v1alpha1
kind: Wordpress
metadata:
  name: {name}
  namespace: {NAMESPACE}
  uid: 3f0e6c52-8a1d-4c7e-b0b5-{name:0>12}
  generation: 1
spec:
  credentialsSecretRef:
    name: {name}-mysql-credentials
  mysql:
    image: {mysql_image}
    storageSize: 2Gi
  wordpress:
    image: {wordpress_image}
"#
    );
    serde_yaml::from_str(&yaml).expect("fixture should deserialize")
}

pub fn key(name: &str) -> ObjectKey {
    ObjectKey::new(NAMESPACE, name)
}

pub fn sub_resource(name: &str) -> ObjectKey {
    ObjectKey::new(NAMESPACE, name)
}

/// Store holding `W1` (`mysql:8`, `wordpress:6`) and nothing else
pub async fn store_with_w1() -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .insert_wordpress(wordpress("W1", "mysql:8", "wordpress:6"))
        .await;
    store
}

pub fn reconciler(store: &InMemoryStore) -> Reconciler {
    Reconciler::new(Arc::new(store.clone()), &ControllerConfig::default())
}

/// One reconciliation with a fresh, live cancellation token
pub async fn reconcile(
    reconciler: &Reconciler,
    name: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    reconciler
        .reconcile(&key(name), &CancellationToken::new())
        .await
}

pub async fn mark_database_ready(store: &InMemoryStore, name: &str, ready: bool) {
    let deployment = sub_resource(&format!("{name}-mysql-deployment"));
    assert!(
        store.set_deployment_ready(&deployment, ready).await,
        "{deployment} should exist"
    );
}

/// Reconcile until every sub-resource exists, marking MySQL ready on the way
pub async fn converge(store: &InMemoryStore, reconciler: &Reconciler, name: &str) {
    let deployment = sub_resource(&format!("{name}-mysql-deployment"));
    for _ in 0..10 {
        let outcome = reconcile(reconciler, name).await.expect("reconcile");
        if store.contains(ManagedKind::Deployment, &deployment).await {
            store.set_deployment_ready(&deployment, true).await;
        }
        if outcome == ReconcileOutcome::Done && store.created().await.len() == 6 {
            return;
        }
    }
    panic!("{name} did not converge");
}
