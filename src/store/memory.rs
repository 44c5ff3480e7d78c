//! # In-Memory Store
//!
//! [`ResourceStore`] kept entirely in process memory.
//!
//! Used by tests to drive the reconciler without a cluster. Supports
//! failure injection per kind and records every create in order.

use crate::crd::{Wordpress, WordpressStatus};
use crate::store::{ManagedKind, ManagedResource, ObjectKey, ResourceStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    wordpresses: HashMap<ObjectKey, Wordpress>,
    managed: HashMap<(ManagedKind, ObjectKey), ManagedResource>,
    created: Vec<(ManagedKind, ObjectKey)>,
    lookup_failures: HashMap<ManagedKind, String>,
    create_failures: HashMap<ManagedKind, String>,
    wordpress_lookup_failure: Option<String>,
    status_updates: usize,
}

/// Thread-safe in-memory store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a Wordpress object
    ///
    /// Objects without a uid get a deterministic one so owner references can be built.
    pub async fn insert_wordpress(&self, mut wordpress: Wordpress) {
        let Some(key) = ObjectKey::from_meta(&wordpress.metadata) else {
            return;
        };
        if wordpress.metadata.uid.is_none() {
            wordpress.metadata.uid = Some(format!("uid-{}-{}", key.namespace, key.name));
        }
        self.state.write().await.wordpresses.insert(key, wordpress);
    }

    pub async fn remove_wordpress(&self, key: &ObjectKey) {
        self.state.write().await.wordpresses.remove(key);
    }

    /// Insert a managed object as if another actor had created it
    pub async fn insert_managed(&self, resource: ManagedResource) {
        if let Some(key) = resource.key() {
            self.state
                .write()
                .await
                .managed
                .insert((resource.kind(), key), resource);
        }
    }

    /// Every successful create, in order
    pub async fn created(&self) -> Vec<(ManagedKind, ObjectKey)> {
        self.state.read().await.created.clone()
    }

    /// Names of every successful create, in order
    pub async fn created_names(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .created
            .iter()
            .map(|(_, key)| key.name.clone())
            .collect()
    }

    pub async fn contains(&self, kind: ManagedKind, key: &ObjectKey) -> bool {
        self.state
            .read()
            .await
            .managed
            .contains_key(&(kind, key.clone()))
    }

    pub async fn get(&self, kind: ManagedKind, key: &ObjectKey) -> Option<ManagedResource> {
        self.state
            .read()
            .await
            .managed
            .get(&(kind, key.clone()))
            .cloned()
    }

    /// Report the given deployment as fully ready (or not ready at all)
    ///
    /// Returns false when the deployment does not exist.
    pub async fn set_deployment_ready(&self, key: &ObjectKey, ready: bool) -> bool {
        let mut state = self.state.write().await;
        let Some(ManagedResource::Deployment(deployment)) =
            state.managed.get_mut(&(ManagedKind::Deployment, key.clone()))
        else {
            return false;
        };
        let desired = deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.replicas)
            .unwrap_or(1);
        let count = if ready { desired } else { 0 };
        let status = deployment.status.get_or_insert_with(Default::default);
        status.replicas = Some(desired);
        status.ready_replicas = Some(count);
        status.available_replicas = Some(count);
        true
    }

    /// Make every lookup of `kind` fail with an unavailable error
    pub async fn fail_lookups(&self, kind: ManagedKind, message: impl Into<String>) {
        self.state
            .write()
            .await
            .lookup_failures
            .insert(kind, message.into());
    }

    /// Make every create of `kind` fail with an unavailable error
    pub async fn fail_creates(&self, kind: ManagedKind, message: impl Into<String>) {
        self.state
            .write()
            .await
            .create_failures
            .insert(kind, message.into());
    }

    /// Make every Wordpress lookup fail with an unavailable error
    pub async fn fail_wordpress_lookups(&self, message: impl Into<String>) {
        self.state.write().await.wordpress_lookup_failure = Some(message.into());
    }

    /// Remove all injected failures
    pub async fn clear_failures(&self) {
        let mut state = self.state.write().await;
        state.lookup_failures.clear();
        state.create_failures.clear();
        state.wordpress_lookup_failure = None;
    }

    pub async fn status_of(&self, key: &ObjectKey) -> Option<WordpressStatus> {
        self.state
            .read()
            .await
            .wordpresses
            .get(key)
            .and_then(|wp| wp.status.clone())
    }

    /// Number of status writes accepted so far
    pub async fn status_updates(&self) -> usize {
        self.state.read().await.status_updates
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn get_wordpress(&self, key: &ObjectKey) -> Result<Wordpress, StoreError> {
        let state = self.state.read().await;
        if let Some(message) = &state.wordpress_lookup_failure {
            return Err(StoreError::Unavailable(message.clone()));
        }
        state
            .wordpresses
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "Wordpress",
                key: key.clone(),
            })
    }

    async fn get_managed(
        &self,
        kind: ManagedKind,
        key: &ObjectKey,
    ) -> Result<ManagedResource, StoreError> {
        let state = self.state.read().await;
        if let Some(message) = state.lookup_failures.get(&kind) {
            return Err(StoreError::Unavailable(message.clone()));
        }
        state
            .managed
            .get(&(kind, key.clone()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.as_str(),
                key: key.clone(),
            })
    }

    async fn create_managed(&self, resource: &ManagedResource) -> Result<(), StoreError> {
        let kind = resource.kind();
        let key = resource.key().ok_or_else(|| {
            StoreError::Unavailable(format!("{kind} is missing a name or namespace"))
        })?;

        let mut state = self.state.write().await;
        if let Some(message) = state.create_failures.get(&kind) {
            return Err(StoreError::Unavailable(message.clone()));
        }
        let entry = (kind, key.clone());
        if state.managed.contains_key(&entry) {
            return Err(StoreError::AlreadyExists {
                kind: kind.as_str(),
                key,
            });
        }
        state.managed.insert(entry.clone(), resource.clone());
        state.created.push(entry);
        Ok(())
    }

    async fn update_wordpress_status(
        &self,
        key: &ObjectKey,
        status: &WordpressStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let wordpress = state
            .wordpresses
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Wordpress",
                key: key.clone(),
            })?;
        wordpress.status = Some(status.clone());
        state.status_updates += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Service;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn service(name: &str) -> ManagedResource {
        ManagedResource::Service(Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = InMemoryStore::new();
        let key = ObjectKey::new("default", "blog-wp-service");

        assert!(store
            .get_managed(ManagedKind::Service, &key)
            .await
            .unwrap_err()
            .is_not_found());

        store.create_managed(&service("blog-wp-service")).await.unwrap();
        assert!(store.get_managed(ManagedKind::Service, &key).await.is_ok());
        assert_eq!(store.created_names().await, vec!["blog-wp-service"]);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let store = InMemoryStore::new();
        store.create_managed(&service("blog-wp-service")).await.unwrap();

        let err = store
            .create_managed(&service("blog-wp-service"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.created().await.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = InMemoryStore::new();
        store.fail_creates(ManagedKind::Service, "quota exceeded").await;

        let err = store
            .create_managed(&service("blog-wp-service"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "store unavailable: quota exceeded");

        store.clear_failures().await;
        assert!(store.create_managed(&service("blog-wp-service")).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_deployment_cannot_be_marked_ready() {
        let store = InMemoryStore::new();
        let key = ObjectKey::new("default", "blog-mysql-deployment");
        assert!(!store.set_deployment_ready(&key, true).await);
    }
}
