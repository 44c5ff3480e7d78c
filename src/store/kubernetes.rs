//! # Kubernetes Store
//!
//! [`ResourceStore`] backed by the Kubernetes API through kube-rs.

use crate::constants::FIELD_MANAGER;
use crate::crd::{Wordpress, WordpressStatus};
use crate::store::{ManagedKind, ManagedResource, ObjectKey, ResourceStore, StoreError};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Service};
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client};
use tracing::debug;

/// Store talking to the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        }
    }
}

/// Map a kube error onto the store taxonomy
///
/// 404 becomes `NotFound` and 409 becomes `AlreadyExists`; everything else is
/// passed through as a transient API error.
fn classify(kind: &'static str, key: &ObjectKey, error: kube::Error) -> StoreError {
    match &error {
        kube::Error::Api(response) if response.code == 404 => StoreError::NotFound {
            kind,
            key: key.clone(),
        },
        kube::Error::Api(response) if response.code == 409 => StoreError::AlreadyExists {
            kind,
            key: key.clone(),
        },
        _ => StoreError::Api(error),
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get_wordpress(&self, key: &ObjectKey) -> Result<Wordpress, StoreError> {
        self.api::<Wordpress>(&key.namespace)
            .get(&key.name)
            .await
            .map_err(|e| classify("Wordpress", key, e))
    }

    async fn get_managed(
        &self,
        kind: ManagedKind,
        key: &ObjectKey,
    ) -> Result<ManagedResource, StoreError> {
        let result = match kind {
            ManagedKind::StorageClaim => self
                .api::<PersistentVolumeClaim>(&key.namespace)
                .get(&key.name)
                .await
                .map(ManagedResource::StorageClaim),
            ManagedKind::Deployment => self
                .api::<Deployment>(&key.namespace)
                .get(&key.name)
                .await
                .map(ManagedResource::Deployment),
            ManagedKind::Service => self
                .api::<Service>(&key.namespace)
                .get(&key.name)
                .await
                .map(ManagedResource::Service),
        };
        result.map_err(|e| classify(kind.as_str(), key, e))
    }

    async fn create_managed(&self, resource: &ManagedResource) -> Result<(), StoreError> {
        let kind = resource.kind();
        let key = resource.key().ok_or_else(|| {
            StoreError::Unavailable(format!("{kind} is missing a name or namespace"))
        })?;
        let params = Self::post_params();

        let result = match resource {
            ManagedResource::StorageClaim(pvc) => self
                .api::<PersistentVolumeClaim>(&key.namespace)
                .create(&params, pvc)
                .await
                .map(|_| ()),
            ManagedResource::Deployment(deployment) => self
                .api::<Deployment>(&key.namespace)
                .create(&params, deployment)
                .await
                .map(|_| ()),
            ManagedResource::Service(service) => self
                .api::<Service>(&key.namespace)
                .create(&params, service)
                .await
                .map(|_| ()),
        };
        result.map_err(|e| classify(kind.as_str(), &key, e))?;
        debug!(kind = kind.as_str(), key = %key, "store.create");
        Ok(())
    }

    async fn update_wordpress_status(
        &self,
        key: &ObjectKey,
        status: &WordpressStatus,
    ) -> Result<(), StoreError> {
        let patch = serde_json::json!({
            "status": status
        });

        self.api::<Wordpress>(&key.namespace)
            .patch_status(
                &key.name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(patch),
            )
            .await
            .map_err(|e| classify("Wordpress", key, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{reason} from the API server"),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_404_is_not_found() {
        let key = ObjectKey::new("default", "blog-mysql-pvc");
        let err = classify("PersistentVolumeClaim", &key, api_error(404, "NotFound"));

        assert!(err.is_not_found());
        assert!(matches!(
            err,
            StoreError::NotFound { kind: "PersistentVolumeClaim", key: k } if k == key
        ));
    }

    #[test]
    fn test_409_is_already_exists() {
        let key = ObjectKey::new("default", "blog-wp-service");
        let err = classify("Service", &key, api_error(409, "AlreadyExists"));

        assert!(matches!(
            err,
            StoreError::AlreadyExists { kind: "Service", key: k } if k == key
        ));
    }

    #[test]
    fn test_other_api_errors_pass_through() {
        let key = ObjectKey::new("default", "blog");
        for code in [401, 429, 500] {
            let err = classify("Wordpress", &key, api_error(code, "InternalError"));
            assert!(!err.is_not_found());
            assert!(
                matches!(&err, StoreError::Api(kube::Error::Api(response)) if response.code == code),
                "{code} should stay an API error"
            );
        }
    }
}
