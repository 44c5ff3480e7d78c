//! # Resource Store
//!
//! The object store the reconciler reads from and writes to.
//!
//! The reconciler only needs four operations: fetch the Wordpress object,
//! look up a managed sub-resource, create a managed sub-resource, and record
//! the Wordpress status. Keeping them behind [`ResourceStore`] lets the
//! reconciler run against the Kubernetes API in production and against
//! [`InMemoryStore`] in tests.
//!
//! - `kubernetes`: Kubernetes API backed store
//! - `memory`: in-memory store with failure injection

mod kubernetes;
mod memory;

pub use kubernetes::KubeStore;
pub use memory::InMemoryStore;

use crate::crd::{Wordpress, WordpressStatus};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::fmt;
use thiserror::Error;

/// Namespaced identity of an object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of a namespaced Kubernetes object, `None` when name or namespace is missing
    pub fn from_meta(meta: &ObjectMeta) -> Option<Self> {
        Some(Self::new(meta.namespace.clone()?, meta.name.clone()?))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Kind of a sub-resource managed for a Wordpress tier
///
/// `ORDERED` is the order the kinds are ensured in within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ManagedKind {
    StorageClaim,
    Deployment,
    Service,
}

impl ManagedKind {
    pub const ORDERED: [ManagedKind; 3] = [
        ManagedKind::StorageClaim,
        ManagedKind::Deployment,
        ManagedKind::Service,
    ];

    /// Kubernetes kind name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagedKind::StorageClaim => "PersistentVolumeClaim",
            ManagedKind::Deployment => "Deployment",
            ManagedKind::Service => "Service",
        }
    }

    /// Suffix used in sub-resource names
    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            ManagedKind::StorageClaim => "pvc",
            ManagedKind::Deployment => "deployment",
            ManagedKind::Service => "service",
        }
    }
}

impl fmt::Display for ManagedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A managed sub-resource, desired or observed
#[derive(Debug, Clone, PartialEq)]
pub enum ManagedResource {
    StorageClaim(PersistentVolumeClaim),
    Deployment(Deployment),
    Service(Service),
}

impl ManagedResource {
    #[must_use]
    pub fn kind(&self) -> ManagedKind {
        match self {
            ManagedResource::StorageClaim(_) => ManagedKind::StorageClaim,
            ManagedResource::Deployment(_) => ManagedKind::Deployment,
            ManagedResource::Service(_) => ManagedKind::Service,
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ManagedResource::StorageClaim(pvc) => &pvc.metadata,
            ManagedResource::Deployment(deployment) => &deployment.metadata,
            ManagedResource::Service(service) => &service.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            ManagedResource::StorageClaim(pvc) => &mut pvc.metadata,
            ManagedResource::Deployment(deployment) => &mut deployment.metadata,
            ManagedResource::Service(service) => &mut service.metadata,
        }
    }

    /// Namespaced identity, `None` when the template left name or namespace empty
    #[must_use]
    pub fn key(&self) -> Option<ObjectKey> {
        ObjectKey::from_meta(self.metadata())
    }

    #[must_use]
    pub fn as_deployment(&self) -> Option<&Deployment> {
        match self {
            ManagedResource::Deployment(deployment) => Some(deployment),
            _ => None,
        }
    }
}

/// Errors surfaced by a [`ResourceStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: ObjectKey },

    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: &'static str, key: ObjectKey },

    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Store of typed resources addressable by namespaced name
///
/// Implementations must report a missing object as [`StoreError::NotFound`];
/// the reconciler relies on that to tell "absent" apart from "lookup failed".
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch the declared Wordpress object
    async fn get_wordpress(&self, key: &ObjectKey) -> Result<Wordpress, StoreError>;

    /// Fetch the current state of a managed sub-resource
    async fn get_managed(
        &self,
        kind: ManagedKind,
        key: &ObjectKey,
    ) -> Result<ManagedResource, StoreError>;

    /// Create a managed sub-resource exactly as given
    async fn create_managed(&self, resource: &ManagedResource) -> Result<(), StoreError>;

    /// Replace the status of a Wordpress object
    async fn update_wordpress_status(
        &self,
        key: &ObjectKey,
        status: &WordpressStatus,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_display() {
        assert_eq!(ObjectKey::new("blogs", "W1").to_string(), "blogs/W1");
    }

    #[test]
    fn test_object_key_requires_namespace() {
        let meta = ObjectMeta {
            name: Some("W1".to_string()),
            ..Default::default()
        };
        assert!(ObjectKey::from_meta(&meta).is_none());
    }

    #[test]
    fn test_managed_kind_order() {
        assert_eq!(
            ManagedKind::ORDERED.map(|k| k.suffix()),
            ["pvc", "deployment", "service"]
        );
    }

    #[test]
    fn test_not_found_classification() {
        let err = StoreError::NotFound {
            kind: "Wordpress",
            key: ObjectKey::new("default", "gone"),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Wordpress default/gone not found");
        assert!(!StoreError::Unavailable("etcd".into()).is_not_found());
    }
}
