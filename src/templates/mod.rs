//! # Templates
//!
//! Pure functions building the desired sub-resources of a Wordpress object.
//!
//! Templates never perform I/O and never set owner references; the ensure
//! step adds the controller reference right before creating the object.
//!
//! - `storage.rs` - Persistent volume claims
//! - `deployment.rs` - Deployments
//! - `service.rs` - Services

mod deployment;
mod service;
mod storage;

pub use deployment::deployment_for;
pub use service::service_for;
pub use storage::storage_claim_for;

use crate::crd::{Tier, Wordpress};
use crate::store::{ManagedKind, ManagedResource, ObjectKey};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;

pub const LABEL_NAME: &str = "app.kubernetes.io/name";
pub const LABEL_INSTANCE: &str = "app.kubernetes.io/instance";
pub const LABEL_COMPONENT: &str = "app.kubernetes.io/component";
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Name of a sub-resource: `<owner>-<tier>-<kind>`
///
/// `resource_name("blog", Tier::Mysql, ManagedKind::StorageClaim)` is `blog-mysql-pvc`.
#[must_use]
pub fn resource_name(owner: &str, tier: Tier, kind: ManagedKind) -> String {
    format!("{owner}-{}-{}", tier.short_name(), kind.suffix())
}

/// Namespaced identity of a sub-resource of `wordpress`
#[must_use]
pub fn resource_key(wordpress: &Wordpress, tier: Tier, kind: ManagedKind) -> ObjectKey {
    ObjectKey::new(
        wordpress.namespace().unwrap_or_default(),
        resource_name(&wordpress.name_any(), tier, kind),
    )
}

/// Labels selecting the pods of one tier
#[must_use]
pub fn selector_labels(wordpress: &Wordpress, tier: Tier) -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_NAME.to_string(), "wordpress".to_string()),
        (LABEL_INSTANCE.to_string(), wordpress.name_any()),
        (LABEL_COMPONENT.to_string(), tier.component().to_string()),
    ])
}

/// Labels put on every sub-resource
#[must_use]
pub fn labels(wordpress: &Wordpress, tier: Tier) -> BTreeMap<String, String> {
    let mut labels = selector_labels(wordpress, tier);
    labels.insert(
        LABEL_MANAGED_BY.to_string(),
        crate::constants::FIELD_MANAGER.to_string(),
    );
    labels
}

pub(crate) fn object_meta(wordpress: &Wordpress, tier: Tier, kind: ManagedKind) -> ObjectMeta {
    ObjectMeta {
        name: Some(resource_name(&wordpress.name_any(), tier, kind)),
        namespace: wordpress.namespace(),
        labels: Some(labels(wordpress, tier)),
        ..Default::default()
    }
}

/// Desired state of one (tier, kind) sub-resource
#[must_use]
pub fn desired(kind: ManagedKind, tier: Tier, wordpress: &Wordpress) -> ManagedResource {
    match kind {
        ManagedKind::StorageClaim => {
            ManagedResource::StorageClaim(storage_claim_for(tier, wordpress))
        }
        ManagedKind::Deployment => ManagedResource::Deployment(deployment_for(tier, wordpress)),
        ManagedKind::Service => ManagedResource::Service(service_for(tier, wordpress)),
    }
}
