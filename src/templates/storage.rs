//! Persistent volume claim template.

use crate::crd::{Tier, Wordpress};
use crate::store::ManagedKind;
use crate::templates::object_meta;
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

/// Storage claim backing the data directory of a tier
#[must_use]
pub fn storage_claim_for(tier: Tier, wordpress: &Wordpress) -> PersistentVolumeClaim {
    let tier_spec = wordpress.spec.tier(tier);

    PersistentVolumeClaim {
        metadata: object_meta(wordpress, tier, ManagedKind::StorageClaim),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            storage_class_name: tier_spec.storage_class_name.clone(),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(tier_spec.storage_size_or_default()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
