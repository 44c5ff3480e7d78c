//! Deployment template.

use crate::crd::{ResourceSpec, Tier, Wordpress};
use crate::store::ManagedKind;
use crate::templates::{labels, object_meta, resource_name, selector_labels};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, PersistentVolumeClaimVolumeSource, PodSpec,
    PodTemplateSpec, Probe, ResourceRequirements, SecretKeySelector, TCPSocketAction, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;
use std::collections::BTreeMap;

const DATABASE_NAME: &str = "wordpress";
const DATABASE_USER: &str = "root";
const DATA_VOLUME: &str = "data";

/// Deployment running the container of a tier
///
/// Both tiers mount a single-writer volume, so pods are replaced with the
/// `Recreate` strategy.
#[must_use]
pub fn deployment_for(tier: Tier, wordpress: &Wordpress) -> Deployment {
    let tier_spec = wordpress.spec.tier(tier);
    let selector = selector_labels(wordpress, tier);

    let container = Container {
        name: tier.short_name().to_string(),
        image: Some(tier_spec.image_or_default(tier)),
        env: Some(env_for(tier, wordpress)),
        ports: Some(vec![ContainerPort {
            name: Some(tier.port_name().to_string()),
            container_port: tier.port(),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        volume_mounts: Some(vec![VolumeMount {
            name: DATA_VOLUME.to_string(),
            mount_path: tier.data_path().to_string(),
            ..Default::default()
        }]),
        readiness_probe: Some(Probe {
            tcp_socket: Some(TCPSocketAction {
                port: IntOrString::String(tier.port_name().to_string()),
                ..Default::default()
            }),
            initial_delay_seconds: Some(10),
            period_seconds: Some(10),
            ..Default::default()
        }),
        resources: tier_spec.resources.as_ref().map(resource_requirements),
        ..Default::default()
    };

    Deployment {
        metadata: object_meta(wordpress, tier, ManagedKind::Deployment),
        spec: Some(DeploymentSpec {
            replicas: Some(tier_spec.replicas_or_default()),
            selector: LabelSelector {
                match_labels: Some(selector),
                ..Default::default()
            },
            strategy: Some(DeploymentStrategy {
                type_: Some("Recreate".to_string()),
                ..Default::default()
            }),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels(wordpress, tier)),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    volumes: Some(vec![Volume {
                        name: DATA_VOLUME.to_string(),
                        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                            claim_name: resource_name(
                                &wordpress.name_any(),
                                tier,
                                ManagedKind::StorageClaim,
                            ),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn password_env(name: &str, wordpress: &Wordpress) -> EnvVar {
    let secret = &wordpress.spec.credentials_secret_ref;
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret.name.clone(),
                key: secret.key.clone(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn plain_env(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        ..Default::default()
    }
}

fn env_for(tier: Tier, wordpress: &Wordpress) -> Vec<EnvVar> {
    match tier {
        Tier::Mysql => vec![
            password_env("MYSQL_ROOT_PASSWORD", wordpress),
            plain_env("MYSQL_DATABASE", DATABASE_NAME),
        ],
        Tier::Wordpress => vec![
            plain_env(
                "WORDPRESS_DB_HOST",
                resource_name(&wordpress.name_any(), Tier::Mysql, ManagedKind::Service),
            ),
            plain_env("WORDPRESS_DB_USER", DATABASE_USER),
            password_env("WORDPRESS_DB_PASSWORD", wordpress),
            plain_env("WORDPRESS_DB_NAME", DATABASE_NAME),
        ],
    }
}

fn quantities(values: &BTreeMap<String, String>) -> Option<BTreeMap<String, Quantity>> {
    if values.is_empty() {
        return None;
    }
    Some(
        values
            .iter()
            .map(|(name, value)| (name.clone(), Quantity(value.clone())))
            .collect(),
    )
}

fn resource_requirements(resources: &ResourceSpec) -> ResourceRequirements {
    ResourceRequirements {
        requests: quantities(&resources.requests),
        limits: quantities(&resources.limits),
        ..Default::default()
    }
}
