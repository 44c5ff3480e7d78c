//! # Wordpress Spec
//!
//! Main CRD specification types and default values.

use crate::crd::Tier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wordpress Custom Resource Definition
///
/// Declares a two-tier Wordpress installation: a MySQL database tier and
/// the Wordpress web tier in front of it.
///
/// # Example
///
/// ```yaml
/// apiVersion: wordpress.gopkg.blogpost.com/v1alpha1
/// kind: Wordpress
/// metadata:
///   name: blog
///   namespace: default
/// spec:
///   credentialsSecretRef:
///     name: blog-mysql-credentials
///   mysql:
///     image: mysql:8.0
///     storageSize: 5Gi
///   wordpress:
///     image: wordpress:6
///     storageSize: 2Gi
///   serviceType: LoadBalancer
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Wordpress",
    group = "wordpress.gopkg.blogpost.com",
    version = "v1alpha1",
    plural = "wordpresses",
    namespaced,
    status = "crate::crd::WordpressStatus",
    shortname = "wp",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct WordpressSpec {
    /// Secret holding the MySQL root password
    /// Used by the database container and by Wordpress to connect to it
    pub credentials_secret_ref: SecretKeyRef,
    /// MySQL database tier
    /// Defaults: image "mysql:8.0", storage "1Gi", 1 replica
    #[serde(default)]
    pub mysql: TierSpec,
    /// Wordpress web tier
    /// Defaults: image "wordpress:6", storage "1Gi", 1 replica
    #[serde(default)]
    pub wordpress: TierSpec,
    /// Service type for the Wordpress service (ClusterIP, NodePort, LoadBalancer)
    /// The MySQL service is always ClusterIP
    #[serde(default = "default_service_type")]
    pub service_type: String,
}

impl WordpressSpec {
    /// Spec of the given tier
    #[must_use]
    pub fn tier(&self, tier: Tier) -> &TierSpec {
        match tier {
            Tier::Mysql => &self.mysql,
            Tier::Wordpress => &self.wordpress,
        }
    }
}

/// Reference to a key inside a Secret in the Wordpress namespace
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeyRef {
    /// Secret name
    pub name: String,
    /// Key in the secret containing the password
    /// Defaults to "password" if not specified
    #[serde(default = "default_password_key")]
    pub key: String,
}

/// Per-tier settings
///
/// Every field is optional; unset fields fall back to the tier defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TierSpec {
    /// Container image
    #[serde(default)]
    pub image: Option<String>,
    /// Size of the persistent volume claim (e.g. "1Gi", "10Gi")
    #[serde(default)]
    pub storage_size: Option<String>,
    /// Storage class for the persistent volume claim
    /// Cluster default storage class when unset
    #[serde(default)]
    pub storage_class_name: Option<String>,
    /// Number of pods
    #[serde(default)]
    pub replicas: Option<i32>,
    /// Compute resources for the tier container
    #[serde(default)]
    pub resources: Option<ResourceSpec>,
}

impl TierSpec {
    /// Image to run, falling back to the tier default
    #[must_use]
    pub fn image_or_default(&self, tier: Tier) -> String {
        self.image
            .clone()
            .unwrap_or_else(|| tier.default_image().to_string())
    }

    /// Storage size to request, falling back to the tier default
    #[must_use]
    pub fn storage_size_or_default(&self) -> String {
        self.storage_size.clone().unwrap_or_else(default_storage_size)
    }

    /// Replica count, never below 1
    #[must_use]
    pub fn replicas_or_default(&self) -> i32 {
        self.replicas.unwrap_or(1).max(1)
    }
}

/// Resource requests and limits as Kubernetes quantity strings
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// Minimum resources (e.g. `cpu: 250m`, `memory: 512Mi`)
    #[serde(default)]
    pub requests: BTreeMap<String, String>,
    /// Maximum resources
    #[serde(default)]
    pub limits: BTreeMap<String, String>,
}

/// Default value for the Wordpress service type
pub fn default_service_type() -> String {
    "ClusterIP".to_string()
}

/// Default key inside the credentials secret
pub fn default_password_key() -> String {
    "password".to_string()
}

/// Default persistent volume claim size for both tiers
pub fn default_storage_size() -> String {
    "1Gi".to_string()
}
