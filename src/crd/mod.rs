//! # Custom Resource Definitions
//!
//! CRD types for the Wordpress operator.
//!
//! ## Module Structure
//!
//! - `spec.rs` - Main CRD specification and default values
//! - `status.rs` - Status types for tracking reconciliation state
//! - `tier.rs` - Database and web tier roles

mod spec;
mod status;
mod tier;

// Re-export all public types
pub use spec::{
    default_password_key, default_service_type, default_storage_size, ResourceSpec,
    SecretKeyRef, TierSpec, Wordpress, WordpressSpec,
};
pub use status::{Condition, WordpressPhase, WordpressStatus};
pub use tier::Tier;

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::CustomResourceExt;

    #[test]
    fn test_minimal_spec_uses_defaults() {
        let spec: WordpressSpec = serde_json::from_value(serde_json::json!({
            "credentialsSecretRef": { "name": "blog-mysql" }
        }))
        .unwrap();

        assert_eq!(spec.credentials_secret_ref.key, "password");
        assert_eq!(spec.service_type, "ClusterIP");
        assert_eq!(spec.mysql.image_or_default(Tier::Mysql), "mysql:8.0");
        assert_eq!(spec.wordpress.image_or_default(Tier::Wordpress), "wordpress:6");
        assert_eq!(spec.mysql.storage_size_or_default(), "1Gi");
        assert_eq!(spec.wordpress.replicas_or_default(), 1);
    }

    #[test]
    fn test_tier_overrides_are_read() {
        let spec: WordpressSpec = serde_json::from_value(serde_json::json!({
            "credentialsSecretRef": { "name": "blog-mysql", "key": "root" },
            "mysql": { "image": "mysql:8", "storageSize": "5Gi", "replicas": 0 },
            "wordpress": {
                "image": "wordpress:6",
                "resources": { "requests": { "cpu": "250m" } }
            }
        }))
        .unwrap();

        assert_eq!(spec.tier(Tier::Mysql).image_or_default(Tier::Mysql), "mysql:8");
        assert_eq!(spec.tier(Tier::Mysql).storage_size_or_default(), "5Gi");
        // zero replicas would leave the tier permanently unready
        assert_eq!(spec.tier(Tier::Mysql).replicas_or_default(), 1);
        let resources = spec.tier(Tier::Wordpress).resources.as_ref().unwrap();
        assert_eq!(resources.requests.get("cpu").map(String::as_str), Some("250m"));
        assert!(resources.limits.is_empty());
    }

    #[test]
    fn test_missing_credentials_is_rejected() {
        let result: Result<WordpressSpec, _> = serde_json::from_value(serde_json::json!({}));
        assert!(result.is_err());
    }

    #[test]
    fn test_crd_metadata() {
        let crd = Wordpress::crd();
        assert_eq!(
            crd.metadata.name.as_deref(),
            Some("wordpresses.wordpress.gopkg.blogpost.com")
        );
        assert_eq!(crd.spec.names.kind, "Wordpress");
        assert_eq!(
            crd.spec.names.short_names.as_deref(),
            Some(&["wp".to_string()][..])
        );
        assert_eq!(crd.spec.scope, "Namespaced");
    }

    #[test]
    fn test_phase_serializes_as_plain_string() {
        let status = WordpressStatus {
            phase: Some(WordpressPhase::WaitingForDatabase),
            ..Default::default()
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["phase"], "WaitingForDatabase");
    }

    #[test]
    fn test_unreconciled_status_has_no_phase() {
        let status: WordpressStatus = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(status.phase, None);

        let unknown: Result<WordpressStatus, _> =
            serde_json::from_value(serde_json::json!({ "phase": "Pending" }));
        assert!(unknown.is_err());
    }
}
